//! linebasic - run a line-numbered BASIC program from a file
//!
//! Reads the whole source file, then lexes, parses and executes it. Any
//! error aborts the run and is reported on stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use miette::{IntoDiagnostic, WrapErr};
use tracing::{debug, info};

use linebasic::basic::{self, ExecutionResult, Interpreter, Limits, VariableStore};
use linebasic::console::TerminalConsole;

/// Command line interface.
#[derive(clap::Parser)]
#[command(name = "linebasic", version, about = "Run a line-numbered BASIC program")]
struct Cli {
    /// BASIC source file.
    #[arg(default_value = "code.bas")]
    file: PathBuf,

    /// Maximum number of line executions before the run is treated as an
    /// infinite loop.
    #[arg(long, env = "LINEBASIC_MAX_LINES", default_value_t = basic::DEFAULT_MAX_LINES)]
    max_lines: usize,

    /// Make CLS a no-op instead of clearing the terminal.
    #[arg(long)]
    no_clear: bool,

    /// Only lex and parse the program.
    #[arg(long)]
    check: bool,

    /// Log interpreter activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Enabled by --verbose or RUST_LOG; stdout is left to the program.
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::EnvFilter::from_default_env()
        } else {
            tracing_subscriber::EnvFilter::new("debug")
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> miette::Result<()> {
    let source = std::fs::read_to_string(&cli.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read: {}", cli.file.display()))?;
    debug!(file = %cli.file.display(), bytes = source.len(), "source loaded");

    let mut variables = VariableStore::new();
    let program = basic::parse_source(&source, &mut variables)?;

    if cli.check {
        println!(
            "{}: {} lines, {} variables",
            cli.file.display(),
            program.len(),
            variables.len()
        );
        return Ok(());
    }

    let limits = Limits { max_lines: cli.max_lines };
    let mut console = TerminalConsole::stdout(!cli.no_clear);
    let mut interpreter = Interpreter::new(variables, limits);

    match interpreter.execute(&program, &mut console)? {
        ExecutionResult::Ended => info!(lines = interpreter.lines_executed(), "end of execution"),
        ExecutionResult::Completed => info!(lines = interpreter.lines_executed(), "program completed"),
    }
    Ok(())
}
