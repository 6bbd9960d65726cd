use std::fs;
use std::path::PathBuf;

use linebasic::basic::{run_source, BasicError, ExecutionResult, Limits};
use linebasic::console::Transcript;

fn demo(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}

fn run_demo(name: &str) -> (Transcript, Result<ExecutionResult, BasicError>) {
    let mut console = Transcript::new();
    let result = run_source(&demo(name), Limits::default(), &mut console);
    (console, result)
}

#[test]
fn hello_prints_and_ends() {
    let (console, result) = run_demo("hello.bas");
    assert_eq!(result.expect("Should run"), ExecutionResult::Ended);
    assert_eq!(console.text(), "HELLO WORLD");
    assert_eq!(console.clears, 1);
}

#[test]
fn variables_and_block_then() {
    let (console, result) = run_demo("variables.bas");
    assert_eq!(result.expect("Should run"), ExecutionResult::Ended);
    assert_eq!(console.text(), "ADA LOVELACE\n36\nOVER THIRTY");
}

#[test]
fn endless_program_is_stopped() {
    let (console, result) = run_demo("forever.bas");
    assert!(matches!(result, Err(BasicError::InfiniteLoop { limit: 100, .. })), "{result:?}");
    assert_eq!(console.output.len(), 50);
    assert_eq!(console.output[0], "TICK");
    assert_eq!(console.output[1], "TOCK");
}

#[test]
fn configured_limit_is_honoured() {
    let mut console = Transcript::new();
    let result = run_source(&demo("forever.bas"), Limits { max_lines: 8 }, &mut console);
    assert!(matches!(result, Err(BasicError::InfiniteLoop { limit: 8, line: 10 })));
    assert_eq!(console.output.len(), 4);
}

#[test]
fn parse_errors_abort_before_running() {
    let mut console = Transcript::new();
    let result = run_source("10 PRINT \"A\"\n20 GOTO", Limits::default(), &mut console);
    assert!(matches!(result, Err(BasicError::Syntax { line: 20, .. })));
    assert!(console.output.is_empty());
}
