//! Errors raised while parsing or running a program

use crate::basic::variables::Sigil;

/// Every failure aborts the whole run; there is no per-line recovery.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BasicError {
    /// First token of a line is present but not numeric.
    #[error("source line {source_line}: expected a line number, found `{found}`")]
    #[diagnostic(code(basic::parse::line_number))]
    LineNumber { source_line: usize, found: String },

    /// Integer literal outside the 64-bit signed range.
    #[error("source line {source_line}: number `{literal}` is out of range")]
    #[diagnostic(
        code(basic::parse::number_range),
        help("numbers must lie between -9223372036854775808 and 9223372036854775807")
    )]
    NumberRange { source_line: usize, literal: String },

    /// Missing, extra or wrong-kind command argument.
    #[error("line {line}: syntax error: {message}")]
    #[diagnostic(code(basic::parse::syntax))]
    Syntax { line: i64, message: String },

    /// A variable was referenced before any declaration.
    #[error("line {line}: variable `{name}` cannot be accessed before initialization")]
    #[diagnostic(
        code(basic::undefined_variable),
        help("declare it on an earlier line, e.g. `10 X%=1` or `10 X$=TEXT`")
    )]
    UndefinedVariable { line: i64, name: String },

    /// Declared value does not match its sigil.
    #[error("line {line}: variable `{name}` must hold a {expected} value, got `{value}`")]
    #[diagnostic(code(basic::parse::variable_type))]
    VariableType {
        line: i64,
        name: String,
        expected: Sigil,
        value: String,
    },

    /// `IF ... THEN` with nothing on the line and no indented lines below.
    #[error("line {line}: THEN block is empty")]
    #[diagnostic(
        code(basic::parse::empty_then_block),
        help("indent the block lines with two spaces after their line number")
    )]
    EmptyThenBlock { line: i64 },

    /// Jump target does not match any line in the program.
    #[error("line {line}: not possible to go to line {target}, not found")]
    #[diagnostic(code(basic::run::undefined_line))]
    UndefinedLine { line: i64, target: i64 },

    #[error("line {line}: infinite loop prevented after {limit} line executions")]
    #[diagnostic(
        code(basic::run::infinite_loop),
        help("raise the limit with --max-lines if the program is meant to run longer")
    )]
    InfiniteLoop { line: i64, limit: usize },

    #[error("failed to write program output")]
    #[diagnostic(code(basic::run::output))]
    Output(#[from] std::io::Error),
}

impl BasicError {
    pub(crate) fn syntax(line: i64, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }
}
