//! BASIC language interpreter

pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod variables;

pub use error::BasicError;
pub use interpreter::{ExecutionResult, Interpreter, Limits, DEFAULT_MAX_LINES};
pub use lexer::{Lexer, Line, Token, TokenKind};
pub use parser::{Parser, Program, Stmt};
pub use variables::{Value, VariableStore};

use crate::console::Console;

/// Lex, parse and run `source` against a fresh variable store.
pub fn run_source(
    source: &str,
    limits: Limits,
    console: &mut dyn Console,
) -> Result<ExecutionResult, BasicError> {
    let mut variables = VariableStore::new();
    let program = parse_source(source, &mut variables)?;
    Interpreter::new(variables, limits).execute(&program, console)
}

/// Lex and parse `source`, applying its declarations to `variables`.
pub fn parse_source(source: &str, variables: &mut VariableStore) -> Result<Program, BasicError> {
    let lines = Lexer::new(source).tokenize();
    Parser::new(lines, variables).parse()
}
