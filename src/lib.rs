//! Interpreter for a small line-numbered BASIC dialect.
//!
//! Source text goes through three stages: [`basic::Lexer`] splits it into
//! token lines, [`basic::Parser`] builds a [`basic::Program`] (applying
//! variable declarations as it goes), and [`basic::Interpreter`] walks the
//! program line by line, writing to a [`console::Console`].

pub mod basic;
pub mod console;
