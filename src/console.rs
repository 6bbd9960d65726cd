//! Display surfaces for program output
//!
//! PRINT writes one entry per call; CLS clears whatever is visible.

use std::io::{self, Write};

/// Where a running program sends its output
pub trait Console {
    fn print(&mut self, text: &str) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

/// Console backed by a writer, normally stdout.
///
/// Clearing uses raw ANSI escape sequences.
pub struct TerminalConsole<W: Write> {
    out: W,
    clear_screen: bool,
}

impl TerminalConsole<io::Stdout> {
    pub fn stdout(clear_screen: bool) -> Self {
        Self::new(io::stdout(), clear_screen)
    }
}

impl<W: Write> TerminalConsole<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    fn write_raw(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Console for TerminalConsole<W> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.write_raw(text)?;
        self.write_raw("\n")?;
        self.out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        if !self.clear_screen {
            return Ok(());
        }
        self.write_raw("\x1b[2J\x1b[H")?; // Clear screen, cursor home
        self.out.flush()
    }
}

/// In-memory console: keeps the lines currently "on screen"
#[derive(Debug, Default)]
pub struct Transcript {
    pub output: Vec<String>,
    /// Number of CLS calls seen
    pub clears: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.output.join("\n")
    }
}

impl Console for Transcript {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.push(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.output.clear();
        self.clears += 1;
        Ok(())
    }
}
