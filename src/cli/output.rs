//! User-facing terminal output.
//!
//! Progress and results go to stdout; diagnostics stay on the `log` facade
//! so `RUST_LOG` controls them independently.

use std::io::{self, Write};

/// Writes formatted status lines, honoring verbose mode.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
}

impl OutputManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Prints `message` only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose {
            self.line(message)?;
        }
        Ok(())
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        self.line(&format!("✓ {message}"))
    }

    pub fn failure(&self, message: &str) -> io::Result<()> {
        self.line(&format!("✗ {message}"))
    }

    pub fn section(&self, title: &str) -> io::Result<()> {
        self.line(&format!("\n{title}\n{}", "=".repeat(title.chars().count())))
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.line(&format!("    {message}"))
    }

    pub fn line(&self, message: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{message}")
    }
}
