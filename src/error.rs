//! Error types for the command line front end.
//!
//! Library code returns [`crate::bundler::Error`]; this module wraps it with
//! argument and execution errors that only the binary produces.

use crate::bundler::ErrorKind;
use thiserror::Error;

/// Result type alias for command line operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command line
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundle assembly errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl BundlerError {
    /// Classifies the error the same way the assembly engine does.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cli(_) => ErrorKind::InvalidRequest,
            Self::Bundler(e) => e.kind(),
            Self::Io(_) | Self::Anyhow(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code for this error: 2 for bad input, 130 for
    /// cancellation, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidRequest => 2,
            ErrorKind::Timeout => 130,
            ErrorKind::Internal => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self.kind() {
            ErrorKind::InvalidRequest => vec![
                "Check the recipe and command line arguments".to_string(),
                "Run with --list-components to see the supported components".to_string(),
            ],
            ErrorKind::Timeout => vec!["The build was cancelled; rerun to completion".to_string()],
            ErrorKind::Internal => {
                vec!["Re-run with --verbose (or RUST_LOG=debug) for details".to_string()]
            }
        }
    }
}
