//! Error types for bundle assembly.
//!
//! Every failure surfaced by the assembly pipeline carries an [`ErrorKind`]
//! classification so callers can decide whether retrying a build makes sense.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a bundler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong (missing component, unknown sub-resource).
    ///
    /// Retrying without changing the input will fail again.
    InvalidRequest,

    /// I/O, serialization, or rendering failure inside the pipeline.
    Internal,

    /// The build observed cancellation.
    Timeout,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::Internal => write!(f, "internal"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Errors returned by the bundle assembly engine.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Caller supplied a request the engine cannot satisfy.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Build was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// I/O error with the operation and path that failed.
    #[error("{context} `{path}`: {source}")]
    Fs {
        /// What the bundler was doing.
        context: &'static str,
        /// Path involved in the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error without path information.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// YAML serialization or parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON conversion failure (template contexts, metadata).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bundler configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Directory traversal failure.
    #[error("directory walk failed: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Template could not be resolved or rendered.
    #[error("template `{name}`: {reason}")]
    Template {
        /// Template name.
        name: String,
        /// Resolver or renderer message.
        reason: String,
    },

    /// Contextual wrapper around another bundler error.
    #[error("{message}: {source}")]
    Context {
        /// Description of the failing step.
        message: String,
        /// Wrapped failure.
        source: Box<Error>,
    },

    /// Failure described only by a message.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Returns the classification of this error.
    ///
    /// Contextual wrappers report the kind of the error they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Cancelled(_) => ErrorKind::Timeout,
            Self::Context { source, .. } => source.kind(),
            _ => ErrorKind::Internal,
        }
    }
}

/// Adds a contextual message to a failure.
pub trait Context<T> {
    /// Wraps the error (or a `None`) with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Lazily evaluated variant of [`Context::context`].
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context {
            message: context.to_string(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context {
            message: f().to_string(),
            source: Box::new(e.into()),
        })
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attaches a file system context to I/O results.
pub trait ErrorExt<T> {
    /// Converts an I/O error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_kind() {
        let err: Result<()> = Err(Error::InvalidRequest("no such component".into()));
        let wrapped = err.context("resolving component").unwrap_err();
        assert_eq!(wrapped.kind(), ErrorKind::InvalidRequest);
        assert!(wrapped.to_string().starts_with("resolving component: "));
    }

    #[test]
    fn io_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Err::<(), _>(io)
            .fs_context("writing values", "/tmp/values.yaml")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("/tmp/values.yaml"));
    }

    #[test]
    fn cancellation_is_timeout() {
        assert_eq!(
            Error::Cancelled("before start".into()).kind(),
            ErrorKind::Timeout
        );
    }
}
