//! Contains the `Error` and `Result` types that `mongodb_smoke` uses.

use std::{sync::Arc, time::Duration};

use mongodb::error::ErrorKind as DriverErrorKind;
use thiserror::Error;

/// The result type for all methods that can return an error in the `mongodb_smoke` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while running the smoke test. The inner
/// [`ErrorKind`](enum.ErrorKind.html) is boxed to keep `Result`s small.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        ErrorKind::InvalidConfig {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        ErrorKind::Timeout {
            operation: operation.into(),
            timeout,
        }
        .into()
    }

    #[cfg(test)]
    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        ErrorKind::Rejected {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn verification(expected: impl Into<String>, found: Option<String>) -> Self {
        ErrorKind::Verification {
            expected: expected.into(),
            found,
        }
        .into()
    }

    /// Whether the deployment could not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Connectivity { .. })
    }

    /// Whether an operation ran past its configured ceiling.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind.as_ref(),
            ErrorKind::Timeout { .. } | ErrorKind::DriverTimeout { .. }
        )
    }

    /// Whether the configuration (URI or options) was invalid.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::InvalidConfig { .. })
    }

    /// Whether a read returned a document other than the one expected.
    pub fn is_verification(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Verification { .. })
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Self::new(err.into())
    }
}

impl From<mongodb::error::Error> for ErrorKind {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            DriverErrorKind::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut => {
                ErrorKind::DriverTimeout {
                    message: err.to_string(),
                }
            }
            DriverErrorKind::Io(_)
            | DriverErrorKind::ServerSelection { .. }
            | DriverErrorKind::DnsResolve { .. }
            | DriverErrorKind::ConnectionPoolCleared { .. } => ErrorKind::Connectivity {
                message: err.to_string(),
            },
            DriverErrorKind::InvalidArgument { message, .. } => ErrorKind::InvalidConfig {
                message: message.clone(),
            },
            _ => ErrorKind::Store(Arc::new(err)),
        }
    }
}

/// The types of errors that can occur.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The connection string or an option was invalid.
    #[error("Invalid configuration: {message}")]
    #[non_exhaustive]
    InvalidConfig { message: String },

    /// The deployment could not be reached: server selection failed, DNS resolution failed, or
    /// the connection broke.
    #[error("Could not reach the deployment: {message}")]
    #[non_exhaustive]
    Connectivity { message: String },

    /// An operation did not complete within the configured `timeoutMS`.
    #[error("{operation} did not complete within {timeout:?}")]
    #[non_exhaustive]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// The driver gave up waiting on a socket.
    #[error("Network timeout: {message}")]
    #[non_exhaustive]
    DriverTimeout { message: String },

    /// The server returned an error for the operation, e.g. a write conflict or a validation
    /// failure.
    #[error("{0}")]
    Store(Arc<mongodb::error::Error>),

    /// An in-process store refused the operation before executing it. The driver reports its
    /// own refusals as [`ErrorKind::Store`].
    #[error("Operation rejected: {message}")]
    #[non_exhaustive]
    Rejected { message: String },

    /// A read by `_id` returned a document whose `name` did not match.
    #[error("Expected a document named {expected:?}, found {found:?}")]
    #[non_exhaustive]
    Verification {
        expected: String,
        found: Option<String>,
    },

    /// A read document could not be decoded.
    #[error("{0}")]
    Deserialization(#[from] mongodb::bson::de::Error),
}
