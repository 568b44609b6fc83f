//! Error types for mapupload-core

use thiserror::Error;

/// Core error types for the mapupload library
///
/// Components return these internally. The pipeline turns them into
/// user-facing messages on the stage responses, so they never reach the
/// caller of [`crate::pipeline::Pipeline`].
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP-specific error
    #[error("Zip error: {0}")]
    Zip(String),

    /// HTTP request or response error
    #[error("HTTP error: {0}")]
    Http(String),

    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// SSH/SFTP transport, authentication or protocol error
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<ssh2::Error> for Error {
    fn from(err: ssh2::Error) -> Self {
        Error::Remote(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
