//! Error types for cert-gate

use std::io;

use thiserror::Error;

/// Result type alias for cert-gate
pub type Result<T> = std::result::Result<T, Error>;

/// cert-gate errors
///
/// These cover startup and tooling failures only. Authorization outcomes are
/// never errors; they are reported through [`crate::mtls::Decision`].
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS setup error
    #[error("TLS error: {0}")]
    Tls(String),

    /// X.509 certificate could not be parsed
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
