//! Error types for Atrium

use thiserror::Error;

/// Result type for Atrium operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Atrium
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed Accept-Encoding header (bad q-value)
    #[error("Malformed Accept-Encoding header: {0}")]
    EncodingHeaderMalformed(String),

    /// No offered content encoding satisfies the client
    #[error("No acceptable content encoding")]
    NotAcceptable,

    /// Encoding token the body encoder cannot produce
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Credential file contains a non-bcrypt hash or a malformed line
    #[error("Unsupported credential encoding: {0}")]
    UnsupportedCredentialEncoding(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
