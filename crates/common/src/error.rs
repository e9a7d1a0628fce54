//! Common error types shared across crates.

use thiserror::Error;

/// Offset of the vault-specific numeric error family.
pub const ERROR_OFFSET: i64 = 5100;

/// Top-level error type of every vault client operation.
///
/// Variants map to the numeric codes of the vault protocol where one exists:
/// - [`VaultError::InvalidCredentials`] → 5110
/// - [`VaultError::SslHandshakeError`] → 5152
/// - [`VaultError::NoInternet`] → 5158
/// - [`VaultError::ProtocolError`] → 5159
/// - [`VaultError::Rejected`] → the code sent by the vault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// A required argument was absent or empty.
    #[error("parameter missing: {0}")]
    ParameterMissing(String),

    /// An argument had the wrong shape, e.g. an app id that is too short.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A size computation or allocation failed.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// An underlying primitive failed.
    #[error("general failure: {0}")]
    GeneralFailure(String),

    /// Padding or MAC mismatch after decryption. The key is wrong.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The vid is unknown to the vault.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or unexpected response, or a malformed recipe.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The vault could not be reached.
    #[error("no internet: {0}")]
    NoInternet(String),

    /// The TLS handshake with the vault failed.
    #[error("ssl handshake error: {0}")]
    SslHandshakeError(String),

    /// The vault answered with a non-OK status and an error code.
    #[error("vault rejected request ({status} {code}): {desc}")]
    Rejected {
        /// Status string of the response, e.g. `INVALID` or `ERROR`.
        status: String,
        /// Numeric error code supplied by the vault.
        code: i64,
        /// Description supplied by the vault, empty if none.
        desc: String,
    },
}

impl VaultError {
    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::ParameterMissing(_) => "parameter_missing",
            VaultError::InvalidParameter(_) => "invalid_parameter",
            VaultError::OutOfMemory(_) => "out_of_memory",
            VaultError::GeneralFailure(_) => "general_failure",
            VaultError::InvalidCredentials(_) => "invalid_credentials",
            VaultError::NotFound(_) => "not_found",
            VaultError::ProtocolError(_) => "protocol_error",
            VaultError::NoInternet(_) => "no_internet",
            VaultError::SslHandshakeError(_) => "ssl_handshake_error",
            VaultError::Rejected { .. } => "rejected",
        }
    }

    /// Numeric code of the vault protocol, if this error has one.
    pub fn error_number(&self) -> Option<i64> {
        match self {
            VaultError::InvalidCredentials(_) => Some(ERROR_OFFSET + 10),
            VaultError::SslHandshakeError(_) => Some(ERROR_OFFSET + 52),
            VaultError::NoInternet(_) => Some(ERROR_OFFSET + 58),
            VaultError::ProtocolError(_) => Some(ERROR_OFFSET + 59),
            VaultError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
