use thiserror::Error;

/// Error type for token verification and minting.
///
/// Variants carry no token content or key material.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed: {0}")]
    Malformed(&'static str),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Error type for signing key configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("At least one signing key is required")]
    Empty,

    #[error("Signing key id must not be empty")]
    EmptyId,

    #[error("Signing key '{id}' too short: minimum {min} bytes, got {actual}")]
    TooShort { id: String, min: usize, actual: usize },

    #[error("Duplicate signing key id: {0}")]
    DuplicateId(String),
}
