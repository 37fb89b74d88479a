use thiserror::Error;

/// Error type for secret hashing operations.
///
/// A wrong secret is not an error: `SecretHasher::verify` reports it as `false`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParameters(String),

    #[error("Secret hashing failed: {0}")]
    HashingFailed(String),
}
