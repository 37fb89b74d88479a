use auth::TokenError;
use thiserror::Error;

/// Error for PrincipalId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for user directory lookups
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("Directory query failed: {0}")]
    QueryFailed(String),

    #[error("Directory returned an invalid record: {0}")]
    InvalidRecord(String),
}

/// Error for revocation store operations
#[derive(Debug, Clone, Error)]
pub enum RevocationError {
    #[error("Revocation store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for all session operations.
///
/// A closed set: callers branch on the variant, never on the message.
/// No variant carries secrets, hashes, token contents or key material.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong secret; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Token has been revoked")]
    Revoked,

    #[error("User directory unavailable")]
    DirectoryUnavailable,

    // Infrastructure errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Message safe to return to an unauthenticated caller.
    ///
    /// Login failures collapse to "invalid credentials" and every token
    /// failure collapses to "unauthorized", so a caller cannot tell expiry
    /// from signature failure from revocation.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid credentials",
            AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::NotYetValid
            | AuthError::Revoked => "unauthorized",
            AuthError::DirectoryUnavailable => "service unavailable",
            AuthError::Internal(_) => "internal error",
        }
    }

    /// True for failures of infrastructure rather than of the caller's input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::DirectoryUnavailable | AuthError::Internal(_))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(_) => AuthError::Malformed,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::Expired,
            TokenError::NotYetValid => AuthError::NotYetValid,
            TokenError::Encoding(e) => AuthError::Internal(format!("Token encoding failed: {}", e)),
        }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(_: DirectoryError) -> Self {
        AuthError::DirectoryUnavailable
    }
}

impl From<RevocationError> for AuthError {
    fn from(err: RevocationError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
