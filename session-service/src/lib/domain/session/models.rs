use std::fmt;

use auth::HashedSecret;
use auth::SessionClaims;
use auth::Token;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::session::errors::PrincipalIdError;

/// Principal read projection.
///
/// Owned by the external directory and fetched per login call; never
/// cached across requests. The secret hash is redacted from Debug output.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: EmailAddress,
    pub secret_hash: HashedSecret,
    pub created_at: DateTime<Utc>,
}

/// Principal unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Generate a new random principal ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a principal ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, PrincipalIdError> {
        Uuid::parse_str(s)
            .map(PrincipalId)
            .map_err(|e| PrincipalIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Case-normalized email address used as the directory lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalize a raw email: surrounding whitespace trimmed, lowercased.
    ///
    /// No format validation happens here; an address that cannot exist
    /// is simply never found by the directory.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login credential. Never persisted; consumed by `AuthService::login`.
#[derive(Clone)]
pub struct Credential {
    pub email: String,
    pub secret: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Record of an explicitly invalidated token.
///
/// Can be dropped once `expires_at` has passed, since the token is then
/// rejected as expired regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub token_id: String,
    pub revoked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RevocationEntry {
    pub fn new(token_id: impl Into<String>, revoked_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_id: token_id.into(),
            revoked_at,
            expires_at,
        }
    }

    /// Check if the revoked token has expired on its own at `now`.
    pub fn is_prunable(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Result of successful login or refresh.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed session token
    pub access_token: Token,
    /// Claims embedded in `access_token`
    pub claims: SessionClaims,
}

/// What logout actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Token id recorded in the revocation store
    Revoked,
    /// Token already expired; nothing to record
    AlreadyExpired,
    /// No revocation store configured: the token stays valid until it
    /// expires and the caller must discard it client-side
    ClientDiscardOnly,
}
