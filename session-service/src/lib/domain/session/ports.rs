use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::Principal;
use crate::domain::session::models::RevocationEntry;
use crate::session::errors::DirectoryError;
use crate::session::errors::RevocationError;

/// Read-only principal lookup provided by the persistence layer.
///
/// The only potentially slow call on the login path; callers bound it
/// with a timeout.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Retrieve principal by normalized email address.
    ///
    /// # Arguments
    /// * `email` - Normalized email address
    ///
    /// # Returns
    /// Optional principal (None if not found)
    ///
    /// # Errors
    /// * `QueryFailed` - Backing store could not be queried
    /// * `InvalidRecord` - Stored record could not be mapped
    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Principal>, DirectoryError>;
}

/// Shared set of revoked token ids.
///
/// Each token id is independent: implementations need per-key atomic
/// insert and lookup, never multi-key transactions.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Record a revoked token.
    ///
    /// # Arguments
    /// * `entry` - Revocation entry keyed by token id
    ///
    /// # Returns
    /// True if the token id was newly revoked, false if already present
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be written
    async fn revoke(&self, entry: RevocationEntry) -> Result<bool, RevocationError>;

    /// Check whether a token id has been revoked.
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be read
    async fn is_revoked(&self, token_id: &str) -> Result<bool, RevocationError>;

    /// Remove entries whose token has already expired at `now`.
    ///
    /// # Returns
    /// Number of entries removed
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be written
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, RevocationError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
