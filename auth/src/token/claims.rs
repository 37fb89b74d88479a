use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims embedded and signed inside a session token.
///
/// Field names follow RFC 7519 on the wire. Timestamps are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (principal identifier)
    #[serde(rename = "sub")]
    pub subject: String,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Unique token identifier, used as the revocation key
    #[serde(rename = "jti")]
    pub token_id: String,
}

impl SessionClaims {
    /// Issue claims for a subject with a fresh token identifier.
    ///
    /// # Arguments
    /// * `subject` - Principal identifier
    /// * `now` - Issue time
    /// * `lifetime` - Token lifetime; `expires_at - issued_at` equals it exactly
    ///
    /// # Returns
    /// Claims with sub, iat, exp and a random UUID v4 jti
    pub fn issue(subject: impl ToString, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let issued_at = now.timestamp();

        Self {
            subject: subject.to_string(),
            issued_at,
            expires_at: issued_at.saturating_add(lifetime.num_seconds()),
            token_id: Uuid::new_v4().to_string(),
        }
    }

    /// Issue replacement claims for the same subject.
    ///
    /// Timestamps have whole-second resolution, so a renewal within the
    /// second the original was issued would otherwise carry the same
    /// expiry. The replacement always expires strictly later.
    ///
    /// # Arguments
    /// * `now` - Renewal time
    /// * `lifetime` - Token lifetime
    ///
    /// # Returns
    /// Claims with a fresh jti and an expiry after `self.expires_at`
    pub fn renew(&self, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let mut renewed = Self::issue(&self.subject, now, lifetime);
        renewed.expires_at = renewed
            .expires_at
            .max(self.expires_at.saturating_add(1));
        renewed
    }

    /// Check if the claims are expired at `now`.
    ///
    /// A token is still valid at exactly its expiration second.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Check if the claims were issued after `now + skew_secs`.
    pub fn is_issued_in_future(&self, now: i64, skew_secs: i64) -> bool {
        self.issued_at > now.saturating_add(skew_secs)
    }

    /// Expiration as a UTC timestamp.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}
