use std::sync::Arc;
use std::time::Duration as StdDuration;

use auth::HashedSecret;
use auth::PasswordError;
use auth::SecretHasher;
use auth::SessionClaims;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::session::models::AuthenticationResult;
use crate::domain::session::models::Credential;
use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::LogoutOutcome;
use crate::domain::session::models::Principal;
use crate::domain::session::models::RevocationEntry;
use crate::domain::session::validator::SessionValidator;
use crate::session::errors::AuthError;
use crate::session::ports::UserDirectory;

/// Session lifetime and rotation policy.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Exact distance between `iat` and `exp` of every minted token
    pub token_lifetime: Duration,
    /// Upper bound on the directory lookup during login
    pub lookup_timeout: StdDuration,
    /// Revoke the presented token when it is exchanged on refresh
    pub rotate_on_refresh: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::days(7),
            lookup_timeout: StdDuration::from_secs(2),
            rotate_on_refresh: true,
        }
    }
}

/// Login, logout and refresh orchestration.
///
/// Shares codec, clock and revocation store with the `SessionValidator`
/// it is built from, so both always agree on what a valid token is.
pub struct AuthService<UD>
where
    UD: UserDirectory,
{
    directory: Arc<UD>,
    validator: SessionValidator,
    hasher: SecretHasher,
    policy: SessionPolicy,
    decoy_hash: HashedSecret,
}

impl<UD> AuthService<UD>
where
    UD: UserDirectory,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// A decoy hash is computed with the same hasher so that logins for
    /// unknown emails cost as much as logins with a wrong secret. Stored
    /// hashes made at a different cost break that equivalence; successful
    /// logins against such hashes are logged so they can be rehashed.
    ///
    /// # Arguments
    /// * `directory` - Principal lookup implementation
    /// * `validator` - Token gate carrying codec, clock and optional revocation store
    /// * `hasher` - Secret hasher
    /// * `policy` - Lifetime, lookup timeout and rotation settings
    ///
    /// # Returns
    /// Configured auth service
    ///
    /// # Errors
    /// * `HashingFailed` - Decoy hash could not be computed
    pub fn new(
        directory: Arc<UD>,
        validator: SessionValidator,
        hasher: SecretHasher,
        policy: SessionPolicy,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            directory,
            validator,
            hasher,
            policy,
            decoy_hash,
        })
    }

    /// Validator sharing this service's codec, clock and revocation store.
    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    /// Hash a secret for storage by the registration side of the directory.
    ///
    /// # Errors
    /// * `Internal` - Hashing failed
    pub fn hash_secret(&self, secret: &str) -> Result<HashedSecret, AuthError> {
        self.hasher
            .hash(secret)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verify credentials and mint a session token.
    ///
    /// "No such user" and "wrong secret" run the same hash verification
    /// and return the same error.
    ///
    /// # Arguments
    /// * `credential` - Email and plaintext secret; dropped after verification
    ///
    /// # Returns
    /// AuthenticationResult with the new token and its claims
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong secret
    /// * `DirectoryUnavailable` - Directory lookup failed or timed out
    /// * `Internal` - Hashing task or token encoding failed
    pub async fn login(&self, credential: Credential) -> Result<AuthenticationResult, AuthError> {
        let email = EmailAddress::normalize(&credential.email);
        let principal = self.lookup(&email).await?;

        let stored = principal
            .as_ref()
            .map(|p| p.secret_hash.clone())
            .unwrap_or_else(|| self.decoy_hash.clone());

        let hasher = self.hasher.clone();
        let secret = credential.secret;
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?;

        let principal = match principal {
            Some(principal) if matches => principal,
            _ => {
                tracing::info!(reason = "invalid_credentials", "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if self.hasher.needs_rehash(&principal.secret_hash) {
            tracing::warn!(
                subject = %principal.id,
                "Stored secret hash does not match the configured hashing cost"
            );
        }

        let claims = SessionClaims::issue(
            principal.id,
            self.validator.clock().now(),
            self.policy.token_lifetime,
        );
        let access_token = self.validator.codec().mint(&claims)?;

        tracing::info!(
            subject = %claims.subject,
            token_id = %claims.token_id,
            expires_at = claims.expires_at,
            "Session issued"
        );

        Ok(AuthenticationResult {
            access_token,
            claims,
        })
    }

    /// Invalidate a token before its natural expiry.
    ///
    /// The signature is checked so only tokens minted here can create
    /// revocation entries, but expiry is not: a token close to or past its
    /// expiration can still be logged out. Without a revocation store this
    /// only confirms the token; the caller must discard it client-side.
    ///
    /// # Errors
    /// * `Malformed` - Token is structurally invalid
    /// * `InvalidSignature` - Token was not minted with a configured key
    /// * `Internal` - Revocation store could not be written
    pub async fn logout(&self, token: &str) -> Result<LogoutOutcome, AuthError> {
        let claims = self.validator.codec().verify_signature(token)?;

        let Some(store) = self.validator.revocations() else {
            tracing::info!(
                token_id = %claims.token_id,
                "Logout without revocation store; client must discard token"
            );
            return Ok(LogoutOutcome::ClientDiscardOnly);
        };

        let now = self.validator.clock().now();
        if claims.is_expired(now.timestamp()) {
            tracing::debug!(token_id = %claims.token_id, "Logout of expired token");
            return Ok(LogoutOutcome::AlreadyExpired);
        }

        store
            .revoke(RevocationEntry::new(
                claims.token_id.clone(),
                now,
                revocation_horizon(&claims),
            ))
            .await?;

        tracing::info!(token_id = %claims.token_id, "Session revoked");

        Ok(LogoutOutcome::Revoked)
    }

    /// Exchange a still-valid token for a fresh one.
    ///
    /// No grace window: an expired token cannot be refreshed. The new token
    /// always expires after the presented one. With rotation enabled and a
    /// store configured, the presented token is revoked once the new token
    /// is minted, and only the caller that revoked it receives the new token.
    ///
    /// # Errors
    /// * Everything `SessionValidator::authenticate` returns
    /// * `Revoked` - A concurrent refresh already consumed the token
    /// * `Internal` - Token encoding or revocation store failed
    pub async fn refresh(&self, token: &str) -> Result<AuthenticationResult, AuthError> {
        let previous = self.validator.authenticate(token).await?;
        let now = self.validator.clock().now();

        let claims = previous.renew(now, self.policy.token_lifetime);
        let access_token = self.validator.codec().mint(&claims)?;

        if self.policy.rotate_on_refresh {
            if let Some(store) = self.validator.revocations() {
                let newly_revoked = store
                    .revoke(RevocationEntry::new(
                        previous.token_id.clone(),
                        now,
                        revocation_horizon(&previous),
                    ))
                    .await?;

                if !newly_revoked {
                    tracing::warn!(token_id = %previous.token_id, "Refresh token reuse detected");
                    return Err(AuthError::Revoked);
                }
            }
        }

        tracing::info!(
            subject = %claims.subject,
            old_token_id = %previous.token_id,
            new_token_id = %claims.token_id,
            "Session refreshed"
        );

        Ok(AuthenticationResult {
            access_token,
            claims,
        })
    }

    async fn lookup(&self, email: &EmailAddress) -> Result<Option<Principal>, AuthError> {
        match tokio::time::timeout(self.policy.lookup_timeout, self.directory.find_by_email(email))
            .await
        {
            Ok(Ok(principal)) => Ok(principal),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Directory lookup failed");
                Err(AuthError::from(e))
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.policy.lookup_timeout.as_millis() as u64,
                    "Directory lookup timed out"
                );
                Err(AuthError::DirectoryUnavailable)
            }
        }
    }
}

/// When a revocation entry may be dropped. An expiry beyond what `DateTime`
/// represents keeps the entry forever.
fn revocation_horizon(claims: &SessionClaims) -> DateTime<Utc> {
    claims
        .expires_at_utc()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
