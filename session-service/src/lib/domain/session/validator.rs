use std::sync::Arc;

use auth::SessionClaims;
use auth::TokenCodec;

use crate::session::errors::AuthError;
use crate::session::ports::Clock;
use crate::session::ports::RevocationStore;
use crate::session::ports::SystemClock;

const BEARER_PREFIX: &str = "Bearer ";

/// Gate for every protected operation.
///
/// Knows only about tokens and claims, nothing about routes or business
/// entities. Checks revocation only when a store is configured; without
/// one the deployment is stateless and tokens live until they expire.
#[derive(Clone)]
pub struct SessionValidator {
    codec: Arc<TokenCodec>,
    revocations: Option<Arc<dyn RevocationStore>>,
    clock: Arc<dyn Clock>,
}

impl SessionValidator {
    /// Create a stateless validator using the system clock.
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            revocations: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Enable revocation checks against a shared store.
    pub fn with_revocation_store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.revocations = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Authenticate a token presented with a request.
    ///
    /// # Arguments
    /// * `token` - Token string as received
    ///
    /// # Returns
    /// Verified session claims
    ///
    /// # Errors
    /// * `Malformed` - Token is structurally invalid
    /// * `InvalidSignature` - Token was tampered with or signed by an unknown key
    /// * `Expired` - Token is past its expiration
    /// * `NotYetValid` - Token was issued beyond the clock skew tolerance
    /// * `Revoked` - Token id is in the revocation store
    /// * `Internal` - Revocation store could not be read
    pub async fn authenticate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let claims = self
            .codec
            .verify(token, self.clock.now())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::from(e)
            })?;

        if let Some(store) = &self.revocations {
            let revoked = store.is_revoked(&claims.token_id).await.map_err(|e| {
                tracing::error!(error = %e, "Revocation lookup failed");
                AuthError::from(e)
            })?;

            if revoked {
                tracing::warn!(token_id = %claims.token_id, "Revoked token presented");
                return Err(AuthError::Revoked);
            }
        }

        Ok(claims)
    }

    /// Authenticate the value of an `Authorization: Bearer <token>` header.
    ///
    /// # Errors
    /// * `Malformed` - Header is not a bearer credential
    /// * Everything `authenticate` returns
    pub async fn authenticate_bearer(&self, header: &str) -> Result<SessionClaims, AuthError> {
        let token = extract_bearer_token(header)?;
        self.authenticate(token).await
    }

    pub fn is_stateless(&self) -> bool {
        self.revocations.is_none()
    }

    pub(crate) fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(crate) fn revocations(&self) -> Option<&Arc<dyn RevocationStore>> {
        self.revocations.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// Strip the `Bearer ` scheme from an Authorization header value.
///
/// # Errors
/// * `Malformed` - Missing scheme or empty token
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::Malformed),
    }
}
