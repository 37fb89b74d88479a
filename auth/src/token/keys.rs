use std::collections::HashSet;
use std::fmt;

use super::errors::KeyError;

/// HMAC signing key with a stable identifier.
///
/// The identifier is written into each token header so verification can
/// pick the right key after a rotation. Debug output never shows the secret.
#[derive(Clone)]
pub struct SigningKey {
    id: String,
    secret: Vec<u8>,
}

impl SigningKey {
    /// Minimum secret length for HS256 (256 bits).
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a new signing key.
    ///
    /// # Arguments
    /// * `id` - Key identifier stored in the token header (`kid`)
    /// * `secret` - Raw HMAC secret
    ///
    /// # Returns
    /// Validated SigningKey
    ///
    /// # Errors
    /// * `EmptyId` - Identifier is empty
    /// * `TooShort` - Secret shorter than 32 bytes
    pub fn new(id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let id = id.into();
        let secret = secret.into();

        if id.is_empty() {
            return Err(KeyError::EmptyId);
        }

        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(KeyError::TooShort {
                id,
                min: Self::MIN_SECRET_LENGTH,
                actual: secret.len(),
            });
        }

        Ok(Self { id, secret })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Ordered set of currently valid signing keys.
///
/// The first key signs new tokens; every key in the set is accepted for
/// verification, so tokens minted before a rotation stay valid until they
/// expire naturally.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: Vec<SigningKey>,
}

impl SigningKeySet {
    /// Build a key set from keys in priority order.
    ///
    /// # Errors
    /// * `Empty` - No keys given
    /// * `DuplicateId` - Two keys share an identifier
    pub fn new(keys: Vec<SigningKey>) -> Result<Self, KeyError> {
        if keys.is_empty() {
            return Err(KeyError::Empty);
        }

        let mut seen = HashSet::new();
        for key in &keys {
            if !seen.insert(key.id.as_str()) {
                return Err(KeyError::DuplicateId(key.id.clone()));
            }
        }

        Ok(Self { keys })
    }

    /// Key set holding a single key.
    pub fn single(key: SigningKey) -> Self {
        Self { keys: vec![key] }
    }

    /// Key used to sign newly minted tokens.
    pub fn active(&self) -> &SigningKey {
        &self.keys[0]
    }

    /// Keys to try when verifying a token carrying `kid`.
    ///
    /// The key whose id matches comes first, then the rest in configured order.
    pub fn candidates<'a>(&'a self, kid: Option<&'a str>) -> impl Iterator<Item = &'a SigningKey> {
        let preferred = kid.and_then(|kid| self.keys.iter().find(|key| key.id == kid));
        let preferred_id = preferred.map(|key| key.id.as_str());

        preferred.into_iter().chain(
            self.keys
                .iter()
                .filter(move |key| Some(key.id.as_str()) != preferred_id),
        )
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
