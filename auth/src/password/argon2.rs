use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;
use crate::constant_time::constant_time_eq;

/// Stored, one-way hash of a secret in PHC string format.
///
/// The string embeds algorithm, parameters and salt, so it is
/// self-describing for later verification. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedSecret(String);

impl HashedSecret {
    /// Wrap a PHC string loaded from storage.
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for HashedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedSecret(<redacted>)")
    }
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Number of passes over memory (Argon2 `t_cost`)
    pub iterations: u32,
    /// Memory size in KiB (Argon2 `m_cost`)
    pub memory_kib: u32,
    /// Degree of parallelism (Argon2 `p_cost`)
    pub parallelism: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            iterations: Params::DEFAULT_T_COST,
            memory_kib: Params::DEFAULT_M_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// One-way secret hashing and verification.
///
/// Hashing uses Argon2id with a fresh random salt per call. Verification
/// recomputes the digest with the salt and parameters embedded in the
/// stored hash and compares digests in constant time.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    /// Create a hasher with Argon2 default cost.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a hasher with an explicit work factor.
    ///
    /// # Arguments
    /// * `cost` - Argon2id iterations, memory and parallelism
    ///
    /// # Returns
    /// SecretHasher using the given cost for new hashes
    ///
    /// # Errors
    /// * `InvalidParameters` - Argon2 rejected the cost combination
    pub fn with_cost(cost: HashingCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hash a plaintext secret for storage.
    ///
    /// Two calls with the same input produce different outputs because
    /// each call draws its own salt.
    ///
    /// # Arguments
    /// * `secret` - Plaintext secret
    ///
    /// # Returns
    /// PHC string format hash (algorithm, parameters, salt and digest)
    ///
    /// # Errors
    /// * `HashingFailed` - Argon2 failed to produce a hash
    pub fn hash(&self, secret: &str) -> Result<HashedSecret, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| HashedSecret(hash.to_string()))
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a plaintext secret against a stored hash.
    ///
    /// Never fails: a wrong secret or an unparseable stored value both
    /// yield `false`.
    ///
    /// # Arguments
    /// * `secret` - Plaintext secret to check
    /// * `stored` - Stored hash in PHC string format
    ///
    /// # Returns
    /// True if the secret matches the stored hash
    pub fn verify(&self, secret: &str, stored: &HashedSecret) -> bool {
        let Ok(parsed) = PasswordHash::new(stored.as_str()) else {
            return false;
        };

        let Some(expected) = parsed.hash.as_ref() else {
            return false;
        };

        let Some(computed) = recompute_digest(secret, &parsed, expected.len()) else {
            return false;
        };

        constant_time_eq(&computed, expected.as_bytes())
    }

    /// Check whether a stored hash was produced with different parameters.
    ///
    /// Verification cost follows the parameters embedded in the stored
    /// hash, so outdated hashes verify faster or slower than the current
    /// cost. Unparseable values also report true.
    ///
    /// # Arguments
    /// * `stored` - Stored hash in PHC string format
    ///
    /// # Returns
    /// True if the hash is not Argon2id v19 at this hasher's cost
    pub fn needs_rehash(&self, stored: &HashedSecret) -> bool {
        let Ok(parsed) = PasswordHash::new(stored.as_str()) else {
            return true;
        };

        let current_algorithm = Algorithm::try_from(parsed.algorithm)
            .map(|algorithm| algorithm == Algorithm::Argon2id)
            .unwrap_or(false);
        let current_version = parsed.version == Some(Version::V0x13 as u32);
        let current_params = Params::try_from(&parsed)
            .map(|params| {
                params.m_cost() == self.params.m_cost()
                    && params.t_cost() == self.params.t_cost()
                    && params.p_cost() == self.params.p_cost()
            })
            .unwrap_or(false);

        !(current_algorithm && current_version && current_params)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute the raw digest for `secret` using everything embedded in `parsed`.
fn recompute_digest(secret: &str, parsed: &PasswordHash<'_>, output_len: usize) -> Option<Vec<u8>> {
    let algorithm = Algorithm::try_from(parsed.algorithm).ok()?;
    let version = match parsed.version {
        Some(v) => Version::try_from(v).ok()?,
        None => Version::default(),
    };
    let params = Params::try_from(parsed).ok()?;

    let mut salt_buf = [0u8; 64];
    let salt = parsed.salt.as_ref()?.decode_b64(&mut salt_buf).ok()?;

    let mut output = vec![0u8; output_len];
    Argon2::new(algorithm, version, params)
        .hash_password_into(secret.as_bytes(), salt, &mut output)
        .ok()?;

    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hasher() -> SecretHasher {
        SecretHasher::with_cost(HashingCost {
            iterations: 1,
            memory_kib: 1024,
            parallelism: 1,
        })
        .expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = test_hasher();
        let secret = "my_secure_password";

        let hash = hasher.hash(secret).expect("Failed to hash secret");

        assert!(hasher.verify(secret, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = test_hasher();

        let hash1 = hasher.hash("same_secret").expect("Failed to hash secret");
        let hash2 = hasher.hash("same_secret").expect("Failed to hash secret");

        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same_secret", &hash1));
        assert!(hasher.verify("same_secret", &hash2));
    }

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = test_hasher().hash("secret").expect("Failed to hash secret");
        assert!(hash.as_str().starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
    }

    #[test]
    fn test_verify_uses_parameters_embedded_in_hash() {
        // Hash produced with one cost must verify under a hasher configured with another.
        let hash = test_hasher().hash("secret").expect("Failed to hash secret");
        let other = SecretHasher::with_cost(HashingCost {
            iterations: 2,
            memory_kib: 2048,
            parallelism: 1,
        })
        .expect("Failed to build hasher");

        assert!(other.verify("secret", &hash));
    }

    #[test]
    fn test_verify_malformed_hash_is_false() {
        let hasher = test_hasher();
        assert!(!hasher.verify("password", &HashedSecret::new("invalid_hash")));
        assert!(!hasher.verify("password", &HashedSecret::new("")));
        assert!(!hasher.verify(
            "password",
            &HashedSecret::new("$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ")
        ));
    }

    #[test]
    fn test_verify_tampered_digest_is_false() {
        let hasher = test_hasher();
        let hash = hasher.hash("secret").expect("Failed to hash secret");

        let mut tampered = hash.into_inner();
        let last = tampered.pop().expect("hash is not empty");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(!hasher.verify("secret", &HashedSecret::new(tampered)));
    }

    #[test]
    fn test_needs_rehash_detects_other_cost() {
        let hasher = test_hasher();
        let hash = hasher.hash("secret").expect("Failed to hash secret");
        assert!(!hasher.needs_rehash(&hash));

        let stronger = SecretHasher::with_cost(HashingCost {
            iterations: 2,
            memory_kib: 2048,
            parallelism: 1,
        })
        .expect("Failed to build hasher");
        assert!(stronger.needs_rehash(&hash));
        assert!(hasher.needs_rehash(&HashedSecret::new("invalid_hash")));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = SecretHasher::with_cost(HashingCost {
            iterations: 0,
            memory_kib: 1024,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParameters(_))));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let hash = HashedSecret::new("$argon2id$secret-material");
        assert_eq!(format!("{:?}", hash), "HashedSecret(<redacted>)");
    }
}
