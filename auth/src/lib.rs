//! Session authentication primitives
//!
//! Stateless building blocks shared by session-aware services:
//! - Secret hashing and verification (Argon2id, PHC strings)
//! - Session token minting and verification (HS256, JWT-compatible layout)
//! - Constant-time comparison used by both
//!
//! Stateful concerns (user lookup, revocation, login orchestration) live in
//! the service crate that consumes these primitives.
//!
//! # Examples
//!
//! ## Secret Hashing
//! ```
//! use auth::SecretHasher;
//!
//! let hasher = SecretHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{SessionClaims, SigningKey, SigningKeySet, TokenCodec};
//! use chrono::{Duration, Utc};
//!
//! let key = SigningKey::new("primary", b"secret_key_at_least_32_bytes_long!".to_vec()).unwrap();
//! let codec = TokenCodec::new(SigningKeySet::single(key));
//!
//! let now = Utc::now();
//! let claims = SessionClaims::issue("user123", now, Duration::days(7));
//! let token = codec.mint(&claims).unwrap();
//!
//! let decoded = codec.verify(token.as_str(), now).unwrap();
//! assert_eq!(decoded, claims);
//! ```

pub mod constant_time;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use constant_time::constant_time_eq;
pub use password::HashedSecret;
pub use password::HashingCost;
pub use password::PasswordError;
pub use password::SecretHasher;
pub use token::KeyError;
pub use token::SessionClaims;
pub use token::SigningKey;
pub use token::SigningKeySet;
pub use token::Token;
pub use token::TokenCodec;
pub use token::TokenError;
