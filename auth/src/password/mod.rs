pub mod argon2;
pub mod errors;

pub use self::argon2::HashedSecret;
pub use self::argon2::HashingCost;
pub use self::argon2::SecretHasher;
pub use errors::PasswordError;
