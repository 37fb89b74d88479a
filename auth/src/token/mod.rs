pub mod claims;
pub mod codec;
pub mod errors;
pub mod keys;

pub use claims::SessionClaims;
pub use codec::Algorithm;
pub use codec::Token;
pub use codec::TokenCodec;
pub use codec::TokenHeader;
pub use errors::KeyError;
pub use errors::TokenError;
pub use keys::SigningKey;
pub use keys::SigningKeySet;
