use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::DecodeError;
use base64::Engine;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use super::claims::SessionClaims;
use super::errors::TokenError;
use super::keys::SigningKey;
use super::keys::SigningKeySet;
use crate::constant_time::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

/// Segment delimiter. Never produced by the URL-safe base64 alphabet.
const DELIMITER: char = '.';

/// Upper bound on accepted token length, checked before any decoding.
pub const MAX_TOKEN_LENGTH: usize = 4096;

/// Default tolerance for tokens issued slightly in the future.
pub const DEFAULT_CLOCK_SKEW_SECS: i64 = 60;

/// Signing algorithm recorded in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// HMAC with SHA-256
    HS256,
}

/// Token header segment.
///
/// Unknown `alg` values fail deserialization, which the codec reports as
/// `Malformed` before attempting any signature check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: Algorithm,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Identifier of the signing key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Signed, immutable session token in `header.claims.signature` form.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Token encoder and verifier.
///
/// Tokens are JWT-compatible: base64url (unpadded) JSON header and claims,
/// followed by an HS256 MAC over `header.claims`. The codec is pure given
/// its keys and may be shared freely across threads.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: SigningKeySet,
    clock_skew: Duration,
}

/// Token split into its parts. Nothing here is trusted until the MAC checks out.
struct UnverifiedToken<'a> {
    signing_input: &'a str,
    header: TokenHeader,
    claims: SessionClaims,
    signature: Vec<u8>,
}

impl TokenCodec {
    /// Create a new codec over a key set.
    ///
    /// # Arguments
    /// * `keys` - Ordered signing keys; the first signs new tokens
    ///
    /// # Returns
    /// TokenCodec with the default 60 second clock skew tolerance
    pub fn new(keys: SigningKeySet) -> Self {
        Self {
            keys,
            clock_skew: Duration::seconds(DEFAULT_CLOCK_SKEW_SECS),
        }
    }

    /// Set the tolerance for tokens issued in the future.
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Encode and sign claims with the active key.
    ///
    /// # Arguments
    /// * `claims` - Claims to embed
    ///
    /// # Returns
    /// Signed token
    ///
    /// # Errors
    /// * `Encoding` - Claims or header could not be serialized
    pub fn mint(&self, claims: &SessionClaims) -> Result<Token, TokenError> {
        let key = self.keys.active();
        let header = TokenHeader {
            alg: Algorithm::HS256,
            typ: Some("JWT".to_string()),
            kid: Some(key.id().to_string()),
        };

        let header_segment = encode_segment(&header)?;
        let claims_segment = encode_segment(claims)?;
        let signing_input = format!("{header_segment}{DELIMITER}{claims_segment}");
        let signature = sign(key, signing_input.as_bytes())?;

        Ok(Token(format!(
            "{signing_input}{DELIMITER}{}",
            URL_SAFE_NO_PAD.encode(signature)
        )))
    }

    /// Verify signature and time bounds, returning the embedded claims.
    ///
    /// # Arguments
    /// * `token` - Token string as received
    /// * `now` - Verification time
    ///
    /// # Returns
    /// Verified claims
    ///
    /// # Errors
    /// * `Malformed` - Wrong segment count, bad encoding, unknown algorithm or oversized input
    /// * `InvalidSignature` - No configured key produces the received MAC
    /// * `Expired` - `now` is past `exp`
    /// * `NotYetValid` - `iat` is beyond `now` plus the clock skew tolerance
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let claims = self.verify_signature(token)?;
        let now = now.timestamp();

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        if claims.is_issued_in_future(now, self.clock_skew.num_seconds()) {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }

    /// Verify structure and signature only, skipping time bounds.
    ///
    /// Used where an expired token still has to be identified, such as
    /// logout. Never use the result to authorize a request.
    ///
    /// # Errors
    /// * `Malformed` - Token is structurally invalid
    /// * `InvalidSignature` - No configured key produces the received MAC
    pub fn verify_signature(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let unverified = parse(token)?;

        let mut matched = false;
        for key in self.keys.candidates(unverified.header.kid.as_deref()) {
            let expected = sign(key, unverified.signing_input.as_bytes())?;
            if constant_time_eq(&expected, &unverified.signature) {
                matched = true;
                break;
            }
        }

        if !matched {
            return Err(TokenError::InvalidSignature);
        }

        Ok(unverified.claims)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    serde_json::to_vec(value)
        .map(|json| URL_SAFE_NO_PAD.encode(json))
        .map_err(|e| TokenError::Encoding(e.to_string()))
}

fn decode_segment(segment: &str, what: &'static str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed(what))
}

fn sign(key: &SigningKey, input: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(key.secret())
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Structural decoding. Cheap checks only; no cryptography.
fn parse(token: &str) -> Result<UnverifiedToken<'_>, TokenError> {
    if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
        return Err(TokenError::Malformed("token length out of bounds"));
    }

    let mut segments = token.split(DELIMITER);
    let (Some(header_segment), Some(claims_segment), Some(signature_segment), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed("expected three segments"));
    };

    if header_segment.is_empty() || claims_segment.is_empty() || signature_segment.is_empty() {
        return Err(TokenError::Malformed("empty segment"));
    }

    let header: TokenHeader =
        serde_json::from_slice(&decode_segment(header_segment, "header encoding")?)
            .map_err(|_| TokenError::Malformed("unsupported header"))?;

    let claims: SessionClaims =
        serde_json::from_slice(&decode_segment(claims_segment, "claims encoding")?)
            .map_err(|_| TokenError::Malformed("invalid claims"))?;

    // A non-canonical final symbol is valid alphabet that no key ever produced.
    let signature = match URL_SAFE_NO_PAD.decode(signature_segment) {
        Ok(signature) => signature,
        Err(DecodeError::InvalidLastSymbol(..)) => return Err(TokenError::InvalidSignature),
        Err(_) => return Err(TokenError::Malformed("signature encoding")),
    };

    Ok(UnverifiedToken {
        signing_input: &token[..header_segment.len() + 1 + claims_segment.len()],
        header,
        claims,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, secret: &str) -> SigningKey {
        SigningKey::new(id, secret.as_bytes().to_vec()).expect("valid key")
    }

    fn codec(id: &str, secret: &str) -> TokenCodec {
        TokenCodec::new(SigningKeySet::single(key(id, secret)))
    }

    fn claims_at(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims::issue("user123", now, Duration::hours(1))
    }

    fn replace_char(s: &str, index: usize) -> String {
        s.char_indices()
            .map(|(i, c)| {
                if i == index {
                    if c == 'A' {
                        'B'
                    } else {
                        'A'
                    }
                } else {
                    c
                }
            })
            .collect()
    }

    const SECRET_1: &str = "secret1_at_least_32_bytes_long_key!";
    const SECRET_2: &str = "secret2_at_least_32_bytes_long_key!";

    #[test]
    fn test_mint_and_verify() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();
        let claims = claims_at(now);

        let token = codec.mint(&claims).expect("Failed to mint token");
        assert_eq!(token.as_str().split('.').count(), 3);

        let decoded = codec.verify(token.as_str(), now).expect("Failed to verify token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_header_records_algorithm_and_key_id() {
        let codec = codec("k1", SECRET_1);
        let token = codec.mint(&claims_at(Utc::now())).expect("Failed to mint token");

        let header_segment = token.as_str().split('.').next().expect("header segment");
        let header: TokenHeader = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(header_segment).expect("valid base64"),
        )
        .expect("valid header");

        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.kid.as_deref(), Some("k1"));
    }

    #[test]
    fn test_verify_with_wrong_key() {
        let now = Utc::now();
        let token = codec("k1", SECRET_1)
            .mint(&claims_at(now))
            .expect("Failed to mint token");

        let result = codec("k1", SECRET_2).verify(token.as_str(), now);
        assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_tampered_signature() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();
        let token = codec.mint(&claims_at(now)).expect("Failed to mint token");

        let signature_start = token.as_str().rfind('.').expect("delimiter") + 1;
        let tampered = replace_char(token.as_str(), signature_start);

        assert_eq!(
            codec.verify(&tampered, now).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn test_tampered_signature_last_char() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();

        for _ in 0..20 {
            let token = codec.mint(&claims_at(now)).expect("Failed to mint token");
            let (signing_input, signature) =
                token.as_str().rsplit_once('.').expect("delimiter");
            let (kept, last) = signature.split_at(signature.len() - 1);

            for replacement in ["A", "B", "C", "D", "w", "_"] {
                if replacement == last {
                    continue;
                }
                let tampered = format!("{signing_input}.{kept}{replacement}");

                assert_eq!(
                    codec.verify(&tampered, now).unwrap_err(),
                    TokenError::InvalidSignature,
                    "expected InvalidSignature for last char {replacement:?}"
                );
            }
        }
    }

    #[test]
    fn test_signature_outside_alphabet_is_malformed() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();
        let token = codec.mint(&claims_at(now)).expect("Failed to mint token");
        let (signing_input, _) = token.as_str().rsplit_once('.').expect("delimiter");

        assert_eq!(
            codec.verify(&format!("{signing_input}.!!!!"), now).unwrap_err(),
            TokenError::Malformed("signature encoding")
        );
    }

    #[test]
    fn test_tampered_claims() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();
        let token = codec.mint(&claims_at(now)).expect("Failed to mint token");

        let mut forged = claims_at(now);
        forged.subject = "admin".to_string();
        let forged_segment = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let parts: Vec<&str> = token.as_str().split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_segment, parts[2]);

        assert_eq!(
            codec.verify(&tampered, now).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let codec = codec("k1", SECRET_1);
        let issued = Utc::now();
        let claims = claims_at(issued);
        let token = codec.mint(&claims).expect("Failed to mint token");

        let at_expiry = DateTime::from_timestamp(claims.expires_at, 0).unwrap();
        assert!(codec.verify(token.as_str(), at_expiry).is_ok());

        let after_expiry = at_expiry + Duration::seconds(1);
        assert_eq!(
            codec.verify(token.as_str(), after_expiry).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_not_yet_valid_beyond_skew() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();

        let within_skew = codec
            .mint(&claims_at(now + Duration::seconds(30)))
            .expect("Failed to mint token");
        assert!(codec.verify(within_skew.as_str(), now).is_ok());

        let beyond_skew = codec
            .mint(&claims_at(now + Duration::seconds(120)))
            .expect("Failed to mint token");
        assert_eq!(
            codec.verify(beyond_skew.as_str(), now).unwrap_err(),
            TokenError::NotYetValid
        );
    }

    #[test]
    fn test_verify_signature_ignores_expiry() {
        let codec = codec("k1", SECRET_1);
        let long_ago = Utc::now() - Duration::days(30);
        let token = codec.mint(&claims_at(long_ago)).expect("Failed to mint token");

        assert_eq!(
            codec.verify(token.as_str(), Utc::now()).unwrap_err(),
            TokenError::Expired
        );
        assert!(codec.verify_signature(token.as_str()).is_ok());
    }

    #[test]
    fn test_rotated_key_still_verifies() {
        let now = Utc::now();
        let old = codec("old", SECRET_1);
        let token = old.mint(&claims_at(now)).expect("Failed to mint token");

        let rotated = TokenCodec::new(
            SigningKeySet::new(vec![key("new", SECRET_2), key("old", SECRET_1)])
                .expect("valid set"),
        );

        assert!(rotated.verify(token.as_str(), now).is_ok());

        let fresh = rotated.mint(&claims_at(now)).expect("Failed to mint token");
        assert_eq!(
            old.verify(fresh.as_str(), now).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn test_malformed_segment_count() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();

        for token in ["", "abc", "a.b", "a.b.c.d", "..", "a..c"] {
            assert!(
                matches!(codec.verify(token, now), Err(TokenError::Malformed(_))),
                "expected Malformed for {token:?}"
            );
        }
    }

    #[test]
    fn test_malformed_encoding() {
        let codec = codec("k1", SECRET_1);
        let result = codec.verify("invalid.token.here", Utc::now());
        assert!(matches!(result, Err(TokenError::Malformed(_))));

        let result = codec.verify("!!!.???.***", Utc::now());
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_unknown_algorithm_is_malformed() {
        let codec = codec("k1", SECRET_1);
        let now = Utc::now();
        let token = codec.mint(&claims_at(now)).expect("Failed to mint token");
        let parts: Vec<&str> = token.as_str().split('.').collect();

        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{}.{}.{}", none_header, parts[1], parts[2]);

        assert_eq!(
            codec.verify(&forged, now).unwrap_err(),
            TokenError::Malformed("unsupported header")
        );
    }

    #[test]
    fn test_oversized_token_is_malformed() {
        let codec = codec("k1", SECRET_1);
        let huge = "a".repeat(MAX_TOKEN_LENGTH + 1);

        assert_eq!(
            codec.verify(&huge, Utc::now()).unwrap_err(),
            TokenError::Malformed("token length out of bounds")
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let codec = codec("k1", SECRET_1);
        let token = codec.mint(&claims_at(Utc::now())).expect("Failed to mint token");
        assert_eq!(format!("{:?}", token), "Token(<redacted>)");
    }
}
