//! JWT token handling for studio members
//!
//! Tokens are compact HS512 JWS strings carrying `{sub, iat, exp}` where the
//! subject is the member's login name (email). Verification collapses every
//! failure (malformed, bad signature, expired, unsupported algorithm) into a
//! single `false`; the category is only written to the log.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::auth::Principal;
use crate::types::StudioError;

/// Prefix required in the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Minimum accepted signing secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Default validity window: one day
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login name (email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signs and verifies bearer tokens with a single server-wide key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("validity", &self.validity)
            .finish()
    }
}

impl TokenCodec {
    /// Create a new codec
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str, validity: Duration) -> Result<Self, StudioError> {
        if secret.is_empty() {
            return Err(StudioError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(StudioError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self::from_secret(secret.as_bytes(), validity))
    }

    /// Create a codec for dev mode, signing with a built-in secret
    pub fn new_dev(validity: Duration) -> Self {
        Self::from_secret(b"dev-mode-secret-not-for-production-use-123456", validity)
    }

    fn from_secret(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity,
        }
    }

    /// Configured validity window
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a signed token for an authenticated principal
    pub fn issue(&self, principal: &Principal) -> Result<String, StudioError> {
        let now = now_secs()?;

        let claims = Claims {
            sub: principal.username.clone(),
            iat: now,
            exp: now + self.validity.as_secs(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| StudioError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Check that a token is well-formed, correctly signed and not expired.
    ///
    /// Never fails; every problem is logged and reported as `false`.
    pub fn verify(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            warn!("JWT token is missing");
            return false;
        };
        if token.is_empty() {
            warn!("JWT claims string is empty");
            return false;
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(err) => {
                warn!("{}", failure_category(err.kind()));
                return false;
            }
        };

        match now_secs() {
            Ok(now) if claims.exp > now => true,
            Ok(_) => {
                warn!("JWT token is expired");
                false
            }
            Err(e) => {
                warn!("Cannot check JWT expiration: {}", e);
                false
            }
        }
    }

    /// Read the subject of a correctly signed token.
    ///
    /// Expiration is not checked here; callers run [`TokenCodec::verify`] first.
    pub fn subject_of(&self, token: &str) -> Result<String, StudioError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims.sub)
    }
}

fn failure_category(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidSignature => "Invalid JWT signature",
        ErrorKind::ExpiredSignature => "JWT token is expired",
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            "JWT token is unsupported"
        }
        _ => "Invalid JWT token",
    }
}

fn now_secs() -> Result<u64, StudioError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| StudioError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
///
/// Only the exact `"Bearer "` prefix is accepted; anything else means no token.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    auth_header?.strip_prefix(BEARER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn test_codec() -> TokenCodec {
        TokenCodec::new(SECRET, DEFAULT_VALIDITY).unwrap()
    }

    fn member() -> Principal {
        Principal {
            id: 1,
            username: "yoga@studio.com".into(),
            first_name: "Admin".into(),
            last_name: "Admin".into(),
            admin: true,
        }
    }

    fn sign(claims: &Claims, algorithm: Algorithm) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = test_codec();

        let token = codec.issue(&member()).unwrap();
        assert!(!token.is_empty());
        assert!(codec.verify(Some(&token)));
        assert_eq!(codec.subject_of(&token).unwrap(), "yoga@studio.com");
    }

    #[test]
    fn test_issued_token_carries_validity_window() {
        let codec = TokenCodec::new(SECRET, Duration::from_secs(600)).unwrap();
        let token = codec.issue(&member()).unwrap();

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        let claims = decode::<Claims>(&token, &codec.decoding_key, &validation)
            .unwrap()
            .claims;
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_rejects_missing_and_malformed_tokens() {
        let codec = test_codec();

        assert!(!codec.verify(None));
        assert!(!codec.verify(Some("")));
        assert!(!codec.verify(Some("not.a.jwt")));
        assert!(!codec.verify(Some("invalid-token")));
    }

    #[test]
    fn test_wrong_secret() {
        let other =
            TokenCodec::new("different-secret-that-is-at-least-32-characters", DEFAULT_VALIDITY)
                .unwrap();

        let token = test_codec().issue(&member()).unwrap();
        assert!(!other.verify(Some(&token)));
        assert!(other.subject_of(&token).is_err());
    }

    #[test]
    fn test_any_mutation_invalidates_token() {
        let codec = test_codec();
        let token = codec.issue(&member()).unwrap();

        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = String::with_capacity(token.len());
            tampered.push_str(&token[..i]);
            tampered.push(replacement);
            tampered.push_str(&token[i + c.len_utf8()..]);

            assert!(
                !codec.verify(Some(&tampered)),
                "mutation at position {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = test_codec();
        let now = now_secs().unwrap();

        let expired = sign(
            &Claims {
                sub: "yoga@studio.com".into(),
                iat: now - 7200,
                exp: now - 3600,
            },
            ALGORITHM,
        );
        assert!(!codec.verify(Some(&expired)));

        // Subject stays readable for an expired but authentic token
        assert_eq!(codec.subject_of(&expired).unwrap(), "yoga@studio.com");
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let codec = test_codec();
        let now = now_secs().unwrap();

        let token = sign(
            &Claims {
                sub: "yoga@studio.com".into(),
                iat: now - 10,
                exp: now,
            },
            ALGORITHM,
        );
        assert!(!codec.verify(Some(&token)));
    }

    #[test]
    fn test_unsupported_algorithm_is_rejected() {
        let codec = test_codec();
        let now = now_secs().unwrap();

        let token = sign(
            &Claims {
                sub: "yoga@studio.com".into(),
                iat: now,
                exp: now + 3600,
            },
            Algorithm::HS256,
        );
        assert!(!codec.verify(Some(&token)));
    }

    #[test]
    fn test_successive_tokens_are_independently_valid() {
        let codec = test_codec();

        let first = codec.issue(&member()).unwrap();
        let second = codec.issue(&member()).unwrap();
        assert!(codec.verify(Some(&first)));
        assert!(codec.verify(Some(&second)));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("Bearer ")), Some(""));

        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("abc123")), None);
        assert_eq!(extract_token_from_header(Some("Malformed xyz")), None);
        assert_eq!(extract_token_from_header(Some("bearer abc123")), None);
        assert_eq!(extract_token_from_header(Some("Bearer")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(TokenCodec::new("short", DEFAULT_VALIDITY).is_err());
        assert!(TokenCodec::new("", DEFAULT_VALIDITY).is_err());
        assert!(TokenCodec::new("this-secret-is-at-least-32-chars-long", DEFAULT_VALIDITY).is_ok());
    }

    #[test]
    fn test_dev_mode_codec() {
        let codec = TokenCodec::new_dev(Duration::from_secs(60));

        let token = codec.issue(&member()).unwrap();
        assert!(codec.verify(Some(&token)));
        assert_eq!(codec.validity(), Duration::from_secs(60));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", test_codec());
        assert!(!rendered.contains(SECRET));
    }
}
