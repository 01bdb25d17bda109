/**
 * Maintenance Credentials
 * Pre-shared token verification for maintenance writes
 */
use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Stored form of the pre-shared token. The plain token is never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenHash {
    /// Lowercase hex SHA-256 digest.
    Sha256(String),
    /// bcrypt hash (`$2a$`, `$2b$`, `$2y$`).
    Bcrypt(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Unrecognised token hash format (expected bcrypt or 64 hex chars)")]
pub struct InvalidTokenHash;

/// Hash a token with SHA-256 and return the lowercase hex digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl TokenHash {
    pub fn from_plain(token: &str) -> Self {
        TokenHash::Sha256(sha256_hex(token))
    }

    pub fn parse(hash: &str) -> Result<Self, InvalidTokenHash> {
        let hash = hash.trim();
        if hash.starts_with("$2") {
            Ok(TokenHash::Bcrypt(hash.to_string()))
        } else if hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(TokenHash::Sha256(hash.to_ascii_lowercase()))
        } else {
            Err(InvalidTokenHash)
        }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match self {
            TokenHash::Sha256(digest) => {
                constant_time_eq(sha256_hex(candidate).as_bytes(), digest.as_bytes())
            }
            TokenHash::Bcrypt(hash) => bcrypt::verify(candidate, hash).unwrap_or(false),
        }
    }

    fn stored(&self) -> &str {
        match self {
            TokenHash::Sha256(s) | TokenHash::Bcrypt(s) => s,
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>` or a bare header value.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim_start();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Checks maintenance write credentials against the configured token hash.
/// With no hash configured every write is refused.
#[derive(Debug, Clone, Default)]
pub struct TokenVerifier {
    hash: Option<TokenHash>,
}

impl TokenVerifier {
    pub fn new(hash: Option<TokenHash>) -> Self {
        Self { hash }
    }

    pub fn from_plain(token: &str) -> Self {
        Self::new(Some(TokenHash::from_plain(token)))
    }

    pub fn is_configured(&self) -> bool {
        self.hash.is_some()
    }

    /// Verify the credential carried by `headers`.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let hash = self.hash.clone().ok_or(ApiError::Unauthorized)?;
        let token = extract_token(headers)
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let valid = match hash {
            // bcrypt is deliberately slow; keep it off the async workers.
            TokenHash::Bcrypt(_) => tokio::task::spawn_blocking(move || hash.verify(&token))
                .await
                .map_err(|e| ApiError::Internal(format!("token verification panicked: {e}")))?,
            TokenHash::Sha256(_) => hash.verify(&token),
        };

        if valid {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Opaque cookie value marking a browser session as the site admin.
    pub fn bypass_marker(&self) -> Option<String> {
        self.hash
            .as_ref()
            .map(|hash| sha256_hex(&format!("maintenance-bypass:{}", hash.stored())))
    }

    pub fn is_bypass_marker(&self, value: &str) -> bool {
        self.bypass_marker()
            .is_some_and(|marker| constant_time_eq(marker.as_bytes(), value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_accepts_bearer_and_bare() {
        let bearer = headers_with("Bearer s3cret");
        assert_eq!(extract_token(&bearer), Some("s3cret"));
        let bare = headers_with("s3cret");
        assert_eq!(extract_token(&bare), Some("s3cret"));
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers_with("Bearer ")), None);
    }

    #[test]
    fn test_parse_recognises_formats() {
        let digest = sha256_hex("token");
        assert_eq!(TokenHash::parse(&digest).unwrap(), TokenHash::Sha256(digest));
        assert!(matches!(
            TokenHash::parse("$2b$04$abcdefghijklmnopqrstuu"),
            Ok(TokenHash::Bcrypt(_))
        ));
        assert!(TokenHash::parse("plaintext").is_err());
    }

    #[test]
    fn test_sha256_verify() {
        let hash = TokenHash::from_plain("s3cret");
        assert!(hash.verify("s3cret"));
        assert!(!hash.verify("s3cret "));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_bcrypt_verify() {
        let hashed = bcrypt::hash("s3cret", 4).unwrap();
        let hash = TokenHash::parse(&hashed).unwrap();
        assert!(hash.verify("s3cret"));
        assert!(!hash.verify("other"));
    }

    #[tokio::test]
    async fn test_authorize_rejects_missing_and_wrong_tokens() {
        let verifier = TokenVerifier::from_plain("s3cret");
        assert!(verifier.authorize(&HeaderMap::new()).await.is_err());
        assert!(verifier.authorize(&headers_with("Bearer nope")).await.is_err());
        assert!(verifier.authorize(&headers_with("Bearer s3cret")).await.is_ok());
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_refuses_everything() {
        let verifier = TokenVerifier::default();
        assert!(!verifier.is_configured());
        assert!(verifier.authorize(&headers_with("Bearer anything")).await.is_err());
        assert!(verifier.bypass_marker().is_none());
    }

    #[test]
    fn test_bypass_marker_round_trip() {
        let verifier = TokenVerifier::from_plain("s3cret");
        let marker = verifier.bypass_marker().unwrap();
        assert!(verifier.is_bypass_marker(&marker));
        assert!(!verifier.is_bypass_marker("forged"));
        assert!(!TokenVerifier::from_plain("other").is_bypass_marker(&marker));
    }
}
