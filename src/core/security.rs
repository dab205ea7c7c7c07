//! Signed security tokens
//!
//! Tokens are HS256 JWTs carrying an arbitrary JSON payload (`info`) and an
//! expiry. The security middleware parses them and stores the payload as a
//! [`TokenInfo`] request extension.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::ScaffoldError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub info: Value,
    pub exp: i64,
}

/// A generated token and its expiry (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub expires_at: i64,
}

/// Resources that can be turned into a token (e.g. a user)
pub trait TokenSubject {
    /// Payload embedded in the token
    fn token_information(&self) -> Value;
}

/// Token payload of an authenticated request
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo(pub Value);

/// Creates and verifies tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Generate a token for a subject, valid for `ttl`
    pub fn generate_token(
        &self,
        subject: &dyn TokenSubject,
        ttl: Duration,
    ) -> Result<Token, ScaffoldError> {
        let expires_at = (Utc::now() + ttl).timestamp();
        let claims = Claims {
            info: subject.token_information(),
            exp: expires_at,
        };

        let value = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ScaffoldError::Internal(format!("token signing failed: {}", e)))?;

        Ok(Token { value, expires_at })
    }

    /// Verify a token and return its payload
    pub fn parse_token(&self, token: &str) -> Result<Value, ScaffoldError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims.info)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                ScaffoldError::Unauthorized {
                    message: "Authorization token is invalid".to_string(),
                }
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenService")
    }
}

/// Raw token of a request: the named cookie when present, otherwise the
/// `Authorization` header without its `Bearer ` prefix
pub fn extract_token(headers: &HeaderMap, cookie_name: Option<&str>) -> Option<String> {
    if let Some(name) = cookie_name.filter(|n| !n.is_empty()) {
        let from_cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string());
        if from_cookie.is_some() {
            return from_cookie;
        }
    }

    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    if header.is_empty() {
        return None;
    }
    Some(header.replacen("Bearer ", "", 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    struct User {
        email: String,
    }

    impl TokenSubject for User {
        fn token_information(&self) -> Value {
            json!({"email": self.email})
        }
    }

    #[test]
    fn test_generate_and_parse() {
        let service = TokenService::new("test_secret_key");
        let user = User {
            email: "ada@example.com".to_string(),
        };

        let token = service.generate_token(&user, Duration::hours(1)).unwrap();
        let info = service.parse_token(&token.value).unwrap();
        assert_eq!(info, json!({"email": "ada@example.com"}));

        let remaining = token.expires_at - Utc::now().timestamp();
        assert!(remaining > 3500 && remaining <= 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user = User {
            email: "ada@example.com".to_string(),
        };
        let token = TokenService::new("one")
            .generate_token(&user, Duration::hours(1))
            .unwrap();

        let result = TokenService::new("two").parse_token(&token.value);
        assert!(matches!(result, Err(ScaffoldError::Unauthorized { .. })));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new("test_secret_key");
        let user = User {
            email: "ada@example.com".to_string(),
        };
        let token = service.generate_token(&user, Duration::hours(-2)).unwrap();

        assert!(service.parse_token(&token.value).is_err());
    }

    #[test]
    fn test_extract_from_cookie_first() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(
            extract_token(&headers, Some("session")),
            Some("abc".to_string())
        );
        assert_eq!(extract_token(&headers, None), Some("xyz".to_string()));
    }

    #[test]
    fn test_extract_falls_back_to_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(
            extract_token(&headers, Some("session")),
            Some("xyz".to_string())
        );

        assert_eq!(extract_token(&HeaderMap::new(), Some("session")), None);
    }
}
