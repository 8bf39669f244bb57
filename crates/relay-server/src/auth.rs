//! Bearer token authentication
//!
//! ```text
//! Authorization: Bearer <token> → IdentityVerifier → AuthenticatedUser
//! ```
//!
//! Handlers that take `AuthenticatedUser` reject with 401 before any body
//! parsing or store access happens.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use relay_core::{Identity, IdentityVerifier};
use serde::Deserialize;

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// HS256 JWT verifier; the `sub` claim is the user ID
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Option<Identity> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(Identity::new(data.claims.sub)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Token rejected: {}", e);
                None
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verified caller, extracted from the `Authorization` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(ApiError::unauthorized)?;
        
        state
            .verifier
            .verify(token)
            .await
            .map(Self)
            .ok_or_else(ApiError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<&'a str>,
    }

    fn config(issuer: Option<&str>) -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            issuer: issuer.map(Into::into),
            audience: None,
        }
    }

    fn token(secret: &str, sub: &str, exp_offset_secs: i64, iss: Option<&str>) -> String {
        let claims = TestClaims {
            sub,
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
            iss,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token() {
        let verifier = JwtVerifier::new(&config(None));
        let identity = verifier.verify(&token("test-secret", "user-1", 3600, None)).await;
        assert_eq!(identity, Some(Identity::new("user-1")));
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let verifier = JwtVerifier::new(&config(None));
        assert_eq!(verifier.verify(&token("other", "user-1", 3600, None)).await, None);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let verifier = JwtVerifier::new(&config(None));
        assert_eq!(verifier.verify(&token("test-secret", "user-1", -3600, None)).await, None);
    }

    #[tokio::test]
    async fn test_issuer_enforced() {
        let verifier = JwtVerifier::new(&config(Some("tier-relay")));
        assert_eq!(verifier.verify(&token("test-secret", "user-1", 3600, None)).await, None);
        assert!(verifier
            .verify(&token("test-secret", "user-1", 3600, Some("tier-relay")))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let verifier = JwtVerifier::new(&config(None));
        assert_eq!(verifier.verify("not.a.jwt").await, None);
    }
}
