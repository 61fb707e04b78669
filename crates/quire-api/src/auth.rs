//! Bearer JWT authentication.
//!
//! Tokens are HS256 JWTs minted by the identity provider. The verified
//! subject becomes an [`AuthUser`] request extension that handlers extract.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use quire_core::defaults;

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::AppState;

pub const TOKEN_REFRESH_NEEDED_HEADER: &str = "x-token-refresh-needed";
pub const TOKEN_EXPIRES_IN_HEADER: &str = "x-token-expires-in";

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    /// Token expiry, unix seconds.
    pub expires_at: i64,
}

impl AuthUser {
    pub fn expires_in(&self) -> i64 {
        self.expires_at - Utc::now().timestamp()
    }
}

/// Verifies identity-provider tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(subsystem = "api", component = "auth", error = %e, "Token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::token_expired(),
                _ => ApiError::invalid_token("Invalid token"),
            }
        })?;

        let id = data
            .claims
            .sub
            .as_deref()
            .and_then(|sub| Uuid::parse_str(sub).ok())
            .ok_or_else(|| ApiError::invalid_token("Invalid token payload - missing user ID"))?;

        Ok(AuthUser {
            id,
            email: data.claims.email,
            expires_at: data.claims.exp,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::unauthorized(
            "Missing or invalid authorization header",
        )),
    }
}

/// Middleware: reject unauthenticated requests, attach [`AuthUser`] and
/// add refresh hints when the token is close to expiry.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.auth.verify(bearer_token(request.headers())?)?;
    let expires_in = user.expires_in();
    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;

    if expires_in < defaults::TOKEN_REFRESH_WINDOW_SECS {
        let headers = response.headers_mut();
        headers.insert(
            TOKEN_REFRESH_NEEDED_HEADER,
            HeaderValue::from_static("true"),
        );
        if let Ok(value) = HeaderValue::from_str(&expires_in.max(0).to_string()) {
            headers.insert(TOKEN_EXPIRES_IN_HEADER, value);
        }
    }

    Ok(response)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn verifier(issuer: Option<&str>) -> JwtVerifier {
        JwtVerifier::new(&JwtConfig {
            secret: SECRET.to_string(),
            audience: "authenticated".to_string(),
            issuer: issuer.map(String::from),
        })
    }

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn in_secs(secs: i64) -> i64 {
        Utc::now().timestamp() + secs
    }

    #[test]
    fn test_valid_token() {
        let id = Uuid::new_v4();
        let t = token(json!({
            "sub": id.to_string(),
            "aud": "authenticated",
            "exp": in_secs(3600),
            "email": "ada@example.com"
        }));
        let user = verifier(None).verify(&t).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert!(user.expires_in() > 3500);
    }

    #[test]
    fn test_expired_token() {
        let t = token(json!({
            "sub": Uuid::new_v4().to_string(),
            "aud": "authenticated",
            "exp": in_secs(-60)
        }));
        let err = verifier(None).verify(&t).unwrap_err();
        assert_eq!(err.code(), "TOKEN_EXPIRED");
    }

    #[test]
    fn test_missing_sub_is_invalid() {
        let t = token(json!({ "aud": "authenticated", "exp": in_secs(3600) }));
        let err = verifier(None).verify(&t).unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_non_uuid_sub_is_invalid() {
        let t = token(json!({
            "sub": "not-a-uuid",
            "aud": "authenticated",
            "exp": in_secs(3600)
        }));
        assert_eq!(verifier(None).verify(&t).unwrap_err().code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_wrong_audience_is_invalid() {
        let t = token(json!({
            "sub": Uuid::new_v4().to_string(),
            "aud": "anon",
            "exp": in_secs(3600)
        }));
        assert_eq!(verifier(None).verify(&t).unwrap_err().code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_issuer_enforced_when_configured() {
        let claims = |iss: &str| {
            token(json!({
                "sub": Uuid::new_v4().to_string(),
                "aud": "authenticated",
                "iss": iss,
                "exp": in_secs(3600)
            }))
        };
        let v = verifier(Some("https://id.example.com"));
        assert!(v.verify(&claims("https://id.example.com")).is_ok());
        assert_eq!(
            v.verify(&claims("https://evil.example.com")).unwrap_err().code(),
            "INVALID_TOKEN"
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let t = encode(
            &Header::default(),
            &json!({
                "sub": Uuid::new_v4().to_string(),
                "aud": "authenticated",
                "exp": in_secs(3600)
            }),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();
        assert_eq!(verifier(None).verify(&t).unwrap_err().code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers).unwrap_err().code(), "UNAUTHORIZED");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers).unwrap_err().code(), "UNAUTHORIZED");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }
}
