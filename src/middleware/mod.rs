use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{AuthUser, Role};

/// Claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

pub fn issue_token(user: &AuthUser, secret: &str, ttl_hours: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user.user_id.to_string(),
        role: user.role,
        exp: (now + chrono::Duration::hours(ttl_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::Unauthorized("invalid or expired token".to_string())
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("token subject is not a user id".to_string()))?;

    Ok(AuthUser::new(user_id, data.claims.role))
}

// Bearer JWT extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

        verify_token(token, &state.config.jwt.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let user = AuthUser::new(42, Role::Owner);
        let token = issue_token(&user, "secret", 1).unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap(), user);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_token(&AuthUser::new(1, Role::Customer), "secret", 1).unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let token = issue_token(&AuthUser::new(1, Role::Customer), "secret", -2).unwrap();
        assert!(matches!(verify_token(&token, "secret"), Err(AppError::Unauthorized(_))));
    }
}
