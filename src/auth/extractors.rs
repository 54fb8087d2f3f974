use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::TokenKind,
    jwt::{JwtKeys, TokenError},
    repo_types::User,
};
use crate::{error::ApiError, state::AppState};

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = keys
            .verify(token, TokenKind::Access)
            .map_err(|e| match e {
                TokenError::WrongKind { .. } => {
                    ApiError::Unauthorized("Access token required".into())
                }
                TokenError::Invalid(err) => {
                    warn!(error = %err, "invalid or expired token");
                    ApiError::Unauthorized("Token is not valid".into())
                }
            })?;

        Ok(AuthUser(claims.sub))
    }
}

/// An authenticated caller whose stored `is_admin` flag is true at request time.
pub struct AdminUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        match User::admin_flag(&state.db, user_id).await? {
            Some(true) => Ok(AdminUser(user_id)),
            _ => {
                warn!(%user_id, "non-admin caller on admin route");
                Err(ApiError::Forbidden)
            }
        }
    }
}
