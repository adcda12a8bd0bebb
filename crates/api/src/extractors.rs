//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use cyberguard_common::AppError;
use cyberguard_db::entities::user;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Authenticated official extractor. Citizens get 403.
#[derive(Debug, Clone)]
pub struct OfficialUser(pub user::Model);

impl<S> FromRequestParts<S> for OfficialUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.is_official() {
            Ok(Self(user))
        } else {
            Err(AppError::Forbidden("Officials only".to_string()))
        }
    }
}

/// Bearer token of the current request, if any.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| Self(token.trim().to_string()))
            .filter(|token| !token.0.is_empty())
            .ok_or(AppError::Unauthorized)
    }
}
