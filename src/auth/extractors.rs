use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{
    repo_types::User,
    services::{resolve_optional, resolve_required, Identity, INVALID_TOKEN},
};
use crate::{error::AppError, state::AppState};

/// Pulls the token out of `Authorization: Bearer <token>`.
/// A missing header is `None`; a present but unusable header is an error.
pub(crate) fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let unauthorized = || AppError::Unauthorized(INVALID_TOKEN.into());

    let header = value.to_str().map_err(|_| {
        warn!("non-ascii Authorization header");
        unauthorized()
    })?;
    let (scheme, token) = header.trim().split_once(' ').ok_or_else(|| {
        warn!("malformed Authorization header");
        unauthorized()
    })?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        warn!(%scheme, "unsupported auth scheme");
        return Err(unauthorized());
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(unauthorized());
    }
    Ok(Some(token))
}

/// Requires a valid bearer token for an existing user.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        resolve_required(state, token).await.map(CurrentUser)
    }
}

/// Accepts anonymous callers; a token that is sent must still be valid.
pub struct MaybeUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        resolve_optional(state, token).await.map(MaybeUser)
    }
}
