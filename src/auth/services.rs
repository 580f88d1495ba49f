use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    jwt::TokenError,
    password::{hash_password, verify_password, PasswordError},
    repo_types::User,
};
use crate::{
    db::StoreError,
    error::{AppError, SERVICE_UNAVAILABLE},
    state::AppState,
};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_TOKEN: &str = "Could not validate credentials";

/// Who is calling, as recovered from an optional bearer token.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Authenticated(User),
    Anonymous,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s\x00]+@[^@\s\x00]+\.[^@\s\x00]+$").unwrap();
    }
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> Result<&str, AppError> {
    let email = email.trim();
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

fn password_failure(e: PasswordError) -> AppError {
    if e.is_policy() {
        AppError::BadRequest(e.to_string())
    } else {
        error!(error = %e, "password backend failure");
        AppError::ServiceUnavailable(SERVICE_UNAVAILABLE.into())
    }
}

pub async fn signup(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email)?;
    let hash = hash_password(password).map_err(|e| {
        if e.is_policy() {
            warn!(%email, reason = %e, "signup password rejected");
        }
        password_failure(e)
    })?;

    match state.users.create(email, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(StoreError::Conflict) => {
            warn!(%email, "email already registered");
            Err(AppError::Conflict("Email already registered".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Checks credentials and returns a freshly signed access token.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String, AppError> {
    let email = normalize_email(email)?;

    let user = match state.users.find_by_email(email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Err(e) => return Err(e.into()),
    };

    let ok = verify_password(password, &user.password_hash).map_err(password_failure)?;
    if !ok {
        warn!(%email, user_id = user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.jwt.issue(&user.email).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::ServiceUnavailable(SERVICE_UNAVAILABLE.into())
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(token)
}

/// Authentication is mandatory: an absent token is rejected.
pub async fn resolve_required(state: &AppState, token: Option<&str>) -> Result<User, AppError> {
    match resolve_optional(state, token).await? {
        Identity::Authenticated(user) => Ok(user),
        Identity::Anonymous => Err(AppError::Unauthorized(INVALID_TOKEN.into())),
    }
}

/// No token means anonymous. A token that is present must be valid and
/// refer to an existing user.
pub async fn resolve_optional(state: &AppState, token: Option<&str>) -> Result<Identity, AppError> {
    let Some(token) = token else {
        return Ok(Identity::Anonymous);
    };

    let email = state.jwt.verify(token).map_err(|e: TokenError| {
        warn!(error = %e, "rejected bearer token");
        AppError::Unauthorized(INVALID_TOKEN.into())
    })?;

    match state.users.find_by_email(&email).await? {
        Some(user) => Ok(Identity::Authenticated(user)),
        None => {
            warn!(%email, "token subject no longer exists");
            Err(AppError::Unauthorized(INVALID_TOKEN.into()))
        }
    }
}
