//! User account routes
//!
//! Registration, token issuing and management of the authenticated
//! account. Only the caller's own record is ever reachable here.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::RequireAuth;
use crate::domain::users::{
    RegisterRequest, TokenRequest, TokenResponse, UpdateUserRequest, UserResponse,
    MIN_PASSWORD_LEN,
};
use crate::error::{ApiError, ApiResult};
use crate::store::{NewUser, UserChanges};

const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

fn validate_email(email: &str) -> ApiResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("Enter a valid email address."));
    }
    Ok(())
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Ensure the password has at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// POST /users
///
/// Register a new account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Created<DataResponse<UserResponse>>> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email: req.email.trim().to_string(),
            name: req.name,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Created(DataResponse::new(user.into())))
}

/// POST /users/token
///
/// Exchange credentials for an access token.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .store
        .find_user_by_email(req.email.trim())
        .await?
        .filter(|u| u.is_active)
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    tracing::debug!(user_id = %user.id, "Access token issued");

    Ok(Json(TokenResponse { token }))
}

/// GET /users/me
///
/// Account info for the authenticated user.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> ApiResult<DataResponse<UserResponse>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    Ok(DataResponse::new(user.into()))
}

/// PATCH /users/me
///
/// Update the authenticated user's account. A provided password is
/// re-hashed before it is stored.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<DataResponse<UserResponse>> {
    if let Some(email) = &req.email {
        validate_email(email)?;
    }

    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = state
        .store
        .update_user(
            auth.user_id,
            UserChanges {
                email: req.email.map(|e| e.trim().to_string()),
                name: req.name,
                password_hash,
            },
        )
        .await?;

    Ok(DataResponse::new(user.into()))
}
