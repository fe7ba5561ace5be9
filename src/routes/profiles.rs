//! Profile routes
//!
//! Owner-scoped profile management plus the like toggle and the
//! payment-gated top-liked listing. Responses go through the gated
//! projection in `domain::profiles`, which drops the contact number
//! for unpaid profiles.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse, MessageResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::profiles::{
    CreateProfileRequest, Profile, ProfileResponse, UpdateProfileRequest, TOP_LIKED_LIMIT,
};
use crate::error::{ApiError, ApiResult};
use crate::store::{NewProfile, ProfileChanges, StoreError};

async fn own_profile(state: &AppState, user_id: Uuid) -> ApiResult<Profile> {
    state
        .store
        .find_profile_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("You do not have a profile yet."))
}

/// POST /profiles
///
/// Create the authenticated user's profile. Each user gets exactly one;
/// a second attempt is rejected.
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateProfileRequest>,
) -> ApiResult<Created<DataResponse<ProfileResponse>>> {
    let profile = state
        .store
        .create_profile(
            auth.user_id,
            NewProfile {
                status: req.status.unwrap_or_default(),
                number: req.number,
                image: req.image,
            },
        )
        .await?;

    tracing::info!(user_id = %auth.user_id, profile_id = %profile.id, "Profile created");

    Ok(Created(DataResponse::new((&profile).into())))
}

/// GET /profiles/me
///
/// Get the current user's profile.
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> ApiResult<DataResponse<ProfileResponse>> {
    let profile = own_profile(&state, auth.user_id).await?;

    Ok(DataResponse::new((&profile).into()))
}

/// PATCH /profiles/me
///
/// Update the current user's profile. Only status, number and image are
/// writable; the like counter and payment flag are not.
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<DataResponse<ProfileResponse>> {
    let profile = state
        .store
        .update_profile(
            auth.user_id,
            ProfileChanges {
                status: req.status,
                number: req.number,
                image: req.image,
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found("You do not have a profile yet."),
            other => other.into(),
        })?;

    Ok(DataResponse::new((&profile).into()))
}

/// DELETE /profiles/me
///
/// Delete the current user's profile, cascading its like memberships.
pub async fn delete_my_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> ApiResult<NoContent> {
    state
        .store
        .delete_profile(auth.user_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found("You do not have a profile yet."),
            other => other.into(),
        })?;

    tracing::info!(user_id = %auth.user_id, "Profile deleted");

    Ok(NoContent)
}

/// POST /profiles/:profile_id/like
///
/// Toggle a like on the target profile. Liking your own profile is
/// rejected before the store is touched.
pub async fn like_profile(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<MessageResponse> {
    let own = own_profile(&state, auth.user_id).await?;

    let target = state
        .store
        .find_profile_by_id(profile_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found."))?;

    if own.id == target.id {
        return Err(ApiError::bad_request("You cannot like your own profile."));
    }

    let outcome = state.store.toggle_like(own.id, target.id).await?;

    tracing::info!(
        liker = %own.id,
        target = %target.id,
        outcome = ?outcome,
        "Like toggled"
    );

    Ok(MessageResponse::new(outcome.message()))
}

/// GET /profiles/top-liked
///
/// The top profiles the current user has liked, by like count. Gated on
/// the requester's payment flag: unpaid users get an empty list without
/// the relation ever being consulted.
pub async fn top_liked(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> ApiResult<DataResponse<Vec<ProfileResponse>>> {
    let own = own_profile(&state, auth.user_id).await?;

    if !own.is_paid {
        return Ok(DataResponse::new(Vec::new()));
    }

    let liked = state.store.top_liked(own.id, TOP_LIKED_LIMIT).await?;

    Ok(DataResponse::new(liked.iter().map(Into::into).collect()))
}
