pub mod health;
pub mod profiles;
pub mod users;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/users", post(users::register))
        .route("/users/token", post(users::create_token))
        // Authenticated account management
        .route("/users/me", get(users::get_me).patch(users::update_me))
        // Profiles
        .route("/profiles", post(profiles::create_profile))
        .route(
            "/profiles/me",
            get(profiles::get_my_profile)
                .patch(profiles::update_my_profile)
                .delete(profiles::delete_my_profile),
        )
        .route("/profiles/top-liked", get(profiles::top_liked))
        .route("/profiles/:profile_id/like", post(profiles::like_profile))
}
