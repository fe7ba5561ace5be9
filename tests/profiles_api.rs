//! End-to-end tests for the profile and like API.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{create_profile, register_and_login, request, spawn_app, TestApp};
use vibes_backend::store::Store;

/// Register, log in and create a profile in one go.
async fn user_with_profile(app: &TestApp, email: &str) -> (Uuid, String, Uuid) {
    let (user_id, token) = register_and_login(app, email).await;
    let profile_id = create_profile(app, &token, json!({})).await;
    (user_id, token, profile_id)
}

#[tokio::test]
async fn anonymous_access_is_rejected() {
    let app = spawn_app();

    for uri in ["/profiles/me", "/profiles/top-liked"] {
        let (status, _) = request(&app.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "expected 401 for {uri}");
    }
}

#[tokio::test]
async fn create_then_retrieve_profile() {
    let app = spawn_app();
    let (_, token) = register_and_login(&app, "u1@example.com").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/profiles",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "single");
    assert_eq!(body["data"]["like_count"], 0);

    let (status, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "single");
    assert_eq!(body["data"]["like_count"], 0);
}

#[tokio::test]
async fn second_profile_is_rejected() {
    let app = spawn_app();
    let (_, token, _) = user_with_profile(&app, "u1@example.com").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/profiles",
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You already have a profile.");

    // Still exactly one profile behind the "me" endpoint.
    let (status, _) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_profile_fields() {
    let app = spawn_app();
    let (_, token, _) = user_with_profile(&app, "u1@example.com").await;

    let (status, body) = request(
        &app.router,
        Method::PATCH,
        "/profiles/me",
        Some(&token),
        Some(json!({"status": "married", "image": "uploads/profile/u1.jpg"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "married");
    assert_eq!(body["data"]["image"], "uploads/profile/u1.jpg");
}

#[tokio::test]
async fn delete_profile_then_404() {
    let app = spawn_app();
    let (_, token, _) = user_with_profile(&app, "u1@example.com").await;

    let (status, _) = request(
        &app.router,
        Method::DELETE,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn like_toggles_target_count() {
    let app = spawn_app();
    let (_, u1_token, _) = user_with_profile(&app, "u1@example.com").await;
    let (_, u2_token, u2_profile) = user_with_profile(&app, "u2@example.com").await;

    // Like: the target's own view shows the bumped count.
    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/profiles/{u2_profile}/like"),
        Some(&u1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile liked!");

    let (_, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&u2_token),
        None,
    )
    .await;
    assert_eq!(body["data"]["like_count"], 1);

    // Toggle again: unliked, count back to zero.
    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/profiles/{u2_profile}/like"),
        Some(&u1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile unliked!");

    let (_, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&u2_token),
        None,
    )
    .await;
    assert_eq!(body["data"]["like_count"], 0);
}

#[tokio::test]
async fn self_like_is_rejected() {
    let app = spawn_app();
    let (_, token, profile_id) = user_with_profile(&app, "u1@example.com").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/profiles/{profile_id}/like"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot like your own profile.");

    let (_, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["like_count"], 0);
}

#[tokio::test]
async fn liking_unknown_profile_is_404() {
    let app = spawn_app();
    let (_, token, _) = user_with_profile(&app, "u1@example.com").await;

    let (status, _) = request(
        &app.router,
        Method::POST,
        &format!("/profiles/{}/like", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_liked_is_empty_without_payment() {
    let app = spawn_app();
    let (_, u1_token, _) = user_with_profile(&app, "u1@example.com").await;
    let (_, _, u2_profile) = user_with_profile(&app, "u2@example.com").await;
    let (_, _, u3_profile) = user_with_profile(&app, "u3@example.com").await;

    for target in [u2_profile, u3_profile] {
        let (status, _) = request(
            &app.router,
            Method::POST,
            &format!("/profiles/{target}/like"),
            Some(&u1_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = request(
        &app.router,
        Method::GET,
        "/profiles/top-liked",
        Some(&u1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn top_liked_sorts_by_like_count_when_paid() {
    let app = spawn_app();
    let (u1_id, u1_token, _) = user_with_profile(&app, "u1@example.com").await;
    let (_, _, u2_profile) = user_with_profile(&app, "u2@example.com").await;
    let (_, _, u3_profile) = user_with_profile(&app, "u3@example.com").await;

    // U1 likes both; two bystanders push U2's count above U3's.
    for target in [u2_profile, u3_profile] {
        request(
            &app.router,
            Method::POST,
            &format!("/profiles/{target}/like"),
            Some(&u1_token),
            None,
        )
        .await;
    }
    for email in ["fan1@example.com", "fan2@example.com"] {
        let (_, fan_token, _) = user_with_profile(&app, email).await;
        request(
            &app.router,
            Method::POST,
            &format!("/profiles/{u2_profile}/like"),
            Some(&fan_token),
            None,
        )
        .await;
    }

    app.store.set_paid(u1_id, true).await.unwrap();

    let (status, body) = request(
        &app.router,
        Method::GET,
        "/profiles/top-liked",
        Some(&u1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], u2_profile.to_string());
    assert_eq!(entries[0]["like_count"], 3);
    assert_eq!(entries[1]["id"], u3_profile.to_string());
    assert_eq!(entries[1]["like_count"], 1);
}

#[tokio::test]
async fn top_liked_truncates_to_five() {
    let app = spawn_app();
    let (u1_id, u1_token, _) = user_with_profile(&app, "u1@example.com").await;
    app.store.set_paid(u1_id, true).await.unwrap();

    for i in 0..7 {
        let (_, _, target) = user_with_profile(&app, &format!("t{i}@example.com")).await;
        request(
            &app.router,
            Method::POST,
            &format!("/profiles/{target}/like"),
            Some(&u1_token),
            None,
        )
        .await;
    }

    let (status, body) = request(
        &app.router,
        Method::GET,
        "/profiles/top-liked",
        Some(&u1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn number_is_hidden_until_paid() {
    let app = spawn_app();
    let (user_id, token) = register_and_login(&app, "u1@example.com").await;
    create_profile(&app, &token, json!({"number": "07000000000"})).await;

    let (_, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    let object = body["data"].as_object().unwrap();
    assert!(!object.contains_key("number"));

    app.store.set_paid(user_id, true).await.unwrap();

    let (_, body) = request(
        &app.router,
        Method::GET,
        "/profiles/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["number"], "07000000000");
}
