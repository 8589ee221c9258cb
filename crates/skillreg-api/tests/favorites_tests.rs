//! `POST /favorites` / `DELETE /favorites` (§4.10). Same-origin only, and
//! require an authenticated subject.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use skillreg_core::repository::favorite::FavoriteRepository;
use skillreg_types::skill::Visibility;

#[tokio::test]
async fn favoriting_requires_authentication() {
    let app = TestApp::new().await;
    let skill = app.seed_skill("widget-maker", Visibility::Public, None).await;

    let body = serde_json::json!({ "skill_id": skill.id }).to_string();
    let (status, _) = app.request(TestApp::post_json("/favorites", &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_favorite_add_then_remove_round_trips() {
    let app = TestApp::new().await;
    let (user_id, token) = app.seed_token("alice").await;
    let skill = app.seed_skill("widget-maker", Visibility::Public, None).await;

    let body = serde_json::json!({ "skill_id": skill.id }).to_string();
    let req = TestApp::post_json_authed("/favorites", &body, &token);
    let (status, _) = app.request(req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.state.favorites.is_favorited(user_id, skill.id).await.unwrap());

    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri("/favorites")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::from(body))
        .unwrap();
    let (status, _) = app.request(req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(!app.state.favorites.is_favorited(user_id, skill.id).await.unwrap());
}

#[tokio::test]
async fn adding_the_same_favorite_twice_is_idempotent() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_token("alice").await;
    let skill = app.seed_skill("widget-maker", Visibility::Public, None).await;
    let body = serde_json::json!({ "skill_id": skill.id }).to_string();

    for _ in 0..2 {
        let req = TestApp::post_json_authed("/favorites", &body, &token);
        let (status, _) = app.request(req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
