//! `GET /registry/skill/{owner}/{name}`, the legacy `GET
//! /registry/skill/{identifier}`, and `GET /skills/{slug}/download` (§6).

mod common;

use axum::http::StatusCode;
use common::TestApp;
use skillreg_types::skill::Visibility;

#[tokio::test]
async fn detail_by_owner_and_name_returns_public_skill() {
    let app = TestApp::new().await;
    app.seed_skill("widget-maker", Visibility::Public, None).await;

    let (status, body) = app.request(TestApp::get("/registry/skill/acme/widget-maker")).await;
    assert_eq!(status, StatusCode::OK);

    let parsed: serde_json::Value = TestApp::parse_json(&body);
    assert_eq!(parsed["name"], "widget-maker");
    assert!(parsed["content"].as_str().unwrap().contains("Body for widget-maker"));
}

#[tokio::test]
async fn detail_by_legacy_identifier_resolves_slug() {
    let app = TestApp::new().await;
    app.seed_skill("widget-maker", Visibility::Public, None).await;

    let (status, body) = app.request(TestApp::get("/registry/skill/widget-maker")).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = TestApp::parse_json(&body);
    assert_eq!(parsed["name"], "widget-maker");
}

#[tokio::test]
async fn detail_by_legacy_at_shorthand_resolves_coordinate() {
    let app = TestApp::new().await;
    app.seed_skill("widget-maker", Visibility::Public, None).await;

    let (status, body) = app.request(TestApp::get("/registry/skill/@acme/widget-maker")).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = TestApp::parse_json(&body);
    assert_eq!(parsed["name"], "widget-maker");
}

#[tokio::test]
async fn private_skill_is_not_found_for_anonymous_caller() {
    let app = TestApp::new().await;
    let (owner_id, _) = app.seed_token("owner").await;
    app.seed_skill("secret-tool", Visibility::Private, Some(owner_id)).await;

    let (status, _) = app.request(TestApp::get("/registry/skill/acme/secret-tool")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_skill_is_visible_to_its_owner() {
    let app = TestApp::new().await;
    let (owner_id, token) = app.seed_token("owner").await;
    app.seed_skill("secret-tool", Visibility::Private, Some(owner_id)).await;

    let req = TestApp::get_authed("/registry/skill/secret-tool", &token);
    let (status, body) = app.request(req).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = TestApp::parse_json(&body);
    assert_eq!(parsed["name"], "secret-tool");
}

#[tokio::test]
async fn unknown_skill_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.request(TestApp::get("/registry/skill/acme/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_public_skill_returns_a_zip_archive() {
    let app = TestApp::new().await;
    app.seed_skill("widget-maker", Visibility::Public, None).await;

    let (status, body) = app.request(TestApp::get("/skills/widget-maker/download")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[0..4], &0x0403_4b50u32.to_le_bytes());
}

#[tokio::test]
async fn download_private_skill_requires_a_token() {
    let app = TestApp::new().await;
    let (owner_id, _) = app.seed_token("owner").await;
    app.seed_skill("secret-tool", Visibility::Private, Some(owner_id)).await;

    let (status, _) = app.request(TestApp::get("/skills/secret-tool/download")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_private_skill_succeeds_for_owner_token() {
    let app = TestApp::new().await;
    let (owner_id, token) = app.seed_token("owner").await;
    app.seed_skill("secret-tool", Visibility::Private, Some(owner_id)).await;

    let req = TestApp::get_authed("/skills/secret-tool/download", &token);
    let (status, body) = app.request(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[0..4], &0x0403_4b50u32.to_le_bytes());
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected_even_for_public_skill() {
    let app = TestApp::new().await;
    app.seed_skill("widget-maker", Visibility::Public, None).await;

    let req = TestApp::get_authed("/registry/skill/acme/widget-maker", "not-a-real-token");
    let (status, _) = app.request(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
