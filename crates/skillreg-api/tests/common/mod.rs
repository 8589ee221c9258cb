//! Shared fixtures for the `skregd` HTTP integration tests: a throwaway
//! SQLite db + filesystem object store, one seeded skill, and a thin
//! request/response helper around `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use skillreg_core::repository::account::UserAccountRepository;
use skillreg_core::repository::auth::AuthRepository;
use skillreg_core::repository::object_store::ObjectStore;
use skillreg_core::repository::skill::SkillRepository;
use skillreg_types::auth::{ApiToken, TokenScope};
use skillreg_types::skill::{Skill, SourceType, Tier, Visibility};
use skillreg_types::user::UserAccount;
use tower::ServiceExt;
use uuid::Uuid;

use skillreg_api::http::router::build_router;
use skillreg_api::state::AppState;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        // Leak the directory so it outlives the test; the OS reclaims it on
        // process exit, same trade-off `DatabasePool`'s own tests make.
        let data_dir = dir.path().to_path_buf();
        std::mem::forget(dir);

        let state = AppState::init_at(data_dir).await.expect("init test state");
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn request(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(req).await.expect("router call");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("read body").to_vec();
        (status, body)
    }

    /// Like [`Self::request`] but returns the raw response so callers can
    /// inspect headers (CORS, rate-limit) instead of just status + body.
    pub async fn request_raw(&self, req: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(req).await.expect("router call")
    }

    pub fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> T {
        serde_json::from_slice(body).expect("parse json response")
    }

    pub fn get(path: &str) -> Request<Body> {
        Request::builder().method("GET").uri(path).body(Body::empty()).unwrap()
    }

    pub fn get_authed(path: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(path)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    pub fn post_json(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn post_json_authed(path: &str, body: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Inserts a skill row plus its `SKILL.md` body in the object store,
    /// returning the skill so callers can read back its id/slug.
    pub async fn seed_skill(&self, slug: &str, visibility: Visibility, owner_id: Option<Uuid>) -> Skill {
        let now = Utc::now();
        let content = format!("---\nname: {slug}\ndescription: a test skill\n---\nBody for {slug}.\n");
        let content_hash = skillreg_infra::crypto::hash::content_hash(content.as_bytes());

        let skill = Skill {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: "a test skill".to_string(),
            repo_owner: "acme".to_string(),
            repo_name: slug.to_string(),
            skill_path: String::new(),
            github_url: format!("https://github.com/acme/{slug}"),
            stars: 10,
            forks: 1,
            trending_score: 1.0,
            indexed_at: now,
            updated_at: now,
            last_commit_at: Some(now),
            readme: None,
            file_structure: None,
            star_snapshots: vec![],
            visibility,
            source_type: SourceType::Hosted,
            tier: Tier::Hot,
            owner_id,
            org_id: None,
            content_hash,
            last_ingest_error: None,
        };

        self.state.skills.upsert_skill(&skill, true).await.expect("seed skill");
        self.state
            .objects
            .put(&format!("skills/acme/{slug}/SKILL.md"), content.as_bytes())
            .await
            .expect("seed object");

        skill
    }

    /// Creates a user account plus a live, read+write-scoped bearer token
    /// for it, returning `(user_id, plain_token)`.
    pub async fn seed_token(&self, username: &str) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let account = UserAccount { id: user_id, username: username.to_string(), github_id: None, created_at: Utc::now() };
        self.state.accounts.upsert(&account).await.expect("seed account");

        let (plain, prefix) = skillreg_infra::crypto::hash::generate_token("at");
        let token = ApiToken {
            id: Uuid::new_v4(),
            subject_user_id: Some(user_id),
            subject_org_id: None,
            prefix,
            token_hash: skillreg_infra::crypto::hash::token_hash(&plain),
            scopes: vec![TokenScope::Read, TokenScope::Write],
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            revoked_at: None,
            created_at: Utc::now(),
        };
        self.state.auth.create_token(&token).await.expect("seed token");

        (user_id, plain)
    }
}
