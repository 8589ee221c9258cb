//! Axum router (§6). Registry read endpoints get permissive CORS and a
//! rate-limit layer; auth/favorites are same-origin only.

use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::Method;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::middleware::rate_limit::rate_limit;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let registry_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, USER_AGENT]);

    let registry_routes = Router::new()
        .route("/registry/search", get(handlers::search::search))
        .route("/registry/skill/{owner}/{name}", get(handlers::skill::by_owner_and_name))
        .route("/registry/skill/{identifier}", get(handlers::skill::by_identifier))
        .route("/skills/{slug}/download", get(handlers::download::download))
        .route("/categories", get(handlers::categories::list))
        .layer(registry_cors)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let same_origin_routes = Router::new()
        .route("/auth/init", post(handlers::auth::init))
        .route("/auth/token", post(handlers::auth::token))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/favorites", post(handlers::favorites::add))
        .route("/favorites", delete(handlers::favorites::remove))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(registry_routes)
        .merge(same_origin_routes)
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}
