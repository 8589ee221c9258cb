//! Sliding-window rate limiting (§6, §9). Applied as `axum` middleware so
//! it stays out of the `AppError`/`{error: ...}` envelope entirely: a
//! `429` here is never routed through [`crate::http::error::AppError`],
//! which keeps this independent of §7's NotFound/Unauthorized/Forbidden
//! propagation policy.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use skillreg_core::repository::kv::KvStore;

use crate::state::AppState;

fn subject_for(request: &Request) -> String {
    if let Some(auth) = request.headers().get(axum::http::header::AUTHORIZATION) {
        if let Ok(value) = auth.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return token.chars().take(12).collect();
            }
        }
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let subject = subject_for(&request);
    let endpoint = request.uri().path().to_string();
    let window_secs = state.config.rate_limit_window_secs;
    let limit = state.config.rate_limit_per_window as u64;

    let now_secs = chrono::Utc::now().timestamp().max(0) as u64;
    let bucket = now_secs / window_secs.max(1);
    let key = format!("ratelimit:{subject}:{endpoint}:{bucket}");

    let count = match state.kv.increment_counter(&key, Duration::from_secs(window_secs)).await {
        Ok(c) => c,
        Err(_) => return next.run(request).await,
    };

    let remaining = limit.saturating_sub(count);
    let reset = (bucket + 1) * window_secs.max(1);

    if count > limit {
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        let headers = response.headers_mut();
        headers.insert("retry-after", HeaderValue::from(window_secs));
        headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(0u64));
        headers.insert("x-ratelimit-reset", HeaderValue::from(reset));
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset));
    response
}
