//! `reqwest`-backed `SourceHostClient` (C2) against the GitHub REST API.
//! `Accept`/`X-GitHub-Api-Version`/user-agent and, when configured, a
//! bearer token are injected once as default headers at construction.
//! Retries live here so callers never see a transient failure that
//! succeeded on a later attempt (§4.2).

use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use skillreg_core::queue::backoff_delay;
use skillreg_core::source_host::{FileContent, PublicEvent, RepoMeta, SourceHostClient};
use skillreg_types::config::GlobalConfig;
use skillreg_types::error::SourceHostError;
use tracing::{debug, warn};

pub struct GitHubSourceHostClient {
    http: reqwest::Client,
    base_url: String,
    events_url: String,
    max_retries: u32,
    max_delay: Duration,
    retryable_statuses: Vec<u16>,
}

impl GitHubSourceHostClient {
    pub fn new(config: &GlobalConfig) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, reqwest::header::HeaderValue::from_static("application/vnd.github+json"));
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&config.source_host_api_version) {
            headers.insert("x-github-api-version", value);
        }
        if let Some(token) = &config.source_host_token {
            if let Ok(mut value) = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}")) {
                value.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }

        let http = reqwest::Client::builder()
            .user_agent(config.source_host_user_agent.clone())
            .timeout(Duration::from_secs(config.source_host_request_timeout_secs))
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.source_host_base_url.clone(),
            events_url: config.source_host_events_url.clone(),
            max_retries: config.source_host_max_retries,
            max_delay: Duration::from_millis(config.source_host_max_delay_ms),
            retryable_statuses: config.source_host_retryable_statuses.clone(),
        }
    }

    /// Sends `req`, retrying on network errors and the configured
    /// retryable statuses, honoring `Retry-After`/`x-ratelimit-reset`
    /// when present. Non-retryable statuses (including 404) are returned
    /// as-is for the caller to interpret.
    async fn send_with_retry(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, SourceHostError> {
        let mut attempt = 0u32;
        loop {
            let attempt_req = req
                .try_clone()
                .ok_or_else(|| SourceHostError::Network("request body is not cloneable".into()))?;

            match attempt_req.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() || status == 404 {
                        return Ok(resp);
                    }
                    if !self.retryable_statuses.contains(&status) && !is_rate_limited(status, resp.headers()) {
                        return Err(SourceHostError::Http(status));
                    }
                    if attempt >= self.max_retries {
                        return Err(SourceHostError::RetriesExhausted(attempt));
                    }
                    let delay = retry_after_delay(resp.headers()).unwrap_or_else(|| backoff_delay(attempt, Duration::from_millis(500), self.max_delay));
                    warn!(status, attempt, delay_ms = delay.as_millis() as u64, "retrying source host request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(SourceHostError::Network(err.to_string()));
                    }
                    let delay = backoff_delay(attempt, Duration::from_millis(500), self.max_delay);
                    debug!(error = %err, attempt, "source host request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// A `403` is treated as rate-limiting, not a hard denial, when GitHub's
/// own signals say so: zero remaining quota, or a `retry-after` hint.
fn is_rate_limited(status: u16, headers: &reqwest::header::HeaderMap) -> bool {
    if status != 403 {
        return false;
    }
    let remaining_is_zero = headers.get("x-ratelimit-remaining").and_then(|v| v.to_str().ok()) == Some("0");
    remaining_is_zero || headers.contains_key("retry-after")
}

/// `Retry-After` (seconds or an HTTP-date) takes precedence over
/// `x-ratelimit-reset` (unix epoch seconds), matching GitHub's own
/// documented precedence.
fn retry_after_delay(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    if let Some(v) = headers.get("retry-after") {
        let raw = v.to_str().unwrap_or("");
        if let Ok(secs) = raw.parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
        if let Some(at) = parse_http_date(raw) {
            let now = Utc::now();
            if at > now {
                return Some((at - now).to_std().unwrap_or_default());
            }
            return Some(Duration::ZERO);
        }
    }
    if let Some(v) = headers.get("x-ratelimit-reset") {
        if let Ok(reset_epoch) = v.to_str().unwrap_or("").parse::<i64>() {
            let now = Utc::now().timestamp();
            if reset_epoch > now {
                return Some(Duration::from_secs((reset_epoch - now) as u64));
            }
        }
    }
    None
}

/// Parses an RFC 7231 HTTP-date (`"Sun, 06 Nov 1994 08:49:37 GMT"`), the
/// only form GitHub emits on `Retry-After`.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S GMT")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[derive(Debug, Deserialize)]
struct GithubRepoResponse {
    default_branch: String,
    pushed_at: Option<DateTime<Utc>>,
    stargazers_count: i64,
    forks_count: i64,
}

#[derive(Debug, Deserialize)]
struct GithubContentResponse {
    content: String,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitTreeResponse {
    tree: Vec<GitTreeEntry>,
}

#[derive(Debug, Deserialize)]
struct GitTreeEntry {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}

#[derive(Debug, Deserialize)]
struct GithubEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created_at: DateTime<Utc>,
    repo: GithubEventRepo,
}

#[derive(Debug, Deserialize)]
struct GithubEventRepo {
    name: String,
}

impl SourceHostClient for GitHubSourceHostClient {
    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Option<RepoMeta>, SourceHostError> {
        let url = format!("{}/repos/{owner}/{repo}", self.base_url);
        let resp = self.send_with_retry(self.http.get(&url)).await?;

        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(SourceHostError::Http(resp.status().as_u16()));
        }

        let body: GithubRepoResponse = resp.json().await.map_err(|e| SourceHostError::Network(e.to_string()))?;
        Ok(Some(RepoMeta {
            default_branch: body.default_branch,
            pushed_at: body.pushed_at,
            stars: body.stargazers_count,
            forks: body.forks_count,
        }))
    }

    async fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> Result<FileContent, SourceHostError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);
        let resp = self.send_with_retry(self.http.get(&url)).await?;

        if !resp.status().is_success() {
            return Err(SourceHostError::Http(resp.status().as_u16()));
        }

        let body: GithubContentResponse = resp.json().await.map_err(|e| SourceHostError::Network(e.to_string()))?;
        let cleaned: String = body.content.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| SourceHostError::Network(format!("invalid base64 content: {e}")))?;
        let content = String::from_utf8(decoded).map_err(|e| SourceHostError::Network(format!("non-utf8 content: {e}")))?;

        Ok(FileContent { content, sha: body.sha })
    }

    async fn list_tree(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<String>, SourceHostError> {
        let url = format!("{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1", self.base_url);
        let resp = self.send_with_retry(self.http.get(&url)).await?;

        if !resp.status().is_success() {
            return Err(SourceHostError::Http(resp.status().as_u16()));
        }

        let body: GitTreeResponse = resp.json().await.map_err(|e| SourceHostError::Network(e.to_string()))?;
        Ok(body
            .tree
            .into_iter()
            .filter(|e| e.entry_type == "blob")
            .map(|e| e.path)
            .collect())
    }

    async fn list_events(&self, page: u32) -> Result<Vec<PublicEvent>, SourceHostError> {
        let url = format!("{}?page={page}", self.events_url);
        let resp = self.send_with_retry(self.http.get(&url)).await?;

        if !resp.status().is_success() {
            return Err(SourceHostError::Http(resp.status().as_u16()));
        }

        let events: Vec<GithubEvent> = resp.json().await.map_err(|e| SourceHostError::Network(e.to_string()))?;
        Ok(events
            .into_iter()
            .filter_map(|e| {
                let (owner, repo_name) = e.repo.name.split_once('/')?;
                Some(PublicEvent {
                    id: e.id,
                    event_type: e.event_type,
                    created_at: e.created_at,
                    repo_owner: owner.to_string(),
                    repo_name: repo_name.to_string(),
                })
            })
            .collect())
    }
}
