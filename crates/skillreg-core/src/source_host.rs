//! Source-Host Client port (C2). `skillreg-infra::source_host` adapts
//! this to `reqwest` against the GitHub REST API; retry/back-off live
//! behind the trait so callers never see a transient failure that
//! succeeded on retry.

use std::future::Future;

use chrono::{DateTime, Utc};
use skillreg_types::error::SourceHostError;

#[derive(Debug, Clone)]
pub struct RepoMeta {
    pub default_branch: String,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stars: i64,
    pub forks: i64,
}

#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: String,
    pub sha: Option<String>,
}

/// A single event from the public event firehose (§4.4).
#[derive(Debug, Clone)]
pub struct PublicEvent {
    pub id: String,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    pub repo_owner: String,
    pub repo_name: String,
}

pub trait SourceHostClient: Send + Sync {
    /// `None` on 404 -- the caller (C5 step 1) archives any existing
    /// skills for this coordinate.
    fn get_repo(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Option<RepoMeta>, SourceHostError>> + Send;

    fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> impl Future<Output = Result<FileContent, SourceHostError>> + Send;

    /// Flat recursive listing of every path in the repo at `branch`.
    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<String>, SourceHostError>> + Send;

    /// Up to 100 events per page, newest first (§4.4).
    fn list_events(&self, page: u32) -> impl Future<Output = Result<Vec<PublicEvent>, SourceHostError>> + Send;
}
