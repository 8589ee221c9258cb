//! Skill domain types: the registry entity, its manifest, and slug rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility of a skill row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

/// Where a skill's content originated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Hosted,
    Upload,
}

/// Freshness tier controlling refresh cadence (C8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Hot,
    Cold,
    Archived,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Hot
    }
}

/// A single `{date, stars}` observation in a skill's compressed history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StarSnapshot {
    pub d: NaiveDate,
    pub s: i64,
}

/// The registry entity: a single discovered, ingested skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub repo_owner: String,
    pub repo_name: String,
    /// Empty means the repo root.
    pub skill_path: String,
    pub github_url: String,
    pub stars: i64,
    pub forks: i64,
    pub trending_score: f64,
    pub indexed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_commit_at: Option<DateTime<Utc>>,
    pub readme: Option<String>,
    /// Serialized file tree, opaque to everything but the detail view.
    pub file_structure: Option<String>,
    pub star_snapshots: Vec<StarSnapshot>,
    pub visibility: Visibility,
    pub source_type: SourceType,
    pub tier: Tier,
    pub owner_id: Option<Uuid>,
    pub org_id: Option<Uuid>,
    pub content_hash: String,
    pub last_ingest_error: Option<String>,
}

/// Parsed `SKILL.md` YAML frontmatter (discovery-time shape, §4.5 step 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillManifest {
    pub name: String,
    pub description: String,
    #[serde(default, rename = "allowed-tools")]
    pub allowed_tools: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub hooks: Option<serde_json::Value>,
    #[serde(default, rename = "user-invocable")]
    pub user_invocable: Option<bool>,
}

impl SkillManifest {
    /// A candidate is valid iff `name` and `description` are non-empty
    /// (§4.5 step 3).
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// Lowercase and collapse runs of non-alphanumerics to a single `-`,
/// trimming leading/trailing separators.
fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_sep = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('-');
            last_was_sep = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Computes `{owner}-{repo}` or `{owner}-{repo}-{displayName|path}` per §3.
/// `display_name_or_path` is the skill's `skillPath` (or a display name
/// override) when the skill does not live at the repo root.
pub fn compute_slug(owner: &str, repo: &str, display_name_or_path: Option<&str>) -> String {
    let base = format!("{}-{}", slugify(owner), slugify(repo));
    match display_name_or_path {
        Some(extra) if !extra.trim().is_empty() => {
            format!("{}-{}", base, slugify(extra))
        }
        _ => base,
    }
}

/// Appends a numeric disambiguator to a colliding slug (§4.5 step 4 --
/// the exact rule is left to implementation by the open question in §9;
/// this crate picks a simple, stable `-2`, `-3`, ... suffix scheme).
pub fn disambiguate_slug(base_slug: &str, attempt: u32) -> String {
    format!("{}-{}", base_slug, attempt + 1)
}
