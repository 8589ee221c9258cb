//! CLI-side `installed.json` schema. The CLI program is out of scope, but
//! the registry's download contract must stay consistent with it (§6), so
//! the schema types and load/save logic live here as a library surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INSTALLED_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    Auto,
    Manual,
    Pinned,
}

impl Default for UpdateStrategy {
    fn default() -> Self {
        Self::Manual
    }
}

/// A single installed skill entry, schema version 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstalledSkillEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub registry_slug: Option<String>,
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub global: bool,
    pub installed_at: DateTime<Utc>,
    #[serde(default)]
    pub sha: Option<String>,
    pub path: String,
    #[serde(default)]
    pub content_hash: Option<String>,
}

/// The on-disk `installed.json` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstalledSkillsDb {
    pub version: u32,
    pub skills: Vec<InstalledSkillEntry>,
}

/// The version-1 shape: no `registry_slug`, no `update_strategy`, no
/// `content_hash`, `agents` singular (`agent: Option<String>`).
#[derive(Debug, Clone, Deserialize)]
struct InstalledSkillEntryV1 {
    name: String,
    description: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    global: bool,
    installed_at: DateTime<Utc>,
    #[serde(default)]
    sha: Option<String>,
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct InstalledSkillsDbV1 {
    #[serde(default)]
    version: u32,
    skills: Vec<InstalledSkillEntryV1>,
}

impl From<InstalledSkillEntryV1> for InstalledSkillEntry {
    fn from(v1: InstalledSkillEntryV1) -> Self {
        Self {
            name: v1.name,
            description: v1.description,
            source: v1.source,
            registry_slug: None,
            update_strategy: UpdateStrategy::default(),
            agents: v1.agent.into_iter().collect(),
            global: v1.global,
            installed_at: v1.installed_at,
            sha: v1.sha,
            path: v1.path,
            content_hash: None,
        }
    }
}

impl InstalledSkillsDb {
    pub fn new() -> Self {
        Self {
            version: INSTALLED_SCHEMA_VERSION,
            skills: Vec::new(),
        }
    }

    pub fn save(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Loads a document written by any supported schema version, upgrading
    /// version-1 documents to version 2 by filling in defaults.
    pub fn load(raw: &str) -> serde_json::Result<Self> {
        let probe: serde_json::Value = serde_json::from_str(raw)?;
        let version = probe.get("version").and_then(|v| v.as_u64()).unwrap_or(1);
        if version >= 2 {
            serde_json::from_str(raw)
        } else {
            let v1: InstalledSkillsDbV1 = serde_json::from_str(raw)?;
            Ok(Self {
                version: INSTALLED_SCHEMA_VERSION,
                skills: v1.skills.into_iter().map(Into::into).collect(),
            })
        }
    }
}

impl Default for InstalledSkillsDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> InstalledSkillEntry {
        InstalledSkillEntry {
            name: "foo".into(),
            description: "does foo".into(),
            source: Some("acme/widget".into()),
            registry_slug: Some("acme-widget-foo".into()),
            update_strategy: UpdateStrategy::Auto,
            agents: vec!["claude".into()],
            global: false,
            installed_at: Utc::now(),
            sha: Some("deadbeef".into()),
            path: "skills/foo".into(),
            content_hash: Some("sha256:abc".into()),
        }
    }

    #[test]
    fn v2_round_trips() {
        let db = InstalledSkillsDb {
            version: INSTALLED_SCHEMA_VERSION,
            skills: vec![sample_entry()],
        };
        let saved = db.save().expect("save");
        let loaded = InstalledSkillsDb::load(&saved).expect("load");
        assert_eq!(db, loaded);
    }

    #[test]
    fn v1_upgrades_with_defaults_filled() {
        let v1_json = r#"{
            "version": 1,
            "skills": [{
                "name": "foo",
                "description": "does foo",
                "agent": "claude",
                "global": false,
                "installed_at": "2024-01-01T00:00:00Z",
                "path": "skills/foo"
            }]
        }"#;
        let loaded = InstalledSkillsDb::load(v1_json).expect("load v1");
        assert_eq!(loaded.version, INSTALLED_SCHEMA_VERSION);
        assert_eq!(loaded.skills.len(), 1);
        assert_eq!(loaded.skills[0].update_strategy, UpdateStrategy::Manual);
        assert_eq!(loaded.skills[0].registry_slug, None);
        assert_eq!(loaded.skills[0].agents, vec!["claude".to_string()]);
    }
}
