//! User accounts and the per-download audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub github_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserActionKind {
    Download,
    View,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAction {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub subject_ip: Option<String>,
    pub skill_id: Uuid,
    pub action: UserActionKind,
    pub created_at: DateTime<Utc>,
}
