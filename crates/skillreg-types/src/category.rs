//! Category: predefined (fixed, build-time) or ai-suggested (runtime).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Predefined,
    AiSuggested,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub kind: CategoryKind,
}

/// The special category assigned when keyword scoring and suggestion both
/// come up empty (§4.6).
pub const OTHER_CATEGORY_SLUG: &str = "other";

/// A `(skillId, categorySlug)` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    pub skill_id: uuid::Uuid,
    pub category_slug: String,
    pub score: f64,
}

/// Category plus the count of skills assigned to it, for `/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub count: i64,
}
