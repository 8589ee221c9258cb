//! Wire response DTOs (§6). Field names and casing are bit-exact per the
//! external interface table; these are intentionally separate from the
//! storage-shaped [`skillreg_types::skill::Skill`].

use serde::{Deserialize, Serialize};
use skillreg_types::category::CategoryWithCount;
use skillreg_types::skill::{Skill, Visibility};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSkillItem {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub repo: String,
    pub stars: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub categories: Vec<String>,
    pub visibility: Visibility,
    pub slug: String,
}

impl SearchSkillItem {
    pub fn from_skill(skill: &Skill, categories: Vec<String>) -> Self {
        Self {
            name: skill.name.clone(),
            description: skill.description.clone(),
            owner: skill.repo_owner.clone(),
            repo: skill.repo_name.clone(),
            stars: skill.stars,
            updated_at: skill.updated_at,
            categories,
            visibility: skill.visibility,
            slug: skill.slug.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub skills: Vec<SearchSkillItem>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDetailResponse {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub repo: String,
    pub stars: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub categories: Vec<String>,
    pub content: String,
    pub github_url: String,
    pub visibility: Visibility,
}

impl SkillDetailResponse {
    pub fn from_skill(skill: &Skill, categories: Vec<String>, content: String) -> Self {
        Self {
            name: skill.name.clone(),
            description: skill.description.clone(),
            owner: skill.repo_owner.clone(),
            repo: skill.repo_name.clone(),
            stars: skill.stars,
            updated_at: skill.updated_at,
            categories,
            content,
            github_url: skill.github_url.clone(),
            visibility: skill.visibility,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryWithCount>,
}
