//! Query parameter extractor for `GET /registry/search` (§6).

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct RegistrySearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub include_private: bool,
    pub sort: Option<String>,
}

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

impl RegistrySearchQuery {
    pub fn normalized_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn normalized_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
