//! Process-wide configuration, loaded once into an immutable value and
//! passed to components via explicit parameters (§9 "shared mutable
//! singletons").

use serde::{Deserialize, Serialize};

/// The curated discovery path list (§4.5 step 2), relative to repo root.
///
/// The dot-folder exclusion rule ("exclude any path starting with
/// `.<name>/` at any depth") takes precedence over the prose's "such as
/// `.claude/skills/`" aside -- the §8 scenario 3 test fixes this: a push
/// touching only `.claude/skills/bar/SKILL.md` must write zero rows. So
/// these five literal roots are the only ones walked; any dot-prefixed
/// path component encountered elsewhere during the walk is pruned.
pub fn default_discovery_paths() -> Vec<String> {
    vec![
        "".to_string(),
        "skills".to_string(),
        "skills/.curated".to_string(),
        "skills/.experimental".to_string(),
        "skills/.system".to_string(),
    ]
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_ranking_interval_secs() -> u64 {
    3600
}

fn default_discovery_max_depth() -> u32 {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}

fn default_cache_max_items() -> usize {
    100
}

fn default_prune_fraction() -> f64 {
    0.20
}

fn default_user_agent() -> String {
    "skillreg/0.1".to_string()
}

fn default_source_host_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_source_host_events_url() -> String {
    "https://api.github.com/events".to_string()
}

fn default_source_host_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_search_cache_ttl_secs() -> u64 {
    60
}

fn default_rate_limit_per_window() -> u32 {
    120
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

/// Process-wide settings. Values not present in the loaded `config.toml`
/// fall back to these defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub poll_interval_secs: u64,
    pub ranking_interval_secs: u64,
    pub discovery_paths: Vec<String>,
    pub discovery_max_depth: u32,
    pub source_host_base_url: String,
    pub source_host_events_url: String,
    pub source_host_user_agent: String,
    pub source_host_api_version: String,
    /// Bearer token injected on every source-host request when present
    /// (§4.2). `None` means unauthenticated, rate-limited requests.
    pub source_host_token: Option<String>,
    pub source_host_max_retries: u32,
    pub source_host_request_timeout_secs: u64,
    pub source_host_max_delay_ms: u64,
    pub source_host_retryable_statuses: Vec<u16>,
    pub cache_max_items: usize,
    pub cache_prune_fraction: f64,
    pub search_cache_ttl_secs: u64,
    pub rate_limit_per_window: u32,
    pub rate_limit_window_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            ranking_interval_secs: default_ranking_interval_secs(),
            discovery_paths: default_discovery_paths(),
            discovery_max_depth: default_discovery_max_depth(),
            source_host_base_url: default_source_host_base_url(),
            source_host_events_url: default_source_host_events_url(),
            source_host_user_agent: default_user_agent(),
            source_host_api_version: default_source_host_api_version(),
            source_host_token: None,
            source_host_max_retries: default_max_retries(),
            source_host_request_timeout_secs: default_request_timeout_secs(),
            source_host_max_delay_ms: default_max_delay_ms(),
            source_host_retryable_statuses: default_retryable_statuses(),
            cache_max_items: default_cache_max_items(),
            cache_prune_fraction: default_prune_fraction(),
            search_cache_ttl_secs: default_search_cache_ttl_secs(),
            rate_limit_per_window: default_rate_limit_per_window(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let cfg = GlobalConfig::default();
        let serialized = toml::to_string(&cfg).expect("serialize");
        let parsed: GlobalConfig = toml::from_str(&serialized).expect("parse");
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let partial = "poll_interval_secs = 60\n";
        let cfg: GlobalConfig = toml::from_str(partial).expect("parse");
        assert_eq!(cfg.poll_interval_secs, 60);
        assert_eq!(cfg.ranking_interval_secs, default_ranking_interval_secs());
        assert_eq!(cfg.discovery_paths, default_discovery_paths());
    }

    #[test]
    fn discovery_paths_are_the_five_literal_curated_roots() {
        let paths = default_discovery_paths();
        assert_eq!(paths.len(), 5);
        assert!(paths.iter().any(|p| p == "skills/.curated"));
        assert!(!paths.iter().any(|p| p.starts_with(".claude")));
    }
}
