//! Global configuration loader.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`GlobalConfig`], falling back to defaults when the file is missing or
//! malformed.

use std::path::Path;

use skillreg_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config.toml at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("failed to parse {}: {err}, using defaults", config_path.display());
            GlobalConfig::default()
        }
    }
}

/// `~/.skillreg` unless `SKILLREG_DATA_DIR` is set.
pub fn default_data_dir() -> std::path::PathBuf {
    std::env::var_os("SKILLREG_DATA_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| ".".into()).join(".skillreg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.poll_interval_secs, 300);
    }

    #[tokio::test]
    async fn valid_toml_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "poll_interval_secs = 120\n")
            .await
            .unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.ranking_interval_secs, 3600);
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not valid { toml")
            .await
            .unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.poll_interval_secs, 300);
    }
}
