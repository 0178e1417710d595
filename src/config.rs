use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenSearch endpoint. When absent, `listings_file` is used instead.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_index")]
    pub index: String,
    /// Sign requests with AWS SigV4 for this region.
    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(default)]
    pub listings_file: Option<PathBuf>,
    /// Upper bound on listings fetched per location search.
    #[serde(default = "default_result_limit")]
    pub result_limit: i64,
    /// Terminals narrower than this many columns get the full-screen filter modal.
    #[serde(default = "default_modal_breakpoint")]
    pub modal_breakpoint: u16,
    #[serde(default = "default_toast_capacity")]
    pub toast_capacity: usize,
    #[serde(default = "default_toast_ttl_secs")]
    pub toast_ttl_secs: u64,
    /// Extra autocomplete entries, merged with what the provider reports.
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_home_types")]
    pub home_types: Vec<String>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_index() -> String {
    "listings-*".to_string()
}

fn default_result_limit() -> i64 {
    500
}

fn default_modal_breakpoint() -> u16 {
    100
}

fn default_toast_capacity() -> usize {
    4
}

fn default_toast_ttl_secs() -> u64 {
    5
}

fn default_home_types() -> Vec<String> {
    ["House", "Condo", "Townhouse", "Multi-family", "Land", "Manufactured"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            index: default_index(),
            aws_region: None,
            listings_file: None,
            result_limit: default_result_limit(),
            modal_breakpoint: default_modal_breakpoint(),
            toast_capacity: default_toast_capacity(),
            toast_ttl_secs: default_toast_ttl_secs(),
            locations: Vec::new(),
            home_types: default_home_types(),
            log_file: None,
        }
    }
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("property_explorer")
        .join("config.json")
}

pub fn load_config(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&contents)
        .with_context(|| format!("invalid config at {}", path.display()))?;
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join("config.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            endpoint_url: Some("https://search.example:9200".to_string()),
            aws_region: Some("us-east-1".to_string()),
            modal_breakpoint: 80,
            locations: vec!["Burlington, VT".to_string()],
            ..AppConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), Some(config));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"listings_file": "/tmp/listings.json"}"#).unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.index, "listings-*");
        assert_eq!(config.result_limit, 500);
        assert_eq!(config.modal_breakpoint, 100);
        assert_eq!(config.home_types.len(), 6);
        assert_eq!(config.listings_file, Some(PathBuf::from("/tmp/listings.json")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
