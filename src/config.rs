use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const API_KEY_ENV: &str = "HUBSPOT_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hubspot: HubspotConfig,
    pub geocoder: GeocoderConfig,
    pub dedup: DedupConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubspotConfig {
    pub base_url: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
    /// Only contacts whose `filter_property` equals `filter_value` are fetched
    pub filter_property: String,
    pub filter_value: String,
}

impl Default for HubspotConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hubapi.com".to_string(),
            page_size: 100,
            timeout_seconds: 30,
            filter_property: "allowed_to_collect".to_string(),
            filter_value: "true".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderProvider {
    Nominatim,
    Offline,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub requests_per_min: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::Nominatim,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "contact_pipeline/0.1".to_string(),
            timeout_seconds: 10,
            // Nominatim usage policy: at most one request per second
            requests_per_min: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Backfill the newer of two email groups that share a display name
    pub backfill_across_names: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { backfill_across_names: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl Config {
    /// Load from `path`. When `path` is the default location and the file is
    /// absent, built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !config_path.exists() {
            tracing::info!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.hubspot.page_size == 0 || config.hubspot.page_size > 100 {
            return Err(PipelineError::Config(format!(
                "hubspot.page_size must be between 1 and 100, got {}",
                config.hubspot.page_size
            )));
        }
        if config.upload.concurrency == 0 {
            return Err(PipelineError::Config("upload.concurrency must be at least 1".into()));
        }
        Ok(config)
    }

    /// HubSpot private-app token from the environment (`.env` is honoured).
    pub fn api_key() -> Result<String> {
        let key = std::env::var(API_KEY_ENV)?;
        if key.trim().is_empty() {
            return Err(PipelineError::Config(format!("{} is empty", API_KEY_ENV)));
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.hubspot.page_size, 100);
        assert_eq!(config.geocoder.provider, GeocoderProvider::Nominatim);
        assert!(config.dedup.backfill_across_names);
        assert_eq!(config.upload.concurrency, 1);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config = Config::from_toml(
            r#"
            [geocoder]
            provider = "offline"

            [upload]
            concurrency = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.geocoder.provider, GeocoderProvider::Offline);
        assert_eq!(config.geocoder.requests_per_min, 60);
        assert_eq!(config.upload.concurrency, 4);
        assert_eq!(config.hubspot.filter_property, "allowed_to_collect");
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let err = Config::from_toml("[hubspot]\npage_size = 500\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn rejects_zero_upload_concurrency() {
        assert!(Config::from_toml("[upload]\nconcurrency = 0\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
