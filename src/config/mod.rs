//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::recognition::RecognitionConfig;

const CONFIG_FILE: &str = "config.toml";

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Matching thresholds and multiplier policy
    pub recognition: RecognitionConfig,
    /// Card data locations
    pub data: DataConfig,
    /// Replay backend settings
    pub ocr: OcrConfig,
}

/// Where card data comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Card list file; the cached download when unset
    pub cards_file: Option<PathBuf>,
    /// Keyword list file; the cached download when unset
    pub keywords_file: Option<PathBuf>,
    /// Foreign-language names to accept as aliases (e.g. "French")
    pub languages: Vec<String>,
    /// Download missing files on first use
    pub auto_download: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cards_file: None,
            keywords_file: None,
            languages: Vec::new(),
            auto_download: true,
        }
    }
}

/// Saved OCR output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory holding `<image>.box_texts.txt` files; next to the image when unset
    pub box_texts_dir: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default configuration file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(crate::storage::get_config_dir()?.join(CONFIG_FILE))
}

/// Load `path`, writing the defaults there first if it does not exist
pub fn load_or_create_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        return load_config(path).with_context(|| format!("Invalid config file {:?}", path));
    }

    info!("Creating default config at {:?}", path);
    let config = AppConfig::default();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_config(&config, path)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ConflictPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check recognition defaults
        assert!((config.recognition.max_ratio_diff - 0.3).abs() < 0.001);
        assert!((config.recognition.max_ratio_diff_keyword - 0.2).abs() < 0.001);
        assert_eq!(config.recognition.conflict_policy, ConflictPolicy::LastWins);

        // Check data defaults
        assert!(config.data.cards_file.is_none());
        assert!(config.data.keywords_file.is_none());
        assert!(config.data.languages.is_empty());
        assert!(config.data.auto_download);

        assert!(config.ocr.box_texts_dir.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.recognition.max_ratio_diff, parsed.recognition.max_ratio_diff);
        assert_eq!(config.recognition.conflict_policy, parsed.recognition.conflict_policy);
        assert_eq!(config.data.auto_download, parsed.data.auto_download);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.recognition.max_ratio_diff = 0.25;
        config.recognition.conflict_policy = ConflictPolicy::FirstWins;
        config.data.languages = vec!["French".to_string(), "German".to_string()];
        config.data.cards_file = Some(PathBuf::from("/data/all_cards.txt"));

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("first_wins"));
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert!((parsed.recognition.max_ratio_diff - 0.25).abs() < 0.001);
        assert_eq!(parsed.recognition.conflict_policy, ConflictPolicy::FirstWins);
        assert_eq!(parsed.data.languages, vec!["French", "German"]);
        assert_eq!(parsed.data.cards_file, Some(PathBuf::from("/data/all_cards.txt")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[recognition]\nmax_ratio_diff = 0.4\n").unwrap();
        assert!((parsed.recognition.max_ratio_diff - 0.4).abs() < 0.001);
        assert!((parsed.recognition.max_ratio_diff_keyword - 0.2).abs() < 0.001);
        assert!(parsed.data.auto_download);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.data.auto_download, loaded.data.auto_download);
        assert_eq!(config.recognition.max_ratio_diff, loaded.recognition.max_ratio_diff);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = load_or_create_config(&path).unwrap();
        assert!(path.exists());
        let loaded = load_or_create_config(&path).unwrap();
        assert_eq!(created.recognition.max_ratio_diff, loaded.recognition.max_ratio_diff);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
