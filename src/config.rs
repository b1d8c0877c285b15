//! Dashboard configuration: data-source identifier and fetch settings.

use crate::data::SheetKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Published sheet holding the PLE results.
pub const DEFAULT_SHEET_ID: &str = "1X8Iwe1jbmkFZ1SHH6ayHx6YE11hamr6idJ68-L-KJF8";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_EXPORT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings read from an optional JSON file; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub sheet_id: String,
    pub sheet_name: String,
    pub export_base_url: String,
    pub timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            export_base_url: DEFAULT_EXPORT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn sheet_key(&self) -> SheetKey {
        SheetKey::new(self.sheet_id.clone(), self.sheet_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_fields_take_defaults() -> Result<()> {
        let config = DashboardConfig::from_json(r#"{ "sheet_name": "Results2025" }"#)?;
        assert_eq!(config.sheet_name, "Results2025");
        assert_eq!(config.sheet_id, DEFAULT_SHEET_ID);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn loads_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, r#"{{ "sheet_id": "abc", "timeout_secs": 5 }}"#)?;

        let config = DashboardConfig::load(Some(tmp.path()))?;
        assert_eq!(config.sheet_key(), SheetKey::new("abc", DEFAULT_SHEET_NAME));
        assert_eq!(config.timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn no_path_means_defaults() -> Result<()> {
        assert_eq!(DashboardConfig::load(None)?, DashboardConfig::default());
        Ok(())
    }

    #[test]
    fn bad_json_is_reported() {
        assert!(matches!(
            DashboardConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
