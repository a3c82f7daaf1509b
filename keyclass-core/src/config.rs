use crate::error::{KeyclassError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Default value functions for serde
fn default_pdftotext_path() -> String {
    "pdftotext".to_string()
}

fn default_upload_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "doc".to_string(), "docx".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyclassConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files and records.
    /// When unset the CLI falls back to the platform data directory.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// `pdftotext` binary, either a path or a name resolved through PATH
    #[serde(default = "default_pdftotext_path")]
    pub pdftotext_path: String,
    /// File extensions accepted for document uploads (lowercase, no dot)
    #[serde(default = "default_upload_extensions")]
    pub upload_extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdftotext_path: default_pdftotext_path(),
            upload_extensions: default_upload_extensions(),
        }
    }
}

impl ExtractionConfig {
    pub fn accepts_upload(&self, file_name: &str) -> bool {
        let lowered = file_name.to_lowercase();
        self.upload_extensions
            .iter()
            .any(|ext| lowered.ends_with(&format!(".{}", ext.to_lowercase())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl KeyclassConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| KeyclassError::Config(e.to_string()))
    }
}
