//! YAML configuration for the anti-plagiarism service.
//!
//! One file holds every component's settings; each section falls back to
//! its defaults when omitted.
//!
//! ```yaml
//! version: "1.0"
//!
//! submissions:
//!   max_code_length: 60000
//!
//! snippets:
//!   window: 16
//!   mode: both          # exact | structure | both
//!   seed: 0
//!
//! detector:
//!   max_results: 20
//!   max_snippet_authors: null
//!   coldest_snippets_limit: null
//!
//! statistics:
//!   faint_coefficient: 1.5
//!   strong_coefficient: 3.0
//!   faint: { min: 4.0, max: 40.0 }
//!   strong: { min: 8.0, max: 80.0 }
//!
//! author_plagiarisms:
//!   max_last_submissions: 10
//!
//! storage:
//!   backend: redb       # or in_memory
//!   path: /var/lib/antiplag/data.redb
//!   compression_level: 3
//!
//! logging:
//!   level: info
//!   json: false
//! ```

use std::fs;
use std::path::Path;

use detector::DetectorConfig;
use serde::{Deserialize, Serialize};
use snippets::SnippetConfig;
use stats::SuspicionConfig;
use submission::{BackendConfig, CompressionConfig, IntakeConfig};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration of [`AntiPlagiarism`](crate::AntiPlagiarism).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AntiplagConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub submissions: IntakeConfig,

    #[serde(default)]
    pub snippets: SnippetConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    /// Suspicion thresholds derived from task statistics.
    #[serde(default)]
    pub statistics: SuspicionConfig,

    #[serde(default)]
    pub author_plagiarisms: AuthorPlagiarismsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AntiplagConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: AntiplagConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        let invalid = |section: &str, err: &dyn std::fmt::Display| {
            ConfigLoadError::Validation(format!("{section}: {err}"))
        };
        self.submissions
            .validate()
            .map_err(|e| invalid("submissions", &e))?;
        self.snippets.validate().map_err(|e| invalid("snippets", &e))?;
        self.detector.validate().map_err(|e| invalid("detector", &e))?;
        self.statistics
            .validate()
            .map_err(|e| invalid("statistics", &e))?;
        self.author_plagiarisms.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Default for AntiplagConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            submissions: IntakeConfig::default(),
            snippets: SnippetConfig::default(),
            detector: DetectorConfig::default(),
            statistics: SuspicionConfig::default(),
            author_plagiarisms: AuthorPlagiarismsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorPlagiarismsConfig {
    /// Upper bound for `last_n` in author reports.
    #[serde(default = "default_max_last_submissions")]
    pub max_last_submissions: usize,
}

impl AuthorPlagiarismsConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_last_submissions == 0 {
            return Err(ConfigLoadError::Validation(
                "author_plagiarisms.max_last_submissions must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AuthorPlagiarismsConfig {
    fn default() -> Self {
        Self {
            max_last_submissions: default_max_last_submissions(),
        }
    }
}

/// Where submissions and statistics snapshots live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: BackendConfig,

    /// zstd level for stored records.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl StorageConfig {
    pub fn compression(&self) -> CompressionConfig {
        CompressionConfig::default().with_level(self.compression_level)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "storage.compression_level must be between 1 and 22".to_string(),
            ));
        }
        if let BackendConfig::Redb { path } = &self.backend {
            if path.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "storage.path is required when backend is 'redb'".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            compression_level: default_compression_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `ANTIPLAG_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Helper functions for serde defaults
fn default_max_last_submissions() -> usize {
    10
}

fn default_compression_level() -> i32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}
