//! Configuration and error types for snippet extraction.
//!
//! Extraction is a pure function of `(code units, SnippetConfig)`: two
//! deployments that share a config produce bit-identical fingerprints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which token view a fingerprint is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMode {
    /// Kind and verbatim value of every token. Catches exact copies only.
    Exact,
    /// Identifiers and literals reduced to their kind. Survives renaming.
    Structure,
    /// Both of the above for every window.
    #[default]
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnippetConfig {
    /// Number of consecutive tokens per snippet (W).
    ///
    /// Any contiguous match at least this long is found regardless of
    /// alignment. Smaller windows raise recall and noise together.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default)]
    pub mode: FingerprintMode,
    /// Seed mixed into token hashes and the rolling base.
    #[serde(default)]
    pub seed: u64,
}

fn default_window() -> usize {
    16
}

impl SnippetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_mode(mut self, mode: FingerprintMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SnippetError> {
        if self.window < 1 {
            return Err(SnippetError::InvalidWindow {
                window: self.window,
            });
        }
        Ok(())
    }
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            mode: FingerprintMode::default(),
            seed: 0,
        }
    }
}

/// Errors returned by snippet extraction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnippetError {
    #[error("invalid config: window must be >= 1 (got {window})")]
    InvalidWindow { window: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SnippetConfig::default();
        assert_eq!(cfg.window, 16);
        assert_eq!(cfg.mode, FingerprintMode::Both);
        assert_eq!(cfg.seed, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = SnippetConfig::new().with_window(0).validate().unwrap_err();
        assert_eq!(err, SnippetError::InvalidWindow { window: 0 });
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: SnippetConfig = serde_json::from_str(r#"{"mode":"structure"}"#).unwrap();
        assert_eq!(cfg.window, 16);
        assert_eq!(cfg.mode, FingerprintMode::Structure);
    }
}
