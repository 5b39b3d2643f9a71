use anyhow::Context;
use lingo_core::KeyMatching;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "lingo.config.json";

/// Lingo configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Language used when no `--language` flag is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Bound on every document call, in milliseconds; 0 waits forever
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How push pairs local texts with remote keys
    #[serde(default)]
    pub push_matching: KeyMatching,

    /// Read the whole page even when the document has a selection
    #[serde(default = "default_ignore_selection")]
    pub ignore_selection: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_ignore_selection() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: None,
            timeout_ms: default_timeout_ms(),
            push_matching: KeyMatching::default(),
            ignore_selection: default_ignore_selection(),
        }
    }
}

impl Config {
    /// Load config from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
