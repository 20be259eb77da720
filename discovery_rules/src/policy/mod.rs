//! Engine policy and host configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Tunable behavior of the discovery engine.
///
/// Every field has a default, so a partial `[policy]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Interactions answered with ASCII art before the announcement.
    pub ascii_turns: u32,

    /// Chance (0.0-1.0) that the fallback reply fires when nothing matched.
    pub fallback_probability: f64,

    /// First match on an internal action reveals it; the next one navigates.
    pub reveal_before_navigate: bool,

    /// Lower bound of the random idle delay, in milliseconds.
    pub idle_min_ms: u64,

    /// Upper bound of the random idle delay, in milliseconds.
    pub idle_max_ms: u64,

    /// Inputs that clear the session.
    pub reset_words: Vec<String>,

    /// Let a matching rule preempt the ASCII and announcement turns.
    pub intro_skip: bool,

    /// Longest input the ASCII endpoint accepts.
    pub max_input_len: usize,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            ascii_turns: 2,
            fallback_probability: 0.5,
            reveal_before_navigate: true,
            idle_min_ms: 30_000,
            idle_max_ms: 60_000,
            reset_words: vec!["reset".into(), "restart".into(), "xyzzy".into()],
            intro_skip: false,
            max_input_len: 200,
        }
    }
}

impl EnginePolicy {
    /// The interaction that shows the turn announcement.
    pub fn announce_turn(&self) -> u32 {
        self.ascii_turns + 1
    }

    pub fn idle_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.idle_min_ms),
            Duration::from_millis(self.idle_max_ms),
        )
    }

    /// Whether a normalized input is one of the reset words.
    pub fn is_reset_word(&self, normalized: &str) -> bool {
        self.reset_words
            .iter()
            .any(|word| word.eq_ignore_ascii_case(normalized))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.fallback_probability) {
            return Err(ConfigError::InvalidPolicy(format!(
                "fallback_probability {} is outside 0.0..=1.0",
                self.fallback_probability
            )));
        }
        if self.idle_min_ms > self.idle_max_ms {
            return Err(ConfigError::InvalidPolicy(format!(
                "idle_min_ms {} exceeds idle_max_ms {}",
                self.idle_min_ms, self.idle_max_ms
            )));
        }
        Ok(())
    }
}

/// Configuration for a host embedding the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Site root used to resolve relative endpoints.
    pub base_url: String,

    /// Rule document location: a URL, a site-relative path, or a local file.
    pub rules: String,

    /// ASCII rendering endpoint, relative to `base_url` unless absolute.
    pub ascii_endpoint: String,

    /// Where the session record lives. `None` keeps it in memory.
    pub session_file: Option<PathBuf>,

    pub policy: EnginePolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            rules: Self::DEFAULT_RULES_PATH.to_string(),
            ascii_endpoint: "/Ascii/Input".to_string(),
            session_file: None,
            policy: EnginePolicy::default(),
        }
    }
}

impl HostConfig {
    /// Well-known location of the rule document on the site.
    pub const DEFAULT_RULES_PATH: &'static str = "/data/discovery-rules.json";

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = toml::from_str(content)?;
        config.policy.validate()?;
        Ok(config)
    }

    /// Resolve a site-relative path against `base_url`. Absolute URLs pass through.
    pub fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                target.trim_start_matches('/')
            )
        }
    }

    pub fn ascii_url(&self) -> String {
        self.resolve(&self.ascii_endpoint)
    }
}
