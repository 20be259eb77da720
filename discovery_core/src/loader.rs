//! Rule-set loading. A failed load degrades to an empty rule set.

use discovery_rules::{DocumentFormat, HostConfig, RuleSet, RuleSetError};
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Where the rule document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Url(String),
    File(PathBuf),
}

impl RuleSource {
    /// Local files win when the configured location exists on disk; anything
    /// else is treated as a site URL.
    pub fn from_config(config: &HostConfig) -> Self {
        let location = config.rules.as_str();
        if !location.starts_with("http") && Path::new(location).is_file() {
            RuleSource::File(PathBuf::from(location))
        } else {
            RuleSource::Url(config.resolve(location))
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSource::Url(url) => write!(f, "{}", url),
            RuleSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch and validate the rule document.
pub async fn fetch_rule_set(
    source: &RuleSource,
    client: &reqwest::Client,
) -> Result<RuleSet, LoadError> {
    match source {
        RuleSource::Url(url) => {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status(status.as_u16()));
            }
            let format = DocumentFormat::from_content_type(
                response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok()),
            );
            let body = response.text().await?;
            Ok(RuleSet::parse(&body, format)?)
        }
        RuleSource::File(path) => {
            let format = DocumentFormat::from_path(path)?;
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RuleSetError::Io {
                    path: path.clone(),
                    source,
                })?;
            Ok(RuleSet::parse(&text, format)?)
        }
    }
}

/// Load the rule set, falling back to an empty one on any failure.
pub async fn load_rule_set(source: &RuleSource, client: &reqwest::Client) -> RuleSet {
    match fetch_rule_set(source, client).await {
        Ok(rules) => {
            log::info!(
                "Loaded {} rules from {} ({} skipped)",
                rules.rules().len(),
                source,
                rules.skipped().len()
            );
            rules
        }
        Err(e) => {
            log::error!("Failed to load rules from {}: {}", source, e);
            RuleSet::empty()
        }
    }
}
