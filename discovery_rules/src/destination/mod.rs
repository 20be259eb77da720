//! Navigation destinations named by action rules.

use serde::{Deserialize, Serialize};

/// Where an action rule points.
///
/// Internal paths start with `/` and are tracked by discovery. External URLs
/// start with `http` and always open in a new browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Internal(String),
    External(String),
}

impl Destination {
    /// Classify an action string. Returns `None` for anything that is neither
    /// a rooted path nor an `http`/`https` URL.
    pub fn parse(action: &str) -> Option<Self> {
        let action = action.trim();
        if action.starts_with('/') {
            Some(Destination::Internal(action.to_string()))
        } else if action.starts_with("http") {
            Some(Destination::External(action.to_string()))
        } else {
            None
        }
    }

    /// The raw target string.
    pub fn target(&self) -> &str {
        match self {
            Destination::Internal(path) => path,
            Destination::External(url) => url,
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.target())
    }
}

/// Human-readable label for an internal path: the path minus its leading `/`.
pub fn label_for_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// A pre-declared navigation slot that becomes visible once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSlot {
    pub path: String,
    pub label: String,
}

impl NavSlot {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}
