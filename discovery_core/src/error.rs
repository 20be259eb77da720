//! Engine error types. None of these ever reach the user; the engine
//! logs them and degrades.

use thiserror::Error;

/// Failure persisting or clearing the session record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize session record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure obtaining ASCII art from the rendering endpoint.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("ASCII endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ASCII endpoint returned status {0}")]
    Status(u16),

    #[error("ASCII endpoint response has no preformatted block")]
    MissingPreBlock,

    #[error("input of {len} characters exceeds the limit of {max}")]
    InputTooLong { len: usize, max: usize },
}

/// Failure fetching the rule document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("rule fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rule endpoint returned status {0}")]
    Status(u16),

    #[error(transparent)]
    RuleSet(#[from] discovery_rules::RuleSetError),
}
