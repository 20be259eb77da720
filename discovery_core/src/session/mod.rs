//! Session state - the small record that survives reloads within one session.

mod store;

pub use store::*;

use discovery_rules::{EnginePolicy, RuleSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tracker::DiscoveryTracker;
use crate::turn::Phase;

/// Identifier for one browsing session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the engine remembers between interactions.
///
/// The phase is not stored: it is always derived from `interaction_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub session_id: SessionId,

    /// Submitted, non-empty inputs so far.
    #[serde(default)]
    pub interaction_count: u32,

    /// Internal destinations revealed by action rules.
    #[serde(default)]
    pub discovered: DiscoveryTracker,
}

impl SessionState {
    /// A fresh session: zero interactions, nothing discovered.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, policy: &EnginePolicy) -> Phase {
        Phase::for_interaction(self.interaction_count, policy)
    }

    /// Count one interaction and return the phase it falls in.
    pub fn advance(&mut self, policy: &EnginePolicy) -> Phase {
        self.interaction_count = self.interaction_count.saturating_add(1);
        self.phase(policy)
    }

    /// Start over with a new session id.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drop discovered paths that no action rule in `rules` can produce.
    ///
    /// Returns how many were dropped.
    pub fn retain_known(&mut self, rules: &RuleSet) -> usize {
        let known = rules.internal_destinations();
        self.discovered.retain(|path| known.contains(path))
    }
}
