//! Turn-progression state machine.
//!
//! The phase is a pure function of the persisted interaction counter, so a
//! reload mid-session lands in the same phase:
//!
//! | interaction            | phase          | behavior                          |
//! |------------------------|----------------|-----------------------------------|
//! | `1..=ascii_turns`      | `Early`        | ASCII art only                    |
//! | `ascii_turns + 1`      | `Announce`     | the turn announcement, once       |
//! | after that             | `Conversation` | rule matching, ASCII on no match  |
//!
//! [`step`] performs no I/O. It mutates the session record and returns the
//! [`Effect`] the driver must carry out.

use discovery_rules::{EnginePolicy, RuleSet};
use serde::{Deserialize, Serialize};

use crate::matcher::{Outcome, RuleMatcher};
use crate::random::RandomSource;
use crate::session::SessionState;

/// Coarse behavioral mode. `Conversation` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Early,
    Announce,
    Conversation,
}

impl Phase {
    /// Phase of the `count`-th interaction.
    pub fn for_interaction(count: u32, policy: &EnginePolicy) -> Self {
        if count <= policy.ascii_turns {
            Phase::Early
        } else if count == policy.announce_turn() {
            Phase::Announce
        } else {
            Phase::Conversation
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Early => "early",
            Phase::Announce => "announce",
            Phase::Conversation => "conversation",
        };
        write!(f, "{}", name)
    }
}

/// The side effect one submission calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Blank input; nothing happens and nothing is counted.
    Ignore,

    /// Send this text to the ASCII endpoint and show the result.
    RenderAscii(String),

    /// Show the one-time turn announcement.
    Announce(String),

    /// Show a rule reply.
    Reply(String),

    /// Reveal a nav slot. No navigation.
    Reveal { path: String, label: String },

    /// Leave the page, or open a new context for external targets.
    Navigate { target: String, new_context: bool },

    /// The session was cleared; the view must reload.
    Reset,
}

/// Advance the session by one input.
///
/// Blank input is ignored. Otherwise the counter is incremented first and the
/// phase of the new count decides what happens.
pub fn step(
    state: &mut SessionState,
    input: &str,
    rules: &RuleSet,
    matcher: &RuleMatcher,
    rng: &mut dyn RandomSource,
) -> Effect {
    let text = input.trim();
    if text.is_empty() {
        return Effect::Ignore;
    }

    let policy = matcher.policy();
    let phase = state.advance(policy);
    log::debug!(
        "Session {} turn {} ({})",
        state.session_id,
        state.interaction_count,
        phase
    );

    if phase != Phase::Conversation && policy.intro_skip {
        let outcome = matcher.evaluate(text, rules, &state.discovered, rng);
        if outcome != Outcome::NoMatch {
            return apply(outcome, state, text, rules);
        }
    }

    match phase {
        Phase::Early => Effect::RenderAscii(text.to_string()),
        Phase::Announce => Effect::Announce(rules.turn_announcement().to_string()),
        Phase::Conversation => {
            let outcome = matcher.evaluate(text, rules, &state.discovered, rng);
            apply(outcome, state, text, rules)
        }
    }
}

/// Fold a matcher outcome into the session and turn it into an effect.
fn apply(outcome: Outcome, state: &mut SessionState, text: &str, rules: &RuleSet) -> Effect {
    match outcome {
        Outcome::NoMatch => Effect::RenderAscii(text.to_string()),
        Outcome::Reply(reply) => Effect::Reply(reply),
        Outcome::Unlock(path) => {
            state.discovered.unlock(&path);
            let label = rules.label_for(&path);
            Effect::Reveal { path, label }
        }
        Outcome::Navigate {
            target,
            new_context,
        } => {
            if !new_context {
                state.discovered.unlock(&target);
            }
            Effect::Navigate {
                target,
                new_context,
            }
        }
        Outcome::Reset => {
            state.reset();
            Effect::Reset
        }
    }
}
