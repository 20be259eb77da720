//! Rule Matcher - deterministic first-match-wins dispatch.
//!
//! Evaluation order:
//! 1. **Normalize**: trim and case-fold the input
//! 2. **Reset**: a reset word short-circuits everything else
//! 3. **Ordered rules**: the first pattern that matches decides the outcome
//! 4. **Fallback**: only if nothing matched, and only with the policy's probability

use discovery_rules::{ActionRule, Destination, EnginePolicy, Replies, Rule, RuleSet};

use crate::random::RandomSource;
use crate::tracker::DiscoveryTracker;

/// What a line of input resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Show this text.
    Reply(String),

    /// Reveal an internal destination without leaving the page.
    Unlock(String),

    /// Leave for `target`. External targets open in a new context.
    Navigate { target: String, new_context: bool },

    /// Clear the session.
    Reset,

    /// Nothing fired; the caller renders ASCII art instead.
    NoMatch,
}

/// Trim and case-fold input before matching.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Matches input against a rule set under a given policy.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    policy: EnginePolicy,
}

impl RuleMatcher {
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    pub fn with_defaults() -> Self {
        Self::new(EnginePolicy::default())
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Resolve one line of input to at most one outcome.
    pub fn evaluate(
        &self,
        text: &str,
        rules: &RuleSet,
        discovered: &DiscoveryTracker,
        rng: &mut dyn RandomSource,
    ) -> Outcome {
        let normalized = normalize(text);

        if self.policy.is_reset_word(&normalized) {
            return Outcome::Reset;
        }

        let selected = rules.ordered_rules().find(|rule| {
            rule.pattern()
                .map(|pattern| pattern.is_match(&normalized))
                .unwrap_or(false)
        });

        match selected {
            Some(Rule::Reply(rule)) => Outcome::Reply(choose(&rule.replies, rng)),
            Some(Rule::Action(rule)) => self.resolve_action(rule, discovered),
            Some(Rule::Fallback(_)) | None => self.try_fallback(rules, rng),
        }
    }

    fn resolve_action(&self, rule: &ActionRule, discovered: &DiscoveryTracker) -> Outcome {
        match &rule.destination {
            Destination::Internal(path) => {
                if discovered.is_discovered(path) || !self.policy.reveal_before_navigate {
                    Outcome::Navigate {
                        target: path.clone(),
                        new_context: false,
                    }
                } else {
                    Outcome::Unlock(path.clone())
                }
            }
            Destination::External(url) => Outcome::Navigate {
                target: url.clone(),
                new_context: true,
            },
        }
    }

    fn try_fallback(&self, rules: &RuleSet, rng: &mut dyn RandomSource) -> Outcome {
        let Some(fallback) = rules.fallback() else {
            return Outcome::NoMatch;
        };

        let draw = rng.next_f64();
        if draw < self.policy.fallback_probability {
            Outcome::Reply(choose(&fallback.replies, rng))
        } else {
            log::debug!("Fallback skipped (draw {:.3})", draw);
            Outcome::NoMatch
        }
    }
}

/// Pick one reply variant uniformly.
pub fn choose(replies: &Replies, rng: &mut dyn RandomSource) -> String {
    let variants = replies.variants();
    if variants.len() == 1 {
        return variants[0].clone();
    }
    variants[rng.pick_index(variants.len())].clone()
}
