//! Rule Set - the validated, read-only rule configuration.
//!
//! A rule document is validated exactly once, at load time:
//! 1. **Compile**: every pattern is compiled case-insensitively
//! 2. **Classify**: each entry becomes a reply, action, or fallback rule
//! 3. **Skip**: entries that cannot be used are dropped and logged, never fatal
//!
//! Matching code only ever sees [`Rule`] variants and never inspects raw data.

mod document;

pub use document::*;

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::destination::{Destination, NavSlot};
use crate::error::RuleSetError;

/// Reply variants for a rule. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replies(Vec<String>);

impl Replies {
    /// Wrap reply variants, rejecting an empty set.
    pub fn new(variants: Vec<String>) -> Option<Self> {
        if variants.is_empty() {
            None
        } else {
            Some(Self(variants))
        }
    }

    pub fn variants(&self) -> &[String] {
        &self.0
    }
}

/// A rule that answers with text.
#[derive(Debug, Clone)]
pub struct ReplyRule {
    pub pattern: Regex,
    pub replies: Replies,
}

/// A rule that points somewhere.
#[derive(Debug, Clone)]
pub struct ActionRule {
    pub pattern: Regex,
    pub destination: Destination,
}

/// The reply used when no ordered rule matches.
#[derive(Debug, Clone)]
pub struct FallbackRule {
    pub replies: Replies,
}

/// A validated rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Reply(ReplyRule),
    Action(ActionRule),
    Fallback(FallbackRule),
}

impl Rule {
    /// The match pattern, if this rule takes part in ordered matching.
    pub fn pattern(&self) -> Option<&Regex> {
        match self {
            Rule::Reply(rule) => Some(&rule.pattern),
            Rule::Action(rule) => Some(&rule.pattern),
            Rule::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Rule::Fallback(_))
    }
}

/// An ambient message shown after inactivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleMessage {
    pub text: String,
    /// Fixed delay. `None` means the scheduler draws one from its bounds.
    pub delay: Option<Duration>,
}

impl IdleMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl From<RawIdleMessage> for IdleMessage {
    fn from(raw: RawIdleMessage) -> Self {
        match raw {
            RawIdleMessage::Text(text) => IdleMessage::new(text),
            RawIdleMessage::Timed { delay_ms, text } => {
                IdleMessage::new(text).with_delay(Duration::from_millis(delay_ms))
            }
        }
    }
}

/// A document entry dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    /// Position in the document's `rules` array.
    pub index: usize,
    pub reason: String,
}

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, RuleSetError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(DocumentFormat::Json),
            Some("toml") => Ok(DocumentFormat::Toml),
            other => Err(RuleSetError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Pick a format from an HTTP content type, defaulting to JSON.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// The complete validated rule configuration. Immutable once built.
#[derive(Debug, Clone)]
pub struct RuleSet {
    turn_announcement: String,
    rules: Vec<Rule>,
    idle: Vec<IdleMessage>,
    nav_slots: Vec<NavSlot>,
    skipped: Vec<SkippedRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl RuleSet {
    /// Announcement used when the document does not set `turn_message`.
    pub const DEFAULT_TURN_MESSAGE: &'static str = "Do you like my art?";

    /// A rule set with no rules. Matching against it never fires.
    pub fn empty() -> Self {
        Self {
            turn_announcement: Self::DEFAULT_TURN_MESSAGE.to_string(),
            rules: Vec::new(),
            idle: Vec::new(),
            nav_slots: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Validate a raw document.
    pub fn from_document(document: RuleDocument) -> Self {
        let mut rules = Vec::with_capacity(document.rules.len());
        let mut skipped = Vec::new();

        for (index, raw) in document.rules.into_iter().enumerate() {
            match validate_rule(raw) {
                Ok(rule) => rules.push(rule),
                Err(reason) => {
                    log::warn!("Skipping rule #{}: {}", index, reason);
                    skipped.push(SkippedRule { index, reason });
                }
            }
        }

        Self {
            turn_announcement: document
                .turn_message
                .unwrap_or_else(|| Self::DEFAULT_TURN_MESSAGE.to_string()),
            rules,
            idle: document.idle.into_iter().map(IdleMessage::from).collect(),
            nav_slots: document.nav_slots,
            skipped,
        }
    }

    /// Parse and validate a document in the given format.
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, RuleSetError> {
        let document: RuleDocument = match format {
            DocumentFormat::Json => serde_json::from_str(text)?,
            DocumentFormat::Toml => toml::from_str(text)?,
        };
        Ok(Self::from_document(document))
    }

    pub fn from_json_str(text: &str) -> Result<Self, RuleSetError> {
        Self::parse(text, DocumentFormat::Json)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuleSetError> {
        Self::parse(text, DocumentFormat::Toml)
    }

    /// Load a rule document from a local file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, format)
    }

    pub fn turn_announcement(&self) -> &str {
        &self.turn_announcement
    }

    /// All valid rules in document order, fallbacks included.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that take part in first-match-wins evaluation.
    pub fn ordered_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !rule.is_fallback())
    }

    /// The fallback rule. When several are declared the last one wins.
    pub fn fallback(&self) -> Option<&FallbackRule> {
        self.rules.iter().rev().find_map(|rule| match rule {
            Rule::Fallback(fallback) => Some(fallback),
            _ => None,
        })
    }

    pub fn idle_messages(&self) -> &[IdleMessage] {
        &self.idle
    }

    pub fn nav_slots(&self) -> &[NavSlot] {
        &self.nav_slots
    }

    /// Entries dropped during validation.
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }

    /// Every internal path some action rule can reveal.
    pub fn internal_destinations(&self) -> BTreeSet<&str> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                Rule::Action(ActionRule {
                    destination: Destination::Internal(path),
                    ..
                }) => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Label for an internal path, preferring a declared nav slot.
    pub fn label_for(&self, path: &str) -> String {
        self.nav_slots
            .iter()
            .find(|slot| slot.path == path)
            .map(|slot| slot.label.clone())
            .unwrap_or_else(|| crate::destination::label_for_path(path).to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Turn one raw entry into a rule, or explain why it cannot be used.
fn validate_rule(raw: RawRule) -> Result<Rule, String> {
    let replies = match raw.reply {
        Some(reply) => Some(
            Replies::new(reply.into_variants()).ok_or_else(|| "empty reply list".to_string())?,
        ),
        None => None,
    };

    if raw.fallback {
        let replies = replies.ok_or_else(|| "fallback rule without a reply".to_string())?;
        return Ok(Rule::Fallback(FallbackRule { replies }));
    }

    let pattern = compile_pattern(&raw.pattern)?;

    // Action takes precedence when a rule carries both.
    if let Some(action) = raw.action {
        let destination = Destination::parse(&action)
            .ok_or_else(|| format!("action '{}' is neither a path nor a URL", action))?;
        return Ok(Rule::Action(ActionRule {
            pattern,
            destination,
        }));
    }

    match replies {
        Some(replies) => Ok(Rule::Reply(ReplyRule { pattern, replies })),
        None => Err("rule has neither a reply nor an action".to_string()),
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, String> {
    if pattern.is_empty() {
        return Err("empty match pattern".to_string());
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| format!("pattern '{}' failed to compile: {}", pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleSet {
        RuleSet::from_json_str(
            r#"{
                "turn_message": "Like my art?",
                "rules": [
                    { "match": "^help$", "reply": "Type anything." },
                    { "match": "essay|blog", "action": "/essays" },
                    { "match": "github", "action": "https://github.com" },
                    { "match": "([unclosed", "reply": "never" },
                    { "match": "nothing" },
                    { "fallback": true, "reply": ["first fallback"] },
                    { "match": "dupe", "reply": [] },
                    { "match": "cave", "action": "cave" },
                    { "fallback": true, "reply": ["hm.", "go on."] }
                ],
                "idle": ["anyone?"],
                "nav_slots": [{ "path": "/essays", "label": "Essays" }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_rules_are_classified() {
        let rules = sample();

        assert_eq!(rules.turn_announcement(), "Like my art?");
        assert!(matches!(rules.rules()[0], Rule::Reply(_)));
        assert!(matches!(rules.rules()[1], Rule::Action(_)));
        assert!(matches!(rules.rules()[2], Rule::Action(_)));
        assert_eq!(rules.ordered_rules().count(), 3);
    }

    #[test]
    fn test_invalid_rules_are_skipped_not_fatal() {
        let rules = sample();
        let skipped: Vec<usize> = rules.skipped().iter().map(|s| s.index).collect();

        assert_eq!(skipped, vec![3, 4, 6, 7]);
        assert!(rules.skipped()[0].reason.contains("failed to compile"));
    }

    #[test]
    fn test_last_fallback_wins() {
        let rules = sample();
        let fallback = rules.fallback().unwrap();
        assert_eq!(fallback.replies.variants(), ["hm.", "go on."]);
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let rules = sample();
        let pattern = rules.rules()[1].pattern().unwrap();
        assert!(pattern.is_match("My BLOG please"));
    }

    #[test]
    fn test_action_wins_over_reply() {
        let rules = RuleSet::from_json_str(
            r#"{ "rules": [{ "match": "x", "reply": "text", "action": "/x" }] }"#,
        )
        .unwrap();
        assert!(matches!(rules.rules()[0], Rule::Action(_)));
    }

    #[test]
    fn test_internal_destinations_exclude_urls() {
        let rules = sample();
        let paths: Vec<&str> = rules.internal_destinations().into_iter().collect();
        assert_eq!(paths, vec!["/essays"]);
    }

    #[test]
    fn test_labels_prefer_nav_slots() {
        let rules = sample();
        assert_eq!(rules.label_for("/essays"), "Essays");
        assert_eq!(rules.label_for("/cave"), "cave");
    }

    #[test]
    fn test_default_turn_message() {
        let rules = RuleSet::from_json_str("{}").unwrap();
        assert_eq!(rules.turn_announcement(), RuleSet::DEFAULT_TURN_MESSAGE);
        assert!(rules.is_empty());
        assert!(rules.fallback().is_none());
    }

    #[test]
    fn test_toml_document() {
        let rules = RuleSet::from_toml_str(
            r#"
            turn_message = "Well?"
            idle = ["psst", { delay_ms = 1000, text = "hey" }]

            [[rules]]
            match = "hello"
            reply = ["hi", "hey"]
            "#,
        )
        .unwrap();

        assert_eq!(rules.turn_announcement(), "Well?");
        assert_eq!(rules.rules().len(), 1);
        assert_eq!(rules.idle_messages()[0], IdleMessage::new("psst"));
        assert_eq!(
            rules.idle_messages()[1].delay,
            Some(Duration::from_millis(1000))
        );
    }

    #[test]
    fn test_bundled_rules_are_valid() {
        let rules =
            RuleSet::from_json_str(include_str!("../../../data/discovery-rules.json")).unwrap();
        assert!(rules.skipped().is_empty());
        assert!(rules.fallback().is_some());
        assert_eq!(rules.nav_slots().len(), 3);
        for slot in rules.nav_slots() {
            assert!(rules.internal_destinations().contains(slot.path.as_str()));
        }
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(RuleSet::from_json_str("{ not json").is_err());
        assert!(RuleSet::from_json_str(r#"{ "rules": 5 }"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{ "rules": [{ "match": "a", "reply": "b" }] }"#).unwrap();

        let rules = RuleSet::load(&path).unwrap();
        assert_eq!(rules.rules().len(), 1);

        let bad = dir.path().join("rules.yaml");
        std::fs::write(&bad, "").unwrap();
        assert!(matches!(
            RuleSet::load(&bad),
            Err(RuleSetError::UnsupportedFormat(_))
        ));
    }
}
