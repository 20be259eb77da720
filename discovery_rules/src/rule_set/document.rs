//! The raw rule document as it appears on disk or over the wire.

use serde::{Deserialize, Serialize};

use crate::destination::NavSlot;

/// Unvalidated rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<RawRule>,

    #[serde(default)]
    pub idle: Vec<RawIdleMessage>,

    #[serde(default)]
    pub turn_message: Option<String>,

    #[serde(default)]
    pub nav_slots: Vec<NavSlot>,
}

/// One rule entry before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(rename = "match", alias = "pattern", default)]
    pub pattern: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<RawReply>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default)]
    pub fallback: bool,
}

/// A reply is either a single string or a set of variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReply {
    One(String),
    Many(Vec<String>),
}

impl RawReply {
    pub fn into_variants(self) -> Vec<String> {
        match self {
            RawReply::One(text) => vec![text],
            RawReply::Many(texts) => texts,
        }
    }
}

/// Idle messages come as bare strings or with their own delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawIdleMessage {
    Text(String),
    Timed { delay_ms: u64, text: String },
}
