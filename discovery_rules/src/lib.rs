//! # Discovery Rules
//!
//! The rule-set crate for the conversational discovery layer: the configuration
//! document, its load-time validation into tagged rule variants, navigation
//! destinations, and the engine policy. This crate holds no session state and
//! performs no network I/O.

pub mod destination;
pub mod error;
pub mod policy;
pub mod rule_set;

pub use destination::*;
pub use error::*;
pub use policy::*;
pub use rule_set::*;
