//! # Discovery Core
//!
//! The engine behind the conversational discovery layer. It turns a plain
//! text-input form into a turn-aware game layered over an ASCII-art endpoint.
//!
//! ## Core Components
//!
//! - **session**: the persisted session record and its store
//! - **tracker**: which internal destinations have been discovered
//! - **matcher**: first-match-wins rule dispatch
//! - **turn**: the turn-progression state machine (pure `step` function)
//! - **idle**: delayed ambient messages during conversation
//! - **presentation**: output surfaces and the ASCII endpoint client
//! - **engine**: the async driver that threads state through one submission
//!
//! ## Design Philosophy
//!
//! - **Degrade, never abort**: every failure falls back to ASCII-only behavior
//! - **Pure core**: state transitions are a function of the persisted counter
//! - **Injected randomness**: every random choice goes through [`RandomSource`]

pub mod engine;
pub mod error;
pub mod idle;
pub mod loader;
pub mod matcher;
pub mod presentation;
pub mod random;
pub mod session;
pub mod tracker;
pub mod turn;

pub use engine::*;
pub use error::*;
pub use idle::*;
pub use loader::*;
pub use matcher::*;
pub use presentation::*;
pub use random::*;
pub use session::*;
pub use tracker::*;
pub use turn::*;
