//! Idle reinforcement - ambient messages after the user goes quiet.
//!
//! At most one idle timer is pending. Every interaction cancels it and, during
//! conversation, arms a new one. A timer that fires does not re-arm itself.

use discovery_rules::{EnginePolicy, IdleMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::presentation::Surface;
use crate::random::RandomSource;
use crate::turn::Phase;

/// Owns the single pending idle timer.
pub struct IdleScheduler {
    surface: Arc<dyn Surface>,
    min_delay: Duration,
    max_delay: Duration,
    /// Bumped on every cancel; a timer only fires if its generation is current.
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl IdleScheduler {
    pub fn new(surface: Arc<dyn Surface>, policy: &EnginePolicy) -> Self {
        let (min_delay, max_delay) = policy.idle_bounds();
        Self {
            surface,
            min_delay,
            max_delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Cancel the pending timer and, in conversation, schedule a new one.
    ///
    /// Must be called from within a tokio runtime. Returns the delay of the
    /// new timer.
    pub fn rearm(
        &mut self,
        phase: Phase,
        messages: &[IdleMessage],
        rng: &mut dyn RandomSource,
    ) -> Option<Duration> {
        self.cancel();

        if phase != Phase::Conversation || messages.is_empty() {
            return None;
        }

        let message = &messages[rng.pick_index(messages.len())];
        let delay = message
            .delay
            .unwrap_or_else(|| rng.duration_between(self.min_delay, self.max_delay));

        let armed = self.generation.load(Ordering::SeqCst);
        let current = Arc::clone(&self.generation);
        let surface = Arc::clone(&self.surface);
        let text = message.text.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == armed {
                log::debug!("Idle message after {:?}", delay);
                surface.show_idle(&text);
            }
        }));

        Some(delay)
    }

    /// Whether a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for IdleScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
