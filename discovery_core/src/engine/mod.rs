//! Engine - the async driver around the pure turn machine.
//!
//! One submission runs strictly in sequence:
//! 1. **Load**: read the session record from the store
//! 2. **Step**: count the interaction and decide the effect
//! 3. **Act**: call the ASCII endpoint or update the surface
//! 4. **Persist**: write the record back (or clear it on reset)
//! 5. **Re-arm**: cancel and reschedule the idle timer

use discovery_rules::{EnginePolicy, HostConfig, RuleSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::idle::IdleScheduler;
use crate::loader::{load_rule_set, RuleSource};
use crate::matcher::RuleMatcher;
use crate::presentation::{AsciiRenderer, HttpAsciiRenderer, Surface};
use crate::random::{RandomSource, ThreadRandom};
use crate::session::{FileStore, MemoryStore, SessionState, SessionStateStore};
use crate::turn::{step, Effect, Phase};

/// The discovery engine for one session.
pub struct Engine {
    rules: Arc<RuleSet>,
    matcher: RuleMatcher,
    store: Box<dyn SessionStateStore>,
    renderer: Arc<dyn AsciiRenderer>,
    surface: Arc<dyn Surface>,
    idle: IdleScheduler,
    rng: Box<dyn RandomSource>,
}

impl Engine {
    pub fn new(
        rules: Arc<RuleSet>,
        policy: EnginePolicy,
        store: Box<dyn SessionStateStore>,
        renderer: Arc<dyn AsciiRenderer>,
        surface: Arc<dyn Surface>,
    ) -> Self {
        let idle = IdleScheduler::new(Arc::clone(&surface), &policy);
        Self {
            rules,
            matcher: RuleMatcher::new(policy),
            store,
            renderer,
            surface,
            idle,
            rng: Box::new(ThreadRandom::new()),
        }
    }

    /// Replace the random source, e.g. with a scripted one.
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Build an engine from host configuration, fetching the rule set once.
    pub async fn from_config(config: &HostConfig, surface: Arc<dyn Surface>) -> Self {
        let client = reqwest::Client::new();
        let rules = load_rule_set(&RuleSource::from_config(config), &client).await;
        let store: Box<dyn SessionStateStore> = match &config.session_file {
            Some(path) => Box::new(FileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        let renderer = HttpAsciiRenderer::with_client(
            client,
            config.ascii_url(),
            config.policy.max_input_len,
        );
        Self::new(
            Arc::new(rules),
            config.policy.clone(),
            store,
            Arc::new(renderer),
            surface,
        )
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn policy(&self) -> &EnginePolicy {
        self.matcher.policy()
    }

    /// The persisted session as the next submission will see it.
    pub fn session(&self) -> SessionState {
        self.store.load()
    }

    pub fn phase(&self) -> Phase {
        self.session().phase(self.policy())
    }

    pub fn idle_pending(&self) -> bool {
        self.idle.is_pending()
    }

    /// Page load: draw discovered nav links and arm the idle timer for the
    /// restored phase.
    pub fn start(&mut self) {
        let mut state = self.store.load();
        if self.prune_discoveries(&mut state) > 0 {
            self.persist(&state);
        }
        log::info!(
            "Session {} resumed at turn {}",
            state.session_id,
            state.interaction_count
        );
        self.render_nav(&state);
        self.rearm_idle(&state);
    }

    /// Process one submitted line and return the effect that was carried out.
    pub async fn submit(&mut self, input: &str) -> Effect {
        let mut state = self.store.load();
        self.prune_discoveries(&mut state);

        let effect = step(
            &mut state,
            input,
            &self.rules,
            &self.matcher,
            self.rng.as_mut(),
        );

        match &effect {
            Effect::Ignore => return Effect::Ignore,
            Effect::Reset => {
                self.idle.cancel();
                if let Err(e) = self.store.clear() {
                    log::warn!("Failed to clear session record: {}", e);
                }
                log::info!("Session reset");
                self.surface.reload();
                self.render_nav(&state);
                return Effect::Reset;
            }
            Effect::RenderAscii(text) => {
                let art = render_ascii(self.renderer.as_ref(), text).await;
                self.surface.show_ascii(&art);
            }
            Effect::Announce(text) | Effect::Reply(text) => self.surface.show_reply(text),
            Effect::Reveal { path, label } => {
                log::info!("Discovered {}", path);
                self.surface.reveal(path, label);
                self.render_nav(&state);
            }
            Effect::Navigate {
                target,
                new_context,
            } => self.surface.navigate(target, *new_context),
        }

        self.persist(&state);
        self.rearm_idle(&state);
        effect
    }

    /// Drop discoveries the current rules can no longer produce.
    ///
    /// An empty rule set is what a failed load degrades to, so the record is
    /// left alone rather than losing progress to a transient failure.
    fn prune_discoveries(&self, state: &mut SessionState) -> usize {
        if self.rules.is_empty() {
            return 0;
        }
        let dropped = state.retain_known(&self.rules);
        if dropped > 0 {
            log::info!("Dropped {} discovered paths no longer in the rule set", dropped);
        }
        dropped
    }

    fn persist(&self, state: &SessionState) {
        if let Err(e) = self.store.save(state) {
            log::warn!("Failed to save session record: {}", e);
        }
    }

    fn render_nav(&self, state: &SessionState) {
        let slots = self.rules.nav_slots();
        let fragment = if slots.is_empty() {
            state.discovered.render()
        } else {
            state.discovered.render_slots(slots)
        };
        self.surface.render_nav(&fragment);
    }

    fn rearm_idle(&mut self, state: &SessionState) {
        let phase = state.phase(self.matcher.policy());
        self.idle
            .rearm(phase, self.rules.idle_messages(), self.rng.as_mut());
    }
}

/// ASCII art for `text`, or `text` itself if the endpoint lets us down.
async fn render_ascii(renderer: &dyn AsciiRenderer, text: &str) -> String {
    match renderer.render(text).await {
        Ok(art) => art,
        Err(e) => {
            log::warn!("ASCII rendering degraded to raw input: {}", e);
            text.to_string()
        }
    }
}

/// Result of handing input to a shared engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted(Effect),
    /// Another submission was still in flight; this one was dropped.
    Busy,
}

/// Shared handle used by the host's event binding.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<Engine>>,
}

impl EngineHandle {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn start(&self) {
        self.inner.lock().await.start();
    }

    /// Submit input unless a previous submission is still being processed.
    pub async fn submit(&self, input: &str) -> Submission {
        match self.inner.try_lock() {
            Ok(mut engine) => Submission::Accepted(engine.submit(input).await),
            Err(_) => {
                log::debug!("Ignoring submission while another is in flight");
                Submission::Busy
            }
        }
    }

    /// Run a closure against the engine once it is idle.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let mut engine = self.inner.lock().await;
        f(&mut engine)
    }
}

/// Bind the engine to an input control.
///
/// Each line is submitted on its own task so input keeps flowing while a
/// request is pending; overlapping submissions are dropped. The returned task
/// finishes once the input closes and every accepted submission has completed.
/// Without an input control there is nothing to attach to and `None` is
/// returned.
pub fn attach(
    handle: EngineHandle,
    input: Option<mpsc::Receiver<String>>,
) -> Option<JoinHandle<()>> {
    let Some(mut input) = input else {
        log::info!("No input control on the page; nothing to attach to");
        return None;
    };

    Some(tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                line = input.recv() => match line {
                    Some(line) => {
                        let handle = handle.clone();
                        in_flight.spawn(async move { handle.submit(&line).await });
                    }
                    None => break,
                },
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Ok(Submission::Busy) = done {
                        log::info!("Dropped input submitted while another was in flight");
                    }
                }
            }
        }
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                log::warn!("Submission task failed: {}", e);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::presentation::HtmlSurface;
    use crate::random::ScriptedRandom;
    use async_trait::async_trait;

    struct EchoArt;

    #[async_trait]
    impl AsciiRenderer for EchoArt {
        async fn render(&self, text: &str) -> Result<String, RenderError> {
            Ok(format!("ART({})", text))
        }
    }

    struct BrokenArt;

    #[async_trait]
    impl AsciiRenderer for BrokenArt {
        async fn render(&self, _text: &str) -> Result<String, RenderError> {
            Err(RenderError::Status(503))
        }
    }

    fn rules() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::from_json_str(
                r#"{
                    "rules": [
                        { "match": "help", "reply": "Type anything." },
                        { "match": "essay", "action": "/essays" }
                    ],
                    "idle": ["still there?"],
                    "turn_message": "Like my art?"
                }"#,
            )
            .unwrap(),
        )
    }

    fn engine_with(renderer: Arc<dyn AsciiRenderer>) -> (Engine, Arc<HtmlSurface>) {
        let surface = Arc::new(HtmlSurface::new());
        let engine = Engine::new(
            rules(),
            EnginePolicy::default(),
            Box::new(MemoryStore::new()),
            renderer,
            surface.clone(),
        )
        .with_random(Box::new(ScriptedRandom::constant(0.9)));
        (engine, surface)
    }

    #[tokio::test]
    async fn test_submission_flow() {
        let (mut engine, surface) = engine_with(Arc::new(EchoArt));

        engine.submit("a").await;
        assert_eq!(surface.output(), "<pre>ART(a)</pre>");
        assert!(!engine.idle_pending());

        engine.submit("b").await;
        engine.submit("c").await;
        assert_eq!(surface.output(), "<p>Like my art?</p>");
        assert!(!engine.idle_pending());

        engine.submit("help").await;
        assert_eq!(surface.output(), "<p>Type anything.</p>");
        assert_eq!(engine.session().interaction_count, 4);
        assert_eq!(engine.phase(), Phase::Conversation);
        assert!(engine.idle_pending());
    }

    #[tokio::test]
    async fn test_renderer_failure_echoes_input() {
        let (mut engine, surface) = engine_with(Arc::new(BrokenArt));

        let effect = engine.submit("hello").await;

        assert_eq!(effect, Effect::RenderAscii("hello".into()));
        assert_eq!(surface.output(), "<pre>hello</pre>");
        assert_eq!(engine.session().interaction_count, 1);
    }

    #[tokio::test]
    async fn test_blank_input_changes_nothing() {
        let (mut engine, surface) = engine_with(Arc::new(EchoArt));

        assert_eq!(engine.submit("   ").await, Effect::Ignore);
        assert!(surface.output().is_empty());
        assert_eq!(engine.session().interaction_count, 0);
    }

    #[tokio::test]
    async fn test_reveal_updates_nav_then_navigates() {
        let (mut engine, surface) = engine_with(Arc::new(EchoArt));
        for input in ["a", "b", "c"] {
            engine.submit(input).await;
        }

        engine.submit("essay").await;
        let view = surface.view();
        assert_eq!(view.revealed, vec!["/essays".to_string()]);
        assert!(view.nav.contains(r#"data-path="/essays""#));
        assert!(view.location.is_none());

        engine.submit("essay").await;
        assert_eq!(surface.view().location.as_deref(), Some("/essays"));
    }

    #[tokio::test]
    async fn test_reset_clears_store_and_reloads() {
        let (mut engine, surface) = engine_with(Arc::new(EchoArt));
        for input in ["a", "b", "c", "essay"] {
            engine.submit(input).await;
        }
        assert!(engine.idle_pending());

        assert_eq!(engine.submit("restart").await, Effect::Reset);

        let state = engine.session();
        assert_eq!(state.interaction_count, 0);
        assert!(state.discovered.is_empty());
        assert_eq!(engine.phase(), Phase::Early);
        assert!(!engine.idle_pending());
        let view = surface.view();
        assert_eq!(view.reloads, 1);
        assert!(view.nav.is_empty());
    }

    #[tokio::test]
    async fn test_start_restores_nav_and_idle() {
        let store = MemoryStore::with_record(
            r#"{ "interaction_count": 7, "discovered": ["/essays", "/removed"] }"#,
        );
        let surface = Arc::new(HtmlSurface::new());
        let mut engine = Engine::new(
            rules(),
            EnginePolicy::default(),
            Box::new(store),
            Arc::new(EchoArt),
            surface.clone(),
        );

        engine.start();

        assert!(surface.view().nav.contains("/essays"));
        assert!(!surface.view().nav.contains("/removed"));
        assert!(!engine.session().discovered.is_discovered("/removed"));
        assert!(engine.idle_pending());
    }

    #[tokio::test]
    async fn test_handle_rejects_overlapping_submissions() {
        let (engine, _surface) = engine_with(Arc::new(EchoArt));
        let handle = EngineHandle::new(engine);

        let held = handle.inner.lock().await;
        assert_eq!(handle.submit("a").await, Submission::Busy);
        drop(held);

        assert_eq!(
            handle.submit("a").await,
            Submission::Accepted(Effect::RenderAscii("a".into()))
        );
        let count = handle
            .with_engine(|engine| engine.session().interaction_count)
            .await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_attach_without_input_is_a_no_op() {
        let (engine, _surface) = engine_with(Arc::new(EchoArt));
        assert!(attach(EngineHandle::new(engine), None).is_none());
    }

    #[tokio::test]
    async fn test_attach_feeds_submissions() {
        let (engine, surface) = engine_with(Arc::new(EchoArt));
        let handle = EngineHandle::new(engine);
        let (tx, rx) = mpsc::channel(4);

        let task = attach(handle.clone(), Some(rx)).unwrap();
        tx.send("first".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();

        let count = handle
            .with_engine(|engine| engine.session().interaction_count)
            .await;
        assert_eq!(count, 1);
        assert_eq!(surface.output(), "<pre>ART(first)</pre>");
    }

    struct SlowArt;

    #[async_trait]
    impl AsciiRenderer for SlowArt {
        async fn render(&self, text: &str) -> Result<String, RenderError> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(format!("ART({})", text))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_waits_for_in_flight_submission() {
        let (engine, surface) = engine_with(Arc::new(SlowArt));
        let handle = EngineHandle::new(engine);
        let (tx, rx) = mpsc::channel(4);

        let task = attach(handle.clone(), Some(rx)).unwrap();
        tx.send("first".to_string()).await.unwrap();
        tx.send("second".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();

        // Nothing is still holding the engine once the binding has finished.
        let engine = handle.inner.try_lock().expect("no submission in flight");
        assert!(engine.session().interaction_count >= 1);
        assert!(surface.output().starts_with("<pre>ART("));
    }
}
