//! Lifecycle hooks run around each transition
//!
//! Every transition kind has a [`HookPair`]: a [`Gate`] consulted before the
//! index changes, which may abandon the transition, and an [`Effect`] awaited
//! after the index has changed, which may extend the transition with
//! asynchronous work such as an animation. A [`ProgressReporter`] receives the
//! auto-play progress.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::navigation::{Transition, TransitionKind};

/// Decides whether a transition may proceed
#[async_trait]
pub trait Gate: Send + Sync {
    /// Return `false` to abandon the transition
    async fn allow(&self, transition: &Transition) -> bool;
}

/// Work performed after a transition has been committed
#[async_trait]
pub trait Effect: Send + Sync {
    async fn run(&self, transition: &Transition) -> anyhow::Result<()>;
}

/// Receives auto-play progress in `0.0..=1.0`
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: f64);
}

/// Gate that lets every transition through
#[derive(Debug, Clone, Copy, Default)]
pub struct Permit;

#[async_trait]
impl Gate for Permit {
    async fn allow(&self, _transition: &Transition) -> bool {
        true
    }
}

/// Effect that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffect;

#[async_trait]
impl Effect for NoEffect {
    async fn run(&self, _transition: &Transition) -> anyhow::Result<()> {
        Ok(())
    }
}

struct GateFn<F>(F);

#[async_trait]
impl<F> Gate for GateFn<F>
where
    F: Fn(&Transition) -> bool + Send + Sync,
{
    async fn allow(&self, transition: &Transition) -> bool {
        (self.0)(transition)
    }
}

struct EffectFn<F>(F);

#[async_trait]
impl<F, Fut> Effect for EffectFn<F>
where
    F: Fn(Transition) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, transition: &Transition) -> anyhow::Result<()> {
        (self.0)(*transition).await
    }
}

struct ProgressFn<F>(F);

impl<F> ProgressReporter for ProgressFn<F>
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, progress: f64) {
        (self.0)(progress)
    }
}

/// Create a gate from a synchronous predicate
pub fn gate_fn<F>(f: F) -> Arc<dyn Gate>
where
    F: Fn(&Transition) -> bool + Send + Sync + 'static,
{
    Arc::new(GateFn(f))
}

/// Create an effect from a closure returning a future
pub fn effect_fn<F, Fut>(f: F) -> Arc<dyn Effect>
where
    F: Fn(Transition) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(EffectFn(f))
}

/// Create a progress reporter from a closure
pub fn progress_fn<F>(f: F) -> Arc<dyn ProgressReporter>
where
    F: Fn(f64) + Send + Sync + 'static,
{
    Arc::new(ProgressFn(f))
}

/// Before/after hooks for one transition kind
#[derive(Clone)]
pub struct HookPair {
    pub gate: Arc<dyn Gate>,
    pub effect: Arc<dyn Effect>,
}

impl Default for HookPair {
    fn default() -> Self {
        Self {
            gate: Arc::new(Permit),
            effect: Arc::new(NoEffect),
        }
    }
}

impl HookPair {
    /// Replace the gate
    pub fn with_gate(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replace the effect
    pub fn with_effect(mut self, effect: Arc<dyn Effect>) -> Self {
        self.effect = effect;
        self
    }
}

impl std::fmt::Debug for HookPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookPair").finish_non_exhaustive()
    }
}

/// All hooks of a controller
#[derive(Clone, Default)]
pub struct HookSet {
    pub next: HookPair,
    pub prev: HookPair,
    pub looped: HookPair,
    pub progress: Option<Arc<dyn ProgressReporter>>,
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Dispatches a transition to the hooks configured for its kind
pub struct HookPipeline<'a> {
    hooks: &'a HookSet,
}

impl<'a> HookPipeline<'a> {
    pub fn new(hooks: &'a HookSet) -> Self {
        Self { hooks }
    }

    /// The hook pair responsible for `kind`
    pub fn resolve(&self, kind: TransitionKind) -> &'a HookPair {
        match kind {
            TransitionKind::Next => &self.hooks.next,
            TransitionKind::Prev => &self.hooks.prev,
            TransitionKind::Loop => &self.hooks.looped,
        }
    }

    /// Run the gate for `transition`
    pub async fn before(&self, transition: &Transition) -> bool {
        let allowed = self.resolve(transition.kind).gate.allow(transition).await;
        if !allowed {
            tracing::debug!(
                "{} to {} vetoed by gate",
                transition.kind,
                transition.target
            );
        }
        allowed
    }

    /// Run the effect for `transition`
    pub async fn after(&self, transition: &Transition) -> anyhow::Result<()> {
        self.resolve(transition.kind).effect.run(transition).await
    }

    /// Forward a progress value to the reporter, if any
    pub fn progress(&self, progress: f64) {
        if let Some(reporter) = &self.hooks.progress {
            reporter.report(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Trigger;
    use parking_lot::Mutex;

    fn transition(kind: TransitionKind) -> Transition {
        Transition {
            kind,
            target: 1,
            previous: 0,
            trigger: Trigger::Manual,
        }
    }

    #[tokio::test]
    async fn test_defaults_permit_and_do_nothing() {
        let hooks = HookSet::default();
        let pipeline = HookPipeline::new(&hooks);

        for kind in [TransitionKind::Next, TransitionKind::Prev, TransitionKind::Loop] {
            assert!(pipeline.before(&transition(kind)).await);
            assert!(pipeline.after(&transition(kind)).await.is_ok());
        }
        pipeline.progress(0.5);
    }

    #[tokio::test]
    async fn test_resolves_by_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let hooks = HookSet {
            looped: HookPair::default()
                .with_gate(gate_fn(|t| t.target != 1))
                .with_effect(effect_fn(move |t| {
                    record.lock().push(t.kind);
                    async { Ok(()) }
                })),
            ..HookSet::default()
        };
        let pipeline = HookPipeline::new(&hooks);

        assert!(pipeline.before(&transition(TransitionKind::Next)).await);
        assert!(!pipeline.before(&transition(TransitionKind::Loop)).await);

        pipeline.after(&transition(TransitionKind::Next)).await.unwrap();
        pipeline.after(&transition(TransitionKind::Loop)).await.unwrap();
        assert_eq!(*seen.lock(), vec![TransitionKind::Loop]);
    }

    #[tokio::test]
    async fn test_progress_reporter_receives_values() {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let hooks = HookSet {
            progress: Some(progress_fn(move |p| sink.lock().push(p))),
            ..HookSet::default()
        };

        HookPipeline::new(&hooks).progress(0.25);
        assert_eq!(*values.lock(), vec![0.25]);
    }
}
