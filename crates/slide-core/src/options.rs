use std::sync::Arc;
use std::time::Duration;

use crate::hooks::{Effect, Gate, HookPair, HookSet, ProgressReporter};
use crate::settings::{Directions, SlideSettings};

/// Everything a controller reads on each operation: settings plus hooks.
///
/// Replaced as a whole through `configure()`; a transition keeps the
/// options it started with until it releases the lock.
#[derive(Debug, Clone, Default)]
pub struct SlideOptions {
    pub settings: SlideSettings,
    pub hooks: HookSet,
}

impl SlideOptions {
    /// Options for `count` items with default settings and hooks
    pub fn new(count: usize) -> Self {
        Self::from_settings(SlideSettings::with_count(count))
    }

    pub fn from_settings(settings: SlideSettings) -> Self {
        Self {
            settings,
            hooks: HookSet::default(),
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.settings.looping = looping;
        self
    }

    pub fn auto_play(mut self, auto_play: bool) -> Self {
        self.settings.auto_play = auto_play;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.settings.interval = interval;
        self
    }

    pub fn frame(mut self, frame: Duration) -> Self {
        self.settings.frame = frame;
        self
    }

    /// Drop backward navigation along with its hooks
    pub fn forward_only(mut self) -> Self {
        self.settings.directions = Directions::ForwardOnly;
        self.hooks.prev = HookPair::default();
        self
    }

    pub fn before_next(mut self, gate: Arc<dyn Gate>) -> Self {
        self.hooks.next.gate = gate;
        self
    }

    pub fn on_next(mut self, effect: Arc<dyn Effect>) -> Self {
        self.hooks.next.effect = effect;
        self
    }

    pub fn before_prev(mut self, gate: Arc<dyn Gate>) -> Self {
        self.hooks.prev.gate = gate;
        self
    }

    pub fn on_prev(mut self, effect: Arc<dyn Effect>) -> Self {
        self.hooks.prev.effect = effect;
        self
    }

    pub fn before_loop(mut self, gate: Arc<dyn Gate>) -> Self {
        self.hooks.looped.gate = gate;
        self
    }

    pub fn on_loop(mut self, effect: Arc<dyn Effect>) -> Self {
        self.hooks.looped.effect = effect;
        self
    }

    pub fn on_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.hooks.progress = Some(reporter);
        self
    }
}
