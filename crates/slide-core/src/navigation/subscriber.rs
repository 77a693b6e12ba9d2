//! Slide subscriber trait

use super::SlideContext;

/// Trait for components that need to respond to index changes
pub trait SlideSubscriber: Send + Sync {
    /// Called after a transition commits, and on `restart()` / `reset()`
    fn on_slide_change(&self, context: &SlideContext);
}
