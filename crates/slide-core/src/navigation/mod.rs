mod engine;
mod position;
mod subscriber;

pub use engine::{NavigationController, NavigationOutcome};
pub use position::{plan_step, Blocked, Direction, Transition, TransitionKind, Trigger};
pub use subscriber::SlideSubscriber;

/// Context passed to subscribers when the current index changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideContext {
    /// Current index, `None` when there is nothing to show
    pub current: Option<usize>,
    pub total: usize,
    /// What moved the index; `None` for hard resets
    pub trigger: Option<Trigger>,
}
