use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a single navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Towards higher indices
    Forward,
    /// Towards lower indices
    Backward,
}

impl Direction {
    /// Map a signed step onto a direction; a zero step has none
    pub fn from_step(step: i32) -> Option<Self> {
        match step {
            0 => None,
            s if s > 0 => Some(Direction::Forward),
            _ => Some(Direction::Backward),
        }
    }
}

/// Classification of a transition, derived from where the candidate index lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    Next,
    Prev,
    Loop,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Next => write!(f, "next"),
            TransitionKind::Prev => write!(f, "prev"),
            TransitionKind::Loop => write!(f, "loop"),
        }
    }
}

/// Who asked for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// A user command (`next()` / `prev()`)
    Manual,
    /// The auto-play scheduler
    Automatic,
}

impl Trigger {
    pub fn is_automatic(self) -> bool {
        matches!(self, Trigger::Automatic)
    }
}

/// A planned transition, handed to every hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Index the transition moves to
    pub target: usize,
    /// Index before the transition
    pub previous: usize,
    pub trigger: Trigger,
}

/// Why a step could not be planned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// No items to navigate
    Empty,
    /// Edge of the collection reached with looping disabled
    Boundary,
}

/// Apply `direction` to `current` within `[0, count)`.
///
/// Overflow wraps to `0` and underflow wraps to `count - 1` when `looping`
/// is set; both directions wrap symmetrically.
pub fn plan_step(
    current: usize,
    count: usize,
    direction: Direction,
    looping: bool,
    trigger: Trigger,
) -> Result<Transition, Blocked> {
    if count == 0 {
        return Err(Blocked::Empty);
    }

    let candidate = match direction {
        Direction::Forward => current.checked_add(1).filter(|idx| *idx < count),
        Direction::Backward => current.checked_sub(1),
    };

    let (kind, target) = match (candidate, direction) {
        (Some(idx), Direction::Forward) => (TransitionKind::Next, idx),
        (Some(idx), Direction::Backward) => (TransitionKind::Prev, idx),
        (None, _) if !looping => return Err(Blocked::Boundary),
        (None, Direction::Forward) => (TransitionKind::Loop, 0),
        (None, Direction::Backward) => (TransitionKind::Loop, count - 1),
    };

    Ok(Transition {
        kind,
        target,
        previous: current,
        trigger,
    })
}
