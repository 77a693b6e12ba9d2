//! Playback state machine
//!
//! Auto-play, the transition lock and the pause override are folded into a
//! single enumeration so that only intended combinations can be represented:
//!
//! | from                  | event            | to                            |
//! |-----------------------|------------------|-------------------------------|
//! | `Idle`                | `begin_cycle`    | `Scheduling`                  |
//! | `Scheduling`          | `end_cycle`      | `Idle`                        |
//! | `Idle`                | `acquire`        | `TransitionPending`           |
//! | `Scheduling`          | manual `acquire` | `TransitionPending`           |
//! | `Paused`              | manual `acquire` | `TransitionPending { paused }`|
//! | `TransitionPending`   | `release`        | `Idle` or `Paused`            |
//! | `Idle`/`Scheduling`   | `pause`          | `Paused`                      |
//! | `TransitionPending`   | `pause`/`resume` | same, with `paused` flipped   |
//! | `Paused`              | `resume`         | `Idle`                        |
//! | any                   | `clear`          | `Idle`                        |

use std::time::Duration;

use tokio::time::Instant;

use crate::navigation::Trigger;

/// Identifies one auto-play cycle; stale timer loops compare against it
pub type CycleId = u64;

/// Identifies one transition; the lock is only released by its owner
pub type Ticket = u64;

/// Why [`PlaybackState::acquire`] refused the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRefused {
    /// Another transition holds it
    Held,
    /// An automatic step arrived after auto-play was paused or restarted
    Suspended,
}

/// The controller's playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing running, not paused, no lock
    #[default]
    Idle,
    /// The auto-play loop is ticking
    Scheduling { cycle: CycleId, started: Instant },
    /// A transition holds the lock
    TransitionPending {
        ticket: Ticket,
        target: usize,
        /// Whether to land in `Paused` once the lock is released
        paused: bool,
    },
    /// Auto-play suppressed by the caller
    Paused,
}

impl PlaybackState {
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            PlaybackState::Paused | PlaybackState::TransitionPending { paused: true, .. }
        )
    }

    pub fn is_scheduling(&self) -> bool {
        matches!(self, PlaybackState::Scheduling { .. })
    }

    /// Target index of the in-flight transition, if any
    pub fn lock_target(&self) -> Option<usize> {
        match self {
            PlaybackState::TransitionPending { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn holds_ticket(&self, ticket: Ticket) -> bool {
        matches!(self, PlaybackState::TransitionPending { ticket: t, .. } if *t == ticket)
    }

    pub fn owns_cycle(&self, cycle: CycleId) -> bool {
        matches!(self, PlaybackState::Scheduling { cycle: c, .. } if *c == cycle)
    }

    /// Elapsed time of the running cycle
    pub fn elapsed(&self) -> Duration {
        match self {
            PlaybackState::Scheduling { started, .. } => started.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// `Idle -> Scheduling`; refused from every other state
    pub fn begin_cycle(&mut self, cycle: CycleId, started: Instant) -> bool {
        if *self != PlaybackState::Idle {
            return false;
        }
        *self = PlaybackState::Scheduling { cycle, started };
        true
    }

    /// `Scheduling -> Idle`. Returns whether a cycle was running.
    pub fn end_cycle(&mut self) -> bool {
        if self.is_scheduling() {
            *self = PlaybackState::Idle;
            true
        } else {
            false
        }
    }

    /// Take the transition lock and return the state it replaced.
    ///
    /// An automatic step is only accepted from `Idle`, the state its own
    /// cycle left behind.
    pub fn acquire(
        &mut self,
        ticket: Ticket,
        target: usize,
        trigger: Trigger,
    ) -> Result<PlaybackState, LockRefused> {
        let previous = *self;
        if matches!(previous, PlaybackState::TransitionPending { .. }) {
            return Err(LockRefused::Held);
        }
        if trigger.is_automatic() && previous != PlaybackState::Idle {
            return Err(LockRefused::Suspended);
        }
        let paused = previous == PlaybackState::Paused;
        *self = PlaybackState::TransitionPending {
            ticket,
            target,
            paused,
        };
        Ok(previous)
    }

    /// Release the lock if `ticket` still owns it
    pub fn release(&mut self, ticket: Ticket) -> bool {
        match *self {
            PlaybackState::TransitionPending { ticket: t, paused, .. } if t == ticket => {
                *self = if paused {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Idle
                };
                true
            }
            _ => false,
        }
    }

    /// Suppress auto-play. Returns whether a cycle was running.
    pub fn pause(&mut self) -> bool {
        match self {
            PlaybackState::TransitionPending { paused, .. } => {
                *paused = true;
                false
            }
            PlaybackState::Scheduling { .. } => {
                *self = PlaybackState::Paused;
                true
            }
            PlaybackState::Idle | PlaybackState::Paused => {
                *self = PlaybackState::Paused;
                false
            }
        }
    }

    /// Lift the pause override
    pub fn resume(&mut self) {
        match self {
            PlaybackState::TransitionPending { paused, .. } => *paused = false,
            PlaybackState::Paused => *self = PlaybackState::Idle,
            PlaybackState::Idle | PlaybackState::Scheduling { .. } => {}
        }
    }

    /// Drop every transient state, including a held lock
    pub fn clear(&mut self) {
        *self = PlaybackState::Idle;
    }
}

/// Read-only view of the auto-play side of the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPlayStatus {
    /// The timer loop is running
    pub active: bool,
    pub paused: bool,
    /// Time since the running cycle started
    pub elapsed: Duration,
    /// Interval after which the cycle fires
    pub interval: Duration,
}
