//! Navigation controller implementation

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use super::{plan_step, Blocked, Direction, SlideContext, SlideSubscriber, Transition, Trigger};
use crate::autoplay::{AutoPlayHost, AutoPlayScheduler};
use crate::error::{Result, SlideError};
use crate::hooks::HookPipeline;
use crate::options::SlideOptions;
use crate::settings::Directions;
use crate::state::{AutoPlayStatus, CycleId, LockRefused, PlaybackState, Ticket};

/// What a call to [`NavigationController::navigate`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The index moved and the effect completed
    Committed(Transition),
    /// The gate refused the transition
    Vetoed(Transition),
    /// A hard reset took the lock away before the index was committed
    Superseded(Transition),
    /// Another transition holds the lock; the call was dropped
    Busy,
    /// An automatic step found auto-play paused or restarted
    Skipped,
    /// Edge reached with looping disabled
    Boundary,
    /// Direction not supported by this configuration
    Unsupported,
    /// Nothing to navigate
    Empty,
}

impl NavigationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, NavigationOutcome::Committed(_))
    }
}

/// Navigation state stored internally
#[derive(Debug, Default)]
struct ControllerState {
    index: usize,
    playback: PlaybackState,
    last_ticket: Ticket,
}

/// The slide navigation state machine.
///
/// Owns the current index, the transition lock and the auto-play loop. All
/// mutation goes through [`navigate`](Self::navigate) or the playback
/// commands; internal locks are never held across an `.await` or a hook call.
pub struct NavigationController {
    this: Weak<NavigationController>,
    state: Mutex<ControllerState>,
    options: RwLock<Arc<SlideOptions>>,
    subscribers: RwLock<Vec<Weak<dyn SlideSubscriber>>>,
    scheduler: AutoPlayScheduler,
}

/// Releases the transition lock when a transition ends, however it ends
struct TransitionGuard<'a> {
    controller: &'a NavigationController,
    ticket: Ticket,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.controller.finish_transition(self.ticket);
    }
}

impl NavigationController {
    /// Create a new controller. Auto-play is not started until
    /// [`start_auto_play`](Self::start_auto_play) is called.
    pub fn new(options: SlideOptions) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            state: Mutex::new(ControllerState::default()),
            options: RwLock::new(Arc::new(options)),
            subscribers: RwLock::new(Vec::new()),
            scheduler: AutoPlayScheduler::new(),
        })
    }

    /// Snapshot of the current options
    pub fn options(&self) -> Arc<SlideOptions> {
        self.options.read().clone()
    }

    /// Replace the options. The item count is fixed for the controller's
    /// lifetime; transitions already in flight keep their old snapshot.
    pub fn configure(&self, options: SlideOptions) -> Result<()> {
        let previous = self.options();
        if options.settings.count != previous.settings.count {
            return Err(SlideError::CountChanged {
                expected: previous.settings.count,
                found: options.settings.count,
            });
        }

        let auto_play = options.settings.auto_play;
        *self.options.write() = Arc::new(options);

        if auto_play != previous.settings.auto_play {
            if auto_play {
                self.start_auto_play();
            } else {
                self.stop_auto_play();
            }
        }
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.state.lock().index
    }

    pub fn count(&self) -> usize {
        self.options.read().settings.count
    }

    pub fn playback(&self) -> PlaybackState {
        self.state.lock().playback
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().playback.is_paused()
    }

    pub fn auto_play_status(&self) -> AutoPlayStatus {
        let interval = self.options.read().settings.interval;
        let playback = self.playback();
        AutoPlayStatus {
            active: playback.is_scheduling(),
            paused: playback.is_paused(),
            elapsed: playback.elapsed(),
            interval,
        }
    }

    /// Get the context subscribers receive
    pub fn context(&self, trigger: Option<Trigger>) -> SlideContext {
        let total = self.count();
        let index = self.index();
        SlideContext {
            current: (total > 0).then_some(index),
            total,
            trigger,
        }
    }

    /// Move one step in `direction`.
    ///
    /// Runs the gate, commits the index, resets progress and awaits the
    /// effect. Effect errors are returned after the lock has been released
    /// and auto-play has been given a chance to restart.
    pub async fn navigate(&self, direction: Direction, trigger: Trigger) -> Result<NavigationOutcome> {
        let options = self.options();
        let settings = &options.settings;

        if direction == Direction::Backward && settings.directions == Directions::ForwardOnly {
            tracing::debug!("Backward navigation is not supported by this deck");
            return Ok(NavigationOutcome::Unsupported);
        }

        let (transition, ticket, preempted) = {
            let mut state = self.state.lock();
            let transition = match plan_step(state.index, settings.count, direction, settings.looping, trigger) {
                Ok(transition) => transition,
                Err(Blocked::Empty) => return Ok(NavigationOutcome::Empty),
                Err(Blocked::Boundary) => {
                    tracing::debug!("Boundary reached at {} without looping", state.index);
                    return Ok(NavigationOutcome::Boundary);
                }
            };

            let ticket = state.last_ticket + 1;
            let replaced = match state.playback.acquire(ticket, transition.target, trigger) {
                Ok(replaced) => replaced,
                Err(LockRefused::Held) => {
                    tracing::debug!(
                        "{:?} {} dropped, transition to {:?} in flight",
                        trigger,
                        transition.kind,
                        state.playback.lock_target()
                    );
                    return Ok(NavigationOutcome::Busy);
                }
                Err(LockRefused::Suspended) => {
                    tracing::debug!("Automatic {} skipped, auto play no longer idle", transition.kind);
                    return Ok(NavigationOutcome::Skipped);
                }
            };
            state.last_ticket = ticket;

            // Manual navigation preempts a ticking scheduler
            if replaced.is_scheduling() {
                self.scheduler.cancel();
            }
            (transition, ticket, replaced.is_scheduling())
        };

        let guard = TransitionGuard {
            controller: self,
            ticket,
        };
        let pipeline = HookPipeline::new(&options.hooks);
        if preempted {
            pipeline.progress(0.0);
        }

        tracing::debug!(
            "{} {} -> {} ({:?})",
            transition.kind,
            transition.previous,
            transition.target,
            transition.trigger
        );

        if !pipeline.before(&transition).await {
            drop(guard);
            return Ok(NavigationOutcome::Vetoed(transition));
        }

        {
            let mut state = self.state.lock();
            if !state.playback.holds_ticket(ticket) {
                tracing::debug!("{} to {} superseded by reset", transition.kind, transition.target);
                drop(state);
                drop(guard);
                return Ok(NavigationOutcome::Superseded(transition));
            }
            state.index = transition.target;
        }

        self.scheduler.cancel();
        pipeline.progress(0.0);
        tracing::info!("Slide {} -> {} ({})", transition.previous, transition.target, transition.kind);
        self.notify_subscribers(Some(trigger));

        let result = pipeline.after(&transition).await;
        drop(guard);

        result.map_err(|source| SlideError::Effect {
            kind: transition.kind,
            source,
        })?;
        Ok(NavigationOutcome::Committed(transition))
    }

    /// Navigate by a signed step; `0` is ignored
    pub async fn navigate_step(&self, step: i32, trigger: Trigger) -> Result<NavigationOutcome> {
        match Direction::from_step(step) {
            Some(direction) => self.navigate(direction, trigger).await,
            None => Ok(NavigationOutcome::Unsupported),
        }
    }

    /// Start the auto-play loop.
    ///
    /// Does nothing when auto-play is disabled, there are no items, a loop is
    /// already running, a transition holds the lock or the caller paused.
    pub fn start_auto_play(&self) -> bool {
        let options = self.options();
        let settings = &options.settings;
        if !settings.auto_play || settings.count == 0 {
            return false;
        }

        let mut state = self.state.lock();
        if state.playback != PlaybackState::Idle {
            return false;
        }

        let cycle = self.scheduler.next_cycle();
        let started = Instant::now();
        let host: Weak<dyn AutoPlayHost> = self.this.clone();
        if !self
            .scheduler
            .launch(host, cycle, started, settings.interval, settings.frame)
        {
            return false;
        }
        state.playback.begin_cycle(cycle, started);
        tracing::debug!("Start auto play (cycle {})", cycle);
        true
    }

    /// Stop the auto-play loop and report zero progress. Idempotent.
    pub fn stop_auto_play(&self) {
        let stopped = self.state.lock().playback.end_cycle();
        self.scheduler.cancel();
        self.emit_progress(0.0);
        if stopped {
            tracing::debug!("Stop auto play");
        }
    }

    /// Clear the pause override and start auto-play
    pub fn play(&self) {
        self.state.lock().playback.resume();
        self.start_auto_play();
    }

    /// Set the pause override and stop auto-play
    pub fn pause(&self) {
        self.state.lock().playback.pause();
        self.scheduler.cancel();
        self.emit_progress(0.0);
        tracing::debug!("Auto play paused");
    }

    /// Back to the first item with a fresh auto-play cycle.
    ///
    /// Like [`reset`](Self::reset), takes the lock away from a transition in
    /// flight, so one still in its gate ends up superseded.
    pub fn restart(&self) {
        self.reset();
        self.start_auto_play();
    }

    /// Hard reset: first item, no lock, no pause, no running loop. No hooks
    /// run and auto-play is not restarted.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.playback.clear();
            state.index = 0;
        }
        self.scheduler.cancel();
        self.emit_progress(0.0);
        self.notify_subscribers(None);
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn SlideSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    /// Number of subscribers still alive
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn owns_cycle(&self, cycle: CycleId) -> bool {
        self.state.lock().playback.owns_cycle(cycle)
    }

    fn finish_transition(&self, ticket: Ticket) {
        if !self.state.lock().playback.release(ticket) {
            tracing::debug!("Lock of transition {} already taken over", ticket);
        }
        self.start_auto_play();
    }

    /// Report progress through the live options
    fn emit_progress(&self, progress: f64) {
        let options = self.options();
        HookPipeline::new(&options.hooks).progress(progress);
    }

    /// Notify all subscribers of an index change
    fn notify_subscribers(&self, trigger: Option<Trigger>) {
        let context = self.context(trigger);
        let live: Vec<Arc<dyn SlideSubscriber>> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        for subscriber in live {
            subscriber.on_slide_change(&context);
        }
    }
}

#[async_trait]
impl AutoPlayHost for NavigationController {
    fn report_progress(&self, cycle: CycleId, progress: f64) -> bool {
        if !self.owns_cycle(cycle) {
            return false;
        }
        self.emit_progress(progress);

        // Whoever ended the cycle meanwhile may have reported 0 before us
        if !self.owns_cycle(cycle) {
            self.emit_progress(0.0);
            return false;
        }
        true
    }

    async fn cycle_elapsed(&self, cycle: CycleId) {
        {
            let mut state = self.state.lock();
            if !state.playback.owns_cycle(cycle) {
                return;
            }
            state.playback.end_cycle();
            self.scheduler.detach();
        }
        self.emit_progress(0.0);

        if let Err(e) = self.navigate(Direction::Forward, Trigger::Automatic).await {
            tracing::warn!("Automatic transition failed: {}", e);
        }
    }
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("NavigationController")
            .field("index", &state.index)
            .field("playback", &state.playback)
            .finish_non_exhaustive()
    }
}
