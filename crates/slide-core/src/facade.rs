//! Public surface handed to the rendering layer

use std::sync::Arc;

use crate::error::Result;
use crate::navigation::{
    Direction, NavigationController, NavigationOutcome, SlideContext, SlideSubscriber, Trigger,
};
use crate::options::SlideOptions;
use crate::state::AutoPlayStatus;

/// Handle to a slide controller.
///
/// Cheap to clone; every clone drives the same controller.
#[derive(Debug, Clone)]
pub struct Slides {
    controller: Arc<NavigationController>,
}

impl Slides {
    /// Wrap a new controller without starting auto-play
    pub fn new(options: SlideOptions) -> Self {
        Self {
            controller: NavigationController::new(options),
        }
    }

    /// Create a controller and start auto-play if it is enabled.
    ///
    /// Must be called from within a tokio runtime for auto-play to run.
    pub fn start(options: SlideOptions) -> Self {
        let slides = Self::new(options);
        slides.controller.start_auto_play();
        slides
    }

    /// Current index, `None` when there are no items
    pub fn current(&self) -> Option<usize> {
        self.controller.context(None).current
    }

    pub fn total(&self) -> usize {
        self.controller.count()
    }

    /// Whether the caller has paused auto-play
    pub fn pausing(&self) -> bool {
        self.controller.is_paused()
    }

    pub fn auto_play(&self) -> AutoPlayStatus {
        self.controller.auto_play_status()
    }

    pub fn context(&self) -> SlideContext {
        self.controller.context(None)
    }

    pub fn play(&self) {
        self.controller.play();
    }

    pub fn pause(&self) {
        self.controller.pause();
    }

    /// Step forward; resolves once the transition and its effect are done
    pub async fn next(&self) -> Result<NavigationOutcome> {
        self.controller.navigate(Direction::Forward, Trigger::Manual).await
    }

    /// Step backward; resolves once the transition and its effect are done
    pub async fn prev(&self) -> Result<NavigationOutcome> {
        self.controller.navigate(Direction::Backward, Trigger::Manual).await
    }

    pub fn restart(&self) {
        self.controller.restart();
    }

    pub fn reset(&self) {
        self.controller.reset();
    }

    /// Swap in new options; see [`NavigationController::configure`]
    pub fn configure(&self, options: SlideOptions) -> Result<()> {
        self.controller.configure(options)
    }

    pub fn subscribe(&self, subscriber: Arc<dyn SlideSubscriber>) {
        self.controller.add_subscriber(subscriber);
    }

    pub fn controller(&self) -> &Arc<NavigationController> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlideError;
    use crate::hooks::{effect_fn, gate_fn, progress_fn, Gate};
    use crate::navigation::{Transition, TransitionKind};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Records every hook invocation as `(hook name, transition)`
    #[derive(Clone, Default)]
    struct Journal {
        calls: Arc<Mutex<Vec<(&'static str, Transition)>>>,
        progress: Arc<Mutex<Vec<f64>>>,
    }

    impl Journal {
        fn instrument(&self, options: SlideOptions) -> SlideOptions {
            let hook = |name: &'static str| {
                let calls = self.calls.clone();
                gate_fn(move |t| {
                    calls.lock().push((name, *t));
                    true
                })
            };
            let effect = |name: &'static str| {
                let calls = self.calls.clone();
                effect_fn(move |t| {
                    calls.lock().push((name, t));
                    async { Ok(()) }
                })
            };
            let progress = self.progress.clone();

            options
                .before_next(hook("before_next"))
                .on_next(effect("on_next"))
                .before_prev(hook("before_prev"))
                .on_prev(effect("on_prev"))
                .before_loop(hook("before_loop"))
                .on_loop(effect("on_loop"))
                .on_progress(progress_fn(move |p| progress.lock().push(p)))
        }

        fn names(&self) -> Vec<&'static str> {
            self.calls.lock().iter().map(|(name, _)| *name).collect()
        }
    }

    fn manual(count: usize) -> SlideOptions {
        SlideOptions::new(count).auto_play(false)
    }

    #[tokio::test]
    async fn test_next_is_bounded_without_looping() {
        let slides = Slides::new(manual(3));

        let mut seen = vec![slides.current().unwrap()];
        for _ in 0..5 {
            slides.next().await.unwrap();
            seen.push(slides.current().unwrap());
        }

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(2));
    }

    #[tokio::test]
    async fn test_next_at_end_without_looping_runs_no_hooks() {
        let journal = Journal::default();
        let slides = Slides::new(journal.instrument(manual(5)));
        for _ in 0..4 {
            slides.next().await.unwrap();
        }
        journal.calls.lock().clear();

        let outcome = slides.next().await.unwrap();

        assert_eq!(outcome, NavigationOutcome::Boundary);
        assert_eq!(slides.current(), Some(4));
        assert!(journal.names().is_empty());
    }

    #[tokio::test]
    async fn test_next_at_end_with_looping_uses_loop_hooks() {
        let journal = Journal::default();
        let slides = Slides::new(journal.instrument(manual(2).looping(true)));
        slides.next().await.unwrap();
        journal.calls.lock().clear();

        let outcome = slides.next().await.unwrap();

        assert!(outcome.is_committed());
        assert_eq!(slides.current(), Some(0));
        assert_eq!(journal.names(), vec!["before_loop", "on_loop"]);
        let (_, transition) = journal.calls.lock()[0];
        assert_eq!(transition.previous, 1);
        assert_eq!(transition.target, 0);
        assert_eq!(transition.trigger, Trigger::Manual);
    }

    #[tokio::test]
    async fn test_prev_at_start_wraps_when_looping() {
        let journal = Journal::default();
        let slides = Slides::new(journal.instrument(manual(5).looping(true)));

        slides.prev().await.unwrap();

        assert_eq!(slides.current(), Some(4));
        assert_eq!(journal.names(), vec!["before_loop", "on_loop"]);
    }

    #[tokio::test]
    async fn test_prev_at_start_without_looping_is_noop() {
        let slides = Slides::new(manual(5));
        assert_eq!(slides.prev().await.unwrap(), NavigationOutcome::Boundary);
        assert_eq!(slides.current(), Some(0));
    }

    #[tokio::test]
    async fn test_prev_uses_prev_hooks() {
        let journal = Journal::default();
        let slides = Slides::new(journal.instrument(manual(5)));
        slides.next().await.unwrap();
        slides.next().await.unwrap();
        journal.calls.lock().clear();

        slides.prev().await.unwrap();

        assert_eq!(slides.current(), Some(1));
        assert_eq!(journal.names(), vec!["before_prev", "on_prev"]);
    }

    #[tokio::test]
    async fn test_forward_only_ignores_prev() {
        let slides = Slides::new(manual(5).looping(true).forward_only());
        slides.next().await.unwrap();

        assert_eq!(slides.prev().await.unwrap(), NavigationOutcome::Unsupported);
        assert_eq!(slides.current(), Some(1));
    }

    #[tokio::test]
    async fn test_gate_veto_keeps_index_and_skips_effect() {
        let effects = Arc::new(Mutex::new(0));
        let counter = effects.clone();
        let options = manual(5)
            .before_next(gate_fn(|_| false))
            .on_next(effect_fn(move |_| {
                *counter.lock() += 1;
                async { Ok(()) }
            }));
        let slides = Slides::new(options);

        let outcome = slides.next().await.unwrap();

        assert!(matches!(outcome, NavigationOutcome::Vetoed(_)));
        assert_eq!(slides.current(), Some(0));
        assert_eq!(*effects.lock(), 0);
        assert_eq!(slides.controller().playback().lock_target(), None);
    }

    /// Gate that tries to navigate again while its own transition holds the lock
    struct ReentrantGate {
        slides: Arc<Mutex<Option<Slides>>>,
        nested: Arc<Mutex<Vec<NavigationOutcome>>>,
    }

    #[async_trait]
    impl Gate for ReentrantGate {
        async fn allow(&self, _transition: &Transition) -> bool {
            let slides = self.slides.lock().clone();
            if let Some(slides) = slides {
                let next = slides.next().await.unwrap();
                let prev = slides.prev().await.unwrap();
                self.nested.lock().extend([next, prev]);
            }
            true
        }
    }

    #[tokio::test]
    async fn test_navigation_while_locked_is_dropped() {
        let handle = Arc::new(Mutex::new(None));
        let nested = Arc::new(Mutex::new(Vec::new()));
        let gate = ReentrantGate {
            slides: handle.clone(),
            nested: nested.clone(),
        };
        let slides = Slides::new(manual(5).looping(true).before_next(Arc::new(gate)));
        *handle.lock() = Some(slides.clone());

        let outcome = slides.next().await.unwrap();

        assert!(outcome.is_committed());
        assert_eq!(slides.current(), Some(1));
        assert_eq!(
            *nested.lock(),
            vec![NavigationOutcome::Busy, NavigationOutcome::Busy]
        );
        handle.lock().take();
    }

    #[tokio::test]
    async fn test_failing_effect_propagates_and_releases_lock() {
        let options = manual(5).on_next(effect_fn(|_| async { Err(anyhow::anyhow!("card stuck")) }));
        let slides = Slides::new(options);

        let err = slides.next().await.unwrap_err();

        assert!(matches!(
            err,
            SlideError::Effect {
                kind: TransitionKind::Next,
                ..
            }
        ));
        assert_eq!(slides.current(), Some(1));
        assert_eq!(slides.controller().playback().lock_target(), None);
        assert!(slides.next().await.is_err());
        assert_eq!(slides.current(), Some(2));
    }

    #[tokio::test]
    async fn test_empty_deck() {
        let slides = Slides::new(manual(0).looping(true));
        assert_eq!(slides.current(), None);
        assert_eq!(slides.total(), 0);
        assert_eq!(slides.next().await.unwrap(), NavigationOutcome::Empty);
        assert_eq!(slides.prev().await.unwrap(), NavigationOutcome::Empty);
    }

    #[tokio::test]
    async fn test_zero_step_is_ignored() {
        let slides = Slides::new(manual(3));
        let outcome = slides.controller().navigate_step(0, Trigger::Manual).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Unsupported);
        assert_eq!(slides.current(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_play_advances_through_next_hooks() {
        let journal = Journal::default();
        let options = journal.instrument(
            SlideOptions::new(5)
                .looping(true)
                .interval(Duration::from_millis(3000)),
        );
        let slides = Slides::start(options);
        assert!(slides.auto_play().active);

        tokio::time::sleep(Duration::from_millis(3100)).await;

        assert_eq!(slides.current(), Some(1));
        assert_eq!(journal.names(), vec!["before_next", "on_next"]);
        let (_, transition) = journal.calls.lock()[0];
        assert_eq!(transition.trigger, Trigger::Automatic);

        let progress = journal.progress.lock().clone();
        let full = progress.iter().position(|p| *p == 1.0).unwrap();
        assert_eq!(progress[full + 1], 0.0);
        assert!(progress[..=full].windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_play_loops_back_to_start() {
        let journal = Journal::default();
        let options = journal.instrument(
            SlideOptions::new(2)
                .looping(true)
                .interval(Duration::from_millis(1000)),
        );
        let slides = Slides::start(options);

        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(slides.current(), Some(0));
        assert_eq!(
            journal.names(),
            vec!["before_next", "on_next", "before_loop", "on_loop"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_and_play_resumes() {
        let slides = Slides::start(SlideOptions::new(5).interval(Duration::from_millis(3000)));

        slides.pause();
        assert!(slides.pausing());
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(slides.current(), Some(0));
        assert!(!slides.auto_play().active);

        slides.play();
        assert!(!slides.pausing());
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(slides.current(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_navigation_preempts_scheduler() {
        let journal = Journal::default();
        let options = journal.instrument(SlideOptions::new(5).interval(Duration::from_millis(3000)));
        let slides = Slides::start(options);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let before = journal.progress.lock().len();
        slides.next().await.unwrap();
        assert_eq!(slides.current(), Some(1));

        // Preempting the cycle and committing both report 0
        assert_eq!(&journal.progress.lock()[before..], &[0.0, 0.0]);

        // The restarted cycle needs a whole interval again
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(slides.current(), Some(1));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(slides.current(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_as_cycle_ends_skips_automatic_step() {
        let slides = Slides::new(SlideOptions::new(5).interval(Duration::from_millis(1000)));
        let handle = slides.clone();
        let full = AtomicBool::new(false);
        slides
            .configure(
                SlideOptions::new(5)
                    .interval(Duration::from_millis(1000))
                    .on_progress(progress_fn(move |p| {
                        if p == 1.0 {
                            full.store(true, Ordering::SeqCst);
                        } else if p == 0.0 && full.swap(false, Ordering::SeqCst) {
                            // The cycle has just ended, its step is not taken yet
                            handle.pause();
                        }
                    })),
            )
            .unwrap();
        assert!(slides.controller().start_auto_play());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(slides.pausing());
        assert_eq!(slides.current(), Some(0));
        assert!(!slides.auto_play().active);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(slides.current(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_mid_frame_leaves_progress_at_zero() {
        let slides = Slides::new(SlideOptions::new(5).interval(Duration::from_millis(1000)));
        let handle = slides.clone();
        let reported = Arc::new(Mutex::new(Vec::new()));
        let log = reported.clone();
        let paused = AtomicBool::new(false);
        slides
            .configure(
                SlideOptions::new(5)
                    .interval(Duration::from_millis(1000))
                    .on_progress(progress_fn(move |p| {
                        // Pause lands before this frame's value is drawn
                        if p >= 0.5 && !paused.swap(true, Ordering::SeqCst) {
                            handle.pause();
                        }
                        log.lock().push(p);
                    })),
            )
            .unwrap();
        assert!(slides.controller().start_auto_play());

        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert!(slides.pausing());
        assert_eq!(slides.current(), Some(0));
        let reported = reported.lock();
        assert!(reported.iter().any(|p| *p >= 0.5));
        assert_eq!(reported.last().copied(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_while_paused_stays_paused() {
        let slides = Slides::start(SlideOptions::new(5).interval(Duration::from_millis(1000)));
        slides.pause();

        slides.next().await.unwrap();
        assert_eq!(slides.current(), Some(1));
        assert!(slides.pausing());

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(slides.current(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_start_without_hooks() {
        let journal = Journal::default();
        let slides = Slides::start(journal.instrument(
            SlideOptions::new(5).interval(Duration::from_millis(1000)),
        ));
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(slides.current(), Some(2));
        slides.pause();
        journal.calls.lock().clear();

        slides.reset();

        assert_eq!(slides.current(), Some(0));
        assert!(!slides.pausing());
        assert!(!slides.auto_play().active);
        assert!(journal.names().is_empty());
        assert_eq!(journal.progress.lock().last().copied(), Some(0.0));

        // Reset does not restart auto-play
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(slides.current(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_clears_pause_and_plays_from_start() {
        let slides = Slides::start(SlideOptions::new(5).interval(Duration::from_millis(1000)));
        slides.next().await.unwrap();
        slides.next().await.unwrap();
        slides.pause();

        slides.restart();

        assert_eq!(slides.current(), Some(0));
        assert!(!slides.pausing());
        assert!(slides.auto_play().active);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(slides.current(), Some(1));
    }

    #[tokio::test]
    async fn test_restart_supersedes_transition_in_gate() {
        let handle: Arc<Mutex<Option<Slides>>> = Arc::new(Mutex::new(None));
        let inner = handle.clone();
        let slides = Slides::new(manual(5).before_next(gate_fn(move |t| {
            if t.target == 3 {
                if let Some(slides) = inner.lock().as_ref() {
                    slides.restart();
                }
            }
            true
        })));
        *handle.lock() = Some(slides.clone());

        slides.next().await.unwrap();
        slides.next().await.unwrap();
        let outcome = slides.next().await.unwrap();

        assert!(matches!(outcome, NavigationOutcome::Superseded(t) if t.target == 3));
        assert_eq!(slides.current(), Some(0));

        // The lock did not outlive the superseded transition
        assert!(slides.next().await.unwrap().is_committed());
        assert_eq!(slides.current(), Some(1));
        handle.lock().take();
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_toggles_auto_play() {
        let slides = Slides::start(SlideOptions::new(5).interval(Duration::from_millis(1000)));
        assert!(slides.auto_play().active);

        slides
            .configure(SlideOptions::new(5).auto_play(false).interval(Duration::from_millis(1000)))
            .unwrap();
        assert!(!slides.auto_play().active);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(slides.current(), Some(0));

        slides
            .configure(SlideOptions::new(5).interval(Duration::from_millis(1000)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(slides.current(), Some(1));
    }

    #[tokio::test]
    async fn test_configure_rejects_new_count() {
        let slides = Slides::new(manual(5));
        let err = slides.configure(manual(6)).unwrap_err();
        assert!(matches!(
            err,
            SlideError::CountChanged {
                expected: 5,
                found: 6
            }
        ));
    }

    #[tokio::test]
    async fn test_transition_keeps_options_it_started_with() {
        let swapped = Arc::new(Mutex::new(Vec::new()));
        let slides = Slides::new(manual(5));

        let record = swapped.clone();
        let inner = slides.clone();
        let options = manual(5).on_next(effect_fn(move |t| {
            // Replace the hooks while this effect is running
            inner.configure(manual(5)).unwrap();
            record.lock().push(t.target);
            async { Ok(()) }
        }));
        slides.configure(options).unwrap();

        slides.next().await.unwrap();
        slides.next().await.unwrap();

        assert_eq!(*swapped.lock(), vec![1]);
        assert_eq!(slides.current(), Some(2));
    }

    struct Watcher {
        seen: Mutex<Vec<SlideContext>>,
    }

    impl SlideSubscriber for Watcher {
        fn on_slide_change(&self, context: &SlideContext) {
            self.seen.lock().push(context.clone());
        }
    }

    #[tokio::test]
    async fn test_subscribers_follow_index() {
        let slides = Slides::new(manual(3));
        let watcher = Arc::new(Watcher {
            seen: Mutex::new(Vec::new()),
        });
        slides.subscribe(watcher.clone());

        slides.next().await.unwrap();
        slides.reset();

        let seen = watcher.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].current, Some(1));
        assert_eq!(seen[0].trigger, Some(Trigger::Manual));
        assert_eq!(seen[1].current, Some(0));
        assert_eq!(seen[1].trigger, None);
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let slides = Slides::new(manual(3));
        let gone = Arc::new(Watcher {
            seen: Mutex::new(Vec::new()),
        });
        let live = Arc::new(Watcher {
            seen: Mutex::new(Vec::new()),
        });
        slides.subscribe(gone.clone());
        slides.subscribe(live.clone());
        drop(gone);

        slides.next().await.unwrap();
        assert_eq!(slides.current(), Some(1));
        assert_eq!(slides.controller().subscriber_count(), 1);
        assert_eq!(live.seen.lock().len(), 1);
    }
}
