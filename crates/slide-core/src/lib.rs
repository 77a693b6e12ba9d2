//! Core functionality for slide and carousel controllers
//!
//! This crate drives a single current index over an ordered collection of
//! items: manual and automatic forward/backward/loop transitions, a
//! single-slot lock so that only one transition is ever in flight, and
//! lifecycle hooks run in a fixed order around every transition. It renders
//! nothing; a rendering layer reads [`Slides`] and supplies hooks.

pub mod autoplay;
pub mod error;
pub mod facade;
pub mod hooks;
pub mod navigation;
pub mod options;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use autoplay::AutoPlayScheduler;
pub use error::{Result, SlideError};
pub use facade::Slides;
pub use hooks::{
    effect_fn, gate_fn, progress_fn, Effect, Gate, HookPair, HookPipeline, HookSet, NoEffect,
    Permit, ProgressReporter,
};
pub use navigation::{
    Direction, NavigationController, NavigationOutcome, SlideContext, SlideSubscriber,
    Transition, TransitionKind, Trigger,
};
pub use options::SlideOptions;
pub use settings::{Directions, SlideSettings};
pub use state::{AutoPlayStatus, LockRefused, PlaybackState};
