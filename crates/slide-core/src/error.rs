use thiserror::Error;

use crate::navigation::TransitionKind;

/// Errors that can occur while driving a slide controller
#[derive(Error, Debug)]
pub enum SlideError {
    #[error("{kind} effect failed: {source}")]
    Effect {
        kind: TransitionKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("item count is fixed at {expected}, got {found}")]
    CountChanged { expected: usize, found: usize },

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T, E = SlideError> = std::result::Result<T, E>;
