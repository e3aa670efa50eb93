//! Story progression use cases.
//!
//! [`StoryDirector`] owns the active playthrough and drives it forward through
//! the generation services: one step at a time, on player input, and eagerly
//! ahead of the reader.

mod derive;
mod director;

use std::sync::Arc;

use plotline_domain::DomainError;

use crate::infrastructure::ports::{
    ConditionCheckPort, HintPort, NarrationPort, NotifierPort, ServiceError, TranslationPort,
};

pub use director::{CursorMoved, InputOutcome, StepOutcome, StoryDirector};

/// Collaborators the director calls out to.
#[derive(Clone)]
pub struct StoryServices {
    pub narration: Arc<dyn NarrationPort>,
    pub conditions: Arc<dyn ConditionCheckPort>,
    pub hints: Arc<dyn HintPort>,
    pub translation: Arc<dyn TranslationPort>,
    pub notifier: Arc<dyn NotifierPort>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("Story generation failed: {0}")]
    Generation(#[source] ServiceError),
    #[error("Story generation returned no lines")]
    EmptyGeneration,
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
