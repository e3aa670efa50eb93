//! External service port traits (narration, condition check, hints, ideas,
//! translation, notifications).
//!
//! Prompt construction and response parsing live behind these ports; the engine
//! only sees the request/response shapes below.

use std::collections::BTreeMap;

use async_trait::async_trait;
use plotline_domain::{Cartridge, DisplayLine, Playthrough, Settings, Trigger, TriggerId};

use super::error::ServiceError;

/// Language code meaning "leave text as written".
pub const ORIGINAL_LANGUAGE: &str = "Original";

// =============================================================================
// Narration
// =============================================================================

/// Input for one narration step.
#[derive(Debug, Clone)]
pub struct StepRequest {
    /// Full snapshot: project, line history and cursor.
    pub playthrough: Playthrough,
    /// Triggers drained for this step, in activation order.
    pub activated_triggers: Vec<Trigger>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrationPort: Send + Sync {
    /// Generate the next lines of the story.
    ///
    /// Scene transitions come back pre-expanded: a marker line for the new scene
    /// followed by its opening lines.
    async fn generate_step(&self, request: StepRequest) -> Result<Vec<DisplayLine>, ServiceError>;
}

// =============================================================================
// Condition check
// =============================================================================

#[derive(Debug, Clone)]
pub struct ConditionCheckRequest {
    /// Candidate action triggers, id to natural-language condition.
    pub candidates: BTreeMap<TriggerId, String>,
    /// Lines of the scene the candidates belong to.
    pub scene_lines: Vec<DisplayLine>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConditionCheckPort: Send + Sync {
    /// Ids whose condition the latest player turn satisfied.
    async fn check_conditions(
        &self,
        request: ConditionCheckRequest,
    ) -> Result<Vec<TriggerId>, ServiceError>;
}

// =============================================================================
// Hints
// =============================================================================

#[derive(Debug, Clone)]
pub struct HintRequest {
    pub lines: Vec<DisplayLine>,
    /// Conditions of possible triggers, secret ones excluded.
    pub conditions: Vec<String>,
    pub style_prompt: String,
    pub player_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HintPort: Send + Sync {
    async fn generate_hint(&self, request: HintRequest) -> Result<DisplayLine, ServiceError>;
}

// =============================================================================
// Idea / cartridge generation
// =============================================================================

/// Image data for multimodal requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Base64-encoded image data
    pub data: String,
    /// MIME type (e.g., "image/png")
    pub media_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct IdeaRequest {
    pub image: Option<ImageData>,
    pub prompt: Option<String>,
    pub selected_idea_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedProject {
    pub settings: Settings,
    pub cartridge: Cartridge,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdeaPort: Send + Sync {
    async fn generate_project(&self, request: IdeaRequest) -> Result<GeneratedProject, ServiceError>;
}

// =============================================================================
// Translation
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationPort: Send + Sync {
    /// Translate `texts` into `language`; the result has the same length and order.
    async fn translate(&self, texts: Vec<String>, language: String) -> Result<Vec<String>, ServiceError>;
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A user-visible message (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait NotifierPort: Send + Sync {
    fn notify(&self, notice: Notice);
}
