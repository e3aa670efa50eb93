//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Storage (could swap the in-memory store for a database or browser storage)
//! - Generation services (narration, condition check, hints, ideas, translation)
//! - User notifications
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Storage Port
// =============================================================================
pub use repos::KeyValueStore;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ConditionCheckPort, ConditionCheckRequest, GeneratedProject, HintPort, HintRequest,
    IdeaPort, IdeaRequest, ImageData, NarrationPort, Notice, NoticeLevel, NotifierPort,
    StepRequest, TranslationPort, ORIGINAL_LANGUAGE,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{
    MockConditionCheckPort, MockHintPort, MockIdeaPort, MockNarrationPort, MockNotifierPort,
    MockTranslationPort,
};

#[cfg(test)]
pub use repos::MockKeyValueStore;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{RepoError, ServiceError};
