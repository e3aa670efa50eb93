//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Use cases orchestrate
//! repositories and ports; domain rules stay in `plotline-domain`.

pub mod authoring;
pub mod playthrough;
pub mod story;

pub use authoring::{AuthoringError, AuthoringUseCases, EditOutcome};
pub use playthrough::{PlaythroughError, PlaythroughOps};
pub use story::{InputOutcome, StepOutcome, StoryDirector, StoryError, StoryServices};
