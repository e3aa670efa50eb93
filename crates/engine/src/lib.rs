//! Plotline engine library.
//!
//! Async orchestration around the pure `plotline-domain` crate.
//!
//! ## Structure
//!
//! - `repositories/` - Storage wrappers for projects and playthroughs
//! - `use_cases/` - Story progression, authoring and playthrough lifecycle
//! - `infrastructure/` - Port traits, configuration and adapters
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Test fixtures shared across module tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
