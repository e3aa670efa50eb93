//! Repository modules - Data access wrappers around the storage port.
//!
//! Each repository owns its key namespace and the JSON encoding of one
//! aggregate, so use cases only ever see domain types.

pub mod playthroughs;
pub mod projects;

pub use playthroughs::PlaythroughRepository;
pub use projects::ProjectRepository;
