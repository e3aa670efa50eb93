//! Aggregate roots - domain objects that own their related data
//!
//! Fields stay private; behavior is exposed through methods that keep the
//! aggregate's invariants.

pub mod playthrough;

pub use playthrough::Playthrough;
