//! Common utility functions shared across the domain.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **Minimal dependencies** - serde only

pub mod lenient;
pub mod string;

pub use string::none_if_empty;
