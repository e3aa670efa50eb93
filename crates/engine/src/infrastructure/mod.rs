//! Infrastructure layer - ports and their adapters.

pub mod clock;
pub mod config;
pub mod memory_store;
pub mod notifier;
pub mod offline;
pub mod ports;
