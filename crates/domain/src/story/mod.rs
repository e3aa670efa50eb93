//! Story progression logic: scene indexing and trigger state derivation

mod scene_index;
mod trigger_tracker;

pub use scene_index::{current_scene_id, latest_scene_id, scene_lines_for};
pub use trigger_tracker::{governing_transition, unreachable_triggers, TriggerState, TriggerTracker};
