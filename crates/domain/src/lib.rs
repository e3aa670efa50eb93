//! Plotline domain - cartridge model and story progression rules
//!
//! Everything here is pure and synchronous: trigger state derivation, scene
//! indexing over line history, and instruction batches over cartridges. The
//! engine crate drives these against external generation services.

extern crate self as plotline_domain;

pub mod aggregates;
pub mod common;
pub mod entities;
pub mod error;
pub mod ids;
pub mod instructions;
pub mod story;

pub use aggregates::Playthrough;

pub use entities::{
    Cartridge, Character, DisplayLine, LineKind, LineMeta, Place, ProfilePatch, Project, Scene,
    ScenePatch, ScriptLine, Settings, Sprite, Style, StylePatch, Trigger, TriggerKind,
    TriggerRecord, TriggerType, END_SCENE_ID,
};

pub use error::DomainError;

pub use ids::{CharacterId, PlaceId, PlaythroughId, ProjectId, SceneId, TriggerId};

pub use instructions::{
    apply_instructions, apply_raw_instructions, parse_batch, sanitize_trigger_ids, EntityKind,
    Instruction, InstructionError, Operation, RawInstruction, TriggerRename,
};

pub use story::{
    current_scene_id, governing_transition, latest_scene_id, scene_lines_for,
    unreachable_triggers, TriggerState, TriggerTracker,
};
