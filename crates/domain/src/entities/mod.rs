//! Domain entities - authored cartridge content and story history records

pub mod cartridge;
pub mod character;
pub mod display_line;
pub mod place;
pub mod project;
pub mod scene;
pub mod trigger;

pub use cartridge::{Cartridge, Style, StylePatch};
pub use character::{Character, ProfilePatch, Sprite};
pub use display_line::{DisplayLine, LineKind, LineMeta};
pub use place::Place;
pub use project::{Project, Settings};
pub use scene::{Scene, ScenePatch, ScriptLine};
pub use trigger::{Trigger, TriggerKind, TriggerRecord, TriggerType, END_SCENE_ID};
