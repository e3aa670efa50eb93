//! Project - a cartridge plus its top-level settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Cartridge, Character, Scene};
use crate::ids::{CharacterId, ProjectId, SceneId};

/// Singleton settings; not editable through instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_scene_id: Option<SceneId>,
    /// Target language for translated output; `Original` or absent means untranslated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub cartridge: Cartridge,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(settings: Settings, cartridge: Cartridge, now: DateTime<Utc>) -> Self {
        Self {
            id: ProjectId::generate(),
            settings,
            cartridge,
            updated_at: now,
        }
    }

    /// The designated player character, if it exists in the cartridge.
    pub fn player(&self) -> Option<&Character> {
        self.settings
            .player_id
            .as_ref()
            .and_then(|id| self.cartridge.character(id))
    }

    /// The configured starting scene, else the first scene.
    pub fn starting_scene(&self) -> Option<&Scene> {
        self.settings
            .starting_scene_id
            .as_ref()
            .and_then(|id| self.cartridge.scene(id))
            .or_else(|| self.cartridge.scenes.first())
    }

    /// Replace the cartridge with an edited snapshot.
    pub fn replace_cartridge(&mut self, cartridge: Cartridge, now: DateTime<Utc>) {
        self.cartridge = cartridge;
        self.updated_at = now;
    }
}
