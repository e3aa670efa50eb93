//! Cartridge - the authored game definition
//!
//! Replaced wholesale on edit (copy-on-write); never mutated in place by callers
//! holding a snapshot.

use serde::{Deserialize, Serialize};

use crate::entities::{Character, Place, Scene};
use crate::ids::{CharacterId, PlaceId, SceneId};

/// Free-text narrator instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default)]
    pub prompt: String,
}

/// Partial body for the style edit instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cartridge {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub style: Style,
}

impl Cartridge {
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| &scene.id == id)
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| &character.id == id)
    }

    pub fn place(&self, id: &PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| &place.id == id)
    }
}
