//! DisplayLine - one unit of story history
//!
//! History is append-only within a playthrough. Scene membership is recovered solely
//! from marker lines whose metadata carries a `sceneId`; trigger consumption is
//! recovered from `activatedTriggerIds`.

use serde::{Deserialize, Serialize};

use crate::common::none_if_empty;
use crate::ids::{CharacterId, SceneId, TriggerId};

/// Who or what produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Character,
    Player,
    #[default]
    Narration,
    Hint,
}

/// Metadata bag attached to every line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMeta {
    /// Stop auto-advance and wait for the player.
    #[serde(default)]
    pub should_pause: bool,
    #[serde(default)]
    pub should_end: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_name: Option<String>,
    /// Present only on scene-boundary markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activated_trigger_ids: Vec<TriggerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLine {
    #[serde(rename = "type")]
    pub kind: LineKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default)]
    pub meta: LineMeta,
}

impl DisplayLine {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            character_id: None,
            character_name: None,
            meta: LineMeta::default(),
        }
    }

    pub fn narration(text: impl Into<String>) -> Self {
        Self::new(LineKind::Narration, text)
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self::new(LineKind::Player, text)
    }

    pub fn hint(text: impl Into<String>) -> Self {
        Self::new(LineKind::Hint, text)
    }

    pub fn character(
        character_id: impl Into<CharacterId>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut line = Self::new(LineKind::Character, text);
        line.character_id = Some(character_id.into());
        line.character_name = Some(name.into());
        line
    }

    /// Attribute the line to a character (used for the player's own lines).
    pub fn spoken_by(mut self, character_id: CharacterId, name: impl Into<String>) -> Self {
        self.character_id = Some(character_id);
        self.character_name = Some(name.into());
        self
    }

    /// Mark this line as the entry into `scene_id`.
    pub fn with_scene_marker(mut self, scene_id: impl Into<SceneId>) -> Self {
        self.meta.scene_id = Some(scene_id.into());
        self
    }

    pub fn with_pause(mut self, pause: bool) -> Self {
        self.meta.should_pause = pause;
        self
    }

    pub fn with_ending(mut self, ending_name: Option<String>) -> Self {
        self.meta.should_end = true;
        self.meta.ending_name = ending_name;
        self
    }

    pub fn with_activated<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerId>,
    {
        self.merge_activated(ids.into_iter().map(Into::into));
        self
    }

    pub fn pauses(&self) -> bool {
        self.meta.should_pause
    }

    pub fn ends(&self) -> bool {
        self.meta.should_end
    }

    /// Whether auto-advance must stop at this line.
    pub fn halts(&self) -> bool {
        self.pauses() || self.ends()
    }

    /// The scene this line enters, ignoring empty marker values.
    pub fn scene_marker(&self) -> Option<&SceneId> {
        self.meta
            .scene_id
            .as_ref()
            .filter(|id| none_if_empty(id.as_str()).is_some())
    }

    /// Additively merge activated trigger ids, skipping duplicates.
    ///
    /// Returns how many ids were new.
    pub fn merge_activated<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = TriggerId>,
    {
        let mut added = 0;
        for id in ids {
            if !self.meta.activated_trigger_ids.contains(&id) {
                self.meta.activated_trigger_ids.push(id);
                added += 1;
            }
        }
        added
    }
}
