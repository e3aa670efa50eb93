//! Scene entity - one segment of the story with its script and triggers

use serde::{Deserialize, Serialize};

use crate::entities::{Character, DisplayLine, Trigger, TriggerRecord};
use crate::ids::{CharacterId, PlaceId, SceneId, TriggerId};

/// A pre-authored opening line, played once per scene entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptLine {
    /// Speaking character; narration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    pub text: String,
}

impl ScriptLine {
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            character_id: None,
            text: text.into(),
        }
    }

    pub fn spoken(character_id: impl Into<CharacterId>, text: impl Into<String>) -> Self {
        Self {
            character_id: Some(character_id.into()),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub title: String,
    /// Roster references, not ownership.
    #[serde(default)]
    pub character_ids: Vec<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<PlaceId>,
    #[serde(default)]
    pub script: Vec<ScriptLine>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Scene {
    pub fn new(id: impl Into<SceneId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            character_ids: Vec::new(),
            place_id: None,
            script: Vec::new(),
            triggers: Vec::new(),
            prompt: None,
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_character(mut self, character_id: impl Into<CharacterId>) -> Self {
        self.character_ids.push(character_id.into());
        self
    }

    pub fn with_place(mut self, place_id: impl Into<PlaceId>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    pub fn with_script_line(mut self, line: ScriptLine) -> Self {
        self.script.push(line);
        self
    }

    pub fn trigger(&self, id: &TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|trigger| &trigger.id == id)
    }

    /// Lines played on entering this scene; the first one carries the scene marker.
    ///
    /// A scene without a script still emits a marker line narrating its title.
    pub fn opening_lines(&self, characters: &[Character]) -> Vec<DisplayLine> {
        let mut lines: Vec<DisplayLine> = self
            .script
            .iter()
            .map(|script_line| match &script_line.character_id {
                Some(character_id) => {
                    let name = characters
                        .iter()
                        .find(|character| &character.id == character_id)
                        .map(|character| character.name.clone())
                        .unwrap_or_default();
                    DisplayLine::character(character_id.clone(), name, script_line.text.clone())
                }
                None => DisplayLine::narration(script_line.text.clone()),
            })
            .collect();

        match lines.first_mut() {
            Some(first) => first.meta.scene_id = Some(self.id.clone()),
            None => lines.push(DisplayLine::narration(self.title.clone()).with_scene_marker(self.id.clone())),
        }

        lines
    }
}

/// Partial scene body for create/edit instructions.
///
/// List fields of the wrong shape read as absent (see [`crate::common::lenient`]).
/// `placeId: null` clears the place; an absent `placeId` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::common::lenient::list")]
    pub character_ids: Option<Vec<CharacterId>>,
    #[serde(
        default,
        deserialize_with = "crate::common::lenient::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub place_id: Option<Option<PlaceId>>,
    #[serde(default, deserialize_with = "crate::common::lenient::list")]
    pub script: Option<Vec<ScriptLine>>,
    #[serde(default, deserialize_with = "crate::common::lenient::list")]
    pub triggers: Option<Vec<TriggerRecord>>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_lines_mark_first_script_line() {
        let scene = Scene::new("sc-a", "The Dock")
            .with_script_line(ScriptLine::narration("Fog rolls in."))
            .with_script_line(ScriptLine::spoken("ch-mara", "You're late."));
        let characters = vec![Character::new("ch-mara", "Mara")];

        let lines = scene.opening_lines(&characters);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].scene_marker(), Some(&SceneId::from("sc-a")));
        assert!(lines[1].scene_marker().is_none());
        assert_eq!(lines[1].character_name.as_deref(), Some("Mara"));
    }

    #[test]
    fn empty_script_still_emits_marker() {
        let lines = Scene::new("sc-a", "The Dock").opening_lines(&[]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "The Dock");
        assert_eq!(lines[0].scene_marker(), Some(&SceneId::from("sc-a")));
    }

    #[test]
    fn patch_reads_non_list_script_as_absent() {
        let patch: ScenePatch =
            serde_json::from_str(r#"{"title": "x", "script": "not a list"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("x"));
        assert!(patch.script.is_none());
    }
}
