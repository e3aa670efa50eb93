//! Instruction types - typed edits against a cartridge
//!
//! Editors and the chat layer send instructions as loosely-typed records
//! (`{type, entity, uuid, body}`, see [`RawInstruction`]). They are converted into
//! the [`Instruction`] union up front, so entity/operation pairs that are not
//! supported (creating a style, anything on settings) fail before any cartridge
//! is touched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{ProfilePatch, ScenePatch, StylePatch, TriggerRecord};
use crate::error::DomainError;
use crate::ids::{CharacterId, PlaceId, SceneId, TriggerId};

/// What an instruction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Edit,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// What an instruction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Scene,
    Character,
    Place,
    Trigger,
    Style,
    Settings,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scene => "Scene",
            Self::Character => "Character",
            Self::Place => "Place",
            Self::Trigger => "Trigger",
            Self::Style => "Style",
            Self::Settings => "Settings",
        };
        f.write_str(name)
    }
}

/// One typed cartridge edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    CreateScene(ScenePatch),
    EditScene { id: SceneId, patch: ScenePatch },
    DeleteScene { id: SceneId },

    CreateCharacter(ProfilePatch),
    EditCharacter { id: CharacterId, patch: ProfilePatch },
    DeleteCharacter { id: CharacterId },

    CreatePlace(ProfilePatch),
    EditPlace { id: PlaceId, patch: ProfilePatch },
    DeletePlace { id: PlaceId },

    /// `scene_id` is routing only; it never ends up on the trigger.
    CreateTrigger { scene_id: SceneId, patch: TriggerRecord },
    EditTrigger { id: TriggerId, patch: TriggerRecord },
    DeleteTrigger { id: TriggerId },

    EditStyle(StylePatch),
}

impl Instruction {
    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateScene(_)
            | Self::CreateCharacter(_)
            | Self::CreatePlace(_)
            | Self::CreateTrigger { .. } => Operation::Create,
            Self::EditScene { .. }
            | Self::EditCharacter { .. }
            | Self::EditPlace { .. }
            | Self::EditTrigger { .. }
            | Self::EditStyle(_) => Operation::Edit,
            Self::DeleteScene { .. }
            | Self::DeleteCharacter { .. }
            | Self::DeletePlace { .. }
            | Self::DeleteTrigger { .. } => Operation::Delete,
        }
    }

    pub fn entity(&self) -> EntityKind {
        match self {
            Self::CreateScene(_) | Self::EditScene { .. } | Self::DeleteScene { .. } => {
                EntityKind::Scene
            }
            Self::CreateCharacter(_) | Self::EditCharacter { .. } | Self::DeleteCharacter { .. } => {
                EntityKind::Character
            }
            Self::CreatePlace(_) | Self::EditPlace { .. } | Self::DeletePlace { .. } => {
                EntityKind::Place
            }
            Self::CreateTrigger { .. } | Self::EditTrigger { .. } | Self::DeleteTrigger { .. } => {
                EntityKind::Trigger
            }
            Self::EditStyle(_) => EntityKind::Style,
        }
    }

    /// Id the instruction addresses; for trigger creation, the owning scene.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::EditScene { id, .. } | Self::DeleteScene { id } => Some(id.as_str()),
            Self::EditCharacter { id, .. } | Self::DeleteCharacter { id } => Some(id.as_str()),
            Self::EditPlace { id, .. } | Self::DeletePlace { id } => Some(id.as_str()),
            Self::CreateTrigger { scene_id, .. } => Some(scene_id.as_str()),
            Self::EditTrigger { id, .. } | Self::DeleteTrigger { id } => Some(id.as_str()),
            Self::CreateScene(_)
            | Self::CreateCharacter(_)
            | Self::CreatePlace(_)
            | Self::EditStyle(_) => None,
        }
    }
}

/// Loosely-typed instruction as produced by editors and the chat layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    #[serde(rename = "type")]
    pub operation: Operation,
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl RawInstruction {
    pub fn new(operation: Operation, entity: EntityKind) -> Self {
        Self {
            operation,
            entity,
            uuid: None,
            body: Value::Null,
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    fn uuid(&self) -> Result<String, DomainError> {
        self.uuid
            .clone()
            .filter(|uuid| !uuid.is_empty())
            .ok_or_else(|| DomainError::missing_field("uuid"))
    }

    fn body<T: serde::de::DeserializeOwned>(&self) -> Result<T, DomainError> {
        let body = match &self.body {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        Ok(serde_json::from_value(body)?)
    }

    /// Split the routing `sceneId` off a trigger-create body.
    fn trigger_create_body(&self) -> Result<(SceneId, TriggerRecord), DomainError> {
        let mut body = match &self.body {
            Value::Object(map) => map.clone(),
            Value::Null => Default::default(),
            _ => return Err(DomainError::parse("trigger body must be an object")),
        };

        let scene_id = match body.remove("sceneId") {
            Some(Value::String(id)) if !id.is_empty() => SceneId::from(id),
            _ => return Err(DomainError::missing_field("sceneId")),
        };

        let patch = serde_json::from_value(Value::Object(body))?;
        Ok((scene_id, patch))
    }
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = DomainError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        use EntityKind as E;
        use Operation as O;

        let instruction = match (raw.operation, raw.entity) {
            (O::Create, E::Scene) => Self::CreateScene(raw.body()?),
            (O::Edit, E::Scene) => Self::EditScene {
                id: raw.uuid()?.into(),
                patch: raw.body()?,
            },
            (O::Delete, E::Scene) => Self::DeleteScene {
                id: raw.uuid()?.into(),
            },

            (O::Create, E::Character) => Self::CreateCharacter(raw.body()?),
            (O::Edit, E::Character) => Self::EditCharacter {
                id: raw.uuid()?.into(),
                patch: raw.body()?,
            },
            (O::Delete, E::Character) => Self::DeleteCharacter {
                id: raw.uuid()?.into(),
            },

            (O::Create, E::Place) => Self::CreatePlace(raw.body()?),
            (O::Edit, E::Place) => Self::EditPlace {
                id: raw.uuid()?.into(),
                patch: raw.body()?,
            },
            (O::Delete, E::Place) => Self::DeletePlace {
                id: raw.uuid()?.into(),
            },

            (O::Create, E::Trigger) => {
                let (scene_id, patch) = raw.trigger_create_body()?;
                Self::CreateTrigger { scene_id, patch }
            }
            (O::Edit, E::Trigger) => Self::EditTrigger {
                id: raw.uuid()?.into(),
                patch: raw.body()?,
            },
            (O::Delete, E::Trigger) => Self::DeleteTrigger {
                id: raw.uuid()?.into(),
            },

            (O::Edit, E::Style) => Self::EditStyle(raw.body()?),

            (operation, entity @ (E::Style | E::Settings)) => {
                return Err(DomainError::unsupported(format!(
                    "{operation} {entity} is not supported"
                )));
            }
        };

        Ok(instruction)
    }
}

/// Parse an instruction batch from model output.
///
/// Accepts a bare JSON array or an object with an `instructions` array, optionally
/// wrapped in a Markdown code fence.
pub fn parse_batch(text: &str) -> Result<Vec<RawInstruction>, DomainError> {
    let trimmed = strip_code_fence(text.trim());

    let value: Value = serde_json::from_str(trimmed)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("instructions")
            .ok_or_else(|| DomainError::missing_field("instructions"))?,
        _ => return Err(DomainError::parse("expected an instruction list")),
    };

    Ok(serde_json::from_value(list)?)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
