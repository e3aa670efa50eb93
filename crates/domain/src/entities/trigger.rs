//! Trigger entity - conditional and timed branches within a scene
//!
//! A trigger is either an *action* trigger (natural-language condition judged by an
//! external condition check) or a *fallback* trigger (fires after `k` player turns).
//! Both variants share the narrative/destination fields.
//!
//! On the wire a trigger is a flat record keyed by `type`; [`TriggerRecord`] is that
//! flat form with every field optional, and doubles as the partial body for trigger
//! create/edit instructions.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{SceneId, TriggerId};

/// Sentinel destination that ends the story instead of entering a scene.
pub const END_SCENE_ID: &str = "end";

/// Discriminant of the trigger union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[default]
    Action,
    Fallback,
}

/// Variant-specific trigger data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    /// Fires when the condition check decides `condition` holds.
    Action {
        condition: String,
        /// Same-scene triggers that must be consumed first.
        depends_on: Vec<TriggerId>,
        /// Hidden from hint generation.
        secret: bool,
    },
    /// Fires automatically `k` player turns after scene entry.
    Fallback { k: u32 },
}

/// A conditional or timed rule inside a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TriggerRecord", into = "TriggerRecord")]
pub struct Trigger {
    pub id: TriggerId,
    /// Text injected into the next generation when fired
    pub narrative: String,
    pub go_to_scene_id: Option<SceneId>,
    pub ending_name: Option<String>,
    pub event_image_url: Option<String>,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn action(id: impl Into<TriggerId>, condition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            narrative: String::new(),
            go_to_scene_id: None,
            ending_name: None,
            event_image_url: None,
            kind: TriggerKind::Action {
                condition: condition.into(),
                depends_on: Vec::new(),
                secret: false,
            },
        }
    }

    pub fn fallback(id: impl Into<TriggerId>, k: u32) -> Self {
        Self {
            id: id.into(),
            narrative: String::new(),
            go_to_scene_id: None,
            ending_name: None,
            event_image_url: None,
            kind: TriggerKind::Fallback { k },
        }
    }

    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    pub fn with_go_to(mut self, scene_id: impl Into<SceneId>) -> Self {
        self.go_to_scene_id = Some(scene_id.into());
        self
    }

    pub fn with_ending(mut self, name: impl Into<String>) -> Self {
        self.ending_name = Some(name.into());
        self
    }

    pub fn with_event_image(mut self, url: impl Into<String>) -> Self {
        self.event_image_url = Some(url.into());
        self
    }

    /// Add dependency edges. No-op on fallback triggers.
    pub fn with_depends_on<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TriggerId>,
    {
        if let TriggerKind::Action { depends_on, .. } = &mut self.kind {
            depends_on.extend(ids.into_iter().map(Into::into));
        }
        self
    }

    /// Mark the condition secret. No-op on fallback triggers.
    pub fn with_secret(mut self, value: bool) -> Self {
        if let TriggerKind::Action { secret, .. } = &mut self.kind {
            *secret = value;
        }
        self
    }

    pub fn trigger_type(&self) -> TriggerType {
        match self.kind {
            TriggerKind::Action { .. } => TriggerType::Action,
            TriggerKind::Fallback { .. } => TriggerType::Fallback,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self.kind, TriggerKind::Action { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, TriggerKind::Fallback { .. })
    }

    pub fn condition(&self) -> Option<&str> {
        match &self.kind {
            TriggerKind::Action { condition, .. } => Some(condition),
            TriggerKind::Fallback { .. } => None,
        }
    }

    pub fn depends_on(&self) -> &[TriggerId] {
        match &self.kind {
            TriggerKind::Action { depends_on, .. } => depends_on,
            TriggerKind::Fallback { .. } => &[],
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.kind, TriggerKind::Action { secret: true, .. })
    }

    /// Turn count for fallback triggers.
    pub fn k(&self) -> Option<u32> {
        match self.kind {
            TriggerKind::Fallback { k } => Some(k),
            TriggerKind::Action { .. } => None,
        }
    }

    /// Whether firing this trigger ends the story.
    pub fn ends_story(&self) -> bool {
        self.go_to_scene_id
            .as_ref()
            .is_some_and(|id| id.as_str() == END_SCENE_ID)
    }
}

/// Flat, all-optional trigger record.
///
/// Used as the serialized form of [`Trigger`] and as the partial body of trigger
/// instructions. Merging a body over an existing record is a shallow field-wise
/// override; [`TriggerRecord::into_trigger`] then applies type defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TriggerId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,
    #[serde(
        default,
        deserialize_with = "crate::common::lenient::list",
        skip_serializing_if = "Option::is_none"
    )]
    pub depends_on_trigger_ids: Option<Vec<TriggerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_to_scene_id: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_image_url: Option<String>,
}

impl TriggerRecord {
    /// Shallow merge: fields present on `self` override those on `base`.
    pub fn merged_over(self, base: TriggerRecord) -> TriggerRecord {
        TriggerRecord {
            id: self.id.or(base.id),
            trigger_type: self.trigger_type.or(base.trigger_type),
            narrative: self.narrative.or(base.narrative),
            condition: self.condition.or(base.condition),
            k: self.k.or(base.k),
            depends_on_trigger_ids: self.depends_on_trigger_ids.or(base.depends_on_trigger_ids),
            secret: self.secret.or(base.secret),
            go_to_scene_id: self.go_to_scene_id.or(base.go_to_scene_id),
            ending_name: self.ending_name.or(base.ending_name),
            event_image_url: self.event_image_url.or(base.event_image_url),
        }
    }

    /// Build a trigger under `id`, ignoring any id on the record.
    ///
    /// The effective type defaults to action. A fallback without `k` gets `k = 1`;
    /// an action without `condition` gets an empty condition.
    pub fn into_trigger(self, id: TriggerId) -> Trigger {
        let kind = match self.trigger_type.unwrap_or_default() {
            TriggerType::Fallback => TriggerKind::Fallback {
                k: self.k.unwrap_or(1),
            },
            TriggerType::Action => TriggerKind::Action {
                condition: self.condition.unwrap_or_default(),
                depends_on: self.depends_on_trigger_ids.unwrap_or_default(),
                secret: self.secret.unwrap_or(false),
            },
        };

        Trigger {
            id,
            narrative: self.narrative.unwrap_or_default(),
            go_to_scene_id: self.go_to_scene_id,
            ending_name: self.ending_name,
            event_image_url: self.event_image_url,
            kind,
        }
    }
}

impl From<Trigger> for TriggerRecord {
    fn from(trigger: Trigger) -> Self {
        let mut record = TriggerRecord {
            id: Some(trigger.id),
            trigger_type: None,
            narrative: Some(trigger.narrative),
            condition: None,
            k: None,
            depends_on_trigger_ids: None,
            secret: None,
            go_to_scene_id: trigger.go_to_scene_id,
            ending_name: trigger.ending_name,
            event_image_url: trigger.event_image_url,
        };

        match trigger.kind {
            TriggerKind::Action {
                condition,
                depends_on,
                secret,
            } => {
                record.trigger_type = Some(TriggerType::Action);
                record.condition = Some(condition);
                if !depends_on.is_empty() {
                    record.depends_on_trigger_ids = Some(depends_on);
                }
                if secret {
                    record.secret = Some(true);
                }
            }
            TriggerKind::Fallback { k } => {
                record.trigger_type = Some(TriggerType::Fallback);
                record.k = Some(k);
            }
        }

        record
    }
}

impl TryFrom<TriggerRecord> for Trigger {
    type Error = DomainError;

    fn try_from(mut record: TriggerRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .take()
            .ok_or_else(|| DomainError::missing_field("id"))?;
        Ok(record.into_trigger(id))
    }
}
