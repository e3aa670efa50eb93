//! Prefixed string identifiers.
//!
//! Cartridge ids are plain strings with a kind prefix (`sc-`, `ch-`, `pl-`, `tr-`).
//! Generated suffixes are hyphen-free so a trigger id `tr-{sceneSuffix}-{local}`
//! always splits back into its owning scene.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const SUFFIX_LEN: usize = 12;

fn fresh_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh id carrying this kind's prefix.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, fresh_suffix()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Text after the `prefix-` marker; the whole id when the marker is absent.
            pub fn suffix(&self) -> &str {
                self.0
                    .strip_prefix(concat!($prefix, "-"))
                    .unwrap_or(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

// Cartridge entity IDs
define_id!(SceneId, "sc");
define_id!(CharacterId, "ch");
define_id!(PlaceId, "pl");
define_id!(TriggerId, "tr");

// Ownership IDs
define_id!(ProjectId, "pj");
define_id!(PlaythroughId, "pt");

impl TriggerId {
    /// Generate a trigger id namespaced to `scene_id`.
    pub fn generate_in(scene_id: &SceneId) -> Self {
        Self(format!("tr-{}-{}", scene_id.suffix(), fresh_suffix()))
    }

    /// Resolve the owning scene from the `tr-{sceneSuffix}-{local}` namespace.
    pub fn scene_id(&self) -> Result<SceneId, DomainError> {
        let rest = self
            .0
            .strip_prefix("tr-")
            .ok_or_else(|| DomainError::invalid_id(self.0.clone()))?;

        match rest.split_once('-') {
            Some((scene, local)) if !scene.is_empty() && !local.is_empty() => {
                Ok(SceneId(format!("sc-{scene}")))
            }
            _ => Err(DomainError::invalid_id(self.0.clone())),
        }
    }

    /// Whether this id's namespace resolves to `scene_id`.
    pub fn belongs_to(&self, scene_id: &SceneId) -> bool {
        self.scene_id().is_ok_and(|owner| &owner == scene_id)
    }
}
