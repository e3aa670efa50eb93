//! Place entity - a location scenes may reference

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::Sprite;
use crate::ids::PlaceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sprites: BTreeMap<String, Sprite>,
}

impl Place {
    pub fn new(id: impl Into<PlaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            sprites: BTreeMap::new(),
        }
    }
}
