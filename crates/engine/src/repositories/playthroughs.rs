//! Playthrough persistence.
//!
//! A playthrough document embeds its own project snapshot, so loading one never
//! touches the project namespace.

use std::sync::Arc;

use plotline_domain::{Playthrough, PlaythroughId, ProjectId};

use crate::infrastructure::ports::{KeyValueStore, RepoError};

const KEY_PREFIX: &str = "playthrough:";

fn key(id: &PlaythroughId) -> String {
    format!("{KEY_PREFIX}{id}")
}

pub struct PlaythroughRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PlaythroughRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &PlaythroughId) -> Result<Option<Playthrough>, RepoError> {
        match self.store.load(&key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, playthrough: &Playthrough) -> Result<(), RepoError> {
        let value = serde_json::to_value(playthrough)?;
        self.store.save(&key(playthrough.id()), value).await
    }

    pub async fn delete(&self, id: &PlaythroughId) -> Result<(), RepoError> {
        self.store.delete(&key(id)).await
    }

    /// Playthroughs started from `project_id`, most recently updated first.
    pub async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Playthrough>, RepoError> {
        let mut playthroughs = Vec::new();
        for key in self.store.keys(KEY_PREFIX).await? {
            let Some(value) = self.store.load(&key).await? else {
                continue;
            };
            let playthrough: Playthrough = serde_json::from_value(value)?;
            if &playthrough.project().id == project_id {
                playthroughs.push(playthrough);
            }
        }
        playthroughs.sort_by_key(|playthrough| std::cmp::Reverse(playthrough.updated_at()));
        Ok(playthroughs)
    }
}
