//! Project persistence.

use std::sync::Arc;

use plotline_domain::{Project, ProjectId};

use crate::infrastructure::ports::{KeyValueStore, RepoError};

const KEY_PREFIX: &str = "project:";

fn key(id: &ProjectId) -> String {
    format!("{KEY_PREFIX}{id}")
}

pub struct ProjectRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &ProjectId) -> Result<Option<Project>, RepoError> {
        match self.store.load(&key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, project: &Project) -> Result<(), RepoError> {
        let value = serde_json::to_value(project)?;
        self.store.save(&key(&project.id), value).await
    }

    pub async fn delete(&self, id: &ProjectId) -> Result<(), RepoError> {
        self.store.delete(&key(id)).await
    }

    pub async fn list(&self) -> Result<Vec<Project>, RepoError> {
        let mut projects = Vec::new();
        for key in self.store.keys(KEY_PREFIX).await? {
            if let Some(value) = self.store.load(&key).await? {
                projects.push(serde_json::from_value::<Project>(value)?);
            }
        }
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }
}
