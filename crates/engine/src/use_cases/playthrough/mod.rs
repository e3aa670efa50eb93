//! Playthrough lifecycle: start, load, save, delete, list, staleness.

use std::sync::Arc;

use plotline_domain::{DomainError, Playthrough, PlaythroughId, ProjectId};

use crate::infrastructure::ports::{ClockPort, RepoError};
use crate::repositories::{PlaythroughRepository, ProjectRepository};

#[derive(Debug, thiserror::Error)]
pub enum PlaythroughError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("Playthrough not found: {0}")]
    NotFound(PlaythroughId),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct PlaythroughOps {
    projects: Arc<ProjectRepository>,
    playthroughs: Arc<PlaythroughRepository>,
    clock: Arc<dyn ClockPort>,
}

impl PlaythroughOps {
    pub fn new(
        projects: Arc<ProjectRepository>,
        playthroughs: Arc<PlaythroughRepository>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            projects,
            playthroughs,
            clock,
        }
    }

    /// Snapshot the project and begin at its starting scene.
    pub async fn start(&self, project_id: &ProjectId) -> Result<Playthrough, PlaythroughError> {
        let project = self
            .projects
            .get(project_id)
            .await?
            .ok_or_else(|| PlaythroughError::ProjectNotFound(project_id.clone()))?;

        let playthrough = Playthrough::begin(project, self.clock.now())?;
        self.playthroughs.save(&playthrough).await?;
        tracing::info!(
            playthrough_id = %playthrough.id(),
            project_id = %project_id,
            scene_id = ?playthrough.current_scene_id(),
            "Started playthrough"
        );
        Ok(playthrough)
    }

    pub async fn load(&self, id: &PlaythroughId) -> Result<Playthrough, PlaythroughError> {
        self.playthroughs
            .get(id)
            .await?
            .ok_or_else(|| PlaythroughError::NotFound(id.clone()))
    }

    pub async fn save(&self, playthrough: &Playthrough) -> Result<(), PlaythroughError> {
        self.playthroughs.save(playthrough).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &PlaythroughId) -> Result<(), PlaythroughError> {
        self.playthroughs.delete(id).await?;
        Ok(())
    }

    pub async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Playthrough>, PlaythroughError> {
        Ok(self.playthroughs.list_for_project(project_id).await?)
    }

    /// Whether the stored project has changed since `id` started.
    ///
    /// A playthrough whose project was deleted counts as stale.
    pub async fn is_stale(&self, id: &PlaythroughId) -> Result<bool, PlaythroughError> {
        let playthrough = self.load(id).await?;
        let live = self.projects.get(&playthrough.project().id).await?;
        Ok(match live {
            Some(live) => playthrough.is_stale(&live),
            None => true,
        })
    }
}
