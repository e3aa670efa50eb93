//! Create a project from the idea service.

use std::sync::Arc;

use plotline_domain::{sanitize_trigger_ids, Project};

use super::{report_unreachable, AuthoringError};
use crate::infrastructure::ports::{ClockPort, IdeaPort, IdeaRequest};
use crate::repositories::ProjectRepository;

pub struct GenerateProject {
    ideas: Arc<dyn IdeaPort>,
    projects: Arc<ProjectRepository>,
    clock: Arc<dyn ClockPort>,
}

impl GenerateProject {
    pub fn new(
        ideas: Arc<dyn IdeaPort>,
        projects: Arc<ProjectRepository>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            ideas,
            projects,
            clock,
        }
    }

    /// Generated cartridges get the same trigger-id repair as edited ones
    /// before they are stored.
    pub async fn execute(&self, request: IdeaRequest) -> Result<Project, AuthoringError> {
        let generated = self.ideas.generate_project(request).await?;

        let mut cartridge = generated.cartridge;
        let renames = sanitize_trigger_ids(&mut cartridge);
        if !renames.is_empty() {
            tracing::debug!(rename_count = renames.len(), "Repaired generated trigger ids");
        }
        report_unreachable(&cartridge);

        let project = Project::new(generated.settings, cartridge, self.clock.now());
        self.projects.save(&project).await?;
        tracing::info!(
            project_id = %project.id,
            scene_count = project.cartridge.scenes.len(),
            "Generated project"
        );
        Ok(project)
    }
}
