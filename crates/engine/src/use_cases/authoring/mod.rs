//! Authoring use cases: editing a project through instruction batches and
//! generating a new one from an idea.

mod apply_edits;
mod generate_project;

use plotline_domain::{Cartridge, ProjectId, TriggerId};

use crate::infrastructure::ports::{RepoError, ServiceError};

pub use apply_edits::{ApplyEdits, EditOutcome};
pub use generate_project::GenerateProject;

/// Container for authoring use cases.
pub struct AuthoringUseCases {
    pub apply_edits: ApplyEdits,
    pub generate_project: GenerateProject,
}

impl AuthoringUseCases {
    pub fn new(apply_edits: ApplyEdits, generate_project: GenerateProject) -> Self {
        Self {
            apply_edits,
            generate_project,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("Idea generation failed: {0}")]
    Service(#[from] ServiceError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Log triggers no playthrough can ever reach, and return them.
fn report_unreachable(cartridge: &Cartridge) -> Vec<TriggerId> {
    let mut unreachable = Vec::new();
    for scene in &cartridge.scenes {
        for id in plotline_domain::unreachable_triggers(&scene.triggers) {
            tracing::warn!(scene_id = %scene.id, trigger_id = %id, "Trigger can never activate");
            unreachable.push(id.clone());
        }
    }
    unreachable
}
