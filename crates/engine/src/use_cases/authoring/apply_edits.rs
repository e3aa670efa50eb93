//! Apply an instruction batch to a stored project.
//!
//! Batches are all-or-nothing. A batch that cannot be parsed or applied is
//! answered with a plain-text reply asking the author to try again; the stored
//! project is left as it was.

use std::sync::Arc;

use plotline_domain::{
    apply_raw_instructions, parse_batch, Project, ProjectId, RawInstruction, TriggerId,
};

use super::{report_unreachable, AuthoringError};
use crate::infrastructure::ports::ClockPort;
use crate::repositories::ProjectRepository;

const UNPARSEABLE_REPLY: &str =
    "I couldn't turn that into edits. Could you rephrase what you'd like to change?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied {
        project: Project,
        /// Triggers left with a dependency chain that can never be satisfied.
        unreachable: Vec<TriggerId>,
    },
    Rejected {
        reply: String,
    },
}

pub struct ApplyEdits {
    projects: Arc<ProjectRepository>,
    clock: Arc<dyn ClockPort>,
}

impl ApplyEdits {
    pub fn new(projects: Arc<ProjectRepository>, clock: Arc<dyn ClockPort>) -> Self {
        Self { projects, clock }
    }

    pub async fn execute(
        &self,
        project_id: &ProjectId,
        instructions: Vec<RawInstruction>,
    ) -> Result<EditOutcome, AuthoringError> {
        let mut project = self
            .projects
            .get(project_id)
            .await?
            .ok_or_else(|| AuthoringError::ProjectNotFound(project_id.clone()))?;

        let count = instructions.len();
        let cartridge = match apply_raw_instructions(&project.cartridge, instructions) {
            Ok(cartridge) => cartridge,
            Err(err) => {
                tracing::warn!(project_id = %project_id, error = %err, "Rejected instruction batch");
                return Ok(EditOutcome::Rejected {
                    reply: format!("I couldn't apply those edits ({err}). Please try again."),
                });
            }
        };

        let unreachable = report_unreachable(&cartridge);
        project.replace_cartridge(cartridge, self.clock.now());
        self.projects.save(&project).await?;
        tracing::info!(project_id = %project_id, instruction_count = count, "Applied instruction batch");

        Ok(EditOutcome::Applied {
            project,
            unreachable,
        })
    }

    /// Parse a batch from raw model output, then apply it.
    pub async fn execute_text(
        &self,
        project_id: &ProjectId,
        text: &str,
    ) -> Result<EditOutcome, AuthoringError> {
        match parse_batch(text) {
            Ok(instructions) => self.execute(project_id, instructions).await,
            Err(err) => {
                tracing::warn!(project_id = %project_id, error = %err, "Unparseable instruction batch");
                Ok(EditOutcome::Rejected {
                    reply: UNPARSEABLE_REPLY.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::InMemoryStore;
    use crate::test_fixtures;
    use plotline_domain::{EntityKind, Operation, SceneId};
    use serde_json::json;

    async fn setup() -> (ApplyEdits, Arc<ProjectRepository>, Project) {
        let projects = Arc::new(ProjectRepository::new(Arc::new(InMemoryStore::new())));
        let project = test_fixtures::project();
        projects.save(&project).await.unwrap();
        (
            ApplyEdits::new(Arc::clone(&projects), test_fixtures::clock()),
            projects,
            project,
        )
    }

    #[tokio::test]
    async fn applies_and_saves() {
        let (edits, projects, project) = setup().await;
        let batch = vec![RawInstruction::new(Operation::Edit, EntityKind::Trigger)
            .with_uuid("tr-dock-look")
            .with_body(json!({ "condition": "The player studies the hull" }))];

        let outcome = edits.execute(&project.id, batch).await.unwrap();

        let EditOutcome::Applied { project: edited, unreachable } = outcome else {
            panic!("expected the batch to apply");
        };
        assert!(unreachable.is_empty());
        let stored = projects.get(&project.id).await.unwrap().unwrap();
        assert_eq!(stored, edited);
        let dock = stored.cartridge.scene(&SceneId::from("sc-dock")).unwrap();
        assert_eq!(
            dock.trigger(&TriggerId::from("tr-dock-look")).unwrap().condition(),
            Some("The player studies the hull")
        );
    }

    #[tokio::test]
    async fn failed_batch_is_answered_and_not_saved() {
        let (edits, projects, project) = setup().await;
        let batch = vec![
            RawInstruction::new(Operation::Delete, EntityKind::Character).with_uuid("ch-mara"),
            RawInstruction::new(Operation::Delete, EntityKind::Trigger).with_uuid("tr-nowhere-1"),
        ];

        let outcome = edits.execute(&project.id, batch).await.unwrap();

        let EditOutcome::Rejected { reply } = outcome else {
            panic!("expected a rejection");
        };
        assert!(reply.contains("Scene not found"));
        assert_eq!(projects.get(&project.id).await.unwrap().unwrap(), project);
    }

    #[tokio::test]
    async fn unparseable_text_asks_to_rephrase() {
        let (edits, _, project) = setup().await;

        let outcome = edits.execute_text(&project.id, "Sure! I made the changes.").await.unwrap();

        assert_eq!(
            outcome,
            EditOutcome::Rejected {
                reply: UNPARSEABLE_REPLY.to_string()
            }
        );
    }

    #[tokio::test]
    async fn reports_unreachable_triggers() {
        let (edits, _, project) = setup().await;
        let text = r#"```json
[{"type": "create", "entity": "Trigger", "body": {"sceneId": "sc-dock", "condition": "x", "dependsOnTriggerIds": ["tr-dock-ghost"]}}]
```"#;

        let outcome = edits.execute_text(&project.id, text).await.unwrap();

        let EditOutcome::Applied { unreachable, .. } = outcome else {
            panic!("expected the batch to apply");
        };
        assert_eq!(unreachable.len(), 1);
        assert!(unreachable[0].as_str().starts_with("tr-dock-"));
    }

    #[tokio::test]
    async fn missing_project_is_an_error() {
        let (edits, _, _) = setup().await;
        let err = edits.execute(&ProjectId::generate(), Vec::new()).await.unwrap_err();
        assert!(matches!(err, AuthoringError::ProjectNotFound(_)));
    }
}
