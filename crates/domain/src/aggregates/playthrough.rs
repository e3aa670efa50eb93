//! Playthrough aggregate - one traversal of a project snapshot
//!
//! The project is copied in when the playthrough begins; later edits to the live
//! project never reach it. History is append-only apart from [`Playthrough::fork_at`],
//! which truncates into a new playthrough.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Cartridge, DisplayLine, Project};
use crate::error::DomainError;
use crate::ids::{PlaythroughId, SceneId, TriggerId};
use crate::story::{current_scene_id, latest_scene_id};

/// # Invariants
///
/// - `current_line_idx` always points into `lines` (0 when empty)
/// - `current_scene_id` is the scene governing the line at the cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playthrough {
    id: PlaythroughId,
    project: Project,
    lines: Vec<DisplayLine>,
    current_line_idx: usize,
    current_scene_id: Option<SceneId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Playthrough {
    /// Start a playthrough at the project's starting scene.
    ///
    /// History begins with that scene's opening lines, the first of which is the
    /// scene-boundary marker.
    pub fn begin(project: Project, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let scene = project
            .starting_scene()
            .ok_or_else(|| DomainError::validation("project has no scenes to start from"))?;
        let lines = scene.opening_lines(&project.cartridge.characters);
        let current_scene_id = Some(scene.id.clone());

        Ok(Self {
            id: PlaythroughId::generate(),
            project,
            lines,
            current_line_idx: 0,
            current_scene_id,
            created_at: now,
            updated_at: now,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> &PlaythroughId {
        &self.id
    }

    /// The project snapshot this playthrough runs against.
    #[inline]
    pub fn project(&self) -> &Project {
        &self.project
    }

    #[inline]
    pub fn cartridge(&self) -> &Cartridge {
        &self.project.cartridge
    }

    #[inline]
    pub fn lines(&self) -> &[DisplayLine] {
        &self.lines
    }

    pub fn last_line(&self) -> Option<&DisplayLine> {
        self.lines.last()
    }

    /// Read cursor; may lag behind the end of history.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.current_line_idx
    }

    /// Scene governing the line at the cursor.
    #[inline]
    pub fn current_scene_id(&self) -> Option<&SceneId> {
        self.current_scene_id.as_ref()
    }

    /// Scene generation continues from.
    pub fn latest_scene_id(&self) -> Option<&SceneId> {
        latest_scene_id(&self.lines)
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Lines generated past the cursor that the viewer has not reached yet.
    pub fn unread(&self) -> usize {
        self.lines.len().saturating_sub(self.current_line_idx + 1)
    }

    /// Whether the last line waits for input or ends the story.
    pub fn is_halted(&self) -> bool {
        self.lines.last().is_some_and(DisplayLine::halts)
    }

    pub fn has_ended(&self) -> bool {
        self.lines.last().is_some_and(DisplayLine::ends)
    }

    pub fn player_name(&self) -> Option<&str> {
        self.project.player().map(|player| player.name.as_str())
    }

    /// Whether the live project has moved on since this playthrough started.
    pub fn is_stale(&self, live: &Project) -> bool {
        self.project.id != live.id
            || self.project.settings != live.settings
            || self.project.cartridge != live.cartridge
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Move the cursor, clamped to history. Returns the effective position.
    pub fn set_cursor(&mut self, index: usize) -> usize {
        let last = self.lines.len().saturating_sub(1);
        self.current_line_idx = index.min(last);
        self.current_scene_id = current_scene_id(&self.lines, self.current_line_idx).cloned();
        self.current_line_idx
    }

    pub fn append(&mut self, lines: impl IntoIterator<Item = DisplayLine>, now: DateTime<Utc>) {
        self.lines.extend(lines);
        self.updated_at = now;
    }

    /// Merge activated ids into the line at `index`. Returns how many were new.
    pub fn merge_activated(
        &mut self,
        index: usize,
        ids: impl IntoIterator<Item = TriggerId>,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| DomainError::not_found("Line", index.to_string()))?;
        let added = line.merge_activated(ids);
        if added > 0 {
            self.updated_at = now;
        }
        Ok(added)
    }

    /// Redo from `index`: a new playthrough keeping `lines[..index]`.
    ///
    /// `index` must keep at least one line and cannot exceed history.
    pub fn fork_at(&self, index: usize, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if index == 0 || index > self.lines.len() {
            return Err(DomainError::validation(format!(
                "cannot redo from line {index} of {}",
                self.lines.len()
            )));
        }

        let mut fork = Self {
            id: PlaythroughId::generate(),
            project: self.project.clone(),
            lines: self.lines[..index].to_vec(),
            current_line_idx: 0,
            current_scene_id: None,
            created_at: now,
            updated_at: now,
        };
        fork.set_cursor(self.current_line_idx);
        Ok(fork)
    }
}
