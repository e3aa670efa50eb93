//! Scene/line indexing over a flat, append-only history.
//!
//! Scene markers are not unique: a revisited scene has several. Only the latest
//! entry matters for trigger derivation and fallback timers.
//!
//! Two positions are tracked independently:
//! - [`latest_scene_id`]: where generation continues from (end of history)
//! - [`current_scene_id`]: what governs the line the viewer is looking at

use crate::entities::DisplayLine;
use crate::ids::SceneId;

/// Lines from the most recent entry into `scene_id` to the end of history.
///
/// Without any marker for `scene_id` the whole history is returned.
pub fn scene_lines_for<'a>(lines: &'a [DisplayLine], scene_id: &SceneId) -> &'a [DisplayLine] {
    let start = lines
        .iter()
        .rposition(|line| line.scene_marker() == Some(scene_id))
        .unwrap_or(0);
    &lines[start..]
}

/// The most recent scene marker anywhere in history.
pub fn latest_scene_id(lines: &[DisplayLine]) -> Option<&SceneId> {
    lines.iter().rev().find_map(DisplayLine::scene_marker)
}

/// The most recent scene marker at or before `cursor`.
///
/// A cursor past the end is clamped to the last line.
pub fn current_scene_id(lines: &[DisplayLine], cursor: usize) -> Option<&SceneId> {
    let end = cursor.saturating_add(1).min(lines.len());
    latest_scene_id(&lines[..end])
}
