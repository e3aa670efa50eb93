//! Trigger derivation against a playthrough snapshot.
//!
//! Every helper here builds a fresh [`TriggerTracker`] from history; nothing is
//! cached between turns.

use std::collections::BTreeMap;

use plotline_domain::{
    scene_lines_for, DisplayLine, Playthrough, SceneId, Trigger, TriggerId, TriggerTracker,
};

/// Activations drained for one generation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StepActivation {
    pub activated: Vec<Trigger>,
    /// Drained ids the last line does not record yet.
    pub implicit: Vec<TriggerId>,
}

fn scene_triggers<'a>(playthrough: &'a Playthrough, scene_id: Option<&SceneId>) -> &'a [Trigger] {
    scene_id
        .and_then(|id| playthrough.cartridge().scene(id))
        .map(|scene| scene.triggers.as_slice())
        .unwrap_or_default()
}

fn tracker_for(playthrough: &Playthrough, lines: &[DisplayLine], scene_id: Option<&SceneId>) -> TriggerTracker {
    let scoped = match scene_id {
        Some(id) => scene_lines_for(lines, id),
        None => lines,
    };
    TriggerTracker::new(scene_triggers(playthrough, scene_id), scoped)
}

/// Drain what fires now in the scene generation continues from.
pub(crate) fn step_activation(playthrough: &Playthrough) -> StepActivation {
    let scene_id = playthrough.latest_scene_id();
    let mut tracker = tracker_for(playthrough, playthrough.lines(), scene_id);
    let activated = tracker.take_activated();

    let recorded: &[TriggerId] = playthrough
        .last_line()
        .map(|line| line.meta.activated_trigger_ids.as_slice())
        .unwrap_or_default();
    let implicit = activated
        .iter()
        .map(|trigger| trigger.id.clone())
        .filter(|id| !recorded.contains(id))
        .collect();

    StepActivation { activated, implicit }
}

/// Candidate conditions for the scene the viewer is in.
pub(crate) fn input_candidates(playthrough: &Playthrough) -> BTreeMap<TriggerId, String> {
    let tracker = tracker_for(playthrough, playthrough.lines(), playthrough.current_scene_id());
    tracker
        .possible_triggers()
        .into_iter()
        .filter_map(|(id, trigger)| Some((id.clone(), trigger.condition()?.to_string())))
        .collect()
}

/// Lines of the viewer's scene, as sent to the condition check.
pub(crate) fn viewport_lines(playthrough: &Playthrough) -> Vec<DisplayLine> {
    match playthrough.current_scene_id() {
        Some(id) => scene_lines_for(playthrough.lines(), id).to_vec(),
        None => playthrough.lines().to_vec(),
    }
}

/// Conditions a hint may mention once `lines` are committed. Secret ones are left out.
pub(crate) fn hint_conditions(playthrough: &Playthrough, lines: &[DisplayLine]) -> Vec<String> {
    let scene_id = plotline_domain::latest_scene_id(lines);
    let tracker = tracker_for(playthrough, lines, scene_id);
    tracker
        .possible_triggers()
        .into_values()
        .filter(|trigger| !trigger.is_secret())
        .filter_map(|trigger| trigger.condition().map(str::to_string))
        .collect()
}
