//! Trigger-id repair after an instruction batch.
//!
//! Every trigger id must resolve to its owning scene through the
//! `tr-{sceneSuffix}-{local}` namespace and be unique across the cartridge. Triggers
//! that break either rule get a fresh namespaced id. When the old id is no longer
//! used in the scene, same-scene dependency edges are rewritten to follow it.

use std::collections::{HashMap, HashSet};

use crate::entities::{Cartridge, TriggerKind};
use crate::ids::{SceneId, TriggerId};

/// One id rewritten by [`sanitize_trigger_ids`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRename {
    pub scene_id: SceneId,
    pub from: TriggerId,
    pub to: TriggerId,
}

/// Repair trigger ids in place and report what changed.
///
/// Scenes without the `sc-` prefix, or whose suffix contains `-`, cannot own a
/// resolvable trigger id and are left alone.
pub fn sanitize_trigger_ids(cartridge: &mut Cartridge) -> Vec<TriggerRename> {
    let mut seen: HashSet<TriggerId> = HashSet::new();
    let mut renames = Vec::new();

    for scene in &mut cartridge.scenes {
        if !owns_trigger_namespace(&scene.id) {
            seen.extend(scene.triggers.iter().map(|trigger| trigger.id.clone()));
            continue;
        }

        let mut scene_renames: Vec<(TriggerId, TriggerId)> = Vec::new();
        for trigger in &mut scene.triggers {
            if trigger.id.belongs_to(&scene.id) && !seen.contains(&trigger.id) {
                seen.insert(trigger.id.clone());
                continue;
            }

            let fresh = TriggerId::generate_in(&scene.id);
            let old = std::mem::replace(&mut trigger.id, fresh.clone());
            seen.insert(fresh.clone());
            scene_renames.push((old, fresh));
        }

        if scene_renames.is_empty() {
            continue;
        }

        let still_used: HashSet<&TriggerId> =
            scene.triggers.iter().map(|trigger| &trigger.id).collect();
        let follow: HashMap<TriggerId, TriggerId> = scene_renames
            .iter()
            .filter(|(old, _)| !still_used.contains(old))
            .cloned()
            .collect();

        if !follow.is_empty() {
            for trigger in &mut scene.triggers {
                if let TriggerKind::Action { depends_on, .. } = &mut trigger.kind {
                    for dependency in depends_on.iter_mut() {
                        if let Some(renamed) = follow.get(dependency) {
                            *dependency = renamed.clone();
                        }
                    }
                }
            }
        }

        renames.extend(scene_renames.into_iter().map(|(from, to)| TriggerRename {
            scene_id: scene.id.clone(),
            from,
            to,
        }));
    }

    renames
}

fn owns_trigger_namespace(scene_id: &SceneId) -> bool {
    scene_id
        .as_str()
        .strip_prefix("sc-")
        .is_some_and(|suffix| !suffix.is_empty() && !suffix.contains('-'))
}
