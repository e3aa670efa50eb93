//! Trigger state derivation for one scene.
//!
//! A [`TriggerTracker`] is rebuilt from the scene's triggers and that scene's line
//! slice every turn; nothing is carried between turns. The lifecycle is
//! construct → inspect → drain → discard.
//!
//! Derivation rules:
//! - every line except the last contributes its `activatedTriggerIds` as consumed
//! - fallback triggers whose timer ran out (`k - playerTurns <= 0`) and are not
//!   consumed are queued in trigger-list order
//! - ids recorded on the last line are queued ahead of the expired fallbacks
//! - a dependency is satisfied only by a consumed trigger of the same scene, so
//!   unknown ids, self references and cycles stay unsatisfied forever

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entities::{DisplayLine, LineKind, Trigger};
use crate::ids::TriggerId;

/// Derived state of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    pub consumed: bool,
    /// `k - playerTurnsSoFar`, fallback triggers only
    pub turns_left: Option<i64>,
    pub deps_satisfied: bool,
}

#[derive(Debug, Clone)]
pub struct TriggerTracker {
    triggers: Vec<Trigger>,
    states: Vec<TriggerState>,
    index: HashMap<TriggerId, usize>,
    pending: Vec<usize>,
    player_turns: i64,
}

impl TriggerTracker {
    /// Derive trigger state from `scene_lines`.
    ///
    /// `scene_lines` must already be scoped to the scene owning `triggers`
    /// (see [`crate::story::scene_lines_for`]); cross-scene history skews the
    /// player-turn count.
    pub fn new(triggers: &[Trigger], scene_lines: &[DisplayLine]) -> Self {
        let player_turns = scene_lines
            .iter()
            .filter(|line| line.kind == LineKind::Player)
            .count() as i64;

        let mut index = HashMap::with_capacity(triggers.len());
        for (position, trigger) in triggers.iter().enumerate() {
            index.entry(trigger.id.clone()).or_insert(position);
        }

        let states = triggers
            .iter()
            .map(|trigger| TriggerState {
                consumed: false,
                turns_left: trigger.k().map(|k| i64::from(k) - player_turns),
                deps_satisfied: false,
            })
            .collect();

        let mut tracker = Self {
            triggers: triggers.to_vec(),
            states,
            index,
            pending: Vec::new(),
            player_turns,
        };

        let (last_line, earlier) = match scene_lines.split_last() {
            Some((last, earlier)) => (Some(last), earlier),
            None => (None, scene_lines),
        };

        for line in earlier {
            for id in &line.meta.activated_trigger_ids {
                if let Some(&position) = tracker.index.get(id) {
                    tracker.states[position].consumed = true;
                }
            }
        }
        tracker.refresh_dependencies();

        let mut queued = HashSet::new();

        if let Some(last) = last_line {
            for id in &last.meta.activated_trigger_ids {
                let Some(&position) = tracker.index.get(id) else {
                    continue;
                };
                if !tracker.states[position].consumed && queued.insert(position) {
                    tracker.pending.push(position);
                }
            }
        }

        for (position, trigger) in tracker.triggers.iter().enumerate() {
            let state = &tracker.states[position];
            let expired = state.turns_left.is_some_and(|left| left <= 0);
            if trigger.is_fallback() && expired && !state.consumed && queued.insert(position) {
                tracker.pending.push(position);
            }
        }

        tracker
    }

    /// Drain pending activations, marking each consumed.
    ///
    /// A second call on the same tracker returns an empty list.
    pub fn take_activated(&mut self) -> Vec<Trigger> {
        let drained: Vec<usize> = std::mem::take(&mut self.pending);
        for &position in &drained {
            self.states[position].consumed = true;
        }
        self.refresh_dependencies();

        drained
            .into_iter()
            .map(|position| self.triggers[position].clone())
            .collect()
    }

    /// Pending ids in queue order, without draining.
    pub fn pending_ids(&self) -> Vec<&TriggerId> {
        self.pending
            .iter()
            .map(|&position| &self.triggers[position].id)
            .collect()
    }

    /// Action triggers that are neither consumed nor blocked by dependencies.
    pub fn possible_triggers(&self) -> BTreeMap<&TriggerId, &Trigger> {
        self.triggers
            .iter()
            .zip(&self.states)
            .filter(|(trigger, state)| trigger.is_action() && !state.consumed && state.deps_satisfied)
            .map(|(trigger, _)| (&trigger.id, trigger))
            .collect()
    }

    /// Subset of triggers matching `ids`; unknown ids are dropped.
    pub fn triggers<'a, I>(&self, ids: I) -> Vec<&Trigger>
    where
        I: IntoIterator<Item = &'a TriggerId>,
    {
        ids.into_iter()
            .filter_map(|id| self.index.get(id))
            .map(|&position| &self.triggers[position])
            .collect()
    }

    pub fn state(&self, id: &TriggerId) -> Option<&TriggerState> {
        self.index.get(id).map(|&position| &self.states[position])
    }

    pub fn player_turns(&self) -> i64 {
        self.player_turns
    }

    fn refresh_dependencies(&mut self) {
        let satisfied: Vec<bool> = self
            .triggers
            .iter()
            .map(|trigger| {
                trigger.depends_on().iter().all(|dependency| {
                    self.index
                        .get(dependency)
                        .is_some_and(|&position| self.states[position].consumed)
                })
            })
            .collect();

        for (state, deps_satisfied) in self.states.iter_mut().zip(satisfied) {
            state.deps_satisfied = deps_satisfied;
        }
    }
}

/// Pick the trigger that decides where the story goes after a batch.
///
/// Action triggers with a destination win, then any trigger with a destination,
/// then the first trigger of the batch.
pub fn governing_transition(batch: &[Trigger]) -> Option<&Trigger> {
    batch
        .iter()
        .find(|trigger| trigger.is_action() && trigger.go_to_scene_id.is_some())
        .or_else(|| batch.iter().find(|trigger| trigger.go_to_scene_id.is_some()))
        .or_else(|| batch.first())
}

/// Triggers whose dependency chain can never be satisfied.
///
/// Covers self references, cycles, unknown ids and dependencies on other
/// unreachable triggers. Authoring-time diagnostic only; derivation does not use it.
pub fn unreachable_triggers(triggers: &[Trigger]) -> Vec<&TriggerId> {
    let known: HashSet<&TriggerId> = triggers.iter().map(|trigger| &trigger.id).collect();
    let mut reachable: HashSet<&TriggerId> = HashSet::new();

    loop {
        let before = reachable.len();
        for trigger in triggers {
            let ready = trigger
                .depends_on()
                .iter()
                .all(|dependency| known.contains(dependency) && reachable.contains(dependency));
            if ready {
                reachable.insert(&trigger.id);
            }
        }
        if reachable.len() == before {
            break;
        }
    }

    triggers
        .iter()
        .map(|trigger| &trigger.id)
        .filter(|id| !reachable.contains(id))
        .collect()
}
