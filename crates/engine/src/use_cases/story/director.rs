//! Story director - single owner of the active playthrough.
//!
//! All history mutation goes through here. External calls run outside the lock
//! against a snapshot; their results are committed only if the playthrough they
//! were started for is still active and its cancellation token is untouched.
//!
//! # Cycle
//!
//! 1. Refuse while another cycle or an input turn is in flight, or when the last
//!    line pauses or ends.
//! 2. Drain activations for the scene generation continues from.
//! 3. Narrate, translate, attach the first event image.
//! 4. If the narration pauses, generate a hint and move the pause onto it.
//! 5. Commit the implicit activations and the new lines together.

use std::future::Future;
use std::sync::Arc;

use plotline_domain::{DisplayLine, Playthrough, PlaythroughId, TriggerId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::derive::{hint_conditions, input_candidates, step_activation, viewport_lines, StepActivation};
use super::{StoryError, StoryServices};
use crate::infrastructure::config::DirectorConfig;
use crate::infrastructure::ports::{
    ClockPort, ConditionCheckRequest, HintRequest, Notice, StepRequest, ORIGINAL_LANGUAGE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Lines were appended to history.
    Generated { appended: usize },
    /// A generation cycle or an input turn is already in flight.
    Busy,
    /// The last line waits for player input.
    AwaitingInput,
    Ended,
    /// The playthrough was switched away mid-cycle; the result was dropped.
    Cancelled,
    NoPlaythrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Accepted {
        /// Ids merged onto the player's line.
        activated: Vec<TriggerId>,
        step: StepOutcome,
    },
    Busy,
    Ended,
    Cancelled,
    NoPlaythrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMoved {
    pub cursor: usize,
    /// Whether the caller should start eager look-ahead now.
    pub lookahead_due: bool,
}

struct ActivePlaythrough {
    playthrough: Playthrough,
    token: CancellationToken,
    generating: bool,
    resolving_input: bool,
}

impl ActivePlaythrough {
    fn new(playthrough: Playthrough) -> Self {
        Self {
            playthrough,
            token: CancellationToken::new(),
            generating: false,
            resolving_input: false,
        }
    }

    fn is_busy(&self) -> bool {
        self.generating || self.resolving_input
    }
}

/// Output of one generation cycle, not yet committed.
struct Cycle {
    implicit: Vec<TriggerId>,
    lines: Vec<DisplayLine>,
}

/// The active slot, if it still holds the playthrough `token` was issued for.
fn still_current<'a>(
    slot: &'a mut Option<ActivePlaythrough>,
    id: &PlaythroughId,
    token: &CancellationToken,
) -> Option<&'a mut ActivePlaythrough> {
    slot.as_mut()
        .filter(|active| !token.is_cancelled() && active.playthrough.id() == id)
}

async fn until_cancelled<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}

pub struct StoryDirector {
    services: StoryServices,
    clock: Arc<dyn ClockPort>,
    config: DirectorConfig,
    active: Mutex<Option<ActivePlaythrough>>,
}

impl StoryDirector {
    pub fn new(services: StoryServices, clock: Arc<dyn ClockPort>, config: DirectorConfig) -> Self {
        Self {
            services,
            clock,
            config,
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    // =========================================================================
    // Active playthrough
    // =========================================================================

    /// Make `playthrough` the active one and return the one it replaces.
    ///
    /// In-flight calls for the previous playthrough are aborted and their
    /// results discarded.
    pub async fn activate(&self, playthrough: Playthrough) -> Option<Playthrough> {
        tracing::info!(playthrough_id = %playthrough.id(), "Activating playthrough");
        let previous = self
            .active
            .lock()
            .await
            .replace(ActivePlaythrough::new(playthrough))?;
        previous.token.cancel();
        Some(previous.playthrough)
    }

    pub async fn deactivate(&self) -> Option<Playthrough> {
        let previous = self.active.lock().await.take()?;
        previous.token.cancel();
        tracing::info!(playthrough_id = %previous.playthrough.id(), "Deactivated playthrough");
        Some(previous.playthrough)
    }

    pub async fn snapshot(&self) -> Option<Playthrough> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.playthrough.clone())
    }

    pub async fn set_cursor(&self, index: usize) -> Option<CursorMoved> {
        let mut slot = self.active.lock().await;
        let active = slot.as_mut()?;
        let cursor = active.playthrough.set_cursor(index);
        Some(CursorMoved {
            cursor,
            lookahead_due: self.lookahead_due(active),
        })
    }

    /// Redo from line `index`: cancel in-flight work and continue on a fork that
    /// keeps the lines before it.
    pub async fn redo_from(&self, index: usize) -> Result<Option<Playthrough>, StoryError> {
        let mut slot = self.active.lock().await;
        let Some(active) = slot.as_mut() else {
            return Ok(None);
        };

        let fork = active.playthrough.fork_at(index, self.clock.now())?;
        active.token.cancel();
        tracing::info!(
            playthrough_id = %active.playthrough.id(),
            fork_id = %fork.id(),
            index,
            "Redoing from line"
        );
        *active = ActivePlaythrough::new(fork.clone());
        Ok(Some(fork))
    }

    // =========================================================================
    // Progression
    // =========================================================================

    /// Generate one step, then keep going while eager look-ahead is due.
    pub async fn advance(&self) -> Result<StepOutcome, StoryError> {
        let mut outcome = self.step().await?;
        while matches!(outcome, StepOutcome::Generated { .. }) && self.continue_lookahead().await {
            outcome = self.step().await?;
        }
        Ok(outcome)
    }

    /// Run [`Self::advance`] in the background. Failures are already surfaced
    /// through the notifier.
    pub fn spawn_advance(self: &Arc<Self>) -> JoinHandle<()> {
        let director = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = director.advance().await {
                tracing::debug!(error = %err, "Background advance stopped");
            }
        })
    }

    /// One generation cycle.
    pub async fn step(&self) -> Result<StepOutcome, StoryError> {
        let (snapshot, token) = {
            let mut slot = self.active.lock().await;
            let Some(active) = slot.as_mut() else {
                return Ok(StepOutcome::NoPlaythrough);
            };
            if active.is_busy() {
                return Ok(StepOutcome::Busy);
            }
            if active.playthrough.has_ended() {
                return Ok(StepOutcome::Ended);
            }
            if active.playthrough.is_halted() {
                return Ok(StepOutcome::AwaitingInput);
            }
            active.generating = true;
            (active.playthrough.clone(), active.token.clone())
        };

        let result = self.run_cycle(&snapshot, &token).await;

        let mut slot = self.active.lock().await;
        let Some(active) = still_current(&mut slot, snapshot.id(), &token) else {
            tracing::warn!(playthrough_id = %snapshot.id(), "Dropping result for inactive playthrough");
            return Ok(StepOutcome::Cancelled);
        };
        active.generating = false;

        match result {
            Ok(Some(cycle)) => {
                let now = self.clock.now();
                if !cycle.implicit.is_empty() {
                    let last = snapshot.lines().len().saturating_sub(1);
                    active.playthrough.merge_activated(last, cycle.implicit, now)?;
                }
                let appended = cycle.lines.len();
                active.playthrough.append(cycle.lines, now);
                tracing::info!(
                    playthrough_id = %snapshot.id(),
                    appended,
                    total = active.playthrough.lines().len(),
                    "Committed story step"
                );
                Ok(StepOutcome::Generated { appended })
            }
            Ok(None) => Ok(StepOutcome::Cancelled),
            Err(err) => {
                tracing::error!(playthrough_id = %snapshot.id(), error = %err, "Story step failed");
                self.services.notifier.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Record a player turn, resolve which action triggers it satisfied, then
    /// advance.
    pub async fn submit_input(&self, text: impl Into<String>) -> Result<InputOutcome, StoryError> {
        let (id, token, index, candidates, scene_lines) = {
            let mut slot = self.active.lock().await;
            let Some(active) = slot.as_mut() else {
                return Ok(InputOutcome::NoPlaythrough);
            };
            if active.is_busy() {
                return Ok(InputOutcome::Busy);
            }
            if active.playthrough.has_ended() {
                return Ok(InputOutcome::Ended);
            }

            let mut line = DisplayLine::player(text).with_pause(false);
            if let Some(player) = active.playthrough.project().player() {
                line = line.spoken_by(player.id.clone(), player.name.clone());
            }
            active.playthrough.append([line], self.clock.now());
            let index = active.playthrough.lines().len().saturating_sub(1);
            // The turn is read at the new line, so its viewport scene is the latest scene.
            active.playthrough.set_cursor(index);
            active.resolving_input = true;

            (
                active.playthrough.id().clone(),
                active.token.clone(),
                index,
                input_candidates(&active.playthrough),
                viewport_lines(&active.playthrough),
            )
        };

        tracing::debug!(playthrough_id = %id, candidate_count = candidates.len(), "Resolving player input");

        let mut activated: Vec<TriggerId> = Vec::new();
        if !candidates.is_empty() {
            let request = ConditionCheckRequest {
                candidates: candidates.clone(),
                scene_lines,
            };
            match until_cancelled(&token, self.services.conditions.check_conditions(request)).await {
                None => return Ok(InputOutcome::Cancelled),
                Some(Ok(ids)) => {
                    for trigger_id in ids {
                        if candidates.contains_key(&trigger_id) && !activated.contains(&trigger_id) {
                            activated.push(trigger_id);
                        }
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(playthrough_id = %id, error = %err, "Condition check failed, continuing without activations");
                    self.services
                        .notifier
                        .notify(Notice::warning(format!("Could not check your action: {err}")));
                }
            }
        }

        {
            let mut slot = self.active.lock().await;
            let Some(active) = still_current(&mut slot, &id, &token) else {
                return Ok(InputOutcome::Cancelled);
            };
            active.resolving_input = false;
            active
                .playthrough
                .merge_activated(index, activated.iter().cloned(), self.clock.now())?;
        }

        tracing::info!(playthrough_id = %id, trigger_count = activated.len(), "Player input resolved");
        let step = self.advance().await?;
        Ok(InputOutcome::Accepted { activated, step })
    }

    // =========================================================================
    // Cycle internals
    // =========================================================================

    fn lookahead_due(&self, active: &ActivePlaythrough) -> bool {
        self.config.eager_lookahead
            && !active.is_busy()
            && !active.playthrough.is_halted()
            && active.playthrough.unread() < self.config.lookahead_buffer
    }

    async fn continue_lookahead(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|active| self.lookahead_due(active))
    }

    /// Everything between snapshot and commit. `None` means cancelled.
    async fn run_cycle(
        &self,
        snapshot: &Playthrough,
        token: &CancellationToken,
    ) -> Result<Option<Cycle>, StoryError> {
        let StepActivation { activated, implicit } = step_activation(snapshot);
        tracing::debug!(
            playthrough_id = %snapshot.id(),
            scene_id = ?snapshot.latest_scene_id(),
            trigger_count = activated.len(),
            implicit_count = implicit.len(),
            "Derived step activations"
        );

        let mut working = snapshot.clone();
        if !implicit.is_empty() {
            let last = working.lines().len().saturating_sub(1);
            working.merge_activated(last, implicit.iter().cloned(), self.clock.now())?;
        }

        let request = StepRequest {
            playthrough: working.clone(),
            activated_triggers: activated.clone(),
        };
        let Some(generated) = until_cancelled(token, self.services.narration.generate_step(request)).await
        else {
            return Ok(None);
        };
        let lines = generated.map_err(StoryError::Generation)?;
        if lines.is_empty() {
            return Err(StoryError::EmptyGeneration);
        }

        let Some(mut lines) = self.translate(&working, lines, token).await else {
            return Ok(None);
        };

        if let Some(url) = activated.iter().find_map(|trigger| trigger.event_image_url.clone()) {
            if let Some(first) = lines.first_mut() {
                first.meta.event_image_url = Some(url);
            }
        }

        if lines.last().is_some_and(|line| line.pauses() && !line.ends()) {
            let Some(hint) = self.hint(&working, &lines, token).await else {
                return Ok(None);
            };
            if let Some(last) = lines.last_mut() {
                last.meta.should_pause = false;
            }
            lines.push(hint);
        }

        Ok(Some(Cycle { implicit, lines }))
    }

    async fn translate(
        &self,
        playthrough: &Playthrough,
        mut lines: Vec<DisplayLine>,
        token: &CancellationToken,
    ) -> Option<Vec<DisplayLine>> {
        let language = playthrough
            .project()
            .settings
            .language
            .clone()
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| self.config.language.clone());
        if language == ORIGINAL_LANGUAGE {
            return Some(lines);
        }

        let texts = lines.iter().map(|line| line.text.clone()).collect();
        let translated = self.services.translation.translate(texts, language.clone());
        match until_cancelled(token, translated).await? {
            Ok(texts) if texts.len() == lines.len() => {
                for (line, text) in lines.iter_mut().zip(texts) {
                    line.text = text;
                }
            }
            Ok(texts) => tracing::warn!(
                language = %language,
                expected = lines.len(),
                received = texts.len(),
                "Translation length mismatch, keeping original text"
            ),
            Err(err) => tracing::warn!(
                language = %language,
                error = %err,
                "Translation failed, keeping original text"
            ),
        }
        Some(lines)
    }

    async fn hint(
        &self,
        playthrough: &Playthrough,
        lines: &[DisplayLine],
        token: &CancellationToken,
    ) -> Option<DisplayLine> {
        let mut projected = playthrough.lines().to_vec();
        projected.extend_from_slice(lines);

        let request = HintRequest {
            conditions: hint_conditions(playthrough, &projected),
            lines: projected,
            style_prompt: playthrough.cartridge().style.prompt.clone(),
            player_name: playthrough.player_name().map(str::to_string),
        };
        let hint = match until_cancelled(token, self.services.hints.generate_hint(request)).await? {
            Ok(hint) => hint,
            Err(err) => {
                tracing::warn!(error = %err, "Hint generation failed, using fallback hint");
                DisplayLine::hint(self.config.fallback_hint.clone())
            }
        };
        Some(hint.with_pause(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{NoticeLevel, ServiceError};
    use crate::test_fixtures::{self, GatedConditionChecker, GatedNarrator, StoryMocks};
    use plotline_domain::{
        scene_lines_for, Cartridge, LineKind, Project, Scene, SceneId, ScriptLine, Settings,
        Trigger, TriggerTracker,
    };

    fn quiet() -> DirectorConfig {
        DirectorConfig {
            eager_lookahead: false,
            ..DirectorConfig::default()
        }
    }

    fn line(text: &str) -> DisplayLine {
        DisplayLine::narration(text)
    }

    async fn director_with(
        mocks: StoryMocks,
        config: DirectorConfig,
        playthrough: Playthrough,
    ) -> Arc<StoryDirector> {
        let director = test_fixtures::director(mocks.into_services(), config);
        director.activate(playthrough).await;
        director
    }

    mod stepping {
        use super::*;

        #[tokio::test]
        async fn appends_generated_lines() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .returning(|_| Ok(vec![line("The gulls cry.")]));
            let director = director_with(mocks, quiet(), test_fixtures::playthrough()).await;

            let outcome = director.advance().await.unwrap();

            assert_eq!(outcome, StepOutcome::Generated { appended: 1 });
            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(snapshot.lines().len(), 3);
            assert_eq!(snapshot.lines()[2].text, "The gulls cry.");
        }

        #[tokio::test]
        async fn refuses_without_playthrough_or_past_halt() {
            let director = test_fixtures::director(StoryMocks::new().into_services(), quiet());
            assert_eq!(director.step().await.unwrap(), StepOutcome::NoPlaythrough);

            let mut paused = test_fixtures::playthrough();
            paused.append([line("Well?").with_pause(true)], test_fixtures::now());
            director.activate(paused).await;
            assert_eq!(director.step().await.unwrap(), StepOutcome::AwaitingInput);

            let mut ended = test_fixtures::playthrough();
            ended.append([line("Fin.").with_ending(None)], test_fixtures::now());
            director.activate(ended).await;
            assert_eq!(director.step().await.unwrap(), StepOutcome::Ended);
        }

        #[tokio::test]
        async fn event_image_goes_on_first_new_line() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .withf(|request| {
                    request.activated_triggers.len() == 1
                        && request.activated_triggers[0].id.as_str() == "tr-dock-board"
                })
                .returning(|_| Ok(vec![line("You climb aboard."), line("Ropes everywhere.")]));

            let mut playthrough = test_fixtures::playthrough();
            playthrough.append(
                [DisplayLine::player("I board").with_activated(["tr-dock-board"])],
                test_fixtures::now(),
            );
            let director = director_with(mocks, quiet(), playthrough).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(
                snapshot.lines()[3].meta.event_image_url.as_deref(),
                Some(test_fixtures::BOARDING_IMAGE)
            );
            assert_eq!(snapshot.lines()[4].meta.event_image_url, None);
        }
    }

    mod fallback_expiry {
        use super::*;

        fn quay() -> Playthrough {
            let cartridge = Cartridge {
                scenes: vec![Scene::new("sc-quay", "Quay")
                    .with_script_line(ScriptLine::narration("The tide is out."))
                    .with_trigger(Trigger::fallback("tr-quay-wait", 1).with_narrative("A bell rings."))],
                ..Default::default()
            };
            let project = Project::new(Settings::default(), cartridge, test_fixtures::now());
            let mut playthrough = Playthrough::begin(project, test_fixtures::now()).unwrap();
            playthrough.append([DisplayLine::player("I wait.")], test_fixtures::now());
            playthrough
        }

        #[tokio::test]
        async fn implicit_activation_is_recorded_on_player_line() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .withf(|request| {
                    let sent = &request.playthrough.lines()[1].meta.activated_trigger_ids;
                    request.activated_triggers.len() == 1
                        && request.activated_triggers[0].id.as_str() == "tr-quay-wait"
                        && sent == &vec![TriggerId::from("tr-quay-wait")]
                })
                .returning(|_| Ok(vec![line("A bell rings.")]));
            let director = director_with(mocks, quiet(), quay()).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(
                snapshot.lines()[1].meta.activated_trigger_ids,
                vec![TriggerId::from("tr-quay-wait")]
            );

            let scene_id = SceneId::from("sc-quay");
            let triggers = &snapshot.cartridge().scene(&scene_id).unwrap().triggers;
            let mut tracker = TriggerTracker::new(triggers, scene_lines_for(snapshot.lines(), &scene_id));
            assert!(tracker.state(&TriggerId::from("tr-quay-wait")).unwrap().consumed);
            assert!(tracker.take_activated().is_empty());
        }

        #[tokio::test]
        async fn failed_step_does_not_record_activation() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .returning(|_| Err(ServiceError::request_failed("timeout")));
            mocks
                .notifier
                .expect_notify()
                .times(1)
                .withf(|notice| notice.level == NoticeLevel::Error)
                .return_const(());
            let before = quay();
            let director = director_with(mocks, quiet(), before.clone()).await;

            let err = director.advance().await.unwrap_err();

            assert!(matches!(err, StoryError::Generation(_)));
            assert_eq!(director.snapshot().await.unwrap(), before);
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn generation_failure_is_surfaced_and_retryable() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(2)
                .returning(|_| Err(ServiceError::request_failed("upstream down")));
            mocks.notifier.expect_notify().times(2).return_const(());
            let before = test_fixtures::playthrough();
            let director = director_with(mocks, quiet(), before.clone()).await;

            assert!(director.step().await.is_err());
            assert!(matches!(director.step().await, Err(StoryError::Generation(_))));
            assert_eq!(director.snapshot().await.unwrap(), before);
        }

        #[tokio::test]
        async fn empty_generation_is_an_error() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .returning(|_| Ok(Vec::new()));
            mocks
                .notifier
                .expect_notify()
                .times(1)
                .withf(|notice| notice.message.contains("no lines"))
                .return_const(());
            let director = director_with(mocks, quiet(), test_fixtures::playthrough()).await;

            assert!(matches!(director.advance().await, Err(StoryError::EmptyGeneration)));
            assert_eq!(director.snapshot().await.unwrap().lines().len(), 2);
        }

        #[tokio::test]
        async fn hint_failure_falls_back() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .returning(|_| Ok(vec![line("Mara waits.").with_pause(true)]));
            mocks
                .hints
                .expect_generate_hint()
                .returning(|_| Err(ServiceError::invalid_response("not json")));
            let config = quiet();
            let fallback = config.fallback_hint.clone();
            let director = director_with(mocks, config, test_fixtures::playthrough()).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            let last = snapshot.last_line().unwrap();
            assert_eq!(last.text, fallback);
            assert!(last.pauses());
        }

        #[tokio::test]
        async fn translation_failure_keeps_original_text() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .returning(|_| Ok(vec![line("The gulls cry.")]));
            mocks
                .translation
                .expect_translate()
                .returning(|_, _| Err(ServiceError::request_failed("quota")));
            let config = DirectorConfig {
                language: "fr".into(),
                ..quiet()
            };
            let director = director_with(mocks, config, test_fixtures::playthrough()).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(snapshot.last_line().unwrap().text, "The gulls cry.");
        }
    }

    mod hints_and_lookahead {
        use super::*;

        #[tokio::test]
        async fn pause_moves_onto_hint_and_stops_lookahead() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .returning(|_| Ok(vec![line("Mara waits for an answer.").with_pause(true)]));
            mocks
                .hints
                .expect_generate_hint()
                .times(1)
                .withf(|request| {
                    request.player_name.as_deref() == Some("Sam")
                        && request.conditions.iter().any(|c| c.contains("looks at the ship"))
                        && !request.conditions.iter().any(|c| c.contains("whistles"))
                })
                .returning(|_| Ok(DisplayLine::hint("Ask about the ship.")));
            let director =
                director_with(mocks, DirectorConfig::default(), test_fixtures::playthrough()).await;

            let outcome = director.advance().await.unwrap();

            assert_eq!(outcome, StepOutcome::Generated { appended: 2 });
            let snapshot = director.snapshot().await.unwrap();
            assert!(!snapshot.lines()[2].pauses());
            assert_eq!(snapshot.lines()[3].kind, LineKind::Hint);
            assert!(snapshot.lines()[3].pauses());
            assert!(snapshot.is_halted());
        }

        #[tokio::test]
        async fn lookahead_stops_at_buffer() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(2)
                .returning(|_| Ok(vec![line("The fog thickens.")]));
            let config = DirectorConfig {
                lookahead_buffer: 3,
                ..DirectorConfig::default()
            };
            let director = director_with(mocks, config, test_fixtures::playthrough()).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(snapshot.lines().len(), 4);
            assert_eq!(snapshot.unread(), 3);
        }

        #[tokio::test]
        async fn cursor_reports_when_lookahead_is_due() {
            let mut playthrough = test_fixtures::playthrough();
            playthrough.append((0..5).map(|n| line(&format!("line {n}"))), test_fixtures::now());
            let config = DirectorConfig {
                lookahead_buffer: 3,
                ..DirectorConfig::default()
            };
            let director = director_with(StoryMocks::new(), config, playthrough).await;

            let far = director.set_cursor(1).await.unwrap();
            assert!(!far.lookahead_due);

            let near = director.set_cursor(100).await.unwrap();
            assert_eq!(near.cursor, 6);
            assert!(near.lookahead_due);
        }

        #[tokio::test]
        async fn spawned_advance_fills_buffer_when_due() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(3)
                .returning(|_| Ok(vec![line("Waves slap the pilings.")]));
            let config = DirectorConfig {
                lookahead_buffer: 3,
                ..DirectorConfig::default()
            };
            let director = director_with(mocks, config, test_fixtures::playthrough()).await;

            let moved = director.set_cursor(100).await.unwrap();
            assert_eq!(moved.cursor, 1);
            assert!(moved.lookahead_due);
            director.spawn_advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(snapshot.lines().len(), 5);
            assert_eq!(snapshot.unread(), 3);
            assert!(!director.set_cursor(1).await.unwrap().lookahead_due);
        }

        #[tokio::test]
        async fn translation_applies_to_new_lines() {
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .returning(|_| Ok(vec![line("The gulls cry.")]));
            mocks
                .translation
                .expect_translate()
                .withf(|texts, language| language == "fr" && texts.len() == 1)
                .returning(|texts, _| Ok(texts.into_iter().map(|t| format!("[fr] {t}")).collect()));

            let mut playthrough = test_fixtures::playthrough();
            let mut project = playthrough.project().clone();
            project.settings.language = Some("fr".into());
            playthrough = Playthrough::begin(project, test_fixtures::now()).unwrap();
            let director = director_with(mocks, quiet(), playthrough).await;

            director.advance().await.unwrap();

            let snapshot = director.snapshot().await.unwrap();
            assert_eq!(snapshot.last_line().unwrap().text, "[fr] The gulls cry.");
        }
    }

    mod input {
        use super::*;

        #[tokio::test]
        async fn merges_condition_results_onto_player_line() {
            let mut mocks = StoryMocks::new();
            mocks
                .conditions
                .expect_check_conditions()
                .times(1)
                .withf(|request| {
                    request.candidates.contains_key("tr-dock-look")
                        && !request.candidates.contains_key("tr-dock-board")
                        && request.scene_lines.last().map(|l| l.kind) == Some(LineKind::Player)
                })
                .returning(|_| Ok(vec![TriggerId::from("tr-dock-look"), TriggerId::from("tr-nope-1")]));
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .withf(|request| {
                    request.activated_triggers.len() == 1
                        && request.activated_triggers[0].id.as_str() == "tr-dock-look"
                })
                .returning(|_| Ok(vec![line("She is older than she looks.")]));
            let director = director_with(mocks, quiet(), test_fixtures::playthrough()).await;

            let outcome = director.submit_input("I look at the ship").await.unwrap();

            assert_eq!(
                outcome,
                InputOutcome::Accepted {
                    activated: vec![TriggerId::from("tr-dock-look")],
                    step: StepOutcome::Generated { appended: 1 },
                }
            );
            let snapshot = director.snapshot().await.unwrap();
            let player_line = &snapshot.lines()[2];
            assert_eq!(player_line.kind, LineKind::Player);
            assert_eq!(player_line.character_name.as_deref(), Some("Sam"));
            assert!(!player_line.pauses());
            assert_eq!(player_line.meta.activated_trigger_ids, vec![TriggerId::from("tr-dock-look")]);
            assert_eq!(snapshot.cursor(), 2);
        }

        #[tokio::test]
        async fn condition_failure_proceeds_without_activations() {
            let mut mocks = StoryMocks::new();
            mocks
                .conditions
                .expect_check_conditions()
                .returning(|_| Err(ServiceError::request_failed("timeout")));
            mocks
                .notifier
                .expect_notify()
                .times(1)
                .withf(|notice| notice.level == NoticeLevel::Warning)
                .return_const(());
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .withf(|request| request.activated_triggers.is_empty())
                .returning(|_| Ok(vec![line("Nothing happens.")]));
            let director = director_with(mocks, quiet(), test_fixtures::playthrough()).await;

            let outcome = director.submit_input("I dance").await.unwrap();

            assert!(matches!(
                outcome,
                InputOutcome::Accepted { ref activated, step: StepOutcome::Generated { .. } } if activated.is_empty()
            ));
        }

        #[tokio::test]
        async fn ended_story_rejects_input() {
            let mut ended = test_fixtures::playthrough();
            ended.append([line("Fin.").with_ending(Some("Quiet".into()))], test_fixtures::now());
            let director = director_with(StoryMocks::new(), quiet(), ended).await;

            assert_eq!(director.submit_input("hello?").await.unwrap(), InputOutcome::Ended);
        }
    }

    mod cancellation {
        use super::*;

        fn gated_director(narrator: GatedNarrator, config: DirectorConfig) -> Arc<StoryDirector> {
            let mut services = StoryMocks::new().into_services();
            services.narration = Arc::new(narrator);
            test_fixtures::director(services, config)
        }

        #[tokio::test]
        async fn switching_playthrough_drops_in_flight_result() {
            let narrator = GatedNarrator::new(vec![line("Too late.")]);
            let started = narrator.started();
            let director = gated_director(narrator, quiet());
            let original = test_fixtures::playthrough();
            director.activate(original.clone()).await;

            let running = {
                let director = Arc::clone(&director);
                tokio::spawn(async move { director.advance().await })
            };
            started.notified().await;

            let replacement = test_fixtures::playthrough();
            let previous = director.activate(replacement.clone()).await.unwrap();

            assert_eq!(running.await.unwrap().unwrap(), StepOutcome::Cancelled);
            assert_eq!(previous, original);
            assert_eq!(director.snapshot().await.unwrap(), replacement);
        }

        #[tokio::test]
        async fn input_and_steps_are_refused_while_generating() {
            let narrator = GatedNarrator::new(vec![line("At last.")]);
            let started = narrator.started();
            let release = narrator.release();
            let director = gated_director(narrator, quiet());
            director.activate(test_fixtures::playthrough()).await;

            let running = {
                let director = Arc::clone(&director);
                tokio::spawn(async move { director.advance().await })
            };
            started.notified().await;

            assert_eq!(director.step().await.unwrap(), StepOutcome::Busy);
            assert_eq!(director.submit_input("hurry").await.unwrap(), InputOutcome::Busy);

            release.notify_one();
            assert_eq!(
                running.await.unwrap().unwrap(),
                StepOutcome::Generated { appended: 1 }
            );
            assert_eq!(director.snapshot().await.unwrap().lines().len(), 3);
        }

        #[tokio::test]
        async fn activating_cancels_spawned_lookahead() {
            let narrator = GatedNarrator::new(vec![line("Never told.")]);
            let started = narrator.started();
            let release = narrator.release();
            let director = gated_director(narrator, DirectorConfig::default());
            let original = test_fixtures::playthrough();
            director.activate(original.clone()).await;

            assert!(director.set_cursor(100).await.unwrap().lookahead_due);
            let background = director.spawn_advance();
            started.notified().await;

            let replacement = test_fixtures::playthrough();
            let previous = director.activate(replacement.clone()).await.unwrap();
            release.notify_one();
            background.await.unwrap();

            assert_eq!(previous.lines(), original.lines());
            assert_eq!(director.snapshot().await.unwrap(), replacement);
        }

        #[tokio::test]
        async fn steps_are_refused_while_input_resolves() {
            let checker = GatedConditionChecker::new(vec![TriggerId::from("tr-dock-look")]);
            let started = checker.started();
            let release = checker.release();
            let mut mocks = StoryMocks::new();
            mocks
                .narration
                .expect_generate_step()
                .times(1)
                .returning(|_| Ok(vec![line("The hull is scarred and old.")]));
            let mut services = mocks.into_services();
            services.conditions = Arc::new(checker);
            let director = test_fixtures::director(services, quiet());
            director.activate(test_fixtures::playthrough()).await;

            let turn = {
                let director = Arc::clone(&director);
                tokio::spawn(async move { director.submit_input("I look at the ship").await })
            };
            started.notified().await;

            let resolving = director.snapshot().await.unwrap();
            assert_eq!(resolving.lines().len(), 3);
            assert_eq!(director.step().await.unwrap(), StepOutcome::Busy);
            assert_eq!(director.advance().await.unwrap(), StepOutcome::Busy);
            assert!(!director.set_cursor(2).await.unwrap().lookahead_due);
            assert_eq!(director.snapshot().await.unwrap(), resolving);

            release.notify_one();
            assert_eq!(
                turn.await.unwrap().unwrap(),
                InputOutcome::Accepted {
                    activated: vec![TriggerId::from("tr-dock-look")],
                    step: StepOutcome::Generated { appended: 1 },
                }
            );
            assert_eq!(director.snapshot().await.unwrap().lines().len(), 4);
        }

        #[tokio::test]
        async fn redo_forks_history() {
            let mut playthrough = test_fixtures::playthrough();
            playthrough.append([DisplayLine::player("wrong"), line("Oops.")], test_fixtures::now());
            let director = director_with(StoryMocks::new(), quiet(), playthrough.clone()).await;

            let fork = director.redo_from(2).await.unwrap().unwrap();

            assert_ne!(fork.id(), playthrough.id());
            assert_eq!(fork.lines(), &playthrough.lines()[..2]);
            assert_eq!(director.snapshot().await.unwrap(), fork);
            assert!(matches!(director.redo_from(0).await, Err(StoryError::Domain(_))));
        }
    }
}
