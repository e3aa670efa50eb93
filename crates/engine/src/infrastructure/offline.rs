//! Deterministic stand-ins for the generation services.
//!
//! They let the story director run end to end without a model: narration echoes
//! trigger narratives and expands scene transitions, the condition check matches
//! keywords, and translation is the identity.

use async_trait::async_trait;
use plotline_domain::{
    governing_transition, Cartridge, Character, DisplayLine, LineKind, Scene, ScriptLine,
    Settings, Trigger,
};

use crate::infrastructure::ports::{
    ConditionCheckPort, ConditionCheckRequest, GeneratedProject, HintPort, HintRequest, IdeaPort,
    IdeaRequest, NarrationPort, ServiceError, StepRequest, TranslationPort,
};

/// Words shorter than this never decide a condition match.
const MIN_KEYWORD_LEN: usize = 4;

pub struct OfflineNarrator;

#[async_trait]
impl NarrationPort for OfflineNarrator {
    async fn generate_step(&self, request: StepRequest) -> Result<Vec<DisplayLine>, ServiceError> {
        let StepRequest {
            playthrough,
            activated_triggers,
        } = request;

        let mut lines: Vec<DisplayLine> = activated_triggers
            .iter()
            .filter(|trigger| !trigger.narrative.trim().is_empty())
            .map(|trigger| DisplayLine::narration(trigger.narrative.clone()))
            .collect();

        match governing_transition(&activated_triggers).filter(|t| t.go_to_scene_id.is_some()) {
            Some(transition) if transition.ends_story() => {
                let closing = lines
                    .pop()
                    .unwrap_or_else(|| DisplayLine::narration("The story ends."));
                lines.push(closing.with_ending(transition.ending_name.clone()));
                return Ok(lines);
            }
            Some(transition) => {
                let next = transition
                    .go_to_scene_id
                    .as_ref()
                    .and_then(|id| playthrough.cartridge().scene(id));
                if let Some(scene) = next {
                    lines.extend(scene.opening_lines(&playthrough.cartridge().characters));
                }
            }
            None => {}
        }

        if lines.is_empty() {
            let echo = playthrough
                .lines()
                .iter()
                .rev()
                .find(|line| line.kind == LineKind::Player)
                .map(|line| format!("Nothing comes of \"{}\".", line.text))
                .unwrap_or_else(|| "The scene holds still.".to_string());
            lines.push(DisplayLine::narration(echo));
        }

        if let Some(last) = lines.last_mut() {
            last.meta.should_pause = true;
        }
        Ok(lines)
    }
}

/// Satisfies a condition when the latest player line shares a keyword with it.
pub struct KeywordConditionChecker;

#[async_trait]
impl ConditionCheckPort for KeywordConditionChecker {
    async fn check_conditions(
        &self,
        request: ConditionCheckRequest,
    ) -> Result<Vec<plotline_domain::TriggerId>, ServiceError> {
        let Some(player_line) = request
            .scene_lines
            .iter()
            .rev()
            .find(|line| line.kind == LineKind::Player)
        else {
            return Ok(Vec::new());
        };

        let said = keywords(&player_line.text);
        Ok(request
            .candidates
            .into_iter()
            .filter(|(_, condition)| keywords(condition).iter().any(|word| said.contains(word)))
            .map(|(id, _)| id)
            .collect())
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

pub struct OfflineHinter;

#[async_trait]
impl HintPort for OfflineHinter {
    async fn generate_hint(&self, request: HintRequest) -> Result<DisplayLine, ServiceError> {
        let text = match request.conditions.first() {
            Some(condition) => format!("Perhaps: {condition}"),
            None => "Nothing obvious stands out. Try something.".to_string(),
        };
        Ok(DisplayLine::hint(text).with_pause(true))
    }
}

pub struct PassthroughTranslator;

#[async_trait]
impl TranslationPort for PassthroughTranslator {
    async fn translate(&self, texts: Vec<String>, _language: String) -> Result<Vec<String>, ServiceError> {
        Ok(texts)
    }
}

/// Produces a small built-in story regardless of the request.
pub struct StarterIdeas;

#[async_trait]
impl IdeaPort for StarterIdeas {
    async fn generate_project(&self, request: IdeaRequest) -> Result<GeneratedProject, ServiceError> {
        let title = request
            .prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| "The Lighthouse".to_string());

        let keeper = Character::new("ch-keeper", "Ines")
            .with_description("The old lighthouse keeper, evasive about the missing ship.");
        let player = Character::new("ch-player", "You");

        let shore = Scene::new("sc-shore", "The Shore")
            .with_character("ch-keeper")
            .with_script_line(ScriptLine::narration("Waves hammer the rocks below the lighthouse."))
            .with_script_line(ScriptLine::spoken("ch-keeper", "You shouldn't be out here."))
            .with_trigger(
                Trigger::action("tr-shore-ask", "The player asks about the missing ship")
                    .with_narrative("Ines glances at the lamp room and says nothing."),
            )
            .with_trigger(
                Trigger::action("tr-shore-climb", "The player climbs the lighthouse stairs")
                    .with_depends_on(["tr-shore-ask"])
                    .with_narrative("The stairs groan under your weight.")
                    .with_go_to("sc-lamp"),
            )
            .with_trigger(
                Trigger::fallback("tr-shore-storm", 3)
                    .with_narrative("The storm drives you inside.")
                    .with_go_to("sc-lamp"),
            );

        let lamp = Scene::new("sc-lamp", "The Lamp Room")
            .with_script_line(ScriptLine::narration("The great lens is dark."))
            .with_trigger(
                Trigger::action("tr-lamp-light", "The player lights the lamp")
                    .with_narrative("Far out at sea, a horn answers the light.")
                    .with_go_to("end")
                    .with_ending("Homecoming"),
            );

        Ok(GeneratedProject {
            settings: Settings {
                title,
                player_id: Some(player.id.clone()),
                starting_scene_id: Some(shore.id.clone()),
                language: None,
            },
            cartridge: Cartridge {
                scenes: vec![shore, lamp],
                characters: vec![keeper, player],
                ..Default::default()
            },
        })
    }
}
