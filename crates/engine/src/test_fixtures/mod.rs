//! Shared test fixtures.
//!
//! A small harbor cartridge, mock bundles for the story services and services
//! that block until released, for exercising in-flight behavior.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use plotline_domain::{
    Cartridge, Character, DisplayLine, Playthrough, Project, Scene, ScriptLine, Settings, Trigger,
    TriggerId,
};
use tokio::sync::Notify;

use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::config::DirectorConfig;
use crate::infrastructure::ports::{
    ConditionCheckPort, ConditionCheckRequest, MockConditionCheckPort, MockHintPort,
    MockNarrationPort, MockNotifierPort, MockTranslationPort, NarrationPort, ServiceError,
    StepRequest,
};
use crate::use_cases::story::{StoryDirector, StoryServices};

pub const BOARDING_IMAGE: &str = "images/boarding.png";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(now()))
}

/// Two scenes: a dock with dependent and secret action triggers, and a ship
/// whose fallback ends the story.
pub fn cartridge() -> Cartridge {
    let dock = Scene::new("sc-dock", "The Dock")
        .with_character("ch-mara")
        .with_script_line(ScriptLine::narration("Fog rolls over the dock."))
        .with_script_line(ScriptLine::spoken("ch-mara", "You're late."))
        .with_trigger(
            Trigger::action("tr-dock-look", "The player looks at the ship")
                .with_narrative("The hull is scarred and old."),
        )
        .with_trigger(
            Trigger::action("tr-dock-board", "The player boards the ship")
                .with_depends_on(["tr-dock-look"])
                .with_narrative("You climb the gangway.")
                .with_event_image(BOARDING_IMAGE)
                .with_go_to("sc-ship"),
        )
        .with_trigger(
            Trigger::action("tr-dock-whistle", "The player whistles the old tune")
                .with_secret(true)
                .with_narrative("Mara freezes."),
        );

    let ship = Scene::new("sc-ship", "The Ship")
        .with_script_line(ScriptLine::narration("The deck creaks."))
        .with_trigger(
            Trigger::fallback("tr-ship-sail", 1)
                .with_narrative("The ship slips its moorings.")
                .with_go_to("end")
                .with_ending("Open Water"),
        );

    Cartridge {
        scenes: vec![dock, ship],
        characters: vec![Character::new("ch-mara", "Mara"), Character::new("ch-you", "Sam")],
        ..Default::default()
    }
}

pub fn project() -> Project {
    let settings = Settings {
        title: "Harbor".into(),
        player_id: Some("ch-you".into()),
        starting_scene_id: Some("sc-dock".into()),
        language: None,
    };
    Project::new(settings, cartridge(), now())
}

/// Fresh playthrough of [`project`]: the dock's two opening lines.
pub fn playthrough() -> Playthrough {
    Playthrough::begin(project(), now()).unwrap()
}

/// Story service mocks with no expectations set.
pub struct StoryMocks {
    pub narration: MockNarrationPort,
    pub conditions: MockConditionCheckPort,
    pub hints: MockHintPort,
    pub translation: MockTranslationPort,
    pub notifier: MockNotifierPort,
}

impl StoryMocks {
    pub fn new() -> Self {
        Self {
            narration: MockNarrationPort::new(),
            conditions: MockConditionCheckPort::new(),
            hints: MockHintPort::new(),
            translation: MockTranslationPort::new(),
            notifier: MockNotifierPort::new(),
        }
    }

    pub fn into_services(self) -> StoryServices {
        StoryServices {
            narration: Arc::new(self.narration),
            conditions: Arc::new(self.conditions),
            hints: Arc::new(self.hints),
            translation: Arc::new(self.translation),
            notifier: Arc::new(self.notifier),
        }
    }
}

impl Default for StoryMocks {
    fn default() -> Self {
        Self::new()
    }
}

pub fn director(services: StoryServices, config: DirectorConfig) -> Arc<StoryDirector> {
    Arc::new(StoryDirector::new(services, clock(), config))
}

/// Narrator that signals when called and then waits for a release.
pub struct GatedNarrator {
    started: Arc<Notify>,
    release: Arc<Notify>,
    lines: Vec<DisplayLine>,
}

impl GatedNarrator {
    pub fn new(lines: Vec<DisplayLine>) -> Self {
        Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            lines,
        }
    }

    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn release(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl NarrationPort for GatedNarrator {
    async fn generate_step(&self, _request: StepRequest) -> Result<Vec<DisplayLine>, ServiceError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.lines.clone())
    }
}

/// Condition checker that signals when called and then waits for a release.
pub struct GatedConditionChecker {
    started: Arc<Notify>,
    release: Arc<Notify>,
    activated: Vec<TriggerId>,
}

impl GatedConditionChecker {
    pub fn new(activated: Vec<TriggerId>) -> Self {
        Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            activated,
        }
    }

    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn release(&self) -> Arc<Notify> {
        Arc::clone(&self.release)
    }
}

#[async_trait]
impl ConditionCheckPort for GatedConditionChecker {
    async fn check_conditions(
        &self,
        _request: ConditionCheckRequest,
    ) -> Result<Vec<TriggerId>, ServiceError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.activated.clone())
    }
}
