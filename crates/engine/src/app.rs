//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    config::DirectorConfig,
    memory_store::InMemoryStore,
    notifier::TracingNotifier,
    offline::{
        KeywordConditionChecker, OfflineHinter, OfflineNarrator, PassthroughTranslator,
        StarterIdeas,
    },
    ports::{ClockPort, IdeaPort, KeyValueStore},
};
use crate::repositories::{PlaythroughRepository, ProjectRepository};
use crate::use_cases::{
    authoring::{ApplyEdits, GenerateProject},
    AuthoringUseCases, PlaythroughOps, StoryDirector, StoryServices,
};

/// Main application state.
///
/// Holds the repositories, the use cases and the story director.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub director: Arc<StoryDirector>,
}

pub struct Repositories {
    pub projects: Arc<ProjectRepository>,
    pub playthroughs: Arc<PlaythroughRepository>,
}

/// Container for all use cases.
pub struct UseCases {
    pub authoring: AuthoringUseCases,
    pub playthroughs: PlaythroughOps,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        services: StoryServices,
        ideas: Arc<dyn IdeaPort>,
        clock: Arc<dyn ClockPort>,
        config: DirectorConfig,
    ) -> Self {
        let projects = Arc::new(ProjectRepository::new(Arc::clone(&store)));
        let playthroughs = Arc::new(PlaythroughRepository::new(store));

        let authoring = AuthoringUseCases::new(
            ApplyEdits::new(Arc::clone(&projects), Arc::clone(&clock)),
            GenerateProject::new(ideas, Arc::clone(&projects), Arc::clone(&clock)),
        );
        let playthrough_ops =
            PlaythroughOps::new(Arc::clone(&projects), Arc::clone(&playthroughs), Arc::clone(&clock));
        let director = Arc::new(StoryDirector::new(services, clock, config));

        Self {
            repositories: Repositories {
                projects,
                playthroughs,
            },
            use_cases: UseCases {
                authoring,
                playthroughs: playthrough_ops,
            },
            director,
        }
    }

    /// Wire the offline adapters over an in-memory store.
    pub fn offline(config: DirectorConfig) -> Self {
        let services = StoryServices {
            narration: Arc::new(OfflineNarrator),
            conditions: Arc::new(KeywordConditionChecker),
            hints: Arc::new(OfflineHinter),
            translation: Arc::new(PassthroughTranslator),
            notifier: Arc::new(TracingNotifier),
        };
        Self::new(
            Arc::new(InMemoryStore::new()),
            services,
            Arc::new(StarterIdeas),
            Arc::new(SystemClock),
            config,
        )
    }
}
