//! Plotline Engine - terminal playtest.
//!
//! Plays a project against the offline generation services. Anything typed is a
//! player turn; `/redo N` continues from a fork keeping lines before `N`, and
//! `/quit` leaves.

use std::path::Path;

use anyhow::Context;
use plotline_domain::{sanitize_trigger_ids, Cartridge, DisplayLine, LineKind, Project, Settings};
use plotline_engine::infrastructure::config::EngineConfig;
use plotline_engine::infrastructure::ports::IdeaRequest;
use plotline_engine::use_cases::{InputOutcome, StepOutcome, StoryError};
use plotline_engine::App;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Project file accepted by `PLOTLINE_PROJECT_PATH`.
#[derive(Deserialize)]
struct ProjectFile {
    #[serde(default)]
    settings: Settings,
    cartridge: Cartridge,
}

enum Command {
    Quit,
    Redo(usize),
    Say(String),
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input == "/quit" {
            return Some(Self::Quit);
        }
        if let Some(index) = input.strip_prefix("/redo") {
            return match index.trim().parse() {
                Ok(index) => Some(Self::Redo(index)),
                Err(_) => {
                    eprintln!("usage: /redo <line number>");
                    None
                }
            };
        }
        Some(Self::Say(input.to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Logs go to stderr so they don't interleave with the story on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plotline_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Plotline playtest");

    let config = EngineConfig::from_env();
    let app = App::offline(config.director.clone());

    let project = match &config.project_path {
        Some(path) => import_project(&app, path).await?,
        None => app
            .use_cases
            .authoring
            .generate_project
            .execute(IdeaRequest::default())
            .await?,
    };
    println!("== {} ==", project.settings.title);

    let playthrough = app.use_cases.playthroughs.start(&project.id).await?;
    app.director.activate(playthrough).await;
    report_step(app.director.advance().await);
    let mut shown = show_new_lines(&app, 0).await;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        match command {
            Command::Quit => break,
            Command::Redo(index) => match app.director.redo_from(index).await {
                Ok(Some(fork)) => {
                    shown = fork.lines().len();
                    println!("-- continuing from line {index} --");
                    report_step(app.director.advance().await);
                }
                Ok(None) => {}
                Err(err) => eprintln!("{err}"),
            },
            Command::Say(text) => match app.director.submit_input(text).await {
                Ok(InputOutcome::Busy) => eprintln!("still writing, try again in a moment"),
                Ok(_) => {}
                Err(err) => tracing::debug!(error = %err, "Turn failed"),
            },
        }

        shown = show_new_lines(&app, shown).await;
        if let Some(snapshot) = app.director.snapshot().await {
            app.use_cases.playthroughs.save(&snapshot).await?;
            if snapshot.has_ended() {
                break;
            }
        }
    }

    if let Some(playthrough) = app.director.deactivate().await {
        app.use_cases.playthroughs.save(&playthrough).await?;
        tracing::info!(
            playthrough_id = %playthrough.id(),
            lines = playthrough.lines().len(),
            "Saved playthrough"
        );
    }
    Ok(())
}

/// Load a project file, repair its trigger ids and store it.
async fn import_project(app: &App, path: &Path) -> anyhow::Result<Project> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading project file {}", path.display()))?;
    let file: ProjectFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing project file {}", path.display()))?;

    let mut cartridge = file.cartridge;
    for rename in sanitize_trigger_ids(&mut cartridge) {
        tracing::warn!(scene_id = %rename.scene_id, from = %rename.from, to = %rename.to, "Renamed trigger");
    }

    let project = Project::new(file.settings, cartridge, chrono::Utc::now());
    app.repositories.projects.save(&project).await?;
    Ok(project)
}

/// Print lines past `shown`, move the cursor to the end, and return the new count.
///
/// Starts background look-ahead when the cursor move makes it due.
async fn show_new_lines(app: &App, shown: usize) -> usize {
    let Some(snapshot) = app.director.snapshot().await else {
        return shown;
    };

    for (index, line) in snapshot.lines().iter().enumerate().skip(shown) {
        println!("[{index}] {}", render(line));
        if let Some(ending) = line.ends().then_some(line.meta.ending_name.as_deref()) {
            println!("== THE END{} ==", ending.map(|name| format!(": {name}")).unwrap_or_default());
        }
    }

    let total = snapshot.lines().len();
    let moved = app.director.set_cursor(total.saturating_sub(1)).await;
    if moved.is_some_and(|moved| moved.lookahead_due) {
        // Read-ahead lines show up with the next command.
        app.director.spawn_advance();
    }
    total
}

fn render(line: &DisplayLine) -> String {
    match (line.kind, line.character_name.as_deref()) {
        (LineKind::Player, _) => format!("> {}", line.text),
        (LineKind::Hint, _) => format!("(hint) {}", line.text),
        (_, Some(name)) if !name.is_empty() => format!("{name}: {}", line.text),
        _ => line.text.clone(),
    }
}

fn report_step(result: Result<StepOutcome, StoryError>) {
    if let Err(err) = result {
        tracing::debug!(error = %err, "Step failed");
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
