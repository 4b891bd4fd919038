//! Headless endless-play demo -- a scripted player taps through a small
//! catalog and the session log goes to the console.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example endless_console -p playforge-session

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use playforge_session::prelude::*;

const DT: f64 = 1.0 / 60.0;

/// Surface that prints a one-line scoreboard per play instead of drawing.
struct ConsoleSurface;

impl RenderSurface for ConsoleSurface {
    fn attach(&mut self) {
        tracing::info!("surface attached");
    }

    fn detach(&mut self) {
        tracing::info!("surface detached");
    }

    fn present(&mut self, _view: &PlayView<'_>) {}
}

struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PlayStarted { game } => tracing::info!(%game, "play started"),
            SessionEvent::PlayFinished { game, result } => tracing::info!(
                %game,
                score = result.score,
                success = result.success,
                "play finished"
            ),
            SessionEvent::PoolFilled { count } => tracing::info!(count, "pool filled"),
            SessionEvent::FetchFailed { details } => tracing::warn!(details, "fetch failed"),
        }
    }
}

fn catalog() -> anyhow::Result<StaticCatalog> {
    let tap_game = |id: &str, title: &str| -> anyhow::Result<PublicGame> {
        let project = serde_json::from_str(
            r#"{
                "objects": [{"id": "target", "kind": "balloon",
                             "position": {"x": 0.5, "y": 0.5},
                             "size": {"x": 0.2, "y": 0.2}}],
                "rules": [
                    {"subject": "target",
                     "condition": {"type": "touch", "gesture": "down"},
                     "actions": [{"type": "score", "points": 1},
                                 {"type": "sound", "clipId": "pop"},
                                 {"type": "move", "kind": "teleport", "to": "random"}]},
                    {"subject": "target",
                     "condition": {"type": "always"},
                     "actions": [{"type": "effect", "kind": "glow",
                                  "color": {"r": 1.0, "g": 0.8, "b": 0.2},
                                  "intensity": 0.6, "duration": 0.4}]}
                ],
                "settings": {"duration": 8.0, "targetScore": 3}
            }"#,
        )
        .context("demo project should parse")?;
        Ok(PublicGame {
            id: GameId::new(id),
            title: title.to_owned(),
            author: "demo".to_owned(),
            project: Some(project),
            stats: GameStats::default(),
        })
    };

    Ok(StaticCatalog::new(vec![
        tap_game("g-1", "Balloon Frenzy")?,
        tap_game("g-2", "Pop Rush")?,
        tap_game("g-3", "Tap Storm")?,
    ]))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let runner = GameRunner::new(Box::new(ConsoleSurface), Box::new(NullSoundSink), 2024);
    let mut session = SessionOrchestrator::new(
        Arc::new(catalog()?),
        runner,
        Box::new(LogTelemetry),
        CatalogQuery::default(),
        SessionConfig {
            bridge_seconds: 1.0,
            seed: 2024,
            ..SessionConfig::default()
        },
    );

    // Simulate ~30 seconds of a player who taps whatever is under the
    // (scripted) finger whenever a play is active.
    let mut simulated = 0.0;
    while simulated < 30.0 && session.phase() != SessionPhase::Error {
        let events = match (session.phase(), session.runner().view()) {
            (SessionPhase::Playing, Some(view)) => {
                let target = view
                    .scene()
                    .object(&ObjectId::new("target"))
                    .map(|o| o.position);
                match target {
                    Some(at) => vec![
                        PointerEvent::Down {
                            position: at,
                            time: view.elapsed(),
                        },
                        PointerEvent::Up {
                            position: at,
                            time: view.elapsed() + 0.01,
                        },
                    ],
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        session.update(DT, &events);
        simulated += DT;
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let summary = session.exit();
    tracing::info!(
        plays = summary.plays,
        total_score = summary.total_score,
        "session over"
    );
    Ok(())
}
