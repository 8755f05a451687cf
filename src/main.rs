//! Star Runner
//!
//! Headless driver for the run and progression engine. Plays scripted runs
//! against the on-disk save so unlocks, quests and the shop can be watched
//! in the log.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use star_runner::{
    config::EngineConfig,
    frontend::{LogNotifier, NullRenderer, Renderer, Texture, TextureTable, TrailMaterialCache},
    game::events::RunEventData,
    game::state::RunState,
    FileStore, GameOrchestrator, GameOverAction, InputFrame, Lateral, FRAME_RATE, VERSION,
};

/// Obstacles closer than this trigger the autopilot.
const LOOKAHEAD: f32 = 12.0;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let config = EngineConfig::from_env();
    info!("Star Runner v{}", VERSION);
    info!("Frame Rate: {} Hz, demo budget {} frames", FRAME_RATE, config.demo_frames);
    info!("Save file: {}", config.save_path.display());

    let backend = FileStore::open(&config.save_path)
        .with_context(|| format!("failed to open save file {}", config.save_path.display()))?;
    let today = chrono::Local::now().date_naive();
    let mut game = GameOrchestrator::new(backend, LogNotifier, today, config.seed, config.run.clone());

    for quest in &game.quests().quests {
        info!("Quest: {} ({})", quest.description(), quest.progress_text());
    }

    demo_session(&mut game, &config)?;

    if game.quests().unclaimed_total() > 0 {
        let claimed = game.claim_rewards();
        info!("Claimed {} stars, balance {}", claimed, game.profile().currency);
    }
    Ok(())
}

/// Play runs back to back until the frame budget is spent.
fn demo_session(game: &mut GameOrchestrator<FileStore, LogNotifier>, config: &EngineConfig) -> Result<()> {
    let mut renderer = NullRenderer::new();
    let textures = TextureTable::load_all(&mut renderer);
    let mut trails = TrailMaterialCache::new();
    info!("Floor color: {:06x}", textures.base_color(Texture::SpaceshipFloor));

    let mut runs = 0u32;
    let mut frames = 0u32;

    while frames < config.demo_frames {
        game.start_run().context("failed to start run")?;
        runs += 1;

        let character = game.selected_character();
        let skin = game.current_skin();
        let model = renderer.create_character_model(character, skin);
        trails.get_or_create(&mut renderer, character, skin);
        let mut obstacle_models = Vec::new();

        loop {
            let input = match game.session() {
                Some(session) => autopilot(&session.state),
                None => break,
            };
            let report = game.frame(&input, config.frame_ms)?;
            for event in &report.events {
                if let RunEventData::ObstacleSpawned { kind, .. } = &event.data {
                    obstacle_models.push(renderer.create_obstacle(*kind));
                }
            }
            renderer.animate_character(model, frames as f32 * config.frame_ms);
            frames += 1;

            if frames % (10 * FRAME_RATE) == 0 {
                if let Some(session) = game.session() {
                    info!(
                        "Frame {}: score {}, {} obstacles, {} stars",
                        frames,
                        session.state.score,
                        session.state.active_obstacle_count(),
                        game.profile().currency
                    );
                }
            }

            if let Some(outcome) = report.outcome {
                info!("Run {} ended with {} points", runs, outcome.final_score);
                follow_unlock(game, outcome.actions.first().copied())?;
                break;
            }
            if frames >= config.demo_frames {
                game.back_to_menu();
                break;
            }
        }
        renderer.release(model);
        for handle in obstacle_models {
            renderer.release(handle);
        }
    }

    info!("=== Demo Results ===");
    info!("Runs played: {}", runs);
    for (level, best) in &game.profile().high_scores {
        info!("{} best: {}", level, best);
    }
    info!("Trail materials built: {}, models still live: {}", trails.len(), renderer.live_handles());
    Ok(())
}

/// Switch the menu selection to whatever the last run unlocked.
fn follow_unlock(game: &mut GameOrchestrator<FileStore, LogNotifier>, action: Option<GameOverAction>) -> Result<()> {
    match action {
        Some(GameOverAction::PlayLevelWith { level, character }) => {
            game.select_level(level)?;
            game.select_character(character)?;
        }
        Some(GameOverAction::PlayLevel(level)) => game.select_level(level)?,
        Some(GameOverAction::TryCharacter(character)) => game.select_character(character)?,
        _ => return Ok(()),
    }
    info!("Next run: {} as {}", game.selected_level(), game.selected_character());
    Ok(())
}

/// Hop over or steer around the nearest obstacle ahead.
fn autopilot(state: &RunState) -> InputFrame {
    let player = state.player.position;
    let threat = state
        .obstacles
        .iter()
        .filter(|o| o.active && !o.is_captured())
        .filter(|o| o.position.z < player.z && o.position.z > player.z - LOOKAHEAD)
        .min_by(|a, b| b.position.z.total_cmp(&a.position.z));

    let Some(obstacle) = threat else {
        return InputFrame::new();
    };

    let lateral = if obstacle.position.x > player.x { Lateral::Left } else { Lateral::Right };
    let mut input = InputFrame::with_lateral(lateral);
    if state.player.on_ground && obstacle.position.z > player.z - LOOKAHEAD / 2.0 {
        input = input.jump();
    }
    if state.character().has_singularity() && !state.singularity.used {
        input = input.ability();
    }
    input
}
