//! Per-Frame Simulation Step
//!
//! One call advances a running run by one rendered frame. Paused, idle and
//! finished runs are left untouched, so their clock cannot advance.

use crate::game::ability::{activate_singularity, process_singularity, AbilityError};
use crate::game::catalog::{LevelId, LEVEL3_SPEED_CREEP, LEVEL3_STAGES};
use crate::game::collision::{approach_hit, resolve_ground, Aabb};
use crate::game::events::{GameOverReason, RunEvent};
use crate::game::input::InputFrame;
use crate::game::schedule::{RunSchedule, ScheduledEffect};
use crate::game::spawn::{cull_obstacles, maybe_spawn_obstacle, recycle_grounds, spawn_star};
use crate::game::state::{RunConfig, RunPhase, RunState};

/// Stars further than this behind the player are dropped uncollected.
const STAR_DESPAWN_BEHIND: f32 = 20.0;

/// Longest frame the run clock accepts; a resumed background tab is clamped.
pub const MAX_FRAME_MS: f32 = 250.0;

/// Result of a frame.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this frame
    pub events: Vec<RunEvent>,
    /// Set on the frame the run ended
    pub game_over: Option<GameOverReason>,
    /// Outcome of an ability request made this frame
    pub ability: Option<Result<usize, AbilityError>>,
}

/// Run one frame.
///
/// # Arguments
///
/// * `state` - The run state (will be mutated)
/// * `schedule` - Periodic effects; entries for other runs are discarded
/// * `input` - Player input for this frame
/// * `dt_ms` - Frame duration added to the run clock
/// * `config` - Physics and spawn constants
pub fn tick(
    state: &mut RunState,
    schedule: &mut RunSchedule,
    input: &InputFrame,
    dt_ms: f32,
    config: &RunConfig,
) -> TickResult {
    let mut result = TickResult::default();

    if state.phase != RunPhase::Running {
        return result;
    }

    // 0. Advance the run clock and apply input
    state.frame += 1;
    state.elapsed_ms += clamp_frame(dt_ms);
    result.ability = apply_input(state, input, config);

    // 1. Move the player forward and sideways
    advance_player(state);

    // 2. Gravity and ground contact
    apply_gravity(state, config);

    // 3. Obstacle motion laws and the singularity orbit
    update_obstacles(state);

    // 4. Recycle ground behind the camera
    recycle_grounds(state, config);

    // 5. Keep the track populated ahead
    maybe_spawn_obstacle(state, config);
    cull_obstacles(state);

    // 6. Collisions (first fatal hit latches)
    check_collisions(state, config);

    // 7. Score, high score, stages
    if state.game_over.is_none() {
        update_score(state);
    }

    // 8. Run-clock scheduled effects and star pickups
    run_schedule(state, schedule);
    collect_stars(state, config);

    // 9. Termination
    if let Some(reason) = state.game_over {
        state.phase = RunPhase::GameOver;
        result.game_over = Some(reason);
        state.push_event(RunEvent::game_over(state.frame, reason, state.score));
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        frame = state.frame,
        z = state.player.position.z,
        obstacles = state.obstacles.len(),
        "frame simulated"
    );

    result.events = state.take_events();
    result.events.sort();
    result
}

/// Frame duration added to the run clock. Negative and NaN count as zero.
fn clamp_frame(dt_ms: f32) -> f32 {
    if dt_ms.is_nan() {
        0.0
    } else {
        dt_ms.clamp(0.0, MAX_FRAME_MS)
    }
}

/// Apply one frame of input.
fn apply_input(
    state: &mut RunState,
    input: &InputFrame,
    config: &RunConfig,
) -> Option<Result<usize, AbilityError>> {
    state.player.velocity.x = input.lateral.velocity();

    if input.jump_pressed() && state.player.on_ground {
        state.player.velocity.y = config.jump_velocity;
        state.player.on_ground = false;
        state.jumps += 1;
        state.push_event(RunEvent::jumped(state.frame));
    }

    if !input.ability_pressed() {
        return None;
    }

    let outcome = activate_singularity(state);
    match outcome {
        Ok(captured) => state.push_event(RunEvent::ability_activated(state.frame, captured)),
        Err(reason) => state.push_event(RunEvent::ability_rejected(state.frame, reason)),
    }
    Some(outcome)
}

/// Forward and lateral motion; level 3 creeps faster every frame.
fn advance_player(state: &mut RunState) {
    if state.level == LevelId::Three {
        state.forward_speed += LEVEL3_SPEED_CREEP;
    }
    state.player.position.x += state.player.velocity.x;
    state.player.position.z -= state.forward_speed;
}

/// Integrate gravity and snap onto the ground on contact.
fn apply_gravity(state: &mut RunState, config: &RunConfig) {
    let player = &mut state.player;
    let previous_bottom = player.position.y - player.size.y / 2.0;
    player.velocity.y += config.gravity;
    player.position.y += player.velocity.y;
    player.on_ground = false;

    let surface_offset = config.ground_size.y / 2.0;
    let contact = resolve_ground(
        &player.collider(),
        previous_bottom,
        player.velocity.y,
        &state.grounds,
        surface_offset,
    );
    if let Some(contact) = contact {
        player.on_ground = true;
        player.velocity.y = 0.0;
        player.position.y = contact.rest_y;
    }
}

/// Run every obstacle's own motion law, then the singularity.
fn update_obstacles(state: &mut RunState) {
    let elapsed = state.elapsed_ms;
    let player_z = state.player.position.z;
    for obstacle in state.obstacles.iter_mut() {
        obstacle.update(elapsed, player_z);
    }

    process_singularity(state);
}

/// Obstacle and kill-plane checks.
fn check_collisions(state: &mut RunState, config: &RunConfig) {
    if state.game_over.is_some() {
        return;
    }

    let player_box = state.player.collider();
    let player_pos = state.player.position;

    for obstacle in state.obstacles.iter().filter(|o| o.active && !o.is_captured()) {
        if obstacle.is_approach_type() {
            if approach_hit(obstacle.position, player_pos) {
                state.game_over = Some(GameOverReason::HitWreckage);
                return;
            }
        } else if obstacle.colliders().iter().any(|c| c.overlaps(&player_box)) {
            state.game_over = Some(GameOverReason::HitObstacle);
            return;
        }
    }

    if player_pos.y < config.kill_plane_y {
        state.game_over = Some(GameOverReason::FellIntoSpace);
    }
}

/// Score from distance, high-score banner, level-3 stages.
fn update_score(state: &mut RunState) {
    let distance = (-state.player.position.z).max(0.0);
    let score = distance.floor() as u32;

    if score > state.score {
        state.score = score;
        state.push_event(RunEvent::score_changed(state.frame, score));
    }

    if !state.high_score_announced
        && state.starting_high_score > 0
        && state.score > state.starting_high_score
    {
        state.high_score_announced = true;
        state.push_event(RunEvent::new_high_score(state.frame, state.score, state.starting_high_score));
    }

    if state.level == LevelId::Three {
        for rule in LEVEL3_STAGES {
            if rule.stage > state.stage && state.score >= rule.score_threshold {
                state.stage = rule.stage;
                state.forward_speed += rule.speed_bonus;
                state.spawn_interval = rule.spawn_interval;
                state.push_event(RunEvent::stage_advanced(state.frame, rule.stage));
            }
        }
    }
}

/// Fire due run-clock effects.
fn run_schedule(state: &mut RunState, schedule: &mut RunSchedule) {
    for effect in schedule.poll(state.run_id, state.elapsed_ms) {
        match effect {
            ScheduledEffect::CollectibleStar => {
                spawn_star(state);
            }
            ScheduledEffect::ShootingStar => {
                state.push_event(RunEvent::shooting_star(state.frame));
            }
        }
    }
}

/// Pick up overlapping stars and drop ones left behind.
fn collect_stars(state: &mut RunState, config: &RunConfig) {
    let player_box = state.player.collider();
    let player_z = state.player.position.z;

    let mut collected = Vec::new();
    state.stars.retain(|star| {
        if Aabb::new(star.position, config.star_size).overlaps(&player_box) {
            collected.push(star.id);
            false
        } else {
            star.position.z <= player_z + STAR_DESPAWN_BEHIND
        }
    });

    for star_id in collected {
        state.stars_collected += 1;
        state.push_event(RunEvent::star_collected(state.frame, star_id));
    }
}
