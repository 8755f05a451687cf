//! Spawning
//!
//! Obstacle placement ahead of the player, ground segment recycling and
//! collectible star placement.

use crate::core::vec3::Vec3;
use crate::game::events::RunEvent;
use crate::game::obstacle::{Obstacle, ObstacleKind};
use crate::game::state::{CollectibleStar, RunConfig, RunState};

/// Place one obstacle beyond the last spawn point.
///
/// The kind is drawn uniformly from the level whitelist and the gap
/// uniformly from `[min_spawn_interval, spawn_interval)`.
pub fn spawn_obstacle(state: &mut RunState, config: &RunConfig) -> u32 {
    let kinds = state.level.config().obstacle_kinds();
    let kind = state
        .rng
        .choose(kinds)
        .copied()
        .unwrap_or(ObstacleKind::AsteroidField);

    let gap = state.rng.range_f32(state.min_spawn_interval, state.spawn_interval);
    let x = (state.rng.next_f32() - 0.5) * config.spawn_spread_x;
    let z = state.last_spawn_z - gap;

    let id = state.next_obstacle_id;
    state.next_obstacle_id += 1;

    let obstacle = Obstacle::spawn(id, kind, Vec3::new(x, 0.0, z), &mut state.rng);
    state.obstacles.push(obstacle);
    state.last_spawn_z = z;

    state.push_event(RunEvent::obstacle_spawned(state.frame, id, kind));
    id
}

/// Place the opening set of obstacles.
pub fn prespawn_obstacles(state: &mut RunState, config: &RunConfig) {
    for _ in 0..config.prespawn_count {
        spawn_obstacle(state, config);
    }
}

/// Spawn one obstacle if the spawn frontier is within view.
///
/// Returns true if an obstacle was placed.
pub fn maybe_spawn_obstacle(state: &mut RunState, config: &RunConfig) -> bool {
    if state.last_spawn_z > state.player.position.z - config.spawn_ahead {
        spawn_obstacle(state, config);
        true
    } else {
        false
    }
}

/// Drop obstacles that are no longer active.
pub fn cull_obstacles(state: &mut RunState) {
    state.obstacles.retain(|o| o.active);
}

/// Move ground segments that fell behind the camera to the front of the
/// track.
pub fn recycle_grounds(state: &mut RunState, config: &RunConfig) {
    let camera_z = state.player.position.z + config.camera_offset_z;
    let count = state.grounds.len() as f32;

    for ground in state.grounds.iter_mut() {
        if camera_z < ground.center.z - ground.size.z / 2.0 {
            ground.center.z -= count * ground.size.z;
        }
    }
}

/// Place a collectible star 100 to 200 units ahead of the player.
pub fn spawn_star(state: &mut RunState) -> u32 {
    let x = (state.rng.next_f32() - 0.5) * 16.0;
    let y = 0.3 + state.rng.next_f32() * 0.7;
    let z = state.player.position.z - 100.0 - state.rng.next_f32() * 100.0;
    let position = Vec3::new(x, y, z);

    let id = state.next_star_id;
    state.next_star_id += 1;
    state.stars.push(CollectibleStar { id, position });

    state.push_event(RunEvent::star_spawned(state.frame, id, position));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{CharacterId, LevelId};

    fn run(level: LevelId) -> (RunState, RunConfig) {
        let config = RunConfig::default();
        (RunState::new(level, CharacterId::Rocket, 0, 99, &config), config)
    }

    #[test]
    fn test_prespawn_gaps_and_whitelist() {
        let (mut state, config) = run(LevelId::One);
        prespawn_obstacles(&mut state, &config);

        assert_eq!(state.obstacles.len(), 8);

        let mut prev_z = config.first_spawn_z;
        for o in &state.obstacles {
            let gap = prev_z - o.position.z;
            assert!(gap >= 15.0 - 1e-4 && gap < 25.0 + 1e-4, "gap {}", gap);
            assert!(LevelId::One.config().obstacle_kinds().contains(&o.kind()));
            prev_z = o.position.z;
        }
        assert_eq!(state.last_spawn_z, prev_z);
    }

    #[test]
    fn test_spawn_frontier() {
        let (mut state, config) = run(LevelId::Two);

        // Frontier at -20 is within 80 of the player at 0
        assert!(maybe_spawn_obstacle(&mut state, &config));

        state.last_spawn_z = -200.0;
        assert!(!maybe_spawn_obstacle(&mut state, &config));

        state.player.position.z = -150.0;
        assert!(maybe_spawn_obstacle(&mut state, &config));
    }

    #[test]
    fn test_ground_recycles_behind_camera() {
        let (mut state, config) = run(LevelId::One);

        // Camera at -92: first segment spans [-100, 100], not yet behind
        state.player.position.z = -100.0;
        recycle_grounds(&mut state, &config);
        assert_eq!(state.grounds[0].center.z, 0.0);

        // Camera at -102 is past the segment's far edge at -100
        state.player.position.z = -110.0;
        recycle_grounds(&mut state, &config);
        assert_eq!(state.grounds[0].center.z, -400.0);
        assert_eq!(state.grounds[1].center.z, -200.0);
    }

    #[test]
    fn test_star_placement_ahead() {
        let (mut state, _) = run(LevelId::One);
        state.player.position.z = -50.0;

        for _ in 0..50 {
            spawn_star(&mut state);
        }
        for star in &state.stars {
            assert!(star.position.z <= -150.0 && star.position.z > -250.0);
            assert!(star.position.x >= -8.0 && star.position.x < 8.0);
            assert!(star.position.y >= 0.3 && star.position.y < 1.0 + 1e-6);
        }
    }
}
