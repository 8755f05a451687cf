//! Run State Definitions
//!
//! Everything transient about one run: player body, obstacles, ground,
//! collectible stars, score and the singularity bookkeeping. A `RunState`
//! is discarded on game over or restart; nothing here is persisted.

use std::fmt;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::rng::SeededRng;
use crate::core::vec3::Vec3;
use crate::game::ability::SingularityState;
use crate::game::catalog::{CharacterId, LevelId};
use crate::game::collision::Aabb;
use crate::game::events::{GameOverReason, RunEvent};
use crate::game::obstacle::Obstacle;

// =============================================================================
// RUN ID
// =============================================================================

/// Identity of one run. Every restart gets a fresh id so continuations
/// armed for an earlier run can be recognised and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new random run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RUN PHASE
// =============================================================================

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// Built but not started
    #[default]
    Idle,
    /// Frames advance the simulation
    Running,
    /// Frozen; the run clock does not advance
    Paused,
    /// Terminal
    GameOver,
}

// =============================================================================
// RUN CONFIG
// =============================================================================

/// Physics and spawning constants shared by every level.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Vertical acceleration per frame
    pub gravity: f32,
    /// Vertical velocity set by a jump
    pub jump_velocity: f32,
    /// Player dies below this height
    pub kill_plane_y: f32,
    /// Camera sits this far behind the player along +z
    pub camera_offset_z: f32,
    /// Ground segment size (width, height, depth)
    pub ground_size: Vec3,
    /// Ground segment center height
    pub ground_y: f32,
    /// Number of ground segments cycled under the player
    pub ground_count: usize,
    /// Keep spawning until obstacles reach this far ahead
    pub spawn_ahead: f32,
    /// z of the first spawn reference point
    pub first_spawn_z: f32,
    /// Obstacles placed before the first frame
    pub prespawn_count: usize,
    /// Lateral spread of obstacle spawns (full width)
    pub spawn_spread_x: f32,
    /// Collectible star collider size
    pub star_size: Vec3,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            gravity: -0.004,
            jump_velocity: 0.12,
            kill_plane_y: -10.0,
            camera_offset_z: 8.0,
            ground_size: Vec3::new(10.0, 0.5, 200.0),
            ground_y: -2.0,
            ground_count: 2,
            spawn_ahead: 80.0,
            first_spawn_z: -20.0,
            prespawn_count: 8,
            spawn_spread_x: 3.0,
            star_size: Vec3::splat(0.6),
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Player body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Selected character
    pub character: CharacterId,
    /// Center of the collider
    pub position: Vec3,
    /// Lateral (x) and vertical (y) velocity; forward motion comes from the run speed
    pub velocity: Vec3,
    /// Collider size
    pub size: Vec3,
    /// Resting on a ground segment this frame
    pub on_ground: bool,
}

impl PlayerState {
    /// Create a player for a character at the origin.
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            size: character.info().collider,
            on_ground: false,
        }
    }

    /// Collider box at the current position.
    #[inline]
    pub fn collider(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }
}

// =============================================================================
// COLLECTIBLE STAR
// =============================================================================

/// A star the player can fly through for one unit of currency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectibleStar {
    /// Unique id within the run
    pub id: u32,
    /// World position
    pub position: Vec3,
}

// =============================================================================
// RUN STATE
// =============================================================================

/// Complete state of one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    /// Run identity
    pub run_id: RunId,

    /// Level being played
    pub level: LevelId,

    /// Lifecycle phase
    pub phase: RunPhase,

    /// Frames simulated while running
    pub frame: u32,

    /// Run clock in milliseconds; frozen while paused
    pub elapsed_ms: f32,

    /// Seeded randomness for spawns and impulses
    #[serde(skip)]
    pub rng: SeededRng,

    /// Player body
    pub player: PlayerState,

    /// Live obstacles, in spawn order
    pub obstacles: Vec<Obstacle>,

    /// Next obstacle id (monotonic counter)
    pub next_obstacle_id: u32,

    /// Ground segments
    pub grounds: Vec<Aabb>,

    /// Uncollected stars
    pub stars: Vec<CollectibleStar>,

    /// Next star id (monotonic counter)
    pub next_star_id: u32,

    /// Stars picked up this run
    pub stars_collected: u32,

    /// Jumps made this run
    pub jumps: u32,

    /// Current score, floor of distance travelled
    pub score: u32,

    /// Level best when the run started
    pub starting_high_score: u32,

    /// New-high-score banner already fired this run
    pub high_score_announced: bool,

    /// Difficulty stage (1 until a level-3 threshold is crossed)
    pub stage: u8,

    /// Forward distance per frame
    pub forward_speed: f32,

    /// Largest obstacle gap
    pub spawn_interval: f32,

    /// Smallest obstacle gap
    pub min_spawn_interval: f32,

    /// z of the most recently spawned obstacle
    pub last_spawn_z: f32,

    /// Singularity bookkeeping
    pub singularity: SingularityState,

    /// Set by the first fatal collision
    pub game_over: Option<GameOverReason>,

    /// Events generated this frame (drained each frame)
    #[serde(skip)]
    pub pending_events: Vec<RunEvent>,
}

impl RunState {
    /// Create the state for a fresh run.
    ///
    /// Ground segments are laid out, but no obstacles are spawned until the
    /// run starts.
    pub fn new(
        level: LevelId,
        character: CharacterId,
        starting_high_score: u32,
        rng_seed: u64,
        config: &RunConfig,
    ) -> Self {
        let level_config = level.config();
        let grounds = (0..config.ground_count)
            .map(|i| {
                Aabb::new(
                    Vec3::new(0.0, config.ground_y, -(i as f32) * config.ground_size.z),
                    config.ground_size,
                )
            })
            .collect();

        Self {
            run_id: RunId::new(),
            level,
            phase: RunPhase::Idle,
            frame: 0,
            elapsed_ms: 0.0,
            rng: SeededRng::new(rng_seed),
            player: PlayerState::new(character),
            obstacles: Vec::new(),
            next_obstacle_id: 0,
            grounds,
            stars: Vec::new(),
            next_star_id: 0,
            stars_collected: 0,
            jumps: 0,
            score: 0,
            starting_high_score,
            high_score_announced: false,
            stage: 1,
            forward_speed: level_config.forward_speed,
            spawn_interval: level_config.spawn_interval,
            min_spawn_interval: level_config.min_spawn_interval,
            last_spawn_z: config.first_spawn_z,
            singularity: SingularityState::default(),
            game_over: None,
            pending_events: Vec::new(),
        }
    }

    /// Selected character.
    #[inline]
    pub fn character(&self) -> CharacterId {
        self.player.character
    }

    /// Whether the run has ended.
    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    /// Number of live obstacles.
    pub fn active_obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|o| o.active).count()
    }

    /// Look up an obstacle by id.
    pub fn get_obstacle(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a run event.
    pub fn push_event(&mut self, event: RunEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_takes_level_constants() {
        let state = RunState::new(LevelId::Two, CharacterId::Rocket, 0, 1, &RunConfig::default());
        assert_eq!(state.forward_speed, 0.12);
        assert_eq!(state.spawn_interval, 22.0);
        assert_eq!(state.min_spawn_interval, 12.0);
        assert_eq!(state.phase, RunPhase::Idle);
        assert_eq!(state.stage, 1);
    }

    #[test]
    fn test_ground_layout() {
        let state = RunState::new(LevelId::One, CharacterId::Rocket, 0, 1, &RunConfig::default());
        assert_eq!(state.grounds.len(), 2);
        assert_eq!(state.grounds[0].center.z, 0.0);
        assert_eq!(state.grounds[1].center.z, -200.0);
    }

    #[test]
    fn test_player_uses_character_collider() {
        let player = PlayerState::new(CharacterId::Planet);
        assert_eq!(player.size, Vec3::splat(1.5));
    }

    #[test]
    fn test_run_ids_unique() {
        let a = RunState::new(LevelId::One, CharacterId::Rocket, 0, 1, &RunConfig::default());
        let b = RunState::new(LevelId::One, CharacterId::Rocket, 0, 1, &RunConfig::default());
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_take_events_drains() {
        let mut state = RunState::new(LevelId::One, CharacterId::Rocket, 0, 1, &RunConfig::default());
        state.push_event(RunEvent::jumped(0));
        assert_eq!(state.take_events().len(), 1);
        assert!(state.take_events().is_empty());
    }
}
