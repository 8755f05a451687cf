//! Run Events
//!
//! Events produced by the per-frame step. The orchestrator drains them
//! after every frame and routes them to quests, unlock rules and the HUD.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::game::ability::AbilityError;
use crate::game::obstacle::ObstacleKind;

/// Priority for event dispatch order.
///
/// Lower value = dispatched first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Run termination
    GameOver = 0,
    /// Score and high-score updates
    Score = 1,
    /// Player actions (jump, ability)
    Action = 2,
    /// Pickups
    Pickup = 3,
    /// Spawns and cosmetic cues
    Other = 255,
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Fell below the kill plane
    FellIntoSpace,
    /// Overlapped an obstacle collider
    HitObstacle,
    /// Reached by approaching wreckage
    HitWreckage,
}

impl GameOverReason {
    /// Message shown on the game-over screen.
    pub fn message(self) -> &'static str {
        match self {
            GameOverReason::FellIntoSpace => "You fell into deep space!",
            GameOverReason::HitObstacle => "You crashed into an obstacle!",
            GameOverReason::HitWreckage => "You crashed into satellite wreckage!",
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Run event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunEventData {
    /// Player left the ground
    Jumped,

    /// Score moved to a new value
    ScoreChanged {
        score: u32,
    },

    /// Score passed the level's previous best for the first time this run
    NewHighScore {
        score: u32,
        previous: u32,
    },

    /// Level 3 moved to a harder stage
    StageAdvanced {
        stage: u8,
    },

    /// Collectible star spawned ahead of the player
    StarSpawned {
        star_id: u32,
        position: Vec3,
    },

    /// Player picked up a star
    StarCollected {
        star_id: u32,
    },

    /// Singularity pulled obstacles into orbit
    AbilityActivated {
        captured: usize,
    },

    /// Singularity request refused
    AbilityRejected {
        reason: AbilityError,
    },

    /// Orbiting obstacles were thrown out
    AbilityReleased {
        released: usize,
    },

    /// New obstacle placed ahead
    ObstacleSpawned {
        obstacle_id: u32,
        kind: ObstacleKind,
    },

    /// Decorative shooting star should fire
    ShootingStarCue,

    /// Run ended
    GameOver {
        reason: GameOverReason,
        final_score: u32,
    },
}

/// A run event with frame and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunEvent {
    /// Frame the event occurred on
    pub frame: u32,

    /// Dispatch priority
    pub priority: EventPriority,

    /// Event data
    pub data: RunEventData,
}

impl RunEvent {
    /// Create a new event.
    pub fn new(frame: u32, priority: EventPriority, data: RunEventData) -> Self {
        Self { frame, priority, data }
    }

    /// Create jump event.
    pub fn jumped(frame: u32) -> Self {
        Self::new(frame, EventPriority::Action, RunEventData::Jumped)
    }

    /// Create score changed event.
    pub fn score_changed(frame: u32, score: u32) -> Self {
        Self::new(frame, EventPriority::Score, RunEventData::ScoreChanged { score })
    }

    /// Create new high score event.
    pub fn new_high_score(frame: u32, score: u32, previous: u32) -> Self {
        Self::new(frame, EventPriority::Score, RunEventData::NewHighScore { score, previous })
    }

    /// Create stage advanced event.
    pub fn stage_advanced(frame: u32, stage: u8) -> Self {
        Self::new(frame, EventPriority::Score, RunEventData::StageAdvanced { stage })
    }

    /// Create star spawned event.
    pub fn star_spawned(frame: u32, star_id: u32, position: Vec3) -> Self {
        Self::new(frame, EventPriority::Other, RunEventData::StarSpawned { star_id, position })
    }

    /// Create star collected event.
    pub fn star_collected(frame: u32, star_id: u32) -> Self {
        Self::new(frame, EventPriority::Pickup, RunEventData::StarCollected { star_id })
    }

    /// Create ability activated event.
    pub fn ability_activated(frame: u32, captured: usize) -> Self {
        Self::new(frame, EventPriority::Action, RunEventData::AbilityActivated { captured })
    }

    /// Create ability rejected event.
    pub fn ability_rejected(frame: u32, reason: AbilityError) -> Self {
        Self::new(frame, EventPriority::Action, RunEventData::AbilityRejected { reason })
    }

    /// Create ability released event.
    pub fn ability_released(frame: u32, released: usize) -> Self {
        Self::new(frame, EventPriority::Action, RunEventData::AbilityReleased { released })
    }

    /// Create obstacle spawned event.
    pub fn obstacle_spawned(frame: u32, obstacle_id: u32, kind: ObstacleKind) -> Self {
        Self::new(frame, EventPriority::Other, RunEventData::ObstacleSpawned { obstacle_id, kind })
    }

    /// Create shooting star cue.
    pub fn shooting_star(frame: u32) -> Self {
        Self::new(frame, EventPriority::Other, RunEventData::ShootingStarCue)
    }

    /// Create game over event.
    pub fn game_over(frame: u32, reason: GameOverReason, final_score: u32) -> Self {
        Self::new(frame, EventPriority::GameOver, RunEventData::GameOver { reason, final_score })
    }
}

impl PartialEq for RunEvent {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.priority == other.priority
    }
}

impl Eq for RunEvent {}

impl PartialOrd for RunEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.frame
            .cmp(&other.frame)
            .then(self.priority.cmp(&other.priority))
    }
}
