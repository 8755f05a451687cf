//! Static Catalog
//!
//! Playable characters, levels and the level-3 stage ladder. Everything in
//! here is immutable configuration data; progress against it lives in
//! `progression::profile`.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::game::obstacle::ObstacleKind;

// =============================================================================
// CHARACTERS
// =============================================================================

/// Playable character identifier.
///
/// Serialized with the lowercase ids the save data uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterId {
    /// Galaxy Cruiser
    Rocket,
    /// Rogue Asteroid
    Asteroid,
    /// Wandering Saturn
    Planet,
    /// Swirling Orb
    Orb,
    /// Hyper Cube
    Hypercube,
}

impl CharacterId {
    /// All characters in menu order.
    pub const ALL: [CharacterId; 5] = [
        CharacterId::Rocket,
        CharacterId::Asteroid,
        CharacterId::Planet,
        CharacterId::Orb,
        CharacterId::Hypercube,
    ];

    /// Save-data id.
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterId::Rocket => "rocket",
            CharacterId::Asteroid => "asteroid",
            CharacterId::Planet => "planet",
            CharacterId::Orb => "orb",
            CharacterId::Hypercube => "hypercube",
        }
    }

    /// Parse a save-data id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }

    /// Static definition for this character.
    pub fn info(self) -> &'static Character {
        &CHARACTERS[self as usize]
    }

    /// Whether this character carries the singularity ability.
    pub fn has_singularity(self) -> bool {
        self == CharacterId::Planet
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// How a character becomes available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockCondition {
    /// Available from the first launch
    Default,
    /// Granted together with a level unlock
    WithLevel(LevelId),
    /// Reach a score on a given level
    Score {
        /// Level the score must be reached on
        level: LevelId,
        /// Minimum score
        score: u32,
    },
}

impl UnlockCondition {
    /// Human readable requirement shown on locked character cards.
    pub fn describe(self) -> String {
        match self {
            UnlockCondition::Default => "Unlocked".to_string(),
            UnlockCondition::WithLevel(level) => format!("Unlock {}", level),
            UnlockCondition::Score { level, score } => format!("Score {} in {}", score, level),
        }
    }
}

/// Static character definition.
#[derive(Clone, Debug)]
pub struct Character {
    /// Identifier
    pub id: CharacterId,
    /// Display name
    pub name: &'static str,
    /// Unlock requirement
    pub unlock: UnlockCondition,
    /// Collider size (width, height, depth)
    pub collider: Vec3,
    /// Trail particle color (0xRRGGBB)
    pub trail_color: u32,
    /// Trail particle size
    pub trail_size: f32,
    /// Base body color used when no skin is equipped (0xRRGGBB)
    pub base_color: u32,
}

/// Character table, indexed by `CharacterId as usize`.
pub static CHARACTERS: [Character; 5] = [
    Character {
        id: CharacterId::Rocket,
        name: "Galaxy Cruiser",
        unlock: UnlockCondition::Default,
        collider: Vec3::new(1.0, 1.0, 1.8),
        trail_color: 0xff4500,
        trail_size: 0.18,
        base_color: 0xe5e7eb,
    },
    Character {
        id: CharacterId::Asteroid,
        name: "Rogue Asteroid",
        unlock: UnlockCondition::WithLevel(LevelId::Two),
        collider: Vec3::splat(1.2),
        trail_color: 0x90ee90,
        trail_size: 0.22,
        base_color: 0x8b7d6b,
    },
    Character {
        id: CharacterId::Planet,
        name: "Wandering Saturn",
        unlock: UnlockCondition::WithLevel(LevelId::Three),
        collider: Vec3::splat(1.5),
        trail_color: 0xffd700,
        trail_size: 0.25,
        base_color: 0xf4c542,
    },
    Character {
        id: CharacterId::Orb,
        name: "Swirling Orb",
        unlock: UnlockCondition::Score { level: LevelId::Three, score: 500 },
        collider: Vec3::splat(1.4),
        trail_color: 0x00ffff,
        trail_size: 0.15,
        base_color: 0x00ffff,
    },
    Character {
        id: CharacterId::Hypercube,
        name: "Hyper Cube",
        unlock: UnlockCondition::Score { level: LevelId::Three, score: 1000 },
        collider: Vec3::splat(1.2),
        trail_color: 0x66ff66,
        trail_size: 0.2,
        base_color: 0x66ff66,
    },
];

// =============================================================================
// LEVELS
// =============================================================================

/// Level identifier (1..=3).
///
/// Serialized as its number so profile maps read `{"1": .., "2": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum LevelId {
    /// Level 1
    One = 1,
    /// Level 2
    Two = 2,
    /// Level 3
    Three = 3,
}

impl LevelId {
    /// All levels in order.
    pub const ALL: [LevelId; 3] = [LevelId::One, LevelId::Two, LevelId::Three];

    /// Level number.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Static configuration for this level.
    pub fn config(self) -> &'static LevelConfig {
        &LEVELS[self as usize - 1]
    }

    /// The level after this one, if any.
    pub fn next(self) -> Option<LevelId> {
        match self {
            LevelId::One => Some(LevelId::Two),
            LevelId::Two => Some(LevelId::Three),
            LevelId::Three => None,
        }
    }
}

impl TryFrom<u8> for LevelId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LevelId::One),
            2 => Ok(LevelId::Two),
            3 => Ok(LevelId::Three),
            other => Err(format!("invalid level id {}", other)),
        }
    }
}

impl From<LevelId> for u8 {
    fn from(level: LevelId) -> u8 {
        level as u8
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}", self.number())
    }
}

/// Static level configuration.
#[derive(Clone, Debug)]
pub struct LevelConfig {
    /// Identifier
    pub id: LevelId,
    /// Forward distance covered per frame
    pub forward_speed: f32,
    /// Largest gap between consecutive obstacles
    pub spawn_interval: f32,
    /// Smallest gap between consecutive obstacles
    pub min_spawn_interval: f32,
    /// Number of obstacle kinds available, as a prefix of `ObstacleKind::ALL`
    pub obstacle_kind_count: usize,
    /// Score on this level that unlocks the next one
    pub unlock_next_at: Option<u32>,
    /// Scene background color (0xRRGGBB)
    pub background: u32,
}

impl LevelConfig {
    /// Obstacle kinds this level may spawn.
    pub fn obstacle_kinds(&self) -> &'static [ObstacleKind] {
        const KINDS: &[ObstacleKind] = &ObstacleKind::ALL;
        &KINDS[..self.obstacle_kind_count.min(KINDS.len())]
    }
}

/// Level table, indexed by `LevelId as usize - 1`.
pub static LEVELS: [LevelConfig; 3] = [
    LevelConfig {
        id: LevelId::One,
        forward_speed: 0.08,
        spawn_interval: 25.0,
        min_spawn_interval: 15.0,
        obstacle_kind_count: 3,
        unlock_next_at: Some(500),
        background: 0x010103,
    },
    LevelConfig {
        id: LevelId::Two,
        forward_speed: 0.12,
        spawn_interval: 22.0,
        min_spawn_interval: 12.0,
        obstacle_kind_count: 4,
        unlock_next_at: Some(1000),
        background: 0x0c0a1f,
    },
    LevelConfig {
        id: LevelId::Three,
        forward_speed: 0.16,
        spawn_interval: 18.0,
        min_spawn_interval: 10.0,
        obstacle_kind_count: 6,
        unlock_next_at: None,
        background: 0x1d0b30,
    },
];

// =============================================================================
// LEVEL 3 STAGES
// =============================================================================

/// A difficulty step inside level 3.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageRule {
    /// Stage number shown on the banner ("Stage 2")
    pub stage: u8,
    /// Score at which the stage begins
    pub score_threshold: u32,
    /// Added to the forward speed on entry
    pub speed_bonus: f32,
    /// Replaces the level's spawn interval on entry
    pub spawn_interval: f32,
}

/// Stage ladder for level 3, in ascending score order.
pub const LEVEL3_STAGES: [StageRule; 2] = [
    StageRule { stage: 2, score_threshold: 4000, speed_bonus: 0.01, spawn_interval: 16.0 },
    StageRule { stage: 3, score_threshold: 7000, speed_bonus: 0.01, spawn_interval: 14.0 },
];

/// Per-frame forward speed creep once a level-3 run is under way.
pub const LEVEL3_SPEED_CREEP: f32 = 0.000_001;
