//! Obstacles
//!
//! The six obstacle kinds as one tagged union. Every kind shares the same
//! capability set: advance its own motion law from the run clock, report
//! world-space collider boxes, and say whether it uses the approach-distance
//! hit test instead of box overlap.

use std::f32::consts::TAU;
use serde::{Serialize, Deserialize};

use crate::core::rng::SeededRng;
use crate::core::vec3::Vec3;
use crate::game::collision::Aabb;

/// Height every obstacle group is placed at.
pub const OBSTACLE_BASE_Y: f32 = -1.75;

/// Obstacles further than this behind the player are removed.
pub const DESPAWN_BEHIND: f32 = 20.0;

/// Approach obstacles are kept longer since they fly past the player.
pub const APPROACH_DESPAWN_BEHIND: f32 = 50.0;

/// Obstacle kind, in global unlock order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Row of tumbling rocks sweeping side to side
    AsteroidField,
    /// Three small shots weaving in x and z
    PlasmaShots,
    /// Wreck that flies toward the player
    SatelliteWreckage,
    /// Static grid of six tall beams
    EnergyField,
    /// Saucer swinging across the track
    Ufo,
    /// Ring of eight rotating pillars
    QuantumGate,
}

impl ObstacleKind {
    /// All kinds in unlock order. Levels whitelist a prefix of this.
    pub const ALL: [ObstacleKind; 6] = [
        ObstacleKind::AsteroidField,
        ObstacleKind::PlasmaShots,
        ObstacleKind::SatelliteWreckage,
        ObstacleKind::EnergyField,
        ObstacleKind::Ufo,
        ObstacleKind::QuantumGate,
    ];

    /// Uses the approach-distance test instead of box overlap.
    #[inline]
    pub fn is_approach_type(self) -> bool {
        self == ObstacleKind::SatelliteWreckage
    }

    /// Distance behind the player at which the obstacle is dropped.
    #[inline]
    pub fn despawn_behind(self) -> f32 {
        if self.is_approach_type() {
            APPROACH_DESPAWN_BEHIND
        } else {
            DESPAWN_BEHIND
        }
    }
}

// =============================================================================
// SHAPE
// =============================================================================

/// Per-kind data fixed at spawn time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    /// Four rocks with randomized sizes
    AsteroidField {
        /// Collider size of each rock
        sizes: [Vec3; 4],
    },
    /// Three 0.6 cubes
    PlasmaShots,
    /// Approaching wreck
    SatelliteWreckage {
        /// Distance travelled toward the player per frame
        approach_speed: f32,
    },
    /// Six 0.4 x 4 x 0.4 beams
    EnergyField,
    /// Single 3 x 1.5 x 3 saucer hull
    Ufo,
    /// Eight 0.4 x 4 x 0.4 pillars on a radius-3 ring
    QuantumGate,
}

const PLASMA_SIZE: Vec3 = Vec3::splat(0.6);
const BEAM_SIZE: Vec3 = Vec3::new(0.4, 4.0, 0.4);
const UFO_SIZE: Vec3 = Vec3::new(3.0, 1.5, 3.0);
const ENERGY_BEAMS: [(f32, f32); 6] = [(-4.0, -2.0), (-1.0, -2.0), (1.0, 0.0), (4.0, 0.0), (-4.0, 2.0), (-1.0, 2.0)];
const GATE_PILLARS: usize = 8;
const GATE_RADIUS: f32 = 3.0;

impl ObstacleShape {
    /// Roll the spawn-time data for a kind.
    pub fn roll(kind: ObstacleKind, rng: &mut SeededRng) -> Self {
        match kind {
            ObstacleKind::AsteroidField => {
                let mut sizes = [Vec3::ZERO; 4];
                for size in sizes.iter_mut() {
                    *size = Vec3::new(
                        rng.range_f32(0.8, 1.8),
                        rng.range_f32(0.8, 1.8),
                        rng.range_f32(0.8, 1.8),
                    );
                }
                ObstacleShape::AsteroidField { sizes }
            }
            ObstacleKind::PlasmaShots => ObstacleShape::PlasmaShots,
            ObstacleKind::SatelliteWreckage => ObstacleShape::SatelliteWreckage {
                approach_speed: rng.range_f32(0.08, 0.12),
            },
            ObstacleKind::EnergyField => ObstacleShape::EnergyField,
            ObstacleKind::Ufo => ObstacleShape::Ufo,
            ObstacleKind::QuantumGate => ObstacleShape::QuantumGate,
        }
    }

    /// Kind tag for this shape.
    pub fn kind(&self) -> ObstacleKind {
        match self {
            ObstacleShape::AsteroidField { .. } => ObstacleKind::AsteroidField,
            ObstacleShape::PlasmaShots => ObstacleKind::PlasmaShots,
            ObstacleShape::SatelliteWreckage { .. } => ObstacleKind::SatelliteWreckage,
            ObstacleShape::EnergyField => ObstacleKind::EnergyField,
            ObstacleShape::Ufo => ObstacleKind::Ufo,
            ObstacleShape::QuantumGate => ObstacleKind::QuantumGate,
        }
    }

    /// Collider sizes, one per part.
    fn part_sizes(&self) -> Vec<Vec3> {
        match self {
            ObstacleShape::AsteroidField { sizes } => sizes.to_vec(),
            ObstacleShape::PlasmaShots => vec![PLASMA_SIZE; 3],
            ObstacleShape::SatelliteWreckage { .. } => Vec::new(),
            ObstacleShape::EnergyField => vec![BEAM_SIZE; ENERGY_BEAMS.len()],
            ObstacleShape::Ufo => vec![UFO_SIZE],
            ObstacleShape::QuantumGate => vec![BEAM_SIZE; GATE_PILLARS],
        }
    }

    /// Local part offsets at a given run time.
    fn part_offsets(&self, elapsed_ms: f32) -> Vec<Vec3> {
        match self {
            ObstacleShape::AsteroidField { .. } => {
                let t = elapsed_ms * 0.001;
                (0..4)
                    .map(|i| {
                        let fi = i as f32;
                        Vec3::new((fi - 2.0) * 2.0 + (t + fi).sin() * 2.5, 0.4, 0.0)
                    })
                    .collect()
            }
            ObstacleShape::PlasmaShots => {
                let t = elapsed_ms * 0.0015;
                (0..3)
                    .map(|i| {
                        let fi = i as f32;
                        Vec3::new(
                            fi * 2.0 - 2.0 + (t + fi).sin() * 3.0,
                            0.3,
                            (t * 0.8 + fi).sin() * 2.0,
                        )
                    })
                    .collect()
            }
            ObstacleShape::SatelliteWreckage { .. } => Vec::new(),
            ObstacleShape::EnergyField => ENERGY_BEAMS
                .iter()
                .map(|&(x, z)| Vec3::new(x, 2.0, z))
                .collect(),
            ObstacleShape::Ufo => vec![Vec3::new(0.0, 1.25, 0.0)],
            ObstacleShape::QuantumGate => {
                let t = elapsed_ms * 0.0005;
                (0..GATE_PILLARS)
                    .map(|i| {
                        let a = i as f32 / GATE_PILLARS as f32 * TAU + t;
                        Vec3::new(a.cos() * GATE_RADIUS, 2.0, a.sin() * GATE_RADIUS)
                    })
                    .collect()
            }
        }
    }
}

// =============================================================================
// OBSTACLE
// =============================================================================

/// Who is driving the obstacle's group position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObstacleControl {
    /// The kind's own motion law
    Free,
    /// Held in orbit by the singularity (slot index on the ring)
    Captured {
        /// Slot on the orbit ring
        slot: usize,
    },
    /// Thrown out of orbit; drifts with a decaying impulse
    Released {
        /// Current drift per frame
        drift: Vec3,
    },
}

/// A live obstacle in the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique id within the run
    pub id: u32,
    /// Kind-specific data
    pub shape: ObstacleShape,
    /// Group origin in world space
    pub position: Vec3,
    /// Current local part offsets
    pub parts: Vec<Vec3>,
    /// Cleared once the obstacle should be dropped
    pub active: bool,
    /// Motion ownership
    pub control: ObstacleControl,
    /// Emissive pulse for glowing kinds (0 for the rest)
    pub glow: f32,
}

/// Smallest drift length still applied after a release.
pub const DRIFT_EPSILON: f32 = 0.01;

/// Per-frame drift decay after a release.
pub const DRIFT_DECAY: f32 = 0.95;

impl Obstacle {
    /// Spawn an obstacle of `kind` with its group at `position`.
    pub fn spawn(id: u32, kind: ObstacleKind, position: Vec3, rng: &mut SeededRng) -> Self {
        let shape = ObstacleShape::roll(kind, rng);
        let parts = shape.part_offsets(0.0);
        Self {
            id,
            shape,
            position: Vec3::new(position.x, OBSTACLE_BASE_Y, position.z),
            parts,
            active: true,
            control: ObstacleControl::Free,
            glow: 0.0,
        }
    }

    /// Kind tag.
    #[inline]
    pub fn kind(&self) -> ObstacleKind {
        self.shape.kind()
    }

    /// Uses the approach-distance test.
    #[inline]
    pub fn is_approach_type(&self) -> bool {
        self.kind().is_approach_type()
    }

    /// Whether the singularity currently holds this obstacle.
    #[inline]
    pub fn is_captured(&self) -> bool {
        matches!(self.control, ObstacleControl::Captured { .. })
    }

    /// Advance the motion law by one frame.
    ///
    /// Local part animation always runs. Group-level motion runs only while
    /// the obstacle is free; released obstacles drift instead.
    pub fn update(&mut self, elapsed_ms: f32, player_z: f32) {
        if !self.active {
            return;
        }

        self.parts = self.shape.part_offsets(elapsed_ms);

        match self.control {
            ObstacleControl::Free => match self.shape {
                ObstacleShape::Ufo => {
                    self.position.x = (elapsed_ms * 0.0008).sin() * 4.0;
                }
                ObstacleShape::SatelliteWreckage { approach_speed } => {
                    self.position.z += approach_speed;
                    self.position.y = (elapsed_ms * 0.001 * 0.5).sin() * 0.2;
                }
                _ => {}
            },
            ObstacleControl::Captured { .. } => {}
            ObstacleControl::Released { drift } => {
                if drift.length() > DRIFT_EPSILON {
                    self.position += drift;
                    self.control = ObstacleControl::Released { drift: drift.scale(DRIFT_DECAY) };
                }
            }
        }

        self.glow = match self.kind() {
            ObstacleKind::EnergyField => 0.3 + (elapsed_ms * 0.002 * 2.0).sin() * 0.2,
            ObstacleKind::QuantumGate => 0.3 + (elapsed_ms * 0.0005 * 3.0).sin() * 0.2,
            _ => 0.0,
        };

        if self.position.z > player_z + self.kind().despawn_behind() {
            self.active = false;
        }
    }

    /// World-space collider boxes. Empty for approach obstacles.
    pub fn colliders(&self) -> Vec<Aabb> {
        self.shape
            .part_sizes()
            .into_iter()
            .zip(self.parts.iter())
            .map(|(size, offset)| Aabb::new(self.position + *offset, size))
            .collect()
    }
}
