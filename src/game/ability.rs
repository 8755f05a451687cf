//! Singularity Ability
//!
//! The planet character can, once per run, pull every nearby obstacle into
//! an orbit around itself and fling them away three seconds later.
//! Activation with nothing in range is refused and does not use up the
//! charge.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::game::events::RunEvent;
use crate::game::obstacle::ObstacleControl;
use crate::game::state::RunState;

/// Obstacles closer than this are captured.
pub const SINGULARITY_RANGE: f32 = 15.0;

/// Orbit radius around the player.
pub const ORBIT_RADIUS: f32 = 3.0;

/// Orbit height above the player.
pub const ORBIT_HEIGHT: f32 = 2.0;

/// Time held in orbit before release (run clock).
pub const ORBIT_DURATION_MS: f32 = 3000.0;

/// Minimum time between activation requests.
pub const RETRIGGER_GUARD_MS: f32 = 500.0;

/// Horizontal impulse given to each obstacle on release.
pub const RELEASE_IMPULSE: f32 = 0.5;

/// Why an activation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum AbilityError {
    /// The selected character has no ability
    #[error("character has no singularity ability")]
    WrongCharacter,

    /// Already used this run, or requested again within the guard window
    #[error("singularity is not ready")]
    AbilityNotReady,

    /// Nothing within range to capture
    #[error("no obstacles within range")]
    NoTargetsInRange,
}

/// Per-run singularity bookkeeping.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SingularityState {
    /// Charge consumed this run
    pub used: bool,
    /// Run time of the last accepted request, for the retrigger guard
    pub last_request_ms: Option<f32>,
    /// Run time at which captured obstacles are released
    pub release_at_ms: Option<f32>,
}

impl SingularityState {
    /// Whether obstacles are currently held in orbit.
    #[inline]
    pub fn is_orbiting(&self) -> bool {
        self.release_at_ms.is_some()
    }
}

/// Try to activate the singularity.
///
/// Returns the number of captured obstacles.
pub fn activate_singularity(state: &mut RunState) -> Result<usize, AbilityError> {
    if !state.character().has_singularity() {
        return Err(AbilityError::WrongCharacter);
    }

    let now = state.elapsed_ms;
    let guarded = state
        .singularity
        .last_request_ms
        .is_some_and(|last| now - last < RETRIGGER_GUARD_MS);
    if state.singularity.used || guarded {
        return Err(AbilityError::AbilityNotReady);
    }
    state.singularity.last_request_ms = Some(now);

    let center = state.player.position;
    let targets: Vec<usize> = state
        .obstacles
        .iter()
        .enumerate()
        .filter(|(_, o)| o.active && o.position.distance(center) < SINGULARITY_RANGE)
        .map(|(i, _)| i)
        .collect();

    if targets.is_empty() {
        return Err(AbilityError::NoTargetsInRange);
    }

    for (slot, &index) in targets.iter().enumerate() {
        state.obstacles[index].control = ObstacleControl::Captured { slot };
    }

    state.singularity.used = true;
    state.singularity.release_at_ms = Some(now + ORBIT_DURATION_MS);
    place_in_orbit(state);

    Ok(targets.len())
}

/// Position captured obstacles on their orbit slots.
fn place_in_orbit(state: &mut RunState) {
    let center = state.player.position;
    let t = state.elapsed_ms * 0.001;

    for obstacle in state.obstacles.iter_mut() {
        if let ObstacleControl::Captured { slot } = obstacle.control {
            let angle = t + slot as f32;
            obstacle.position = center
                + Vec3::new(angle.cos() * ORBIT_RADIUS, ORBIT_HEIGHT, angle.sin() * ORBIT_RADIUS);
        }
    }
}

/// Advance an active orbit: keep captured obstacles on their ring and
/// release them once the orbit time is up.
///
/// Returns the number of obstacles released this frame, if any.
pub fn process_singularity(state: &mut RunState) -> Option<usize> {
    let release_at = state.singularity.release_at_ms?;

    if state.elapsed_ms < release_at {
        place_in_orbit(state);
        return None;
    }

    state.singularity.release_at_ms = None;

    let mut released = 0;
    for index in 0..state.obstacles.len() {
        if !state.obstacles[index].is_captured() {
            continue;
        }
        let drift = state.rng.random_horizontal_direction().scale(RELEASE_IMPULSE);
        state.obstacles[index].control = ObstacleControl::Released { drift };
        released += 1;
    }

    state.push_event(RunEvent::ability_released(state.frame, released));
    Some(released)
}
