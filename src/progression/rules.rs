//! Progression Rules
//!
//! Pure score → unlock evaluation. Rules are derived from the static
//! catalog: each level's `unlock_next_at` opens the next level (plus the
//! character tied to it), and score-gated characters open on their level.

use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::catalog::{CharacterId, LevelId, UnlockCondition};
use crate::progression::profile::PlayerProfile;

/// A single unlock granted by a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnlockDelta {
    /// A level became selectable
    Level(LevelId),
    /// A character became selectable
    Character(CharacterId),
}

impl fmt::Display for UnlockDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockDelta::Level(level) => write!(f, "{} unlocked!", level),
            UnlockDelta::Character(character) => write!(f, "{} unlocked!", character),
        }
    }
}

/// Character granted alongside a level unlock.
fn companion_of(level: LevelId) -> Option<CharacterId> {
    CharacterId::ALL
        .into_iter()
        .find(|c| c.info().unlock == UnlockCondition::WithLevel(level))
}

/// Unlocks earned by `score` on `level` that `profile` does not have yet.
pub fn evaluate(level: LevelId, score: u32, profile: &PlayerProfile) -> Vec<UnlockDelta> {
    let mut deltas = Vec::new();

    // Level gate
    let config = level.config();
    if let (Some(threshold), Some(next)) = (config.unlock_next_at, level.next()) {
        if score >= threshold && !profile.is_level_unlocked(next) {
            deltas.push(UnlockDelta::Level(next));
            if let Some(character) = companion_of(next) {
                if !profile.is_character_unlocked(character) {
                    deltas.push(UnlockDelta::Character(character));
                }
            }
        }
    }

    // Score-gated characters
    for character in CharacterId::ALL {
        if let UnlockCondition::Score { level: on, score: needed } = character.info().unlock {
            if on == level && score >= needed && !profile.is_character_unlocked(character) {
                deltas.push(UnlockDelta::Character(character));
            }
        }
    }

    deltas
}

/// Apply deltas to the profile. Returns the ones that changed it.
pub fn apply(profile: &mut PlayerProfile, deltas: &[UnlockDelta]) -> Vec<UnlockDelta> {
    let mut applied = Vec::new();
    for &delta in deltas {
        let changed = match delta {
            UnlockDelta::Level(level) => {
                let entry = profile.unlocked_levels.entry(level).or_insert(false);
                !std::mem::replace(entry, true)
            }
            UnlockDelta::Character(character) => profile.unlocked_characters.insert(character),
        };
        if changed {
            info!("{}", delta);
            applied.push(delta);
        }
    }
    applied
}

/// Evaluate and apply in one step.
pub fn evaluate_and_apply(profile: &mut PlayerProfile, level: LevelId, score: u32) -> Vec<UnlockDelta> {
    let deltas = evaluate(level, score, profile);
    apply(profile, &deltas)
}

/// Update the per-level best. Returns true if `score` beat it.
pub fn record_high_score(profile: &mut PlayerProfile, level: LevelId, score: u32) -> bool {
    profile.record_high_score(level, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_one_threshold() {
        let profile = PlayerProfile::default();
        assert!(evaluate(LevelId::One, 499, &profile).is_empty());
        assert_eq!(
            evaluate(LevelId::One, 500, &profile),
            vec![UnlockDelta::Level(LevelId::Two), UnlockDelta::Character(CharacterId::Asteroid)]
        );
    }

    #[test]
    fn test_first_500_run() {
        let mut profile = PlayerProfile::default();

        let applied = evaluate_and_apply(&mut profile, LevelId::One, 520);
        assert!(record_high_score(&mut profile, LevelId::One, 520));

        assert_eq!(applied.len(), 2);
        assert!(profile.is_level_unlocked(LevelId::Two));
        assert!(profile.is_character_unlocked(CharacterId::Asteroid));
        assert_eq!(profile.high_score(LevelId::One), 520);

        // Nothing left to grant on a second pass
        assert!(evaluate_and_apply(&mut profile, LevelId::One, 900).is_empty());
    }

    #[test]
    fn test_level_two_unlocks_three_and_planet() {
        let profile = PlayerProfile::default();
        assert_eq!(
            evaluate(LevelId::Two, 1000, &profile),
            vec![UnlockDelta::Level(LevelId::Three), UnlockDelta::Character(CharacterId::Planet)]
        );
    }

    #[test]
    fn test_level_three_characters() {
        let profile = PlayerProfile::default();
        assert!(evaluate(LevelId::Three, 499, &profile).is_empty());
        assert_eq!(
            evaluate(LevelId::Three, 500, &profile),
            vec![UnlockDelta::Character(CharacterId::Orb)]
        );
        assert_eq!(
            evaluate(LevelId::Three, 1200, &profile),
            vec![UnlockDelta::Character(CharacterId::Orb), UnlockDelta::Character(CharacterId::Hypercube)]
        );
    }

    #[test]
    fn test_companion_only_with_new_level() {
        let mut profile = PlayerProfile::default();
        profile.unlocked_levels.insert(LevelId::Two, true);

        // Level already open, so the asteroid is not granted on its own
        assert!(evaluate(LevelId::One, 800, &profile).is_empty());
    }

    #[test]
    fn test_scores_on_other_levels_do_not_unlock() {
        let profile = PlayerProfile::default();
        assert!(evaluate(LevelId::One, 5000, &profile)
            .iter()
            .all(|d| !matches!(d, UnlockDelta::Character(CharacterId::Orb | CharacterId::Hypercube))));
    }

    #[test]
    fn test_apply_idempotent() {
        let mut profile = PlayerProfile::default();
        let deltas = evaluate(LevelId::Two, 1500, &profile);

        let first = apply(&mut profile, &deltas);
        let snapshot = profile.clone();
        let second = apply(&mut profile, &deltas);

        assert_eq!(first, deltas);
        assert!(second.is_empty());
        assert_eq!(profile, snapshot);
    }

    #[test]
    fn test_delta_messages() {
        assert_eq!(UnlockDelta::Level(LevelId::Two).to_string(), "Level 2 unlocked!");
        assert_eq!(
            UnlockDelta::Character(CharacterId::Orb).to_string(),
            "Swirling Orb unlocked!"
        );
    }
}
