//! Player Profile
//!
//! Persistent meta-progression: unlocks, per-level bests, currency and
//! cosmetic ownership. `ProgressionState` bundles the profile with the
//! day's quests and is the single in-memory mirror of the store.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};

use crate::game::catalog::{CharacterId, LevelId};
use crate::progression::quest::DailyQuests;
use crate::progression::shop::ShopItem;

/// Persistent player progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Characters available in the menu
    pub unlocked_characters: BTreeSet<CharacterId>,
    /// Level availability
    pub unlocked_levels: BTreeMap<LevelId, bool>,
    /// Best score per level
    pub high_scores: BTreeMap<LevelId, u32>,
    /// Star balance
    pub currency: u32,
    /// Purchased shop items
    pub owned_items: BTreeSet<String>,
    /// Equipped shop item, if any
    pub equipped_item: Option<String>,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            unlocked_characters: BTreeSet::from([CharacterId::Rocket]),
            unlocked_levels: default_unlocked_levels(),
            high_scores: default_high_scores(),
            currency: 0,
            owned_items: BTreeSet::new(),
            equipped_item: None,
        }
    }
}

/// Level 1 open, the rest locked.
pub fn default_unlocked_levels() -> BTreeMap<LevelId, bool> {
    LevelId::ALL
        .into_iter()
        .map(|level| (level, level == LevelId::One))
        .collect()
}

/// Zero best score on every level.
pub fn default_high_scores() -> BTreeMap<LevelId, u32> {
    LevelId::ALL.into_iter().map(|level| (level, 0)).collect()
}

impl PlayerProfile {
    /// Whether a character can be selected.
    #[inline]
    pub fn is_character_unlocked(&self, character: CharacterId) -> bool {
        character == CharacterId::Rocket || self.unlocked_characters.contains(&character)
    }

    /// Whether a level can be selected.
    #[inline]
    pub fn is_level_unlocked(&self, level: LevelId) -> bool {
        self.unlocked_levels.get(&level).copied().unwrap_or(level == LevelId::One)
    }

    /// Best score on a level.
    #[inline]
    pub fn high_score(&self, level: LevelId) -> u32 {
        self.high_scores.get(&level).copied().unwrap_or(0)
    }

    /// Record a score; returns true if it beat the stored best.
    pub fn record_high_score(&mut self, level: LevelId, score: u32) -> bool {
        let best = self.high_scores.entry(level).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Add stars.
    pub fn credit(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Check the balance covers a price.
    #[inline]
    pub fn can_afford(&self, price: u32) -> bool {
        self.currency >= price
    }

    /// Remove stars if the balance covers it.
    pub fn debit(&mut self, amount: u32) -> bool {
        if self.can_afford(amount) {
            self.currency -= amount;
            true
        } else {
            false
        }
    }

    /// Whether an item is owned.
    #[inline]
    pub fn owns(&self, item_id: &str) -> bool {
        self.owned_items.contains(item_id)
    }

    /// Equipped skin that applies to `character`, if any.
    pub fn skin_for(&self, character: CharacterId) -> Option<&'static ShopItem> {
        let equipped = self.equipped_item.as_deref()?;
        ShopItem::find(equipped).filter(|item| item.based_on == character)
    }

    /// Clear an equipped pointer that is not owned or names no known item.
    ///
    /// Returns true if the profile was changed.
    pub fn repair_equipped(&mut self) -> bool {
        let valid = match self.equipped_item.as_deref() {
            None => true,
            Some(id) => self.owns(id) && ShopItem::find(id).is_some(),
        };
        if !valid {
            self.equipped_item = None;
        }
        !valid
    }
}

/// Profile plus the day's quests.
#[derive(Clone, Debug)]
pub struct ProgressionState {
    /// Persistent progress
    pub profile: PlayerProfile,
    /// Today's quest set
    pub quests: DailyQuests,
}
