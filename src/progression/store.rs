//! Persistent Store
//!
//! Key-value persistence for the progression state. Every value is a JSON
//! document stored under a fixed key. Reads never fail: a missing or
//! unreadable key falls back to its default and the rest of the profile
//! still loads. Writes return errors for the caller to log.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::rng::SeededRng;
use crate::game::catalog::{CharacterId, LevelId};
use crate::progression::profile::{default_high_scores, default_unlocked_levels, PlayerProfile, ProgressionState};
use crate::progression::quest::{DailyQuests, Quest, StoredQuests};

/// Unlocked characters (array of ids).
pub const KEY_UNLOCKS: &str = "spaceRunnerUnlocks";
/// Level availability (object keyed by level number).
pub const KEY_UNLOCKED_LEVELS: &str = "spaceRunnerUnlockedLevels";
/// Best score per level (object keyed by level number).
pub const KEY_HIGH_SCORES: &str = "spaceRunnerHighScores";
/// Today's quest array.
pub const KEY_QUESTS: &str = "spaceRunnerQuests";
/// Day the quest array was rolled for.
pub const KEY_QUEST_DAY: &str = "spaceRunnerQuestDay";
/// All-done bonus paid flag.
pub const KEY_QUEST_REWARDED: &str = "spaceRunnerQuestRewarded";
/// Purchased shop item ids.
pub const KEY_SHOP_PURCHASES: &str = "spaceRunnerShopPurchases";
/// Equipped shop item id.
pub const KEY_EQUIPPED_SKIN: &str = "spaceRunnerEquippedSkin";
/// Star balance.
pub const KEY_STARS: &str = "spaceRunnerStars";

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing file could not be read or written
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Value could not be encoded or decoded
    #[error("store value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend refused the operation
    #[error("store backend error: {0}")]
    Backend(String),
}

// =============================================================================
// BACKENDS
// =============================================================================

/// String key-value backend.
pub trait KvStore {
    /// Read a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be stored.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for exercising degraded paths.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Raw value, bypassing the trait.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert a raw value regardless of `fail_writes`.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend(format!("write to {} rejected", key)));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend(format!("remove of {} rejected", key)));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Backend persisted as one JSON object file, rewritten on every write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file starts empty. An unparseable file is logged and
    /// replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Save file {} is corrupt ({}), starting fresh", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened save file {} with {} keys", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// =============================================================================
// TYPED STORE
// =============================================================================

/// Typed view over a backend.
#[derive(Debug)]
pub struct PersistentStore<S: KvStore> {
    backend: S,
}

impl<S: KvStore> PersistentStore<S> {
    /// Wrap a backend.
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Underlying backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Underlying backend, mutable.
    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Decode a key, treating missing, unreadable and corrupt values alike.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt value under {}: {}", key, e);
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }

    /// Level-keyed map merged over `defaults`. Unknown levels and bad
    /// entries are skipped individually.
    fn read_level_map<T: DeserializeOwned>(
        &self,
        key: &str,
        mut defaults: BTreeMap<LevelId, T>,
    ) -> BTreeMap<LevelId, T> {
        let Some(saved) = self.read::<BTreeMap<String, serde_json::Value>>(key) else {
            return defaults;
        };
        for (level_key, value) in saved {
            let level = level_key.parse::<u8>().ok().and_then(|n| LevelId::try_from(n).ok());
            match (level, serde_json::from_value::<T>(value)) {
                (Some(level), Ok(value)) => {
                    defaults.insert(level, value);
                }
                _ => warn!("Skipping bad entry {:?} under {}", level_key, key),
            }
        }
        defaults
    }

    /// Load the profile, falling back per key.
    pub fn load_profile(&self) -> PlayerProfile {
        let mut profile = PlayerProfile::default();

        if let Some(ids) = self.read::<Vec<String>>(KEY_UNLOCKS) {
            for id in ids {
                match CharacterId::from_id(&id) {
                    Some(character) => {
                        profile.unlocked_characters.insert(character);
                    }
                    None => warn!("Skipping unknown character {:?}", id),
                }
            }
        }

        profile.unlocked_levels = self.read_level_map(KEY_UNLOCKED_LEVELS, default_unlocked_levels());
        profile.unlocked_levels.insert(LevelId::One, true);
        profile.high_scores = self.read_level_map(KEY_HIGH_SCORES, default_high_scores());

        if let Some(stars) = self.read::<u32>(KEY_STARS) {
            profile.currency = stars;
        }
        if let Some(items) = self.read::<Vec<String>>(KEY_SHOP_PURCHASES) {
            profile.owned_items = items.into_iter().collect();
        }
        profile.equipped_item = self.read_equipped();

        if profile.repair_equipped() {
            warn!("Equipped item is not owned, clearing it");
        }
        profile
    }

    /// The equipped id may predate JSON encoding and be stored bare.
    fn read_equipped(&self) -> Option<String> {
        let raw = match self.backend.get(KEY_EQUIPPED_SKIN) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read {}: {}", KEY_EQUIPPED_SKIN, e);
                return None;
            }
        };
        match serde_json::from_str::<Option<String>>(&raw) {
            Ok(id) => id,
            Err(_) if !raw.trim().is_empty() => Some(raw.trim().to_string()),
            Err(_) => None,
        }
    }

    /// Persist every profile key.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; later keys are still attempted,
    /// except the star balance, which is only written once owned items are.
    pub fn save_profile(&mut self, profile: &PlayerProfile) -> Result<(), StoreError> {
        let unlocks: Vec<&str> = profile.unlocked_characters.iter().map(|c| c.as_str()).collect();
        let items: Vec<&String> = profile.owned_items.iter().collect();

        // Ownership lands before the balance; a failed grant keeps the old balance
        let owned = self.write(KEY_SHOP_PURCHASES, &items);
        let currency = match owned {
            Ok(()) => self.write(KEY_STARS, &profile.currency),
            Err(e) => Err(e),
        };

        let results = [
            self.write(KEY_UNLOCKS, &unlocks),
            self.write(KEY_UNLOCKED_LEVELS, &profile.unlocked_levels),
            self.write(KEY_HIGH_SCORES, &profile.high_scores),
            currency,
            match &profile.equipped_item {
                Some(id) => self.write(KEY_EQUIPPED_SKIN, id),
                None => self.backend.remove(KEY_EQUIPPED_SKIN),
            },
        ];
        results.into_iter().collect()
    }

    /// Read back whatever quest data is stored.
    pub fn load_quests(&self) -> StoredQuests {
        StoredQuests {
            quests: self.read::<Vec<Quest>>(KEY_QUESTS),
            day: self.read::<NaiveDate>(KEY_QUEST_DAY),
            fully_rewarded: self.read::<bool>(KEY_QUEST_REWARDED).unwrap_or(false),
        }
    }

    /// Persist the quest set, its day tag and the bonus flag.
    ///
    /// # Errors
    ///
    /// Returns the first write failure; later keys are still attempted.
    pub fn save_quests(&mut self, quests: &DailyQuests) -> Result<(), StoreError> {
        let results = [
            self.write(KEY_QUESTS, &quests.quests),
            self.write(KEY_QUEST_DAY, &quests.day),
            self.write(KEY_QUEST_REWARDED, &quests.fully_rewarded),
        ];
        results.into_iter().collect()
    }

    /// Persist the full progression state.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    pub fn save_all(&mut self, state: &ProgressionState) -> Result<(), StoreError> {
        let profile = self.save_profile(&state.profile);
        let quests = self.save_quests(&state.quests);
        profile.and(quests)
    }

    /// Load the profile and today's quests, rolling new quests if the stored
    /// set is stale. Regenerated quests are written back immediately.
    pub fn load_state(&mut self, today: NaiveDate, rng: &mut SeededRng) -> ProgressionState {
        let profile = self.load_profile();
        let (quests, regenerated) = DailyQuests::load_or_regenerate(self.load_quests(), today, rng);
        if regenerated {
            if let Err(e) = self.save_quests(&quests) {
                warn!("Failed to persist new daily quests: {}", e);
            }
        }
        ProgressionState { profile, quests }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = PersistentStore::new(MemoryStore::new());
        assert_eq!(store.load_profile(), PlayerProfile::default());
    }

    #[test]
    fn test_profile_survives_save_and_load() {
        let mut store = PersistentStore::new(MemoryStore::new());
        let mut profile = PlayerProfile::default();
        profile.unlocked_characters.insert(CharacterId::Asteroid);
        profile.unlocked_levels.insert(LevelId::Two, true);
        profile.high_scores.insert(LevelId::One, 612);
        profile.currency = 35;
        profile.owned_items.insert("nebula_skin".to_string());
        profile.equipped_item = Some("nebula_skin".to_string());

        store.save_profile(&profile).unwrap();
        assert_eq!(store.load_profile(), profile);
    }

    /// Memory backend that refuses writes to one key.
    struct RejectKey {
        inner: MemoryStore,
        key: &'static str,
    }

    impl KvStore for RejectKey {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == self.key {
                return Err(StoreError::Backend(format!("write to {} rejected", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_grant_keeps_old_balance() {
        let mut store = PersistentStore::new(RejectKey { inner: MemoryStore::new(), key: KEY_SHOP_PURCHASES });
        store.backend_mut().inner.insert_raw(KEY_STARS, "100");
        let mut profile = PlayerProfile::default();

        // A purchase: debit plus grant, but the grant cannot be written
        profile.currency = 50;
        profile.owned_items.insert("nebula_skin".to_string());
        assert!(store.save_profile(&profile).is_err());

        let loaded = store.load_profile();
        assert_eq!(loaded.currency, 100);
        assert!(loaded.owned_items.is_empty());
    }

    #[test]
    fn test_persisted_formats() {
        let mut store = PersistentStore::new(MemoryStore::new());
        let mut profile = PlayerProfile::default();
        profile.high_scores.insert(LevelId::One, 520);
        profile.currency = 7;
        store.save_profile(&profile).unwrap();

        let backend = store.backend();
        assert_eq!(backend.raw(KEY_UNLOCKS), Some(r#"["rocket"]"#));
        assert_eq!(backend.raw(KEY_UNLOCKED_LEVELS), Some(r#"{"1":true,"2":false,"3":false}"#));
        assert_eq!(backend.raw(KEY_HIGH_SCORES), Some(r#"{"1":520,"2":0,"3":0}"#));
        assert_eq!(backend.raw(KEY_STARS), Some("7"));
        assert_eq!(backend.raw(KEY_EQUIPPED_SKIN), None);
    }

    #[test]
    fn test_partial_maps_merge_over_defaults() {
        let mut backend = MemoryStore::new();
        backend.insert_raw(KEY_UNLOCKED_LEVELS, r#"{"2":true}"#);
        backend.insert_raw(KEY_HIGH_SCORES, r#"{"3":1500,"9":4,"1":"oops"}"#);
        let store = PersistentStore::new(backend);

        let profile = store.load_profile();
        assert!(profile.is_level_unlocked(LevelId::One));
        assert!(profile.is_level_unlocked(LevelId::Two));
        assert!(!profile.is_level_unlocked(LevelId::Three));
        assert_eq!(profile.high_score(LevelId::Three), 1500);
        assert_eq!(profile.high_score(LevelId::One), 0);
        assert_eq!(profile.high_scores.len(), 3);
    }

    #[test]
    fn test_corrupt_key_falls_back_alone() {
        let mut backend = MemoryStore::new();
        backend.insert_raw(KEY_STARS, "not json");
        backend.insert_raw(KEY_UNLOCKS, r#"["rocket","orb","dragon"]"#);
        let store = PersistentStore::new(backend);

        let profile = store.load_profile();
        assert_eq!(profile.currency, 0);
        assert!(profile.is_character_unlocked(CharacterId::Orb));
        assert_eq!(profile.unlocked_characters.len(), 2);
    }

    #[test]
    fn test_equipped_bare_string_and_repair() {
        let mut backend = MemoryStore::new();
        backend.insert_raw(KEY_SHOP_PURCHASES, r#"["fire_skin"]"#);
        backend.insert_raw(KEY_EQUIPPED_SKIN, "fire_skin");
        let store = PersistentStore::new(backend);
        assert_eq!(store.load_profile().equipped_item.as_deref(), Some("fire_skin"));

        let mut backend = MemoryStore::new();
        backend.insert_raw(KEY_EQUIPPED_SKIN, r#""ice_asteroid""#);
        let store = PersistentStore::new(backend);
        assert_eq!(store.load_profile().equipped_item, None);
    }

    #[test]
    fn test_load_state_rolls_and_persists_quests() {
        let mut store = PersistentStore::new(MemoryStore::new());
        let mut rng = SeededRng::new(11);

        let state = store.load_state(today(), &mut rng);
        assert_eq!(state.quests.quests.len(), 3);
        assert_eq!(store.backend().raw(KEY_QUEST_DAY), Some(r#""2026-10-17""#));

        // Same day: same quests come back
        let again = store.load_state(today(), &mut rng);
        assert_eq!(again.quests, state.quests);
    }

    #[test]
    fn test_quest_day_rollover_clears_flag() {
        let mut store = PersistentStore::new(MemoryStore::new());
        let mut rng = SeededRng::new(12);
        let mut state = store.load_state(today(), &mut rng);
        state.quests.fully_rewarded = true;
        store.save_quests(&state.quests).unwrap();

        let tomorrow = today().succ_opt().unwrap();
        let next = store.load_state(tomorrow, &mut rng);
        assert_eq!(next.quests.day, tomorrow);
        assert!(!next.quests.fully_rewarded);
        assert_eq!(store.backend().raw(KEY_QUEST_REWARDED), Some("false"));
    }

    #[test]
    fn test_stored_quests_keep_field_names() {
        let mut store = PersistentStore::new(MemoryStore::new());
        let mut rng = SeededRng::new(13);
        store.load_state(today(), &mut rng);

        let raw = store.backend().raw(KEY_QUESTS).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let mut keys: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["key"].as_str().unwrap())
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["consecutiveScore", "jump", "score"]);
    }

    #[test]
    fn test_write_failure_reported() {
        let mut backend = MemoryStore::new();
        backend.set_fail_writes(true);
        let mut store = PersistentStore::new(backend);

        assert!(matches!(
            store.save_profile(&PlayerProfile::default()),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("star-runner-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("save.json");

        {
            let mut store = PersistentStore::new(FileStore::open(&path).unwrap());
            let mut profile = PlayerProfile::default();
            profile.currency = 99;
            store.save_profile(&profile).unwrap();
        }

        let store = PersistentStore::new(FileStore::open(&path).unwrap());
        assert_eq!(store.load_profile().currency, 99);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_corrupt_file_starts_fresh() {
        let dir = std::env::temp_dir().join(format!("star-runner-test-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("save.json");
        fs::write(&path, "{{{").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_STARS).unwrap(), None);

        let _ = fs::remove_dir_all(dir);
    }
}
