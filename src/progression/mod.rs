//! Progression Module
//!
//! Meta-progression that outlives a single run.
//!
//! ## Module Structure
//!
//! - `profile`: Unlocks, high scores, currency, cosmetics
//! - `quest`: Daily quest generation and tracking
//! - `rules`: Score-driven unlock evaluation
//! - `shop`: Cosmetic purchases and equipping
//! - `store`: Key-value persistence

pub mod profile;
pub mod quest;
pub mod rules;
pub mod shop;
pub mod store;

pub use profile::{PlayerProfile, ProgressionState};
pub use quest::{DailyQuests, Quest, QuestEvent, QuestKind, QuestUpdate};
pub use rules::UnlockDelta;
pub use shop::{ShopError, ShopItem};
pub use store::{FileStore, KvStore, MemoryStore, PersistentStore, StoreError};
