//! # Star Runner Engine
//!
//! Run-state simulation and meta-progression for the Star Runner endless
//! runner.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    STAR RUNNER ENGINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Math primitives                           │
//! │  ├── vec3.rs     - 3D vector                                 │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - One run (deterministic per seed)          │
//! │  ├── catalog.rs  - Characters, levels, stages                │
//! │  ├── state.rs    - Run state and physics constants           │
//! │  ├── tick.rs     - Per-frame simulation step                 │
//! │  ├── session.rs  - Run lifecycle and outcome                 │
//! │  ├── obstacle.rs - Obstacle kinds and motion                 │
//! │  ├── ability.rs  - Singularity capture / release             │
//! │  └── schedule.rs - Run-clock periodic effects                │
//! │                                                              │
//! │  progression/    - Persistent meta-progression               │
//! │  ├── profile.rs  - Unlocks, high scores, stars, cosmetics    │
//! │  ├── quest.rs    - Daily quests                              │
//! │  ├── rules.rs    - Score → unlock rules                      │
//! │  ├── shop.rs     - Cosmetic shop                             │
//! │  └── store.rs    - Key-value persistence                     │
//! │                                                              │
//! │  orchestrator.rs - Menu, run lifecycle, event routing        │
//! │  frontend.rs     - Notifier / renderer ports                 │
//! │  config.rs       - Engine configuration                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same seed, input frames and frame durations, a run produces
//! the same events. Time only advances through `dt_ms` passed to each
//! frame, so a paused run cannot drift.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod progression;
pub mod orchestrator;
pub mod frontend;
pub mod config;

// Re-export commonly used types
pub use core::rng::SeededRng;
pub use core::vec3::Vec3;
pub use game::catalog::{CharacterId, LevelId};
pub use game::input::{InputFrame, Lateral};
pub use game::session::{GameOverAction, RunOutcome, RunSession};
pub use orchestrator::{GameOrchestrator, OrchestratorError};
pub use progression::store::{FileStore, KvStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Target frame rate (Hz)
pub const FRAME_RATE: u32 = 60;
