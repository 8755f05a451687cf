//! Game Logic Module
//!
//! Everything about a single run. Deterministic for a given seed and
//! input/frame-time sequence.
//!
//! ## Module Structure
//!
//! - `catalog`: Characters, levels, stage ladder
//! - `input`: Per-frame input flags
//! - `state`: Run state, player body, run config
//! - `tick`: Per-frame simulation step
//! - `session`: Run lifecycle, outcome, game-over actions
//! - `collision`: Box overlap, approach hits, ground contact
//! - `obstacle`: Obstacle kinds and motion laws
//! - `spawn`: Obstacle, ground and star placement
//! - `ability`: Singularity capture and release
//! - `schedule`: Run-clock periodic effects
//! - `events`: Events routed to quests, unlocks and the HUD

pub mod catalog;
pub mod input;
pub mod state;
pub mod tick;
pub mod session;
pub mod collision;
pub mod obstacle;
pub mod spawn;
pub mod ability;
pub mod schedule;
pub mod events;

// Re-export key types
pub use catalog::{CharacterId, LevelId};
pub use input::{InputFrame, Lateral};
pub use state::{RunConfig, RunId, RunPhase, RunState};
pub use session::{GameOverAction, RunOutcome, RunSession};
pub use tick::TickResult;
pub use events::{GameOverReason, RunEvent, RunEventData};
