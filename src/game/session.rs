//! Run Session
//!
//! Owns one run's state together with the run-clock schedule and drives the
//! lifecycle `Idle → Running ⇄ Paused → GameOver`. The schedule outlives
//! individual runs; entries armed for an earlier run are dropped the first
//! time the new run polls it.

use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::rng::SeededRng;
use crate::game::catalog::{CharacterId, LevelId};
use crate::game::events::GameOverReason;
use crate::game::input::InputFrame;
use crate::game::schedule::RunSchedule;
use crate::game::spawn::prespawn_obstacles;
use crate::game::state::{RunConfig, RunId, RunPhase, RunState};
use crate::game::tick::{tick, TickResult};
use crate::progression::rules::UnlockDelta;

// =============================================================================
// GAME-OVER ACTIONS
// =============================================================================

/// Button offered on the game-over screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverAction {
    /// Jump straight into a newly unlocked level with a newly unlocked character
    PlayLevelWith {
        /// Level to start
        level: LevelId,
        /// Character to select
        character: CharacterId,
    },
    /// Jump straight into a newly unlocked level
    PlayLevel(LevelId),
    /// Replay the current level with a newly unlocked character
    TryCharacter(CharacterId),
    /// Same level, same character
    PlayAgain,
    /// Return to the level select screen
    BackToMenu,
}

impl GameOverAction {
    /// Button label.
    pub fn label(&self) -> String {
        match self {
            GameOverAction::PlayLevelWith { level, character } => {
                format!("Play Level {} with {}", level.number(), character)
            }
            GameOverAction::PlayLevel(level) => format!("Play Level {}", level.number()),
            GameOverAction::TryCharacter(character) => format!("Try {}", character),
            GameOverAction::PlayAgain => "Play Again".to_string(),
            GameOverAction::BackToMenu => "Back to Menu".to_string(),
        }
    }
}

impl fmt::Display for GameOverAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Buttons for a run that granted `unlocks`.
pub fn game_over_actions(unlocks: &[UnlockDelta]) -> Vec<GameOverAction> {
    let level = unlocks.iter().find_map(|d| match d {
        UnlockDelta::Level(level) => Some(*level),
        UnlockDelta::Character(_) => None,
    });
    let character = unlocks.iter().find_map(|d| match d {
        UnlockDelta::Character(character) => Some(*character),
        UnlockDelta::Level(_) => None,
    });

    let mut actions = Vec::with_capacity(3);
    match (level, character) {
        (Some(level), Some(character)) => actions.push(GameOverAction::PlayLevelWith { level, character }),
        (Some(level), None) => actions.push(GameOverAction::PlayLevel(level)),
        (None, Some(character)) => actions.push(GameOverAction::TryCharacter(character)),
        (None, None) => {}
    }
    actions.push(GameOverAction::PlayAgain);
    actions.push(GameOverAction::BackToMenu);
    actions
}

// =============================================================================
// RUN OUTCOME
// =============================================================================

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Run identity
    pub run_id: RunId,
    /// Level played
    pub level: LevelId,
    /// Character played
    pub character: CharacterId,
    /// Score at game over
    pub final_score: u32,
    /// Beat the level's previous best
    pub new_high_score: bool,
    /// Unlocks newly applied during the run
    pub unlocks: Vec<UnlockDelta>,
    /// Stars picked up
    pub stars_collected: u32,
    /// Why the run ended
    pub reason: GameOverReason,
    /// Game-over screen buttons
    pub actions: Vec<GameOverAction>,
}

// =============================================================================
// SESSION
// =============================================================================

/// A run plus its lifecycle.
#[derive(Debug)]
pub struct RunSession {
    /// Current run
    pub state: RunState,
    /// Run-clock effects
    pub schedule: RunSchedule,
    /// Physics and spawn constants
    pub config: RunConfig,
    seeds: SeededRng,
}

impl RunSession {
    /// Build an idle session.
    pub fn new(
        level: LevelId,
        character: CharacterId,
        starting_high_score: u32,
        seed: u64,
        config: RunConfig,
    ) -> Self {
        let mut seeds = SeededRng::new(seed);
        let state = RunState::new(level, character, starting_high_score, seeds.next_u64(), &config);
        Self {
            state,
            schedule: RunSchedule::new(),
            config,
            seeds,
        }
    }

    /// Current run id.
    #[inline]
    pub fn run_id(&self) -> RunId {
        self.state.run_id
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    /// Populate the track, arm the schedule and begin running.
    ///
    /// Returns false if the run was not idle.
    pub fn start(&mut self) -> bool {
        if self.state.phase != RunPhase::Idle {
            return false;
        }
        prespawn_obstacles(&mut self.state, &self.config);
        self.schedule.arm_run(self.state.run_id, self.state.elapsed_ms);
        self.state.phase = RunPhase::Running;

        info!(
            "Run {} started: {} as {}",
            self.state.run_id,
            self.state.level,
            self.state.character()
        );
        true
    }

    /// Advance one frame.
    pub fn step(&mut self, input: &InputFrame, dt_ms: f32) -> TickResult {
        let result = tick(&mut self.state, &mut self.schedule, input, dt_ms, &self.config);
        if let Some(reason) = result.game_over {
            info!(
                "Run {} over at {} points: {}",
                self.state.run_id, self.state.score, reason
            );
        }
        result
    }

    /// Flip between running and paused. Other phases are left alone.
    pub fn toggle_pause(&mut self) -> RunPhase {
        self.state.phase = match self.state.phase {
            RunPhase::Running => RunPhase::Paused,
            RunPhase::Paused => RunPhase::Running,
            other => other,
        };
        debug!("Run {} now {:?}", self.state.run_id, self.state.phase);
        self.state.phase
    }

    /// Replace the run with a fresh one and start it.
    ///
    /// The new run gets a new id; the schedule is kept, so its stale entries
    /// are discarded on the next poll.
    pub fn restart(&mut self, level: LevelId, character: CharacterId, starting_high_score: u32) {
        let seed = self.seeds.next_u64();
        self.state = RunState::new(level, character, starting_high_score, seed, &self.config);
        self.start();
    }

    /// Summary of a finished run, or None while it is still going.
    pub fn outcome(&self, new_high_score: bool, unlocks: Vec<UnlockDelta>) -> Option<RunOutcome> {
        let reason = self.state.game_over.filter(|_| self.state.is_over())?;
        let actions = game_over_actions(&unlocks);
        Some(RunOutcome {
            run_id: self.state.run_id,
            level: self.state.level,
            character: self.state.character(),
            final_score: self.state.score,
            new_high_score,
            unlocks,
            stars_collected: self.state.stars_collected,
            reason,
            actions,
        })
    }
}
