//! Game Orchestrator
//!
//! Menu state, run lifecycle and the glue between a running session and the
//! persistent progression. Frame events are routed to the quest engine,
//! unlock rules and HUD; every mutation of the progression state is written
//! through to the store before the call returns.
//!
//! ## Flow
//!
//! ```text
//! select_level / select_character
//!        │
//!   start_run ──► frame(input, dt) ──► RunEvents ──► quests / unlocks / HUD
//!        ▲              │
//!        │         GameOver ──► finalize quests, high score, unlocks
//!        │              │
//!        └── restart / play_action ◄── game-over screen
//! ```

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::rng::SeededRng;
use crate::frontend::Notifier;
use crate::game::ability::AbilityError;
use crate::game::catalog::{CharacterId, LevelId};
use crate::game::events::{RunEvent, RunEventData};
use crate::game::input::InputFrame;
use crate::game::session::{GameOverAction, RunOutcome, RunSession};
use crate::game::state::{RunConfig, RunId, RunPhase};
use crate::progression::profile::{PlayerProfile, ProgressionState};
use crate::progression::quest::{DailyQuests, QuestEvent, QuestKind, StoredQuests};
use crate::progression::rules::{self, UnlockDelta};
use crate::progression::shop::{self, ShopError, ShopItem};
use crate::progression::store::{KvStore, PersistentStore};

/// Orchestrator errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// Level has not been unlocked
    #[error("{0} is locked")]
    LevelLocked(LevelId),

    /// Character has not been unlocked
    #[error("{0} is locked")]
    CharacterLocked(CharacterId),

    /// No run has been started
    #[error("no active run")]
    NoActiveRun,

    /// Operation only valid on the game-over screen
    #[error("run is not over")]
    NotGameOver,

    /// Shop rejected the operation
    #[error(transparent)]
    Shop(#[from] ShopError),
}

/// What one frame produced.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Events generated this frame, in dispatch order
    pub events: Vec<RunEvent>,
    /// Outcome of an ability request made this frame
    pub ability: Option<Result<usize, AbilityError>>,
    /// Set on the frame the run ended
    pub outcome: Option<RunOutcome>,
    /// Set when the restart input started a new run
    pub restarted: Option<RunId>,
}

/// Top-level game controller.
pub struct GameOrchestrator<S: KvStore, N: Notifier> {
    store: PersistentStore<S>,
    notifier: N,
    progression: ProgressionState,
    config: RunConfig,
    selected_level: LevelId,
    selected_character: CharacterId,
    session: Option<RunSession>,
    run_unlocks: Vec<UnlockDelta>,
    run_new_high_score: bool,
    last_outcome: Option<RunOutcome>,
    seeds: SeededRng,
}

impl<S: KvStore, N: Notifier> GameOrchestrator<S, N> {
    /// Load progression from `backend` and sit on the menu.
    pub fn new(backend: S, notifier: N, today: NaiveDate, seed: u64, config: RunConfig) -> Self {
        let mut seeds = SeededRng::new(seed);
        let mut store = PersistentStore::new(backend);
        let progression = store.load_state(today, &mut seeds);

        info!(
            "Loaded profile: {} stars, levels {:?}, quests for {}",
            progression.profile.currency,
            progression
                .profile
                .unlocked_levels
                .iter()
                .filter(|(_, open)| **open)
                .map(|(level, _)| level.number())
                .collect::<Vec<_>>(),
            progression.quests.day
        );

        Self {
            store,
            notifier,
            progression,
            config,
            selected_level: LevelId::One,
            selected_character: CharacterId::Rocket,
            session: None,
            run_unlocks: Vec::new(),
            run_new_high_score: false,
            last_outcome: None,
            seeds,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Persistent progress.
    pub fn profile(&self) -> &PlayerProfile {
        &self.progression.profile
    }

    /// Today's quests.
    pub fn quests(&self) -> &DailyQuests {
        &self.progression.quests
    }

    /// Current or last session.
    pub fn session(&self) -> Option<&RunSession> {
        self.session.as_ref()
    }

    /// Current or last session, mutable. Lets tools stage a run.
    pub fn session_mut(&mut self) -> Option<&mut RunSession> {
        self.session.as_mut()
    }

    /// Level the next run starts on.
    pub fn selected_level(&self) -> LevelId {
        self.selected_level
    }

    /// Character the next run starts with.
    pub fn selected_character(&self) -> CharacterId {
        self.selected_character
    }

    /// Summary of the most recent finished run.
    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    /// Equipped skin for the selected character, if it applies.
    pub fn current_skin(&self) -> Option<&'static ShopItem> {
        self.progression.profile.skin_for(self.selected_character)
    }

    /// Typed store.
    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    /// Typed store, mutable.
    pub fn store_mut(&mut self) -> &mut PersistentStore<S> {
        &mut self.store
    }

    /// Notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Notifier, mutable.
    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    // =========================================================================
    // MENU
    // =========================================================================

    /// Choose the level for the next run.
    pub fn select_level(&mut self, level: LevelId) -> Result<(), OrchestratorError> {
        if !self.progression.profile.is_level_unlocked(level) {
            return Err(OrchestratorError::LevelLocked(level));
        }
        self.selected_level = level;
        Ok(())
    }

    /// Choose the character for the next run.
    pub fn select_character(&mut self, character: CharacterId) -> Result<(), OrchestratorError> {
        if !self.progression.profile.is_character_unlocked(character) {
            return Err(OrchestratorError::CharacterLocked(character));
        }
        self.selected_character = character;
        Ok(())
    }

    /// Regenerate quests if the calendar day moved on. Returns true if it did.
    pub fn refresh_daily_quests(&mut self, today: NaiveDate) -> bool {
        let current = StoredQuests {
            quests: Some(self.progression.quests.quests.clone()),
            day: Some(self.progression.quests.day),
            fully_rewarded: self.progression.quests.fully_rewarded,
        };
        let (quests, regenerated) = DailyQuests::load_or_regenerate(current, today, &mut self.seeds);
        if regenerated {
            self.progression.quests = quests;
            self.persist_quests();
        }
        regenerated
    }

    // =========================================================================
    // RUN LIFECYCLE
    // =========================================================================

    /// Start a run with the current selection.
    ///
    /// A run still in progress is abandoned without finalizing it.
    pub fn start_run(&mut self) -> Result<RunId, OrchestratorError> {
        let level = self.selected_level;
        let character = self.selected_character;
        if !self.progression.profile.is_level_unlocked(level) {
            return Err(OrchestratorError::LevelLocked(level));
        }
        if !self.progression.profile.is_character_unlocked(character) {
            return Err(OrchestratorError::CharacterLocked(character));
        }

        self.progression.quests.reset_for_new_run();
        self.persist_quests();
        self.run_unlocks.clear();
        self.run_new_high_score = false;

        let high_score = self.progression.profile.high_score(level);
        let run_id = match self.session.as_mut() {
            Some(session) => {
                session.restart(level, character, high_score);
                session.run_id()
            }
            None => {
                let seed = self.seeds.next_u64();
                let mut session = RunSession::new(level, character, high_score, seed, self.config.clone());
                session.start();
                let run_id = session.run_id();
                self.session = Some(session);
                run_id
            }
        };

        self.notifier.score_changed(0);
        self.notifier.currency_changed(self.progression.profile.currency);
        Ok(run_id)
    }

    /// Advance the active run by one frame and route its events.
    pub fn frame(&mut self, input: &InputFrame, dt_ms: f32) -> Result<FrameReport, OrchestratorError> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoActiveRun)?;

        if input.restart_pressed() && session.phase() == RunPhase::GameOver {
            let run_id = self.start_run()?;
            return Ok(FrameReport {
                restarted: Some(run_id),
                ..FrameReport::default()
            });
        }
        if input.pause_pressed() {
            session.toggle_pause();
        }

        let level = session.state.level;
        let result = session.step(input, dt_ms);

        for event in &result.events {
            self.dispatch(level, event);
        }

        let outcome = match result.game_over {
            Some(_) => self.finish_run(),
            None => None,
        };

        Ok(FrameReport {
            events: result.events,
            ability: result.ability,
            outcome,
            restarted: None,
        })
    }

    /// Pause or resume the active run.
    pub fn toggle_pause(&mut self) -> Result<RunPhase, OrchestratorError> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoActiveRun)?;
        Ok(session.toggle_pause())
    }

    /// Play the same level and character again after a game over.
    pub fn restart(&mut self) -> Result<RunId, OrchestratorError> {
        match self.session.as_ref().map(RunSession::phase) {
            None => Err(OrchestratorError::NoActiveRun),
            Some(RunPhase::GameOver) => self.start_run(),
            Some(_) => Err(OrchestratorError::NotGameOver),
        }
    }

    /// Leave the run. An unfinished run is dropped without finalizing.
    pub fn back_to_menu(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.state.is_over() {
                info!("Run {} abandoned at {} points", session.run_id(), session.state.score);
            }
        }
    }

    /// Act on a game-over screen button.
    ///
    /// Returns the new run id, or None for "Back to Menu".
    pub fn play_action(&mut self, action: GameOverAction) -> Result<Option<RunId>, OrchestratorError> {
        if !self.session.as_ref().is_some_and(|s| s.state.is_over()) {
            return Err(OrchestratorError::NotGameOver);
        }
        match action {
            GameOverAction::PlayLevelWith { level, character } => {
                self.select_level(level)?;
                self.select_character(character)?;
            }
            GameOverAction::PlayLevel(level) => self.select_level(level)?,
            GameOverAction::TryCharacter(character) => self.select_character(character)?,
            GameOverAction::PlayAgain => {}
            GameOverAction::BackToMenu => {
                self.back_to_menu();
                return Ok(None);
            }
        }
        self.start_run().map(Some)
    }

    fn dispatch(&mut self, level: LevelId, event: &RunEvent) {
        match &event.data {
            RunEventData::Jumped => {
                let update = self.progression.quests.on_event(QuestEvent::Jump);
                self.announce_quests(&update.completed);
                if update.changed {
                    self.persist_quests();
                }
            }
            RunEventData::ScoreChanged { score } => {
                let score = *score;
                self.notifier.score_changed(score);

                let update = self.progression.quests.on_event(QuestEvent::Score(score));
                self.announce_quests(&update.completed);
                if update.changed {
                    self.persist_quests();
                }

                let beat_best = rules::record_high_score(&mut self.progression.profile, level, score);
                if beat_best {
                    self.run_new_high_score = true;
                }
                let unlocked = rules::evaluate_and_apply(&mut self.progression.profile, level, score);
                self.announce_unlocks(&unlocked);
                if beat_best || !unlocked.is_empty() {
                    self.persist_profile();
                }
            }
            RunEventData::NewHighScore { score, .. } => {
                self.notifier.new_high_score(*score);
                self.notifier.banner("New High Score!");
            }
            RunEventData::StageAdvanced { stage } => {
                self.notifier.banner(&format!("Stage {}", stage));
            }
            RunEventData::StarCollected { .. } => {
                self.progression.profile.credit(1);
                self.notifier.currency_changed(self.progression.profile.currency);
                self.persist_profile();
            }
            RunEventData::AbilityActivated { captured } => {
                info!("Singularity captured {} obstacles", captured);
            }
            RunEventData::AbilityRejected { reason } => {
                debug!("Singularity rejected: {}", reason);
            }
            RunEventData::AbilityReleased { released } => {
                debug!("Singularity released {} obstacles", released);
            }
            RunEventData::StarSpawned { .. }
            | RunEventData::ObstacleSpawned { .. }
            | RunEventData::ShootingStarCue
            | RunEventData::GameOver { .. } => {}
        }
    }

    /// Finalize high score, unlocks and quests for the ended run.
    fn finish_run(&mut self) -> Option<RunOutcome> {
        let session = self.session.as_ref()?;
        let level = session.state.level;
        let score = session.state.score;

        if rules::record_high_score(&mut self.progression.profile, level, score) {
            self.run_new_high_score = true;
        }
        let unlocked = rules::evaluate_and_apply(&mut self.progression.profile, level, score);
        self.announce_unlocks(&unlocked);

        let completed = self.progression.quests.on_run_end(score);
        self.announce_quests(&completed);
        self.persist_all();

        let session = self.session.as_ref()?;
        let outcome = session.outcome(self.run_new_high_score, self.run_unlocks.clone())?;
        self.notifier.game_over(&outcome);
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }

    fn announce_unlocks(&mut self, unlocked: &[UnlockDelta]) {
        for &delta in unlocked {
            if let UnlockDelta::Level(level) = delta {
                self.notifier.banner(&format!("{} Unlocked!", level));
            }
            self.notifier.unlocked(delta);
        }
        self.run_unlocks.extend_from_slice(unlocked);
    }

    fn announce_quests(&mut self, completed: &[QuestKind]) {
        for &kind in completed {
            if let Some(quest) = self.progression.quests.get(kind) {
                info!("Quest complete: {}", quest.description());
                self.notifier.quest_completed(quest);
            }
        }
    }

    // =========================================================================
    // SHOP AND REWARDS
    // =========================================================================

    /// Buy a shop item.
    pub fn buy(&mut self, item_id: &str) -> Result<&'static ShopItem, OrchestratorError> {
        let item = shop::buy(&mut self.progression.profile, item_id)?;
        self.persist_profile();
        self.notifier.purchased(item);
        self.notifier.currency_changed(self.progression.profile.currency);
        Ok(item)
    }

    /// Equip an owned item.
    pub fn equip(&mut self, item_id: &str) -> Result<&'static ShopItem, OrchestratorError> {
        let item = shop::equip(&mut self.progression.profile, item_id)?;
        self.persist_profile();
        Ok(item)
    }

    /// Clear the equipped item. Returns true if something was equipped.
    pub fn unequip(&mut self) -> bool {
        let changed = shop::unequip(&mut self.progression.profile);
        if changed {
            self.persist_profile();
        }
        changed
    }

    /// Credit finished quests (and the all-done bonus). Returns stars paid.
    pub fn claim_rewards(&mut self) -> u32 {
        let total = self.progression.quests.claim_rewards();
        if total > 0 {
            self.progression.profile.credit(total);
            info!("Claimed {} quest stars", total);
            self.notifier.currency_changed(self.progression.profile.currency);
        }
        self.persist_all();
        total
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    fn persist_profile(&mut self) {
        if let Err(e) = self.store.save_profile(&self.progression.profile) {
            warn!("Failed to save profile: {}", e);
        }
    }

    fn persist_quests(&mut self) {
        if let Err(e) = self.store.save_quests(&self.progression.quests) {
            warn!("Failed to save quests: {}", e);
        }
    }

    fn persist_all(&mut self) {
        if let Err(e) = self.store.save_all(&self.progression) {
            warn!("Failed to save progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::Vec3;
    use crate::frontend::{Notification, NotificationLog};
    use crate::game::state::CollectibleStar;
    use crate::progression::quest::Quest;
    use crate::progression::store::{MemoryStore, KEY_STARS, KEY_UNLOCKED_LEVELS, KEY_QUESTS};

    const DT: f32 = 1000.0 / 60.0;

    type TestOrchestrator = GameOrchestrator<MemoryStore, NotificationLog>;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn orchestrator() -> TestOrchestrator {
        GameOrchestrator::new(MemoryStore::new(), NotificationLog::default(), today(), 7, RunConfig::default())
    }

    /// Empty the track so only the test's own setup can end the run.
    fn clear_track(orch: &mut TestOrchestrator) {
        let state = &mut orch.session.as_mut().unwrap().state;
        state.obstacles.clear();
        state.last_spawn_z = -1.0e9;
    }

    fn kill_player(orch: &mut TestOrchestrator) -> RunOutcome {
        orch.session.as_mut().unwrap().state.player.position.y = -50.0;
        orch.frame(&InputFrame::new(), DT).unwrap().outcome.unwrap()
    }

    #[test]
    fn test_locked_selection() {
        let mut orch = orchestrator();
        assert_eq!(orch.select_level(LevelId::Two), Err(OrchestratorError::LevelLocked(LevelId::Two)));
        assert_eq!(
            orch.select_character(CharacterId::Planet),
            Err(OrchestratorError::CharacterLocked(CharacterId::Planet))
        );
        assert!(orch.select_level(LevelId::One).is_ok());
    }

    #[test]
    fn test_frame_without_run() {
        let mut orch = orchestrator();
        assert!(matches!(orch.frame(&InputFrame::new(), DT), Err(OrchestratorError::NoActiveRun)));
        assert_eq!(orch.restart(), Err(OrchestratorError::NoActiveRun));
    }

    #[test]
    fn test_first_run_past_500_unlocks_level_two() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);

        orch.session.as_mut().unwrap().state.player.position.z = -499.95;
        orch.frame(&InputFrame::new(), DT).unwrap();

        assert!(orch.profile().is_level_unlocked(LevelId::Two));
        assert!(orch.profile().is_character_unlocked(CharacterId::Asteroid));
        assert!(orch.store().backend().raw(KEY_UNLOCKED_LEVELS).unwrap().contains(r#""2":true"#));

        let outcome = kill_player(&mut orch);
        assert_eq!(outcome.final_score, 500);
        assert!(outcome.new_high_score);
        assert_eq!(
            outcome.unlocks,
            vec![UnlockDelta::Level(LevelId::Two), UnlockDelta::Character(CharacterId::Asteroid)]
        );
        assert_eq!(outcome.actions[0].label(), "Play Level 2 with Rogue Asteroid");
        assert_eq!(orch.profile().high_score(LevelId::One), 500);

        let notes = orch.notifier_mut().take();
        assert!(notes.contains(&Notification::Banner("Level 2 Unlocked!".to_string())));
        assert!(notes.contains(&Notification::Unlocked(UnlockDelta::Character(CharacterId::Asteroid))));
        assert!(matches!(notes.last(), Some(Notification::GameOver(_))));
    }

    #[test]
    fn test_play_action_jumps_to_unlocked_level() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);
        orch.session.as_mut().unwrap().state.player.position.z = -499.95;
        orch.frame(&InputFrame::new(), DT).unwrap();
        let outcome = kill_player(&mut orch);

        let run = orch.play_action(outcome.actions[0]).unwrap();
        assert!(run.is_some());
        assert_eq!(orch.selected_level(), LevelId::Two);
        assert_eq!(orch.selected_character(), CharacterId::Asteroid);
        assert_eq!(orch.session().unwrap().phase(), RunPhase::Running);

        assert_eq!(orch.play_action(GameOverAction::PlayAgain), Err(OrchestratorError::NotGameOver));
    }

    #[test]
    fn test_jump_updates_quest_and_store() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);

        for _ in 0..40 {
            orch.frame(&InputFrame::new(), DT).unwrap();
        }
        assert!(orch.session().unwrap().state.player.on_ground);

        let report = orch.frame(&InputFrame::new().jump(), DT).unwrap();
        assert!(report.events.iter().any(|e| e.data == RunEventData::Jumped));
        assert_eq!(orch.quests().get(QuestKind::Jump).unwrap().jumps, 1);

        let raw = orch.store().backend().raw(KEY_QUESTS).unwrap();
        assert!(raw.contains(r#""jumps":1"#));
    }

    #[test]
    fn test_score_progress_written_through() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);

        for _ in 0..120 {
            orch.frame(&InputFrame::new(), DT).unwrap();
        }
        let best = orch.quests().get(QuestKind::Score).unwrap().score;
        assert!(best > 0);
        assert!(!orch.quests().get(QuestKind::Score).unwrap().done);

        let raw = orch.store().backend().raw(KEY_QUESTS).unwrap();
        let stored: Vec<Quest> = serde_json::from_str(raw).unwrap();
        let stored_score = stored.iter().find(|q| q.kind == QuestKind::Score).unwrap();
        assert_eq!(stored_score.score, best);
    }

    #[test]
    fn test_star_pickup_credits_currency() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);

        let state = &mut orch.session.as_mut().unwrap().state;
        let ahead = state.player.position + Vec3::new(0.0, 0.0, -0.1);
        state.stars.push(CollectibleStar { id: 900, position: ahead });

        orch.frame(&InputFrame::new(), DT).unwrap();
        assert_eq!(orch.profile().currency, 1);
        assert_eq!(orch.store().backend().raw(KEY_STARS), Some("1"));
    }

    #[test]
    fn test_shop_through_orchestrator() {
        let mut orch = orchestrator();
        orch.progression.profile.currency = 40;

        assert_eq!(
            orch.buy("nebula_skin").unwrap_err(),
            OrchestratorError::Shop(ShopError::InsufficientFunds { price: 50, balance: 40 })
        );

        orch.progression.profile.currency = 60;
        orch.buy("nebula_skin").unwrap();
        orch.equip("nebula_skin").unwrap();
        assert_eq!(orch.current_skin().map(|s| s.id), Some("nebula_skin"));
        assert_eq!(orch.store().backend().raw(KEY_STARS), Some("10"));

        assert!(orch.unequip());
        assert!(!orch.unequip());
    }

    #[test]
    fn test_claim_rewards_once() {
        let mut orch = orchestrator();
        for quest in orch.progression.quests.quests.iter_mut() {
            quest.done = true;
        }
        let expected = orch.quests().unclaimed_total();
        assert_eq!(expected, 10 + 10 + 20 + 30);

        assert_eq!(orch.claim_rewards(), expected);
        assert_eq!(orch.profile().currency, expected);
        assert_eq!(orch.claim_rewards(), 0);
        assert_eq!(orch.profile().currency, expected);
    }

    #[test]
    fn test_restart_rules() {
        let mut orch = orchestrator();
        let first = orch.start_run().unwrap();
        assert_eq!(orch.restart(), Err(OrchestratorError::NotGameOver));

        clear_track(&mut orch);
        kill_player(&mut orch);

        let report = orch.frame(&InputFrame::new().restart(), DT).unwrap();
        let second = report.restarted.unwrap();
        assert_ne!(first, second);
        assert_eq!(orch.session().unwrap().phase(), RunPhase::Running);
    }

    #[test]
    fn test_pause_input_toggles() {
        let mut orch = orchestrator();
        orch.start_run().unwrap();
        clear_track(&mut orch);

        orch.frame(&InputFrame::new().pause(), DT).unwrap();
        assert_eq!(orch.session().unwrap().phase(), RunPhase::Paused);
        let clock = orch.session().unwrap().state.elapsed_ms;

        orch.frame(&InputFrame::new(), DT).unwrap();
        assert_eq!(orch.session().unwrap().state.elapsed_ms, clock);

        assert_eq!(orch.toggle_pause(), Ok(RunPhase::Running));
    }

    #[test]
    fn test_quitting_breaks_streak() {
        let mut orch = orchestrator();
        for quest in orch.progression.quests.quests.iter_mut() {
            if quest.kind == QuestKind::ConsecutiveScore {
                quest.target_score = 1;
                quest.target_streak = 4;
            }
        }

        orch.start_run().unwrap();
        clear_track(&mut orch);
        orch.session.as_mut().unwrap().state.player.position.z = -10.0;
        orch.frame(&InputFrame::new(), DT).unwrap();
        kill_player(&mut orch);
        assert_eq!(orch.quests().get(QuestKind::ConsecutiveScore).unwrap().current_streak, 1);

        // Quit the next run midway
        orch.start_run().unwrap();
        orch.back_to_menu();
        orch.start_run().unwrap();
        assert_eq!(orch.quests().get(QuestKind::ConsecutiveScore).unwrap().current_streak, 0);
    }

    #[test]
    fn test_store_failures_are_not_fatal() {
        let mut orch = orchestrator();
        orch.store_mut().backend_mut().set_fail_writes(true);
        orch.progression.profile.currency = 100;

        orch.buy("fire_skin").unwrap();
        assert_eq!(orch.profile().currency, 25);
        assert!(orch.profile().owns("fire_skin"));
    }

    #[test]
    fn test_progress_survives_reload() {
        let mut orch = orchestrator();
        orch.progression.profile.currency = 80;
        orch.buy("nebula_skin").unwrap();
        let backend = orch.store().backend().clone();

        let reloaded =
            GameOrchestrator::new(backend, NotificationLog::default(), today(), 99, RunConfig::default());
        assert_eq!(reloaded.profile().currency, 30);
        assert!(reloaded.profile().owns("nebula_skin"));
        assert_eq!(reloaded.quests(), orch.quests());
    }

    #[test]
    fn test_new_day_rolls_quests() {
        let mut orch = orchestrator();
        assert!(!orch.refresh_daily_quests(today()));
        let tomorrow = today().succ_opt().unwrap();
        assert!(orch.refresh_daily_quests(tomorrow));
        assert_eq!(orch.quests().day, tomorrow);
    }
}
