//! Run-Clock Schedule
//!
//! Periodic effects (collectible stars, shooting-star cues) driven by the
//! run clock instead of wall-clock timers. Because the clock only advances
//! while running, a paused run never accumulates a backlog.
//!
//! The schedule outlives individual runs; each entry remembers the run it
//! was armed for, and entries from any other run are dropped when polled.

use serde::{Serialize, Deserialize};

use crate::game::state::RunId;

/// Period between collectible star spawns.
pub const STAR_PERIOD_MS: f32 = 10_000.0;

/// Period between decorative shooting-star cues.
pub const SHOOTING_STAR_PERIOD_MS: f32 = 3_000.0;

/// Effect fired by a schedule entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledEffect {
    /// Place a collectible star ahead of the player
    CollectibleStar,
    /// Fire a decorative shooting star
    ShootingStar,
}

/// A periodic continuation bound to one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Run the entry was armed for
    pub run_id: RunId,
    /// What fires
    pub effect: ScheduledEffect,
    /// Period in run-clock milliseconds
    pub period_ms: f32,
    /// Next run-clock time the entry fires
    pub next_due_ms: f32,
}

/// Periodic effect table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSchedule {
    entries: Vec<ScheduleEntry>,
}

impl RunSchedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the standard effects for a run starting at `now_ms`.
    pub fn arm_run(&mut self, run_id: RunId, now_ms: f32) {
        self.arm(run_id, ScheduledEffect::CollectibleStar, STAR_PERIOD_MS, now_ms);
        self.arm(run_id, ScheduledEffect::ShootingStar, SHOOTING_STAR_PERIOD_MS, now_ms);
    }

    /// Arm one periodic entry; it first fires one period after `now_ms`.
    pub fn arm(&mut self, run_id: RunId, effect: ScheduledEffect, period_ms: f32, now_ms: f32) {
        self.entries.push(ScheduleEntry {
            run_id,
            effect,
            period_ms,
            next_due_ms: now_ms + period_ms,
        });
    }

    /// Collect effects due at `now_ms` for `current` run.
    ///
    /// Entries armed for another run are discarded. An entry fires at most
    /// once per poll even if more than one period has elapsed.
    /// Retired entries (due at infinity) never fire.
    pub fn poll(&mut self, current: RunId, now_ms: f32) -> Vec<ScheduledEffect> {
        self.entries.retain(|e| e.run_id == current);

        let mut due = Vec::new();
        for entry in self.entries.iter_mut() {
            if entry.next_due_ms.is_finite() && now_ms >= entry.next_due_ms {
                due.push(entry.effect);
                if entry.period_ms > 0.0 {
                    entry.next_due_ms = next_due_after(entry.next_due_ms, entry.period_ms, now_ms);
                }
            }
        }
        due
    }

    /// Number of armed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are armed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First `due + k * period` strictly after `now`.
///
/// Returns infinity, which retires the entry, once the clock has run past
/// what an f32 can step by one period.
fn next_due_after(due: f32, period: f32, now: f32) -> f32 {
    let periods = ((now - due) / period).floor() + 1.0;
    let next = due + periods * period;
    if !next.is_finite() {
        return f32::INFINITY;
    }
    if next > now {
        return next;
    }
    let bumped = now + period;
    if bumped > now {
        bumped
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_period() {
        let run = RunId::new();
        let mut schedule = RunSchedule::new();
        schedule.arm_run(run, 0.0);

        assert!(schedule.poll(run, 2_999.0).is_empty());
        assert_eq!(schedule.poll(run, 3_000.0), vec![ScheduledEffect::ShootingStar]);
        assert!(schedule.poll(run, 3_001.0).is_empty());
        assert_eq!(schedule.poll(run, 6_000.0), vec![ScheduledEffect::ShootingStar]);

        let at_ten = schedule.poll(run, 10_000.0);
        assert!(at_ten.contains(&ScheduledEffect::CollectibleStar));
    }

    #[test]
    fn test_stale_entries_discarded() {
        let old_run = RunId::new();
        let new_run = RunId::new();
        let mut schedule = RunSchedule::new();

        schedule.arm_run(old_run, 0.0);
        schedule.arm_run(new_run, 0.0);
        assert_eq!(schedule.len(), 4);

        // Only the current run's entries fire; the old run's are dropped
        let fired = schedule.poll(new_run, 10_000.0);
        assert_eq!(fired.len(), 2);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_no_backlog_after_long_gap() {
        let run = RunId::new();
        let mut schedule = RunSchedule::new();
        schedule.arm(run, ScheduledEffect::ShootingStar, 3_000.0, 0.0);

        // A single poll after many periods fires once
        assert_eq!(schedule.poll(run, 30_000.0).len(), 1);
        assert!(schedule.poll(run, 30_001.0).is_empty());
    }

    #[test]
    fn test_huge_clock_jump_terminates() {
        let run = RunId::new();
        let mut schedule = RunSchedule::new();
        schedule.arm_run(run, 0.0);

        assert_eq!(schedule.poll(run, f32::INFINITY).len(), 2);
        assert!(schedule.poll(run, f32::INFINITY).is_empty());

        // Past the point where adding a period no longer changes an f32
        let mut schedule = RunSchedule::new();
        schedule.arm_run(run, 0.0);
        assert_eq!(schedule.poll(run, 1.0e12).len(), 2);
        assert!(schedule.poll(run, 1.0e12 + 1.0).is_empty());
    }

    #[test]
    fn test_next_due_skips_missed_periods() {
        assert_eq!(next_due_after(3_000.0, 3_000.0, 3_000.0), 6_000.0);
        assert_eq!(next_due_after(3_000.0, 3_000.0, 31_500.0), 33_000.0);
    }
}
