//! Level/XP state machine, streak tracking and the rolling WPM estimator.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tycoon_core::{GameConfig, GameState, LevelProgress};

/// XP needed to advance from `level` to the next one.
pub fn xp_threshold(level: u64, config: &GameConfig) -> u64 {
    level.max(1).saturating_mul(config.level_xp_step.max(1))
}

/// Add XP, carrying the remainder over every crossed threshold.
///
/// Returns the number of levels gained.
pub fn add_xp(progress: &mut LevelProgress, xp: u64, config: &GameConfig) -> u64 {
    progress.xp = progress.xp.saturating_add(xp);
    let mut gained = 0;
    loop {
        let threshold = xp_threshold(progress.level, config);
        if progress.xp < threshold {
            break;
        }
        progress.xp -= threshold;
        progress.level += 1;
        gained += 1;
    }
    gained
}

/// Percentage of the way to the next level, in [0, 100).
pub fn xp_progress(progress: &LevelProgress, config: &GameConfig) -> f64 {
    progress.xp as f64 / xp_threshold(progress.level, config) as f64 * 100.0
}

/// Count a correct word; returns the new streak.
pub fn extend_streak(state: &mut GameState) -> u64 {
    state.streak += 1;
    state.streak
}

/// Record a miss: keep the high-water mark, then reset. Returns the broken streak.
pub fn break_streak(state: &mut GameState) -> u64 {
    let broken = state.streak;
    if broken > state.highest_streak {
        state.highest_streak = broken;
    }
    state.streak = 0;
    broken
}

/// Words-per-minute over a sliding time window.
#[derive(Clone, Debug)]
pub struct RollingWpm {
    window: Duration,
    samples: VecDeque<(u64, DateTime<Utc>)>,
}

impl RollingWpm {
    pub fn new(window_secs: i64) -> Self {
        Self {
            window: Duration::seconds(window_secs.max(1)),
            samples: VecDeque::new(),
        }
    }

    /// Record a completed word and drop samples that left the window.
    pub fn record(&mut self, word_length: u64, at: DateTime<Utc>) {
        self.samples.push_back((word_length, at));
        self.prune(at);
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while matches!(self.samples.front(), Some((_, t)) if *t < cutoff) {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// (characters / 5) per minute since the oldest retained sample,
    /// using at least one second of elapsed time.
    pub fn wpm(&self, now: DateTime<Utc>) -> f64 {
        let Some((_, oldest)) = self.samples.front() else {
            return 0.0;
        };
        let chars: u64 = self.samples.iter().map(|(len, _)| *len).sum();
        let elapsed_ms = (now - *oldest).num_milliseconds().max(1_000);
        let minutes = elapsed_ms as f64 / 60_000.0;
        ((chars as f64 / 5.0) / minutes).max(0.0)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn xp_carries_over_levels() {
        let cfg = GameConfig::default();
        let mut p = LevelProgress::default();
        assert_eq!(add_xp(&mut p, 99, &cfg), 0);
        assert_eq!(p, LevelProgress { level: 1, xp: 99 });
        assert_eq!(add_xp(&mut p, 11, &cfg), 1);
        assert_eq!(p, LevelProgress { level: 2, xp: 10 });
        // 510 total: 200 to reach 3, 300 more to reach 4
        assert_eq!(add_xp(&mut p, 500, &cfg), 2);
        assert_eq!(p, LevelProgress { level: 4, xp: 10 });
        assert!((xp_progress(&p, &cfg) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn streak_high_water_mark() {
        let mut s = GameState::default();
        for _ in 0..7 {
            extend_streak(&mut s);
        }
        assert_eq!(break_streak(&mut s), 7);
        assert_eq!(s.streak, 0);
        assert_eq!(s.highest_streak, 7);
        break_streak(&mut s);
        assert_eq!(s.highest_streak, 7);
        for _ in 0..3 {
            extend_streak(&mut s);
        }
        break_streak(&mut s);
        assert_eq!(s.highest_streak, 7);
    }

    #[test]
    fn wpm_uses_minimum_window() {
        let mut w = RollingWpm::new(300);
        assert_eq!(w.wpm(t0()), 0.0);
        w.record(5, t0());
        // one word in under a second counts as one second: 1 word / (1/60) min
        assert!((w.wpm(t0()) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn wpm_prunes_old_samples() {
        let mut w = RollingWpm::new(300);
        w.record(10, t0());
        w.record(10, t0() + Duration::seconds(240));
        assert_eq!(w.len(), 2);
        w.record(10, t0() + Duration::seconds(360));
        assert_eq!(w.len(), 2);
        // 20 chars = 4 words over 2 minutes
        let wpm = w.wpm(t0() + Duration::seconds(360));
        assert!((wpm - 2.0).abs() < 1e-9);
    }
}
