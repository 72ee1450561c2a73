//! Balance tunables shared by the economy and the runtime.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Game balance configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Money earned per typed character before multipliers.
    pub base_rate_per_char: Decimal,
    /// Money factor applied to gold words.
    pub gold_money_factor: Decimal,
    /// XP factor applied to gold words.
    pub gold_xp_factor: u64,
    /// XP needed per level: threshold(level) = level * step.
    pub level_xp_step: u64,
    /// Seconds a typing-test boost stays active.
    pub boost_active_secs: i64,
    /// Seconds of cooldown after the active window ends.
    pub boost_cooldown_secs: i64,
    /// Width of the rolling WPM window in seconds.
    pub wpm_window_secs: i64,
    /// Seed for the deterministic RNG (gold draws, mutations, words).
    pub rng_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_rate_per_char: Decimal::ONE,
            gold_money_factor: Decimal::new(10, 0),
            gold_xp_factor: 2,
            level_xp_step: 100,
            boost_active_secs: 60,
            boost_cooldown_secs: 600,
            wpm_window_secs: 300,
            rng_seed: 42,
        }
    }
}

impl GameConfig {
    /// Seconds from activation until a new boost may start.
    pub fn boost_lockout_secs(&self) -> i64 {
        self.boost_active_secs + self.boost_cooldown_secs
    }
}
