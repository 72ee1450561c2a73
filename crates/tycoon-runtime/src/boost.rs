//! Typing-test boost: phases derived from the activation timestamp.
//!
//! Phases, measured from activation:
//!   [0, active)            Active   multiplier = stored value
//!   [active, lockout)      Cooldown multiplier = 1
//!   [lockout, ..) or none  Idle     multiplier = 1

use crate::error::Rejection;
use chrono::{DateTime, Utc};
use tycoon_core::{GameConfig, TypingTestBoost};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoostPhase {
    Idle,
    Active { multiplier: f64, remaining_secs: i64 },
    Cooldown { remaining_secs: i64 },
}

impl BoostPhase {
    pub fn multiplier(&self) -> f64 {
        match self {
            BoostPhase::Active { multiplier, .. } => *multiplier,
            BoostPhase::Idle | BoostPhase::Cooldown { .. } => 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BoostPhase::Active { .. })
    }

    /// Seconds shown on the countdown, `None` when idle.
    pub fn countdown(&self) -> Option<i64> {
        match self {
            BoostPhase::Idle => None,
            BoostPhase::Active { remaining_secs, .. } | BoostPhase::Cooldown { remaining_secs } => {
                Some(*remaining_secs)
            }
        }
    }
}

fn ceil_secs(ms: i64) -> i64 {
    (ms + 999) / 1_000
}

pub fn boost_phase(boost: &TypingTestBoost, now: DateTime<Utc>, config: &GameConfig) -> BoostPhase {
    let Some(activated_at) = boost.activated_at else {
        return BoostPhase::Idle;
    };
    // A clock that moved backwards counts as "just activated".
    let elapsed_ms = (now - activated_at).num_milliseconds().max(0);
    let active_ms = config.boost_active_secs * 1_000;
    let lockout_ms = config.boost_lockout_secs() * 1_000;
    if elapsed_ms < active_ms {
        BoostPhase::Active {
            multiplier: boost.multiplier,
            remaining_secs: ceil_secs(active_ms - elapsed_ms),
        }
    } else if elapsed_ms < lockout_ms {
        BoostPhase::Cooldown {
            remaining_secs: ceil_secs(lockout_ms - elapsed_ms),
        }
    } else {
        BoostPhase::Idle
    }
}

/// Start a boost window; only allowed from `Idle`.
pub fn activate_boost(
    boost: &mut TypingTestBoost,
    multiplier: f64,
    now: DateTime<Utc>,
    config: &GameConfig,
) -> Result<(), Rejection> {
    if let Some(remaining_secs) = boost_phase(boost, now, config).countdown() {
        return Err(Rejection::BoostUnavailable { remaining_secs });
    }
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(Rejection::InvalidAmount("boost multiplier"));
    }
    boost.multiplier = multiplier;
    boost.activated_at = Some(now);
    Ok(())
}

/// Display countdown that is cleared whenever the activation timestamp changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoostCountdown {
    tracked: Option<DateTime<Utc>>,
    remaining_secs: Option<i64>,
}

impl BoostCountdown {
    /// Recompute for the one-second display tick.
    pub fn tick(&mut self, boost: &TypingTestBoost, now: DateTime<Utc>, config: &GameConfig) {
        if self.tracked != boost.activated_at {
            self.tracked = boost.activated_at;
            self.remaining_secs = None;
        }
        if self.tracked.is_none() {
            return;
        }
        self.remaining_secs = boost_phase(boost, now, config).countdown();
    }

    pub fn remaining_secs(&self) -> Option<i64> {
        self.remaining_secs
    }
}
