#![deny(warnings)]

//! Economic models: word value, experience and cost curves for Typing Tycoon.
//!
//! This module provides validated utilities for:
//! - Word money value with gold and boost factors
//! - Word XP with the streak step multiplier
//! - Geometric upgrade cost curves for fixed and "max" batches
//! - Passive income aggregation and the typing-test boost formula

use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use tycoon_core::{GameConfig, TestMode};

/// Upper bound on units resolved by a single purchase, fixed or "max".
pub const MAX_BATCH_UNITS: u64 = 100_000;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Input was negative, NaN or otherwise outside its domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Result does not fit the money representation.
    #[error("numeric overflow")]
    Overflow,
}

/// Number of characters in a word, as typed.
pub fn word_length(word: &str) -> u64 {
    word.chars().count() as u64
}

/// Base money value of a word before multipliers: length times the base rate.
pub fn base_word_value(length: u64, config: &GameConfig) -> Decimal {
    Decimal::from(length) * config.base_rate_per_char
}

/// Money earned for a correctly typed word.
///
/// value = base(length) * word_multiplier * (gold factor if gold) * (boost if active)
///
/// Example:
/// let v = word_value("hello", false, 1.0, false, Decimal::ONE, &GameConfig::default()).unwrap();
/// assert_eq!(v, Decimal::new(5, 0));
pub fn word_value(
    word: &str,
    is_gold: bool,
    boost_multiplier: f64,
    boost_active: bool,
    word_multiplier: Decimal,
    config: &GameConfig,
) -> Result<Decimal, EconError> {
    if word_multiplier < Decimal::ZERO {
        return Err(EconError::InvalidInput("word multiplier"));
    }
    let mut value = base_word_value(word_length(word), config) * word_multiplier;
    if is_gold {
        value *= config.gold_money_factor;
    }
    if boost_active {
        if !boost_multiplier.is_finite() || boost_multiplier < 1.0 {
            return Err(EconError::InvalidInput("boost multiplier"));
        }
        let boost = Decimal::from_f64(boost_multiplier).ok_or(EconError::Overflow)?;
        value = value.checked_mul(boost).ok_or(EconError::Overflow)?;
    }
    Ok(value)
}

/// Streak XP multiplier in tenths: 10 means 1.0x, 25 means 2.5x.
pub fn streak_xp_tenths(streak: u64) -> u64 {
    match streak {
        50.. => 30,
        25.. => 25,
        15.. => 20,
        10.. => 18,
        5.. => 15,
        3.. => 12,
        _ => 10,
    }
}

/// Streak XP multiplier as a decimal, e.g. 1.2 at a streak of 3.
pub fn streak_xp_multiplier(streak: u64) -> Decimal {
    Decimal::new(streak_xp_tenths(streak) as i64, 1)
}

/// XP for a correctly typed word.
///
/// `streak` is the streak after counting this word. XP is
/// floor(length * 2 * streak multiplier * gold factor).
pub fn word_xp(word: &str, is_gold: bool, streak: u64, config: &GameConfig) -> u64 {
    let gold = if is_gold { config.gold_xp_factor } else { 1 };
    word_length(word)
        .saturating_mul(2)
        .saturating_mul(streak_xp_tenths(streak))
        .saturating_mul(gold)
        / 10
}

/// Money factor granted by the streak bonus upgrade.
///
/// factor = 1 + streak_bonus / 100 * floor(streak / 10)
pub fn streak_money_factor(streak: u64, streak_bonus: Decimal) -> Decimal {
    if streak_bonus <= Decimal::ZERO {
        return Decimal::ONE;
    }
    Decimal::ONE + streak_bonus / Decimal::ONE_HUNDRED * Decimal::from(streak / 10)
}

/// `base^exp` by squaring; `None` on overflow.
fn checked_pow(mut base: Decimal, mut exp: u64) -> Option<Decimal> {
    let mut acc = Decimal::ONE;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.checked_mul(base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(acc)
}

/// Price of a single unit when `owned` units are already held.
///
/// unit = floor(base_cost * cost_multiplier^owned)
///
/// Example:
/// let m = Decimal::new(115, 2);
/// assert_eq!(unit_cost(Decimal::new(100, 0), m, 3).unwrap(), Decimal::new(152, 0));
pub fn unit_cost(
    base_cost: Decimal,
    cost_multiplier: Decimal,
    owned: u64,
) -> Result<Decimal, EconError> {
    if base_cost < Decimal::ZERO {
        return Err(EconError::InvalidInput("base cost"));
    }
    if cost_multiplier < Decimal::ZERO {
        return Err(EconError::InvalidInput("cost multiplier"));
    }
    let growth = checked_pow(cost_multiplier, owned).ok_or(EconError::Overflow)?;
    let raw = base_cost.checked_mul(growth).ok_or(EconError::Overflow)?;
    Ok(raw.floor())
}

/// How many units a purchase asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuyAmount {
    /// A fixed batch, e.g. 1, 10 or 100.
    Count(u64),
    /// As many as the current balance affords (at least one).
    Max,
}

impl fmt::Display for BuyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyAmount::Count(n) => write!(f, "{n}"),
            BuyAmount::Max => f.write_str("max"),
        }
    }
}

impl FromStr for BuyAmount {
    type Err = EconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            return Ok(BuyAmount::Max);
        }
        match s.parse::<u64>() {
            Ok(n) if (1..=MAX_BATCH_UNITS).contains(&n) => Ok(BuyAmount::Count(n)),
            _ => Err(EconError::InvalidInput("buy amount")),
        }
    }
}

/// Resolved purchase: what it costs and how many units it yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostQuote {
    pub total: Decimal,
    pub units: u64,
}

/// Total cost of buying `amount` units of an upgrade with `owned` units held.
///
/// Fixed batches of at most [`MAX_BATCH_UNITS`] sum the per-unit costs of
/// levels `owned..owned+n` and always yield `n` units; affordability is the
/// caller's check. `Max` greedily adds units while `money >= accumulated + next`.
/// When not even one unit is affordable, `Max` still quotes exactly one unit
/// at its true price.
pub fn upgrade_cost(
    base_cost: Decimal,
    cost_multiplier: Decimal,
    owned: u64,
    amount: BuyAmount,
    money: Option<Decimal>,
) -> Result<CostQuote, EconError> {
    match amount {
        BuyAmount::Count(n) if n == 0 || n > MAX_BATCH_UNITS => {
            Err(EconError::InvalidInput("buy amount"))
        }
        BuyAmount::Count(n) => {
            let mut total = Decimal::ZERO;
            for level in owned..owned.saturating_add(n) {
                let unit = unit_cost(base_cost, cost_multiplier, level)?;
                total = total.checked_add(unit).ok_or(EconError::Overflow)?;
            }
            Ok(CostQuote { total, units: n })
        }
        BuyAmount::Max => {
            let money = money.unwrap_or(Decimal::ZERO);
            let mut total = Decimal::ZERO;
            let mut units = 0u64;
            while units < MAX_BATCH_UNITS {
                let level = owned.saturating_add(units);
                let next = match unit_cost(base_cost, cost_multiplier, level) {
                    Ok(next) => next,
                    Err(EconError::Overflow) => break,
                    Err(e) => return Err(e),
                };
                let Some(with_next) = total.checked_add(next) else {
                    break;
                };
                if money < with_next {
                    break;
                }
                total = with_next;
                units += 1;
            }
            if units == 0 {
                debug!(owned, "max purchase unaffordable; quoting a single unit");
                let total = unit_cost(base_cost, cost_multiplier, owned)?;
                return Ok(CostQuote { total, units: 1 });
            }
            Ok(CostQuote { total, units })
        }
    }
}

/// Passive income per second: sum of contributions times the word multiplier.
pub fn total_cash_per_second<'a, I>(contributions: I, word_multiplier: Decimal) -> Decimal
where
    I: IntoIterator<Item = &'a Decimal>,
{
    let sum: Decimal = contributions.into_iter().copied().sum();
    sum * word_multiplier
}

/// Income accrued over `elapsed_secs` of idle time.
pub fn passive_income(cash_per_second: Decimal, elapsed_secs: u64) -> Decimal {
    cash_per_second * Decimal::from(elapsed_secs)
}

/// Bernoulli draw with probability `chance` (clamped to [0,1]).
pub fn is_gold_word<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    if !chance.is_finite() || chance <= 0.0 {
        return false;
    }
    rng.gen_bool(chance.min(1.0))
}

/// Mode bonus applied to a boost: marathon of 200+ words 1.5x, sprint at 60+ WPM 1.3x.
pub fn boost_mode_bonus(mode: TestMode, wpm: f64, word_count: u32) -> f64 {
    match mode {
        TestMode::Marathon if word_count >= 200 => 1.5,
        TestMode::Sprint if wpm >= 60.0 => 1.3,
        _ => 1.0,
    }
}

/// Length tier bonus applied to a boost.
pub fn boost_length_tier(word_count: u32) -> f64 {
    match word_count {
        1000.. => 2.0,
        500.. => 1.7,
        200.. => 1.4,
        100.. => 1.2,
        _ => 1.0,
    }
}

/// Boost multiplier earned by a finished typing test.
///
/// ((wpm/50) * (words/15) * (accuracy/100) + 1) * mode bonus * length tier
pub fn boost_multiplier(
    wpm: f64,
    word_count: u32,
    accuracy: f64,
    mode: TestMode,
) -> Result<f64, EconError> {
    if !wpm.is_finite() || wpm < 0.0 {
        return Err(EconError::InvalidInput("wpm"));
    }
    if !accuracy.is_finite() || !(0.0..=100.0).contains(&accuracy) {
        return Err(EconError::InvalidInput("accuracy"));
    }
    let base = (wpm / 50.0) * (f64::from(word_count) / 15.0) * (accuracy / 100.0) + 1.0;
    Ok(base * boost_mode_bonus(mode, wpm, word_count) * boost_length_tier(word_count))
}
