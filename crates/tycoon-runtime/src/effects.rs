//! The single implementation of every upgrade effect.
//!
//! Each function validates its amount first and leaves the state untouched
//! when it rejects.

use crate::error::Rejection;
use rust_decimal::Decimal;
use tycoon_core::{GameState, UpgradeEffect, UpgradeId, MAX_AVERAGE_WORD_LENGTH};
use tycoon_econ::total_cash_per_second;

fn check_decimal(amount: Decimal, what: &'static str) -> Result<(), Rejection> {
    if amount < Decimal::ZERO {
        return Err(Rejection::InvalidAmount(what));
    }
    Ok(())
}

/// Recompute the cached cash-per-second aggregate from its contributions.
pub fn recompute_cash_per_second(state: &mut GameState) {
    state.cash_per_second =
        total_cash_per_second(state.cash_contributions.values(), state.word_multiplier);
}

pub fn increase_word_multiplier(state: &mut GameState, amount: Decimal) -> Result<(), Rejection> {
    check_decimal(amount, "word multiplier")?;
    state.word_multiplier += amount;
    recompute_cash_per_second(state);
    Ok(())
}

/// Raise the average word length, clamped to the maximum.
pub fn increase_average_word_length(
    state: &mut GameState,
    amount: Decimal,
) -> Result<(), Rejection> {
    check_decimal(amount, "average word length")?;
    state.average_word_length = (state.average_word_length + amount).min(MAX_AVERAGE_WORD_LENGTH);
    Ok(())
}

/// Add to the passive income contributed by upgrade `source`.
pub fn add_cash_per_second(
    state: &mut GameState,
    source: &UpgradeId,
    amount: Decimal,
) -> Result<(), Rejection> {
    check_decimal(amount, "cash per second")?;
    *state
        .cash_contributions
        .entry(source.clone())
        .or_insert(Decimal::ZERO) += amount;
    recompute_cash_per_second(state);
    Ok(())
}

/// Raise the gold word probability, clamped to 1.
pub fn increase_gold_word_chance(state: &mut GameState, amount: f64) -> Result<(), Rejection> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Rejection::InvalidAmount("gold word chance"));
    }
    state.gold_word_chance = (state.gold_word_chance + amount).min(1.0);
    Ok(())
}

pub fn increase_streak_bonus(state: &mut GameState, amount: Decimal) -> Result<(), Rejection> {
    check_decimal(amount, "streak bonus")?;
    state.streak_bonus += amount;
    Ok(())
}

/// Apply a catalog effect `units` times (1 for one-time upgrades).
pub fn apply_effect(
    state: &mut GameState,
    source: &UpgradeId,
    effect: &UpgradeEffect,
    units: u64,
) -> Result<(), Rejection> {
    let n = Decimal::from(units);
    match effect {
        UpgradeEffect::AverageWordLength(v) => increase_average_word_length(state, *v * n),
        UpgradeEffect::WordMultiplier(v) => increase_word_multiplier(state, *v * n),
        UpgradeEffect::CashPerSecond(v) => add_cash_per_second(state, source, *v * n),
        UpgradeEffect::GoldWordChance(v) => increase_gold_word_chance(state, *v * units as f64),
        UpgradeEffect::StreakBonus(v) => increase_streak_bonus(state, *v * n),
    }
}
