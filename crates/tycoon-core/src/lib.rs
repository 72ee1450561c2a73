#![deny(warnings)]

//! Core domain models and invariants for Typing Tycoon.
//!
//! This crate defines the serializable entities persisted for a player, the
//! upgrade catalog records, and validation helpers that guard their
//! invariants before state is accepted from disk or from an import.

pub mod catalog;
pub mod config;
pub mod state;

pub use catalog::{
    Feature, OneTimeUpgrade, RepeatableUpgrade, UpgradeCatalog, UpgradeEffect, UpgradeId,
};
pub use config::GameConfig;
pub use state::{
    AccuracyRecord, Difficulty, GameState, LevelProgress, StateKey, TestMode, TypingTestBoost,
    DEFAULT_GOLD_WORD_CHANCE, MAX_AVERAGE_WORD_LENGTH, MIN_AVERAGE_WORD_LENGTH,
};

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(&'static str),
    /// Money or a per-unit amount must be non-negative.
    #[error("negative value in {0}")]
    Negative(&'static str),
    /// Value lies outside its documented range.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
    /// Accuracy percentage does not match its counts.
    #[error("accuracy percentage disagrees with counts")]
    AccuracyMismatch,
    /// Cached cash-per-second diverges from its contributions.
    #[error("cash per second {cached} does not match contributions {expected}")]
    CashPerSecondMismatch { cached: Decimal, expected: Decimal },
    /// Level must be at least 1.
    #[error("level must be >= 1")]
    InvalidLevel,
    /// Two catalog entries share an id.
    #[error("duplicate upgrade id: {0}")]
    DuplicateId(String),
    /// Text field must not be blank.
    #[error("blank {0}")]
    Blank(&'static str),
}

fn non_negative(value: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative(field));
    }
    Ok(())
}

/// Validate a catalog effect amount.
pub fn validate_effect(effect: &UpgradeEffect) -> Result<(), ValidationError> {
    match effect {
        UpgradeEffect::AverageWordLength(v) => non_negative(*v, "averageWordLength effect"),
        UpgradeEffect::WordMultiplier(v) => non_negative(*v, "wordMultiplier effect"),
        UpgradeEffect::CashPerSecond(v) => non_negative(*v, "cashPerSecond effect"),
        UpgradeEffect::StreakBonus(v) => non_negative(*v, "streakBonus effect"),
        UpgradeEffect::GoldWordChance(v) => {
            if !v.is_finite() {
                return Err(ValidationError::NonFinite("goldWordChance effect"));
            }
            if *v < 0.0 {
                return Err(ValidationError::Negative("goldWordChance effect"));
            }
            Ok(())
        }
    }
}

/// Validate a repeatable upgrade record.
pub fn validate_repeatable(u: &RepeatableUpgrade) -> Result<(), ValidationError> {
    if u.id.0.trim().is_empty() {
        return Err(ValidationError::Blank("upgrade id"));
    }
    if u.base_cost <= Decimal::ZERO {
        return Err(ValidationError::OutOfRange {
            field: "baseCost",
            value: u.base_cost.to_string(),
        });
    }
    if u.cost_multiplier < Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: "costMultiplier",
            value: u.cost_multiplier.to_string(),
        });
    }
    validate_effect(&u.effect)
}

/// Validate a one-time upgrade record.
pub fn validate_one_time(u: &OneTimeUpgrade) -> Result<(), ValidationError> {
    if u.id.0.trim().is_empty() {
        return Err(ValidationError::Blank("upgrade id"));
    }
    non_negative(u.cost, "cost")?;
    if let Some(effect) = &u.effect {
        validate_effect(effect)?;
    }
    Ok(())
}

/// Validate both catalogs, including id uniqueness within each list.
pub fn validate_catalog(catalog: &UpgradeCatalog) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&UpgradeId> = BTreeSet::new();
    for u in &catalog.repeatable {
        validate_repeatable(u)?;
        if !ids.insert(&u.id) {
            return Err(ValidationError::DuplicateId(u.id.0.clone()));
        }
    }
    ids.clear();
    for u in &catalog.one_time {
        validate_one_time(u)?;
        if !ids.insert(&u.id) {
            return Err(ValidationError::DuplicateId(u.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate a complete player state, e.g. before accepting an import.
pub fn validate_state(s: &GameState) -> Result<(), ValidationError> {
    non_negative(s.balance, "balance")?;
    if s.word_multiplier < Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: "wordMultiplier",
            value: s.word_multiplier.to_string(),
        });
    }
    if s.average_word_length < MIN_AVERAGE_WORD_LENGTH
        || s.average_word_length > MAX_AVERAGE_WORD_LENGTH
    {
        return Err(ValidationError::OutOfRange {
            field: "averageWordLength",
            value: s.average_word_length.to_string(),
        });
    }
    if !s.gold_word_chance.is_finite() {
        return Err(ValidationError::NonFinite("goldWordChance"));
    }
    if !(0.0..=1.0).contains(&s.gold_word_chance) {
        return Err(ValidationError::OutOfRange {
            field: "goldWordChance",
            value: s.gold_word_chance.to_string(),
        });
    }
    non_negative(s.streak_bonus, "streakBonus")?;
    if !s.boost.multiplier.is_finite() {
        return Err(ValidationError::NonFinite("typingTestBoost"));
    }
    if s.boost.multiplier < 1.0 {
        return Err(ValidationError::OutOfRange {
            field: "typingTestBoost.multiplier",
            value: s.boost.multiplier.to_string(),
        });
    }
    if !s.accuracy.percentage.is_finite() || !s.accuracy.is_consistent() {
        return Err(ValidationError::AccuracyMismatch);
    }
    if s.progress.level == 0 {
        return Err(ValidationError::InvalidLevel);
    }
    let mut sum = Decimal::ZERO;
    for v in s.cash_contributions.values() {
        non_negative(*v, "cashPerSecondContributions")?;
        sum += *v;
    }
    let expected = sum * s.word_multiplier;
    if expected != s.cash_per_second {
        return Err(ValidationError::CashPerSecondMismatch {
            cached: s.cash_per_second,
            expected,
        });
    }
    Ok(())
}

/// Reset every entity that breaks its invariants back to its default.
///
/// Accuracy keeps its counts and only rederives the percentage; cash per
/// second is always rederived from the contributions. Returns the keys that
/// changed so the caller can write them back.
pub fn repair_state(s: &mut GameState) -> Vec<StateKey> {
    let defaults = GameState::default();
    let mut repaired = Vec::new();
    if s.balance < Decimal::ZERO {
        s.balance = defaults.balance;
        repaired.push(StateKey::Balance);
    }
    if s.word_multiplier < Decimal::ONE {
        s.word_multiplier = defaults.word_multiplier;
        repaired.push(StateKey::WordMultiplier);
    }
    if s.average_word_length < MIN_AVERAGE_WORD_LENGTH
        || s.average_word_length > MAX_AVERAGE_WORD_LENGTH
    {
        s.average_word_length = defaults.average_word_length;
        repaired.push(StateKey::AverageWordLength);
    }
    if !(0.0..=1.0).contains(&s.gold_word_chance) {
        s.gold_word_chance = defaults.gold_word_chance;
        repaired.push(StateKey::GoldWordChance);
    }
    if s.streak_bonus < Decimal::ZERO {
        s.streak_bonus = defaults.streak_bonus;
        repaired.push(StateKey::StreakBonus);
    }
    if !s.boost.multiplier.is_finite() || s.boost.multiplier < 1.0 {
        s.boost = defaults.boost;
        repaired.push(StateKey::TypingTestBoost);
    }
    if !s.accuracy.percentage.is_finite() || !s.accuracy.is_consistent() {
        s.accuracy.percentage = AccuracyRecord::derived_percentage(
            s.accuracy.correct_count,
            s.accuracy.incorrect_count,
        );
        repaired.push(StateKey::Accuracy);
    }
    if s.progress.level == 0 {
        s.progress = defaults.progress;
        repaired.push(StateKey::LevelProgress);
    }
    let before = s.cash_contributions.len();
    s.cash_contributions.retain(|_, v| *v >= Decimal::ZERO);
    if s.cash_contributions.len() != before {
        repaired.push(StateKey::CashPerSecondContributions);
    }
    let expected = s.cash_contributions.values().copied().sum::<Decimal>() * s.word_multiplier;
    if expected != s.cash_per_second {
        s.cash_per_second = expected;
        repaired.push(StateKey::CashPerSecond);
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn repeatable(id: &str) -> RepeatableUpgrade {
        RepeatableUpgrade {
            id: UpgradeId::new(id),
            name: "Auto Typer".to_string(),
            description: "Types for you".to_string(),
            base_cost: Decimal::new(100, 0),
            cost_multiplier: Decimal::new(115, 2),
            effect: UpgradeEffect::CashPerSecond(Decimal::new(10, 0)),
        }
    }

    #[test]
    fn default_state_is_valid() {
        validate_state(&GameState::default()).unwrap();
    }

    #[test]
    fn repair_resets_offending_entities_only() {
        let mut s = GameState::default();
        s.balance = Decimal::new(77, 0);
        s.gold_word_chance = 5.0;
        s.progress.level = 0;
        s.cash_contributions.insert(UpgradeId::new("3"), Decimal::new(-4, 0));
        s.cash_contributions.insert(UpgradeId::new("5"), Decimal::new(2, 0));
        let repaired = repair_state(&mut s);
        assert_eq!(
            repaired,
            vec![
                StateKey::GoldWordChance,
                StateKey::LevelProgress,
                StateKey::CashPerSecondContributions,
                StateKey::CashPerSecond,
            ]
        );
        assert_eq!(s.gold_word_chance, DEFAULT_GOLD_WORD_CHANCE);
        assert_eq!(s.progress, LevelProgress::default());
        assert_eq!(s.balance, Decimal::new(77, 0));
        assert_eq!(s.cash_per_second, Decimal::new(2, 0));
        validate_state(&s).unwrap();
        assert!(repair_state(&mut s).is_empty());
    }

    #[test]
    fn state_entries_roundtrip() {
        let mut s = GameState::default();
        s.balance = Decimal::new(12345, 2);
        s.ownership.insert(UpgradeId::new("3"), 4);
        s.unlocked_features.insert(Feature::TypingTest);
        s.accuracy.record(true);
        s.accuracy.record(false);

        let mut back = GameState::default();
        for key in StateKey::ALL {
            back.set_entry(key, s.entry(key).unwrap()).unwrap();
        }
        assert_eq!(back, s);
    }

    #[test]
    fn state_keys_parse_back() {
        for key in StateKey::ALL {
            assert_eq!(StateKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(StateKey::parse("nope"), None);
    }

    #[test]
    fn feature_serializes_camel_case() {
        let s = serde_json::to_string(&Feature::MarathonMode).unwrap();
        assert_eq!(s, "\"marathonMode\"");
        assert_eq!(Feature::MarathonMode.parent(), Some(Feature::TypingTest));
    }

    #[test]
    fn accuracy_derives_from_counts() {
        let mut a = AccuracyRecord::default();
        assert_eq!(a.percentage, 100.0);
        for _ in 0..3 {
            a.record(true);
        }
        a.record(false);
        assert_eq!(a.percentage, 75.0);
        a.record(true);
        assert_eq!(a.percentage, 80.0);
        assert!(a.is_consistent());
    }

    #[test]
    fn mismatched_cash_per_second_rejected() {
        let mut s = GameState::default();
        s.cash_contributions.insert(UpgradeId::new("3"), Decimal::new(10, 0));
        assert!(matches!(
            validate_state(&s),
            Err(ValidationError::CashPerSecondMismatch { .. })
        ));
        s.cash_per_second = Decimal::new(10, 0);
        assert!(validate_state(&s).is_ok());
    }

    #[test]
    fn out_of_range_fields_rejected() {
        let mut s = GameState::default();
        s.gold_word_chance = 1.5;
        assert!(validate_state(&s).is_err());
        let mut s = GameState::default();
        s.average_word_length = Decimal::new(16, 0);
        assert!(validate_state(&s).is_err());
        let mut s = GameState::default();
        s.progress.level = 0;
        assert_eq!(validate_state(&s), Err(ValidationError::InvalidLevel));
    }

    #[test]
    fn duplicate_catalog_ids_rejected() {
        let catalog = UpgradeCatalog {
            repeatable: vec![repeatable("3"), repeatable("3")],
            one_time: vec![],
        };
        assert_eq!(
            validate_catalog(&catalog),
            Err(ValidationError::DuplicateId("3".to_string()))
        );
    }

    #[test]
    fn effect_yaml_shape() {
        let json = serde_json::to_value(UpgradeEffect::WordMultiplier(Decimal::new(1, 1))).unwrap();
        assert_eq!(json["kind"], "wordMultiplier");
    }

    proptest! {
        #[test]
        fn cost_multiplier_at_least_one(hundredths in 100i64..1_000) {
            let mut u = repeatable("3");
            u.cost_multiplier = Decimal::new(hundredths, 2);
            prop_assert!(validate_repeatable(&u).is_ok());
        }

        #[test]
        fn cost_multiplier_below_one_rejected(hundredths in 0i64..100) {
            let mut u = repeatable("3");
            u.cost_multiplier = Decimal::new(hundredths, 2);
            prop_assert!(validate_repeatable(&u).is_err());
        }
    }
}
