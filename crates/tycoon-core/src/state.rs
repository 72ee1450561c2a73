//! Persisted game entities and their semantic store keys.

use crate::catalog::{Feature, UpgradeId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Running count of correct and incorrect words.
///
/// `percentage` is recomputed from the counts on every update and is only
/// stored alongside them for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyRecord {
    pub percentage: f64,
    pub correct_count: u64,
    pub incorrect_count: u64,
}

impl Default for AccuracyRecord {
    fn default() -> Self {
        Self {
            percentage: 100.0,
            correct_count: 0,
            incorrect_count: 0,
        }
    }
}

impl AccuracyRecord {
    /// Percentage implied by the counts, rounded to one decimal (100 with no samples).
    pub fn derived_percentage(correct: u64, incorrect: u64) -> f64 {
        let total = correct + incorrect;
        if total == 0 {
            return 100.0;
        }
        let pct = correct as f64 / total as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        self.percentage = Self::derived_percentage(self.correct_count, self.incorrect_count);
    }

    pub fn is_consistent(&self) -> bool {
        (self.percentage - Self::derived_percentage(self.correct_count, self.incorrect_count))
            .abs()
            < 1e-9
    }
}

/// Level and XP carried toward the next level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u64,
    pub xp: u64,
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

/// Word mutation options. Only settable once `Feature::Difficulty` is unlocked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difficulty {
    pub upper: bool,
    pub numbers: bool,
    pub symbols: bool,
}

impl Difficulty {
    pub fn is_plain(&self) -> bool {
        !(self.upper || self.numbers || self.symbols)
    }
}

/// Temporary multiplier earned from a typing test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingTestBoost {
    pub multiplier: f64,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Default for TypingTestBoost {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            activated_at: None,
        }
    }
}

/// Semantic key for every persisted entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Balance,
    WordMultiplier,
    AverageWordLength,
    CashPerSecond,
    CashPerSecondContributions,
    StreakCount,
    HighestStreak,
    Accuracy,
    LevelProgress,
    UpgradeOwnership,
    OneTimeUpgradePurchases,
    UnlockedFeatures,
    Difficulty,
    GoldWordChance,
    StreakBonus,
    TypingTestBoost,
}

impl StateKey {
    pub const ALL: [StateKey; 16] = [
        StateKey::Balance,
        StateKey::WordMultiplier,
        StateKey::AverageWordLength,
        StateKey::CashPerSecond,
        StateKey::CashPerSecondContributions,
        StateKey::StreakCount,
        StateKey::HighestStreak,
        StateKey::Accuracy,
        StateKey::LevelProgress,
        StateKey::UpgradeOwnership,
        StateKey::OneTimeUpgradePurchases,
        StateKey::UnlockedFeatures,
        StateKey::Difficulty,
        StateKey::GoldWordChance,
        StateKey::StreakBonus,
        StateKey::TypingTestBoost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::Balance => "balance",
            StateKey::WordMultiplier => "wordMultiplier",
            StateKey::AverageWordLength => "averageWordLength",
            StateKey::CashPerSecond => "cashPerSecond",
            StateKey::CashPerSecondContributions => "cashPerSecondContributions",
            StateKey::StreakCount => "streakCount",
            StateKey::HighestStreak => "highestStreak",
            StateKey::Accuracy => "accuracy",
            StateKey::LevelProgress => "levelProgress",
            StateKey::UpgradeOwnership => "upgradeOwnership",
            StateKey::OneTimeUpgradePurchases => "oneTimeUpgradePurchases",
            StateKey::UnlockedFeatures => "unlockedFeatures",
            StateKey::Difficulty => "difficulty",
            StateKey::GoldWordChance => "goldWordChance",
            StateKey::StreakBonus => "streakBonus",
            StateKey::TypingTestBoost => "typingTestBoost",
        }
    }

    pub fn parse(key: &str) -> Option<StateKey> {
        StateKey::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full player state; one field per persisted entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub balance: Decimal,
    pub word_multiplier: Decimal,
    pub average_word_length: Decimal,
    /// Cached aggregate; always equals the contribution sum times the word multiplier.
    pub cash_per_second: Decimal,
    pub cash_contributions: BTreeMap<UpgradeId, Decimal>,
    pub streak: u64,
    pub highest_streak: u64,
    pub accuracy: AccuracyRecord,
    pub progress: LevelProgress,
    pub ownership: BTreeMap<UpgradeId, u64>,
    pub one_time_purchases: BTreeSet<UpgradeId>,
    pub unlocked_features: BTreeSet<Feature>,
    pub difficulty: Difficulty,
    pub gold_word_chance: f64,
    pub streak_bonus: Decimal,
    pub boost: TypingTestBoost,
}

/// Lowest allowed average word length.
pub const MIN_AVERAGE_WORD_LENGTH: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
/// Highest allowed average word length.
pub const MAX_AVERAGE_WORD_LENGTH: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
/// Gold word probability for a fresh save.
pub const DEFAULT_GOLD_WORD_CHANCE: f64 = 0.01;

impl Default for GameState {
    fn default() -> Self {
        Self {
            balance: Decimal::ZERO,
            word_multiplier: Decimal::ONE,
            average_word_length: Decimal::new(4, 0),
            cash_per_second: Decimal::ZERO,
            cash_contributions: BTreeMap::new(),
            streak: 0,
            highest_streak: 0,
            accuracy: AccuracyRecord::default(),
            progress: LevelProgress::default(),
            ownership: BTreeMap::new(),
            one_time_purchases: BTreeSet::new(),
            unlocked_features: BTreeSet::new(),
            difficulty: Difficulty::default(),
            gold_word_chance: DEFAULT_GOLD_WORD_CHANCE,
            streak_bonus: Decimal::ZERO,
            boost: TypingTestBoost::default(),
        }
    }
}

impl GameState {
    pub fn owned(&self, id: &UpgradeId) -> u64 {
        self.ownership.get(id).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, feature: Feature) -> bool {
        self.unlocked_features.contains(&feature)
    }

    /// JSON value stored under `key`.
    pub fn entry(&self, key: StateKey) -> Result<Value, serde_json::Error> {
        match key {
            StateKey::Balance => serde_json::to_value(self.balance),
            StateKey::WordMultiplier => serde_json::to_value(self.word_multiplier),
            StateKey::AverageWordLength => serde_json::to_value(self.average_word_length),
            StateKey::CashPerSecond => serde_json::to_value(self.cash_per_second),
            StateKey::CashPerSecondContributions => serde_json::to_value(&self.cash_contributions),
            StateKey::StreakCount => serde_json::to_value(self.streak),
            StateKey::HighestStreak => serde_json::to_value(self.highest_streak),
            StateKey::Accuracy => serde_json::to_value(&self.accuracy),
            StateKey::LevelProgress => serde_json::to_value(&self.progress),
            StateKey::UpgradeOwnership => serde_json::to_value(&self.ownership),
            StateKey::OneTimeUpgradePurchases => serde_json::to_value(&self.one_time_purchases),
            StateKey::UnlockedFeatures => serde_json::to_value(&self.unlocked_features),
            StateKey::Difficulty => serde_json::to_value(self.difficulty),
            StateKey::GoldWordChance => serde_json::to_value(self.gold_word_chance),
            StateKey::StreakBonus => serde_json::to_value(self.streak_bonus),
            StateKey::TypingTestBoost => serde_json::to_value(&self.boost),
        }
    }

    /// Replace the entity stored under `key` with a decoded `value`.
    pub fn set_entry(&mut self, key: StateKey, value: Value) -> Result<(), serde_json::Error> {
        match key {
            StateKey::Balance => self.balance = serde_json::from_value(value)?,
            StateKey::WordMultiplier => self.word_multiplier = serde_json::from_value(value)?,
            StateKey::AverageWordLength => {
                self.average_word_length = serde_json::from_value(value)?
            }
            StateKey::CashPerSecond => self.cash_per_second = serde_json::from_value(value)?,
            StateKey::CashPerSecondContributions => {
                self.cash_contributions = serde_json::from_value(value)?
            }
            StateKey::StreakCount => self.streak = serde_json::from_value(value)?,
            StateKey::HighestStreak => self.highest_streak = serde_json::from_value(value)?,
            StateKey::Accuracy => self.accuracy = serde_json::from_value(value)?,
            StateKey::LevelProgress => self.progress = serde_json::from_value(value)?,
            StateKey::UpgradeOwnership => self.ownership = serde_json::from_value(value)?,
            StateKey::OneTimeUpgradePurchases => {
                self.one_time_purchases = serde_json::from_value(value)?
            }
            StateKey::UnlockedFeatures => self.unlocked_features = serde_json::from_value(value)?,
            StateKey::Difficulty => self.difficulty = serde_json::from_value(value)?,
            StateKey::GoldWordChance => self.gold_word_chance = serde_json::from_value(value)?,
            StateKey::StreakBonus => self.streak_bonus = serde_json::from_value(value)?,
            StateKey::TypingTestBoost => self.boost = serde_json::from_value(value)?,
        }
        Ok(())
    }
}

/// Timed typing test variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestMode {
    /// Regular timed test.
    Standard,
    /// Short, speed-focused test.
    Sprint,
    /// Extended test; needs `Feature::MarathonMode`.
    Marathon,
}

impl TestMode {
    /// Word counts a test of this mode may be started with.
    pub fn allowed_lengths(self) -> &'static [u32] {
        match self {
            TestMode::Standard => &[15, 25, 50],
            TestMode::Sprint => &[10],
            TestMode::Marathon => &[100, 200, 500, 1000],
        }
    }
}
