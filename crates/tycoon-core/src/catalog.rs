//! Upgrade catalog records and unlockable features.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an upgrade, e.g. "1", "7".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

impl UpgradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional game modes gated behind one-time purchases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    /// Per-word mutation options (upper case, numbers, symbols).
    Difficulty,
    /// Timed typing tests that grant a temporary boost.
    TypingTest,
    /// Extended test lengths; only usable together with `TypingTest`.
    MarathonMode,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Difficulty, Feature::TypingTest, Feature::MarathonMode];

    /// Feature that must also be unlocked before this one is usable.
    pub fn parent(self) -> Option<Feature> {
        match self {
            Feature::MarathonMode => Some(Feature::TypingTest),
            Feature::Difficulty | Feature::TypingTest => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Difficulty => "difficulty",
            Feature::TypingTest => "typingTest",
            Feature::MarathonMode => "marathonMode",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect declared by a catalog entry.
///
/// Repeatable upgrades apply the amount once per unit bought; one-time
/// upgrades apply it exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "camelCase")]
pub enum UpgradeEffect {
    /// Raises the target length of generated words.
    AverageWordLength(Decimal),
    /// Raises the global word value multiplier.
    WordMultiplier(Decimal),
    /// Adds passive income per second (before the word multiplier).
    CashPerSecond(Decimal),
    /// Raises the probability that a word is gold.
    GoldWordChance(f64),
    /// Raises the additive streak money bonus.
    StreakBonus(Decimal),
}

/// An upgrade that may be bought many times at a geometrically rising price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatableUpgrade {
    pub id: UpgradeId,
    pub name: String,
    pub description: String,
    /// Price of the first unit.
    pub base_cost: Decimal,
    /// Growth factor applied per unit already owned (>= 1).
    pub cost_multiplier: Decimal,
    /// Effect applied per unit bought.
    pub effect: UpgradeEffect,
}

/// A permanent upgrade bought at most once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeUpgrade {
    pub id: UpgradeId,
    pub name: String,
    pub description: String,
    pub cost: Decimal,
    #[serde(default)]
    pub effect: Option<UpgradeEffect>,
    /// Feature unlocked by the purchase, if any.
    #[serde(default)]
    pub feature: Option<Feature>,
}

/// Both catalogs, loaded once at startup and never mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCatalog {
    pub repeatable: Vec<RepeatableUpgrade>,
    pub one_time: Vec<OneTimeUpgrade>,
}

impl UpgradeCatalog {
    pub fn repeatable(&self, id: &UpgradeId) -> Option<&RepeatableUpgrade> {
        self.repeatable.iter().find(|u| &u.id == id)
    }

    pub fn one_time(&self, id: &UpgradeId) -> Option<&OneTimeUpgrade> {
        self.one_time.iter().find(|u| &u.id == id)
    }
}
