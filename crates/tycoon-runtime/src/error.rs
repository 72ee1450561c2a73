//! Rejections (no-op outcomes) and hard reducer failures.

use persistence::{SnapshotError, StoreError};
use rust_decimal::Decimal;
use thiserror::Error;
use tycoon_core::{Feature, TestMode, UpgradeId};

/// Why an event was turned into a no-op. State is unchanged whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },
    #[error("invalid amount for {0}")]
    InvalidAmount(&'static str),
    #[error("unknown upgrade {0}")]
    UnknownUpgrade(UpgradeId),
    #[error("upgrade {0} already purchased")]
    AlreadyPurchased(UpgradeId),
    #[error("feature {0} already unlocked")]
    AlreadyUnlocked(Feature),
    #[error("feature {0} is locked")]
    FeatureLocked(Feature),
    #[error("boost unavailable for another {remaining_secs}s")]
    BoostUnavailable { remaining_secs: i64 },
    #[error("{words} words is not a valid {mode:?} test length")]
    InvalidTestLength { mode: TestMode, words: u32 },
    #[error("a typing test is already running")]
    TestInProgress,
    #[error("no typing test is running")]
    NoActiveTest,
    #[error("typing test unfinished: {typed} of {target} words")]
    TestIncomplete { typed: u32, target: u32 },
    #[error("no word is waiting to be typed")]
    NoTargetWord,
    #[error("import rejected: {0}")]
    MalformedImport(String),
}

/// Failures that abort an event; only store I/O ends up here.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
