#![deny(warnings)]

//! Runtime for Typing Tycoon: progression, purchases, feature gates, boosts,
//! typing tests, word supply and the state reducer that ties them together.
//!
//! All mutation goes through [`Game::apply`]; the modules below hold the
//! rules it delegates to.

pub mod boost;
pub mod effects;
pub mod error;
pub mod features;
pub mod game;
pub mod progression;
pub mod typing_test;
pub mod upgrades;
pub mod words;

pub use boost::{activate_boost, boost_phase, BoostCountdown, BoostPhase};
pub use error::{GameError, Rejection};
pub use game::{Event, Game, Outcome, TargetWord};
pub use progression::{xp_progress, xp_threshold, RollingWpm};
pub use typing_test::{TestResult, TypingTest};
pub use upgrades::{buy_one_time_upgrade, buy_upgrade, quote_upgrade, OneTimePurchase, Purchase};
pub use words::{mutate_word, LocalWordProvider, ProviderError, WordProvider, WordQueue};
