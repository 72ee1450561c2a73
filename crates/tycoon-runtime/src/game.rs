//! The single state reducer: every mutation enters through [`Game::apply`].

use crate::boost::{activate_boost, boost_phase, BoostPhase};
use crate::error::{GameError, Rejection};
use crate::features::{is_available, set_difficulty, unlock_feature};
use crate::progression::{add_xp, break_streak, extend_streak, xp_progress, RollingWpm};
use crate::typing_test::{TestResult, TypingTest};
use crate::upgrades::{buy_one_time_upgrade, buy_upgrade, quote_upgrade};
use crate::words::mutate_word;
use chrono::{DateTime, Utc};
use persistence::{
    export_json, import_json, load_state, save_keys, save_state, KeyValueStore, SnapshotError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use tycoon_core::{
    repair_state, Difficulty, Feature, GameConfig, GameState, StateKey, TestMode,
    UpgradeCatalog, UpgradeId,
};
use tycoon_econ::{
    boost_multiplier, is_gold_word, passive_income, streak_money_factor, word_length, word_value,
    word_xp, BuyAmount, CostQuote, EconError,
};

const WORD_KEYS: &[StateKey] = &[
    StateKey::Balance,
    StateKey::StreakCount,
    StateKey::HighestStreak,
    StateKey::Accuracy,
    StateKey::LevelProgress,
];

const NO_KEYS: &[StateKey] = &[];
const BALANCE_KEYS: &[StateKey] = &[StateKey::Balance];
const DIFFICULTY_KEYS: &[StateKey] = &[StateKey::Difficulty];
const BOOST_KEYS: &[StateKey] = &[StateKey::TypingTestBoost];

const PURCHASE_KEYS: &[StateKey] = &[
    StateKey::Balance,
    StateKey::UpgradeOwnership,
    StateKey::OneTimeUpgradePurchases,
    StateKey::UnlockedFeatures,
    StateKey::WordMultiplier,
    StateKey::AverageWordLength,
    StateKey::CashPerSecond,
    StateKey::CashPerSecondContributions,
    StateKey::GoldWordChance,
    StateKey::StreakBonus,
];

/// Input delivered to the reducer.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new word is shown; it may be mutated by difficulty and drawn gold.
    PresentWord { word: String },
    /// The player finished typing the presented word.
    SubmitWord { typed: String, at: DateTime<Utc> },
    BuyUpgrade { id: UpgradeId, amount: BuyAmount },
    BuyOneTimeUpgrade { id: UpgradeId },
    SetDifficulty(Difficulty),
    StartTypingTest {
        mode: TestMode,
        words: u32,
        at: DateTime<Utc>,
    },
    CompleteTypingTest { at: DateTime<Utc> },
    /// Credit idle income for `elapsed_secs`.
    PassiveIncome { elapsed_secs: u64 },
    /// Replace the whole state with an exported document.
    Import(String),
    /// Wipe the state back to defaults.
    Reset,
}

/// What an event did. `Rejected` means nothing changed.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    WordPresented {
        word: String,
        gold: bool,
    },
    WordScored {
        correct: bool,
        value: Decimal,
        xp: u64,
        levels_gained: u64,
        streak: u64,
        gold: bool,
        wpm: f64,
    },
    UpgradeBought {
        id: UpgradeId,
        units: u64,
        cost: Decimal,
    },
    OneTimeUpgradeBought {
        id: UpgradeId,
        cost: Decimal,
        feature: Option<Feature>,
    },
    DifficultySet(Difficulty),
    TestStarted {
        mode: TestMode,
        words: u32,
    },
    /// `boost` is `None` when a previous boost was still active or cooling down.
    TestCompleted {
        result: TestResult,
        boost: Option<f64>,
    },
    IncomeCredited {
        amount: Decimal,
    },
    Imported,
    Reset,
    Rejected(Rejection),
}

/// The word currently waiting to be typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetWord {
    pub text: String,
    pub gold: bool,
}

type Step = Result<(Outcome, &'static [StateKey]), Rejection>;

/// Player session: typed state, its backing store and per-session trackers.
pub struct Game<S: KeyValueStore> {
    store: S,
    state: GameState,
    catalog: UpgradeCatalog,
    config: GameConfig,
    rng: ChaCha8Rng,
    wpm: RollingWpm,
    target: Option<TargetWord>,
    test: Option<TypingTest>,
}

impl<S: KeyValueStore> Game<S> {
    /// Load state from `store`. Entities that break their invariants are reset
    /// to defaults and written back.
    pub fn new(
        mut store: S,
        catalog: UpgradeCatalog,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        let mut state = load_state(&store)?;
        let repaired = repair_state(&mut state);
        if !repaired.is_empty() {
            for key in &repaired {
                warn!(%key, "stored value violates invariants; using default");
            }
            save_keys(&mut store, &state, &repaired)?;
        }
        info!(
            level = state.progress.level,
            balance = %state.balance,
            "game loaded"
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            wpm: RollingWpm::new(config.wpm_window_secs),
            store,
            state,
            catalog,
            config,
            target: None,
            test: None,
        })
    }

    /// Apply one event. Rejections come back as `Ok(Outcome::Rejected(..))`;
    /// `Err` only reports store failures.
    pub fn apply(&mut self, event: Event) -> Result<Outcome, GameError> {
        let before = self.state.clone();
        let step = match event {
            Event::Import(json) => return self.import(&json),
            Event::Reset => return self.reset(),
            Event::PresentWord { word } => Ok(self.present_word(&word)),
            Event::SubmitWord { typed, at } => self.submit_word(&typed, at),
            Event::BuyUpgrade { id, amount } => self.buy(&id, amount),
            Event::BuyOneTimeUpgrade { id } => self.buy_one_time(&id),
            Event::SetDifficulty(difficulty) => set_difficulty(&mut self.state, difficulty)
                .map(|()| (Outcome::DifficultySet(difficulty), DIFFICULTY_KEYS)),
            Event::StartTypingTest { mode, words, at } => self.start_test(mode, words, at),
            Event::CompleteTypingTest { at } => self.complete_test(at),
            Event::PassiveIncome { elapsed_secs } => Ok(self.credit_income(elapsed_secs)),
        };
        match step {
            Ok((outcome, keys)) => match save_keys(&mut self.store, &self.state, keys) {
                Ok(()) => Ok(outcome),
                Err(e) => {
                    self.state = before;
                    Err(e.into())
                }
            },
            Err(rejection) => {
                warn!(%rejection, "event rejected");
                Ok(Outcome::Rejected(rejection))
            }
        }
    }

    fn present_word(&mut self, word: &str) -> (Outcome, &'static [StateKey]) {
        let text = if is_available(&self.state, Feature::Difficulty)
            && !self.state.difficulty.is_plain()
        {
            mutate_word(word, &self.state.difficulty, &mut self.rng)
        } else {
            word.to_string()
        };
        let gold = is_gold_word(&mut self.rng, self.state.gold_word_chance);
        self.target = Some(TargetWord {
            text: text.clone(),
            gold,
        });
        (Outcome::WordPresented { word: text, gold }, NO_KEYS)
    }

    fn submit_word(&mut self, typed: &str, at: DateTime<Utc>) -> Step {
        let Some(target) = self.target.take() else {
            return Err(Rejection::NoTargetWord);
        };
        let correct = typed == target.text;
        let length = word_length(&target.text);
        if !correct {
            self.record_test_word(false, length);
            let broken = break_streak(&mut self.state);
            self.state.accuracy.record(false);
            debug!(broken, "streak broken");
            let outcome = Outcome::WordScored {
                correct,
                value: Decimal::ZERO,
                xp: 0,
                levels_gained: 0,
                streak: 0,
                gold: target.gold,
                wpm: self.wpm.wpm(at),
            };
            return Ok((outcome, WORD_KEYS));
        }

        let streak = self.state.streak + 1;
        let phase = self.boost_phase(at);
        let value = match word_value(
            &target.text,
            target.gold,
            phase.multiplier(),
            phase.is_active(),
            self.state.word_multiplier,
            &self.config,
        ) {
            Ok(v) => v * streak_money_factor(streak, self.state.streak_bonus),
            Err(e) => {
                self.target = Some(target);
                return Err(Rejection::InvalidAmount(match e {
                    EconError::InvalidInput(what) => what,
                    EconError::Overflow => "word value",
                }));
            }
        };
        let xp = word_xp(&target.text, target.gold, streak, &self.config);
        self.record_test_word(true, length);

        extend_streak(&mut self.state);
        self.state.balance += value;
        let levels_gained = add_xp(&mut self.state.progress, xp, &self.config);
        self.state.accuracy.record(true);
        self.wpm.record(length, at);
        if levels_gained > 0 {
            info!(level = self.state.progress.level, "level up");
        }
        let outcome = Outcome::WordScored {
            correct,
            value,
            xp,
            levels_gained,
            streak,
            gold: target.gold,
            wpm: self.wpm.wpm(at),
        };
        Ok((outcome, WORD_KEYS))
    }

    fn record_test_word(&mut self, correct: bool, length: u64) {
        if let Some(test) = self.test.as_mut() {
            test.record_word(correct, length);
        }
    }

    fn buy(&mut self, id: &UpgradeId, amount: BuyAmount) -> Step {
        let upgrade = self
            .catalog
            .repeatable(id)
            .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
        let purchase = buy_upgrade(&mut self.state, upgrade, amount)?;
        self.state.balance -= purchase.cost;
        info!(%id, units = purchase.units, cost = %purchase.cost, "upgrade purchased");
        let outcome = Outcome::UpgradeBought {
            id: id.clone(),
            units: purchase.units,
            cost: purchase.cost,
        };
        Ok((outcome, PURCHASE_KEYS))
    }

    fn buy_one_time(&mut self, id: &UpgradeId) -> Step {
        let upgrade = self
            .catalog
            .one_time(id)
            .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
        let purchase = buy_one_time_upgrade(&mut self.state, upgrade)?;
        self.state.balance -= purchase.cost;
        if let Some(feature) = purchase.feature {
            if let Err(e) = unlock_feature(&mut self.state, feature) {
                warn!(%feature, error = %e, "feature already unlocked");
            }
        }
        info!(%id, cost = %purchase.cost, "one-time upgrade purchased");
        let outcome = Outcome::OneTimeUpgradeBought {
            id: id.clone(),
            cost: purchase.cost,
            feature: purchase.feature,
        };
        Ok((outcome, PURCHASE_KEYS))
    }

    fn start_test(&mut self, mode: TestMode, words: u32, at: DateTime<Utc>) -> Step {
        if self.test.is_some() {
            return Err(Rejection::TestInProgress);
        }
        self.test = Some(TypingTest::start(mode, words, at, &self.state)?);
        info!(?mode, words, "typing test started");
        Ok((Outcome::TestStarted { mode, words }, NO_KEYS))
    }

    fn complete_test(&mut self, at: DateTime<Utc>) -> Step {
        let Some(test) = self.test.as_ref() else {
            return Err(Rejection::NoActiveTest);
        };
        if !test.is_complete() {
            return Err(Rejection::TestIncomplete {
                typed: test.typed_words(),
                target: test.target_words,
            });
        }
        let result = test.finish(at);
        self.test = None;
        let multiplier =
            boost_multiplier(result.wpm, result.word_count, result.accuracy, result.mode)
                .unwrap_or(1.0);
        let boost = match activate_boost(&mut self.state.boost, multiplier, at, &self.config) {
            Ok(()) => Some(multiplier),
            Err(e) => {
                warn!(error = %e, "boost not activated");
                None
            }
        };
        info!(wpm = result.wpm, accuracy = result.accuracy, ?boost, "typing test completed");
        Ok((Outcome::TestCompleted { result, boost }, BOOST_KEYS))
    }

    fn credit_income(&mut self, elapsed_secs: u64) -> (Outcome, &'static [StateKey]) {
        let amount = passive_income(self.state.cash_per_second, elapsed_secs);
        self.state.balance += amount;
        (Outcome::IncomeCredited { amount }, BALANCE_KEYS)
    }

    fn clear_session(&mut self) {
        self.target = None;
        self.test = None;
        self.wpm.clear();
    }

    fn import(&mut self, json: &str) -> Result<Outcome, GameError> {
        match import_json(&mut self.store, json) {
            Ok(state) => {
                self.state = state;
                self.clear_session();
                Ok(Outcome::Imported)
            }
            Err(SnapshotError::Store(e)) => Err(e.into()),
            Err(e) => {
                let rejection = Rejection::MalformedImport(e.to_string());
                warn!(%rejection, "event rejected");
                Ok(Outcome::Rejected(rejection))
            }
        }
    }

    fn reset(&mut self) -> Result<Outcome, GameError> {
        self.store.replace_all(BTreeMap::new())?;
        self.state = GameState::default();
        save_state(&mut self.store, &self.state)?;
        self.clear_session();
        info!("state reset");
        Ok(Outcome::Reset)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    pub fn target(&self) -> Option<&TargetWord> {
        self.target.as_ref()
    }

    pub fn test(&self) -> Option<&TypingTest> {
        self.test.as_ref()
    }

    pub fn boost_phase(&self, now: DateTime<Utc>) -> BoostPhase {
        boost_phase(&self.state.boost, now, &self.config)
    }

    /// Percent of the way to the next level.
    pub fn xp_progress(&self) -> f64 {
        xp_progress(&self.state.progress, &self.config)
    }

    pub fn wpm(&self, now: DateTime<Utc>) -> f64 {
        self.wpm.wpm(now)
    }

    /// Average length to request from a word provider.
    pub fn target_word_length(&self) -> f64 {
        self.state.average_word_length.to_f64().unwrap_or(4.0)
    }

    /// Price of buying `amount` of repeatable upgrade `id` right now.
    pub fn quote(&self, id: &UpgradeId, amount: BuyAmount) -> Result<CostQuote, Rejection> {
        let upgrade = self
            .catalog
            .repeatable(id)
            .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
        quote_upgrade(&self.state, upgrade, amount)
    }

    pub fn export_json(&self) -> Result<String, GameError> {
        Ok(export_json(&self.store)?)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::recompute_cash_per_second;
    use catalog::default_catalog;
    use chrono::{Duration, TimeZone};
    use persistence::MemoryStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn game() -> Game<MemoryStore> {
        let config = GameConfig {
            rng_seed: 11,
            ..GameConfig::default()
        };
        Game::new(MemoryStore::new(), default_catalog().unwrap(), config).unwrap()
    }

    fn never_gold(g: &mut Game<MemoryStore>) {
        g.state.gold_word_chance = 0.0;
    }

    fn type_word(g: &mut Game<MemoryStore>, word: &str, typed: &str, at: DateTime<Utc>) -> Outcome {
        g.apply(Event::PresentWord { word: word.into() }).unwrap();
        g.apply(Event::SubmitWord {
            typed: typed.into(),
            at,
        })
        .unwrap()
    }

    #[test]
    fn correct_word_pays_and_persists() {
        let mut g = game();
        never_gold(&mut g);
        let out = type_word(&mut g, "hello", "hello", t0());
        assert!(matches!(
            out,
            Outcome::WordScored {
                correct: true,
                xp: 10,
                streak: 1,
                ..
            }
        ));
        assert_eq!(g.state().balance, Decimal::new(5, 0));
        assert_eq!(
            g.store().get("balance").unwrap(),
            Some(serde_json::json!("5"))
        );
        assert_eq!(g.store().get("streakCount").unwrap(), Some(serde_json::json!(1)));
    }

    #[test]
    fn wrong_word_breaks_streak() {
        let mut g = game();
        never_gold(&mut g);
        for _ in 0..7 {
            type_word(&mut g, "key", "key", t0());
        }
        type_word(&mut g, "key", "kye", t0());
        assert_eq!(g.state().streak, 0);
        assert_eq!(g.state().highest_streak, 7);
        type_word(&mut g, "key", "kye", t0());
        assert_eq!(g.state().highest_streak, 7);
        assert_eq!(g.state().accuracy.incorrect_count, 2);
    }

    #[test]
    fn submit_without_word_is_rejected() {
        let mut g = game();
        assert_eq!(
            g.apply(Event::SubmitWord {
                typed: "x".into(),
                at: t0()
            })
            .unwrap(),
            Outcome::Rejected(Rejection::NoTargetWord)
        );
    }

    #[test]
    fn purchase_deducts_cost() {
        let mut g = game();
        g.state.balance = Decimal::new(100, 0);
        let out = g
            .apply(Event::BuyUpgrade {
                id: UpgradeId::new("1"),
                amount: BuyAmount::Count(1),
            })
            .unwrap();
        assert_eq!(
            out,
            Outcome::UpgradeBought {
                id: UpgradeId::new("1"),
                units: 1,
                cost: Decimal::new(25, 0)
            }
        );
        assert_eq!(g.state().balance, Decimal::new(75, 0));
        assert_eq!(g.state().average_word_length, Decimal::new(41, 1));
    }

    #[test]
    fn unknown_upgrade_rejected() {
        let mut g = game();
        let out = g
            .apply(Event::BuyOneTimeUpgrade {
                id: UpgradeId::new("99"),
            })
            .unwrap();
        assert_eq!(
            out,
            Outcome::Rejected(Rejection::UnknownUpgrade(UpgradeId::new("99")))
        );
    }

    #[test]
    fn one_time_feature_unlocks() {
        let mut g = game();
        g.state.balance = Decimal::new(5000, 0);
        g.apply(Event::BuyOneTimeUpgrade {
            id: UpgradeId::new("4"),
        })
        .unwrap();
        assert!(g.state().is_unlocked(Feature::Difficulty));
        assert_eq!(g.state().balance, Decimal::ZERO);
        let hard = Difficulty {
            upper: false,
            numbers: true,
            symbols: false,
        };
        assert_eq!(
            g.apply(Event::SetDifficulty(hard)).unwrap(),
            Outcome::DifficultySet(hard)
        );
        let Outcome::WordPresented { word, .. } =
            g.apply(Event::PresentWord { word: "cat".into() }).unwrap()
        else {
            panic!("word not presented");
        };
        assert_eq!(word.len(), 4);
        assert!(word.starts_with("cat"));
    }

    #[test]
    fn test_completion_activates_boost() {
        let mut g = game();
        never_gold(&mut g);
        g.state.unlocked_features.insert(Feature::TypingTest);
        g.apply(Event::StartTypingTest {
            mode: TestMode::Sprint,
            words: 10,
            at: t0(),
        })
        .unwrap();
        for i in 0..10 {
            type_word(&mut g, "hello", "hello", t0() + Duration::seconds(i));
        }
        assert!(g.test().is_some_and(TypingTest::is_complete));
        let end = t0() + Duration::seconds(10);
        let Outcome::TestCompleted { boost, result } =
            g.apply(Event::CompleteTypingTest { at: end }).unwrap()
        else {
            panic!("test not completed");
        };
        assert_eq!(result.accuracy, 100.0);
        let multiplier = boost.unwrap();
        assert!(multiplier > 1.0);
        assert!(g.boost_phase(end + Duration::seconds(30)).is_active());

        // boosted word is worth more
        let before = g.state().balance;
        type_word(&mut g, "hello", "hello", end + Duration::seconds(1));
        assert!(g.state().balance - before > Decimal::new(5, 0));
    }

    #[test]
    fn passive_income_credits_balance() {
        let mut g = game();
        g.state.cash_contributions.insert(UpgradeId::new("3"), Decimal::new(10, 0));
        recompute_cash_per_second(&mut g.state);
        let out = g.apply(Event::PassiveIncome { elapsed_secs: 3 }).unwrap();
        assert_eq!(
            out,
            Outcome::IncomeCredited {
                amount: Decimal::new(30, 0)
            }
        );
    }

    #[test]
    fn import_rejects_malformed_without_change() {
        let mut g = game();
        never_gold(&mut g);
        type_word(&mut g, "word", "word", t0());
        let before = g.store().clone();
        let out = g.apply(Event::Import("{ broken".into())).unwrap();
        assert!(matches!(out, Outcome::Rejected(Rejection::MalformedImport(_))));
        assert_eq!(g.store(), &before);
    }

    #[test]
    fn invalid_stored_entities_reset_on_load() {
        let mut store = MemoryStore::new();
        store.set("goldWordChance", serde_json::json!(5.0)).unwrap();
        store.set("balance", serde_json::json!("42")).unwrap();
        let g = Game::new(store, default_catalog().unwrap(), GameConfig::default()).unwrap();
        assert_eq!(g.state().gold_word_chance, tycoon_core::DEFAULT_GOLD_WORD_CHANCE);
        assert_eq!(g.state().balance, Decimal::new(42, 0));
        assert_eq!(
            g.store().get("goldWordChance").unwrap(),
            Some(serde_json::json!(tycoon_core::DEFAULT_GOLD_WORD_CHANCE))
        );
        tycoon_core::validate_state(g.state()).unwrap();
    }

    /// Memory store whose batched writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<serde_json::Value>, persistence::StoreError> {
            self.inner.get(key)
        }

        fn set(
            &mut self,
            key: &str,
            value: serde_json::Value,
        ) -> Result<(), persistence::StoreError> {
            self.set_many(vec![(key.to_string(), value)])
        }

        fn set_many(
            &mut self,
            values: Vec<(String, serde_json::Value)>,
        ) -> Result<(), persistence::StoreError> {
            if self.fail {
                return Err(persistence::StoreError::Io("disk full".into()));
            }
            self.inner.set_many(values)
        }

        fn entries(
            &self,
        ) -> Result<BTreeMap<String, serde_json::Value>, persistence::StoreError> {
            self.inner.entries()
        }

        fn replace_all(
            &mut self,
            entries: BTreeMap<String, serde_json::Value>,
        ) -> Result<(), persistence::StoreError> {
            self.inner.replace_all(entries)
        }
    }

    #[test]
    fn failed_save_leaves_state_untouched() {
        let mut store = FlakyStore::default();
        store.inner.set("balance", serde_json::json!("100")).unwrap();
        let mut g = Game::new(store, default_catalog().unwrap(), GameConfig::default()).unwrap();
        g.store.fail = true;
        let before = g.state().clone();
        let res = g.apply(Event::BuyUpgrade {
            id: UpgradeId::new("1"),
            amount: BuyAmount::Count(1),
        });
        assert!(matches!(res, Err(GameError::Store(_))));
        assert_eq!(g.state(), &before);
        assert_eq!(load_state(&g.store.inner).unwrap().balance, Decimal::new(100, 0));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut g = game();
        never_gold(&mut g);
        type_word(&mut g, "word", "word", t0());
        assert_eq!(g.apply(Event::Reset).unwrap(), Outcome::Reset);
        assert_eq!(g.state(), &GameState::default());
        assert_eq!(load_state(g.store()).unwrap(), GameState::default());
    }
}
