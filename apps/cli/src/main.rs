#![deny(warnings)]

//! Headless CLI: play a simulated typing session against a save, buy
//! upgrades, and move snapshots in and out.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use persistence::{JsonFileStore, KeyValueStore, MemoryStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;
use tycoon_core::{GameConfig, TestMode, UpgradeCatalog, UpgradeId};
use tycoon_econ::BuyAmount;
use tycoon_runtime::{Event, Game, LocalWordProvider, Outcome, WordQueue};

/// Chance that the simulated typist fumbles a word.
const TYPO_RATE: f64 = 0.05;
/// Simulated seconds spent per word.
const SECS_PER_WORD: i64 = 2;

#[derive(Debug, Default)]
struct Args {
    words: u32,
    seed: Option<u64>,
    save: Option<PathBuf>,
    buys: Vec<(UpgradeId, BuyAmount)>,
    one_time: Vec<UpgradeId>,
    test: Option<(TestMode, u32)>,
    idle_secs: u64,
    export: Option<PathBuf>,
    import: Option<PathBuf>,
    catalog: Option<PathBuf>,
    slot: Option<String>,
    reset: bool,
    version: bool,
}

fn parse_buy(arg: &str) -> Result<(UpgradeId, BuyAmount)> {
    match arg.split_once(':') {
        Some((id, amount)) => Ok((UpgradeId::new(id), amount.parse()?)),
        None => Ok((UpgradeId::new(arg), BuyAmount::Count(1))),
    }
}

fn parse_test(arg: &str) -> Result<(TestMode, u32)> {
    let (mode, words) = arg.split_once(':').unwrap_or((arg, ""));
    let mode = match mode {
        "standard" => TestMode::Standard,
        "sprint" => TestMode::Sprint,
        "marathon" => TestMode::Marathon,
        other => bail!("unknown test mode {other}"),
    };
    let words = match words {
        "" => mode.allowed_lengths()[0],
        n => n.parse().with_context(|| format!("bad test length {n}"))?,
    };
    Ok((mode, words))
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        words: 50,
        ..Args::default()
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--words" => args.words = value()?.parse()?,
            "--seed" => args.seed = Some(value()?.parse()?),
            "--save" => args.save = Some(value()?.into()),
            "--buy" => args.buys.push(parse_buy(&value()?)?),
            "--buy-once" => args.one_time.push(UpgradeId::new(value()?)),
            "--test" => args.test = Some(parse_test(&value()?)?),
            "--idle" => args.idle_secs = value()?.parse()?,
            "--export" => args.export = Some(value()?.into()),
            "--import" => args.import = Some(value()?.into()),
            "--catalog" => args.catalog = Some(value()?.into()),
            "--slot" => args.slot = Some(value()?),
            "--reset" => args.reset = true,
            "--version" => args.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

/// Report a rejected event without aborting the session.
fn note(outcome: &Outcome) {
    if let Outcome::Rejected(r) = outcome {
        println!("rejected: {r}");
    }
}

fn play_words<S: KeyValueStore>(game: &mut Game<S>, args: &Args, seed: u64) -> Result<()> {
    let mut queue = WordQueue::new(LocalWordProvider::new(seed), 16);
    let mut typist = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let start = Utc::now();
    for i in 0..args.words {
        let Some(word) = queue.advance(game.target_word_length()).map(str::to_string) else {
            warn!("no words available; ending session early");
            break;
        };
        game.apply(Event::PresentWord { word })?;
        let Some(target) = game.target().map(|t| t.text.clone()) else {
            continue;
        };
        let typed = if typist.gen_bool(TYPO_RATE) {
            format!("{target}#")
        } else {
            target
        };
        let at = start + Duration::seconds(i64::from(i) * SECS_PER_WORD);
        game.apply(Event::SubmitWord { typed, at })?;
        if game.test().is_some_and(|t| t.is_complete()) {
            let outcome = game.apply(Event::CompleteTypingTest { at })?;
            if let Outcome::TestCompleted { result, boost } = &outcome {
                println!(
                    "Test | {:?} | wpm: {:.1} | accuracy: {:.1}% | boost: {}",
                    result.mode,
                    result.wpm,
                    result.accuracy,
                    boost.map_or_else(|| "none".to_string(), |b| format!("x{b:.2}"))
                );
            }
        }
    }
    Ok(())
}

fn run<S: KeyValueStore>(store: S, catalog: UpgradeCatalog, args: &Args) -> Result<String> {
    let seed = args.seed.unwrap_or(GameConfig::default().rng_seed);
    let config = GameConfig {
        rng_seed: seed,
        ..GameConfig::default()
    };
    let mut game = Game::new(store, catalog, config)?;

    if args.reset {
        game.apply(Event::Reset)?;
    }
    if let Some(path) = &args.import {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match game.apply(Event::Import(json))? {
            Outcome::Rejected(r) => bail!("import failed: {r}"),
            _ => info!(path = %path.display(), "snapshot imported"),
        }
    }
    if args.idle_secs > 0 {
        note(&game.apply(Event::PassiveIncome {
            elapsed_secs: args.idle_secs,
        })?);
    }
    for id in &args.one_time {
        note(&game.apply(Event::BuyOneTimeUpgrade { id: id.clone() })?);
    }
    for (id, amount) in &args.buys {
        note(&game.apply(Event::BuyUpgrade {
            id: id.clone(),
            amount: *amount,
        })?);
    }
    if let Some((mode, words)) = args.test {
        note(&game.apply(Event::StartTypingTest {
            mode,
            words,
            at: Utc::now(),
        })?);
    }
    play_words(&mut game, args, seed)?;

    let s = game.state();
    println!(
        "Session | balance: ${} | level: {} ({:.1}%) | streak: {} (best {}) | accuracy: {:.1}% | cash/s: {} | wpm: {:.1}",
        s.balance.round_dp(2),
        s.progress.level,
        game.xp_progress(),
        s.streak,
        s.highest_streak,
        s.accuracy.percentage,
        s.cash_per_second.round_dp(2),
        game.wpm(Utc::now() + Duration::seconds(i64::from(args.words) * SECS_PER_WORD)),
    );

    let json = game.export_json()?;
    if let Some(path) = &args.export {
        std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "snapshot exported");
    }
    Ok(json)
}

fn store_in_slot(name: &str, json: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = persistence::init_db(persistence::default_sqlite_url()).await?;
        let existing = persistence::list_saves(&pool).await?;
        let id = match existing.iter().find(|s| s.name == name) {
            Some(slot) => slot.id,
            None => persistence::create_save(&pool, name, Some("cli session")).await?,
        };
        persistence::store_snapshot(&pool, id, json).await?;
        info!(slot = name, id, "snapshot stored in save slot");
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args()?;
    if args.version {
        println!(
            "typing-tycoon cli {} ({})",
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(words = args.words, seed = ?args.seed, save = ?args.save, "starting CLI");

    let catalog = catalog::load_or_default(args.catalog.as_deref())?;
    let json = match &args.save {
        Some(path) => run(JsonFileStore::open(path)?, catalog, &args)?,
        None => run(MemoryStore::new(), catalog, &args)?,
    };
    if let Some(name) = &args.slot {
        store_in_slot(name, &json)?;
    }
    Ok(())
}
