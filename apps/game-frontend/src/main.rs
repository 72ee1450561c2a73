#![deny(warnings)]

//! Headless HUD driven by a one-second tick schedule.
//!
//! The tick only refreshes display values (session time, boost countdown);
//! economy changes still go through `Game::apply`.

use bevy_ecs::prelude::*;
use chrono::{DateTime, Duration, Utc};
use persistence::MemoryStore;
use tycoon_core::GameConfig;
use tycoon_runtime::{BoostCountdown, BoostPhase, Event, Game, GameError, Outcome};

#[derive(Resource)]
struct Clock {
    now: DateTime<Utc>,
}

#[derive(Resource)]
struct Session {
    game: Game<MemoryStore>,
    countdown: BoostCountdown,
}

#[derive(Resource, Default)]
struct HudState {
    session_secs: u64,
    boost_countdown: Option<i64>,
    boost_label: String,
    balance: String,
    level: u64,
    xp_progress: f64,
}

fn advance_clock_system(mut clock: ResMut<Clock>) {
    clock.now += Duration::seconds(1);
}

fn tick_hud_system(clock: Res<Clock>, mut session: ResMut<Session>, mut hud: ResMut<HudState>) {
    let session = &mut *session;
    let game = &session.game;
    session
        .countdown
        .tick(&game.state().boost, clock.now, game.config());
    hud.session_secs = hud.session_secs.saturating_add(1);
    hud.boost_countdown = session.countdown.remaining_secs();
    hud.boost_label = match game.boost_phase(clock.now) {
        BoostPhase::Idle => "idle".into(),
        BoostPhase::Active { multiplier, .. } => format!("active x{multiplier:.2}"),
        BoostPhase::Cooldown { .. } => "cooldown".into(),
    };
    hud.balance = game.state().balance.round_dp(2).to_string();
    hud.level = game.state().progress.level;
    hud.xp_progress = game.xp_progress();
}

fn build_world(game: Game<MemoryStore>, now: DateTime<Utc>) -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(Clock { now });
    world.insert_resource(Session {
        game,
        countdown: BoostCountdown::default(),
    });
    world.insert_resource(HudState::default());
    let mut schedule = Schedule::default();
    schedule.add_systems((advance_clock_system, tick_hud_system).chain());
    (world, schedule)
}

/// Type `words` correctly one second apart; returns the rejections seen.
fn seed_words<'a>(
    game: &mut Game<MemoryStore>,
    words: impl IntoIterator<Item = &'a str>,
    start: DateTime<Utc>,
) -> Result<Vec<Outcome>, GameError> {
    let mut rejected = Vec::new();
    for (i, word) in words.into_iter().enumerate() {
        let at = start + Duration::seconds(i as i64);
        for event in [
            Event::PresentWord { word: word.into() },
            Event::SubmitWord {
                typed: word.into(),
                at,
            },
        ] {
            let outcome = game.apply(event)?;
            if matches!(outcome, Outcome::Rejected(_)) {
                rejected.push(outcome);
            }
        }
    }
    Ok(rejected)
}

fn main() {
    let catalog = match catalog::default_catalog() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("game-frontend: catalog failed to load: {e}");
            std::process::exit(1);
        }
    };
    let game = match Game::new(MemoryStore::new(), catalog, GameConfig::default()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("game-frontend: {e}");
            std::process::exit(1);
        }
    };
    let now = Utc::now();
    let (mut world, mut schedule) = build_world(game, now);
    {
        // A couple of words so the HUD has something to show.
        let mut session = world.resource_mut::<Session>();
        match seed_words(&mut session.game, ["hello", "tycoon"], now) {
            Ok(rejected) => {
                for outcome in rejected {
                    if let Outcome::Rejected(r) = outcome {
                        eprintln!("game-frontend: rejected: {r}");
                    }
                }
            }
            Err(e) => {
                eprintln!("game-frontend: {e}");
                std::process::exit(1);
            }
        }
    }
    // No run loop: headless demo
    for _ in 0..3 {
        schedule.run(&mut world);
    }
    let s = world.resource::<HudState>();
    println!(
        "game-frontend: HUD ready | session={}s balance=${} level={} ({:.1}%) boost={} countdown={:?}",
        s.session_secs, s.balance, s.level, s.xp_progress, s.boost_label, s.boost_countdown
    );
}
