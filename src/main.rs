//! Headless runner for the arena and horde simulations.
//!
//! Loads an optional JSON configuration, runs a fixed number of ticks and
//! optionally prints a JSON summary of the final state.
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use glam::Vec2;
use log::{debug, info};
use serde_json::json;
use serpentine::numeric::u32_to_f32;
use serpentine::{init_logging, Arena, ArenaConfig, Horde, ShipInput};

/// Which game to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Game {
    /// Snake arena with rivals, prey and boids.
    Arena,
    /// Twin-stick horde survival.
    Horde,
}

/// Runs the steering simulation headless and reports the outcome
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Game to run
    #[arg(long, value_enum, default_value_t = Game::Arena)]
    game: Game,
    /// JSON arena configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Ticks to simulate
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,
    /// Override the configured seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Print a JSON summary when the run ends
    #[arg(long)]
    summary: bool,
}

fn run_arena(args: &Args) -> anyhow::Result<serde_json::Value> {
    let mut config = match &args.config {
        Some(path) => ArenaConfig::load(path)
            .with_context(|| format!("loading arena config from {}", path.display()))?,
        None => ArenaConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut arena = Arena::new(config);
    for _ in 0..args.ticks {
        for event in arena.tick() {
            debug!("tick {}: {event:?}", arena.ctx.tick);
        }
        if arena.is_over() {
            info!("player died on tick {}", arena.ctx.tick);
            break;
        }
    }
    let summary = arena.summary();
    info!(
        "arena finished: score {} kills {} length {}",
        summary.score, summary.kills, summary.player_length
    );
    serde_json::to_value(summary).context("serialising arena summary")
}

fn run_horde(args: &Args) -> anyhow::Result<serde_json::Value> {
    let config = match &args.config {
        Some(path) => ArenaConfig::load(path)
            .with_context(|| format!("loading arena config from {}", path.display()))?,
        None => ArenaConfig::default(),
    };
    let seed = args.seed.unwrap_or(config.seed);
    let mut horde = Horde::new(config.bounds(), seed);
    for tick in 0..args.ticks {
        // Circle strafe: sweep the stick round once every 300 ticks.
        let phase = u32_to_f32(u32::try_from(tick % 300).unwrap_or(0));
        let angle = phase / 300.0 * std::f32::consts::TAU;
        let input = ShipInput {
            direction: Vec2::from_angle(angle),
            fire: true,
        };
        for event in horde.tick(&input) {
            debug!("tick {tick}: {event:?}");
        }
        if !horde.ship.alive {
            info!("ship destroyed on tick {tick}");
            break;
        }
    }
    info!("horde finished: wave {} score {}", horde.wave, horde.score);
    Ok(json!({
        "time": horde.time,
        "wave": horde.wave,
        "score": horde.score,
        "ship_alive": horde.ship.alive,
        "ship_hp": horde.ship.hp,
        "enemies": horde.census(),
        "mean_enemy_speed": horde.mean_enemy_speed(),
    }))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let summary = match args.game {
        Game::Arena => run_arena(&args)?,
        Game::Horde => run_horde(&args)?,
    };
    if args.summary {
        let text = serde_json::to_string_pretty(&summary).context("formatting summary")?;
        writeln!(io::stdout().lock(), "{text}").context("writing summary")?;
    }
    Ok(())
}
