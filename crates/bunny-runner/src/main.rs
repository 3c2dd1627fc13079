//! Command-line driver for the bunny world.

mod render;
mod settings;
mod telemetry;

use anyhow::{Context, Result};
use bunny_core::Census;
use bunny_world::{LifecycleSink, Simulation, Snapshot, TracingSink};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use render::ConsoleSink;
use settings::Preset;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{event, info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML settings layered over the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Starting configuration
    #[arg(short, long, value_enum, default_value = "infection")]
    preset: Preset,

    /// Number of turns to play (0 = until only immortals are left)
    #[arg(short, long)]
    turns: Option<u64>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Resume from a snapshot file
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a snapshot when the run ends (`.json` for JSON, anything else for binary)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Draw the grid and lifecycle messages to stdout
    #[arg(short, long)]
    render: bool,

    /// Pause between turns, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Log a census every N turns (0 disables)
    #[arg(long, default_value_t = 10)]
    report_interval: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.json_logs)?;

    let mut config = settings::load(args.config.as_deref(), args.preset)?;
    if let Some(turns) = args.turns {
        config.num_turns = turns;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    info!(
        event = "runner_start",
        preset = ?args.preset,
        width = config.world.width,
        height = config.world.height,
        num_turns = config.num_turns,
        seed = config.seed,
        "Starting bunny world"
    );

    let rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut sim = match &args.load {
        Some(path) => {
            let snapshot = Snapshot::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            Simulation::restore(config, snapshot, rng)?
        }
        None => Simulation::new(config, rng)?,
    };

    if args.render {
        let mut sink = ConsoleSink::new(io::stdout().lock());
        run(&mut sim, &mut sink, &args, |sink| match sink.take_error() {
            Some(e) => Err(e).context("Failed to draw the world"),
            None => Ok(()),
        })?;
    } else {
        run(&mut sim, &mut TracingSink, &args, |_| Ok(()))?;
    }

    let census = sim.population().census(&sim.config().lifecycle);
    report_census(sim.turn(), &census);

    if let Some(path) = &args.save {
        sim.snapshot()
            .save(path)
            .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    }

    info!(
        event = "runner_finished",
        turns = sim.turn(),
        population = census.total,
        "Run complete"
    );

    Ok(())
}

/// Play turns until the limit is hit or nothing mortal is left
fn run<S, F>(sim: &mut Simulation, sink: &mut S, args: &Args, mut after_turn: F) -> Result<()>
where
    S: LifecycleSink,
    F: FnMut(&mut S) -> Result<()>,
{
    let limit = sim.config().num_turns;
    let mut played = 0;

    loop {
        if sim.population().iter().all(|agent| agent.kind.is_immortal()) {
            info!(
                event = "extinction",
                turn = sim.turn(),
                survivors = sim.population().count(),
                "No mortal bunny is left"
            );
            break;
        }
        if limit > 0 && played >= limit {
            break;
        }

        let stats = sim.advance_turn(sink)?;
        after_turn(sink)?;
        played += 1;

        if args.report_interval > 0 && stats.turn % args.report_interval == 0 {
            report_census(stats.turn, &sim.population().census(&sim.config().lifecycle));
        }
        if args.delay_ms > 0 {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }

    Ok(())
}

fn report_census(turn: u64, census: &Census) {
    info!(
        event = "census",
        turn = turn,
        total = census.total,
        males = census.males,
        females = census.females,
        adults = census.adults,
        mean_age = format!("{:.2}", census.mean_age()),
        houses = ?census.surviving_houses(),
        "Population census"
    );

    for (kind, count) in &census.by_kind {
        event!(
            Level::INFO,
            gauge_name = "population_by_kind",
            gauge_value = *count,
            kind = %kind,
            turn = turn,
            "Population by kind"
        );
    }
}
