use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use collider::core::{Metrics, Particle};
use collider::{initialize, Config};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One metrics row per emitted step
    Csv,
    /// One JSON object per emitted step, with the particle list
    Json,
}

/// Run a particle collision simulation and stream its metrics to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config TOML file (defaults apply to any missing key)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of steps to simulate
    #[arg(short, long, default_value_t = 1000)]
    steps: usize,

    /// Emit every K-th step
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    every: u64,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(Serialize)]
struct Frame<'a> {
    #[serde(flatten)]
    metrics: Metrics,
    particles: &'a [Particle],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seed) = cli.seed {
        config.random_seed = seed;
    }

    let sim = initialize(&config).context("initializing simulation")?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.format == Format::Csv {
        writeln!(out, "step,particles,temperature,collisions,reactions,products")?;
    }
    for snapshot in sim.run(cli.steps) {
        let state = snapshot?;
        if state.step() % cli.every != 0 {
            continue;
        }
        let m = state.metrics();
        match cli.format {
            Format::Csv => writeln!(
                out,
                "{},{},{:.6},{},{},{}",
                m.step,
                m.particle_count,
                m.temperature,
                m.collision_count,
                m.reaction_count,
                m.product_count
            )?,
            Format::Json => {
                let frame = Frame {
                    metrics: m,
                    particles: state.particles(),
                };
                serde_json::to_writer(&mut out, &frame)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
