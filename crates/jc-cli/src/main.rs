//! jetcal CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use jc_correct::CorrectionEngine;
use std::path::{Path, PathBuf};

mod events;
mod pipeline;
mod run;

use events::{DEFAULT_CHUNK_SIZE, EventChunks};
use pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "jetcal")]
#[command(about = "jetcal - jet energy calibration corrections and event selection")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the per-channel selection over an event file and report the cutflow
    Select {
        /// Run config (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Events, one JSON object per line
        #[arg(short, long)]
        events: PathBuf,

        /// Output file for the cutflow (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threads (0 = auto). Overrides the run config.
        #[arg(long)]
        threads: Option<usize>,

        /// Base seed of the per-event random streams. Overrides the run config.
        #[arg(long)]
        seed: Option<u64>,

        /// Events read and processed per batch
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Evaluate the configured corrections for one jet
    Correct {
        /// Run config (JSON or YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Uncorrected jet pt (GeV)
        #[arg(long)]
        pt: f64,

        /// Jet pseudorapidity
        #[arg(long, allow_hyphen_values = true)]
        eta: f64,

        /// Jet catchment area
        #[arg(long, default_value = "0.5")]
        area: f64,

        /// Pileup energy density
        #[arg(long)]
        rho: f64,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Select { config, events, output, threads, seed, chunk_size } => {
            cmd_select(&config, &events, output.as_ref(), threads, seed, chunk_size)
        }
        Commands::Correct { config, pt, eta, area, rho, output } => {
            cmd_correct(&config, pt, eta, area, rho, output.as_ref())
        }
    }
}

fn cmd_select(
    config: &Path,
    events: &Path,
    output: Option<&PathBuf>,
    threads: Option<usize>,
    seed: Option<u64>,
    chunk_size: usize,
) -> Result<()> {
    let mut cfg = run::read_run_config(config)?;
    if let Some(threads) = threads {
        cfg.threads = threads;
    }
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    let n_threads = cfg.effective_threads();

    let pipeline = Pipeline::from_config(&cfg, n_threads)?;
    tracing::info!(path = %events.display(), channel = %cfg.channel, n_threads, chunk_size, "processing events");
    let mut cutflow = pipeline.cutflow();
    for chunk in EventChunks::open(events, chunk_size)? {
        let chunk = chunk?;
        pipeline.run_chunk(&chunk, &mut cutflow)?;
        tracing::debug!(n_events = cutflow.n_events(), "chunk done");
    }
    tracing::info!(n_events = cutflow.n_events(), "events processed");

    let levels = pipeline.engine().map(|e| e.levels()).unwrap_or_default();
    let output_json = serde_json::json!({
        "channel": cfg.channel,
        "is_mc": cfg.is_mc,
        "n_events": cutflow.n_events(),
        "seed": cfg.seed,
        "jec_levels": levels,
        "smearing": cfg.is_mc && pipeline.engine().is_some_and(|e| e.has_resolution()),
        "cutflow": cutflow.entries(),
    });
    write_json(output, output_json)
}

fn cmd_correct(
    config: &Path,
    pt: f64,
    eta: f64,
    area: f64,
    rho: f64,
    output: Option<&PathBuf>,
) -> Result<()> {
    let cfg = run::read_run_config(config)?;
    let Some(jec) = &cfg.jec else {
        anyhow::bail!("run config has no jec section");
    };
    let mut engine = CorrectionEngine::init_jec(jec, 1)?;
    if let Some(jer) = &cfg.jer {
        engine = engine.with_jer(jer)?;
    }

    let correction = engine.correction(0, pt, eta, area, rho);
    let corrected_pt = pt * correction;
    let mut output_json = serde_json::json!({
        "pt": pt,
        "eta": eta,
        "area": area,
        "rho": rho,
        "levels": engine.levels(),
        "correction": correction,
        "corrected_pt": corrected_pt,
    });
    if engine.has_resolution() {
        output_json["resolution"] = serde_json::json!(engine.resolution(0, corrected_pt, eta, rho)?);
    }
    if engine.has_scale_factor() {
        output_json["scale_factor"] =
            serde_json::json!(engine.resolution_scale_factor(0, corrected_pt, eta, rho)?);
    }
    write_json(output, output_json)
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
