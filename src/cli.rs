//! Command-line options and the windowless run mode.

use crate::audio;
use crate::engine::Simulation;
use crate::error::Result;
use crate::events::EventCatalog;
use crate::export::{self, SimulationParams};
use crate::state::SimState;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_VOLUME: f64 = 0.35;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gw-vivarium",
    about = "Coupled oscillators over a diffusing field, with a toy chirp designer"
)]
pub struct Args {
    /// Run the simulation without a window and exit
    #[arg(long)]
    pub headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    pub steps: u64,

    /// Override the configured RNG seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file overriding the default simulation settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON event catalogue (defaults to the bundled one)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Directory for exports triggered from the UI
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Write the metrics log as CSV (headless)
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Write the chirp parameter document (headless)
    #[arg(long)]
    pub params_out: Option<PathBuf>,

    /// Write the chirp audio as WAV (headless)
    #[arg(long)]
    pub wav_out: Option<PathBuf>,

    /// Write the final world snapshot as JSON (headless)
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,

    #[arg(long, default_value_t = 30.0)]
    pub mass_a: f64,

    #[arg(long, default_value_t = 25.0)]
    pub mass_b: f64,

    #[arg(long, default_value_t = 4.0)]
    pub duration: f64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn load_state(&self) -> Result<SimState> {
        let mut state = match &self.config {
            Some(path) => SimState::load(path)?,
            None => SimState::default(),
        };
        if let Some(seed) = self.seed {
            state.seed = seed;
        }
        Ok(state)
    }

    pub fn load_catalog(&self) -> Result<EventCatalog> {
        match &self.events {
            Some(path) => EventCatalog::load(path),
            None => EventCatalog::bundled(),
        }
    }

    pub fn chirp_params(&self) -> SimulationParams {
        SimulationParams {
            mass_a: self.mass_a,
            mass_b: self.mass_b,
            duration: self.duration,
        }
    }
}

/// Stdout logging for headless runs. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

pub fn run_headless(args: &Args) -> Result<Simulation> {
    let state = args.load_state()?;
    let catalog = args.load_catalog()?;

    info!("gw-vivarium headless run");
    info!(
        "{} nodes, {}x{} field, {} steps, seed {}",
        state.node_count, state.grid_size, state.grid_size, args.steps, state.seed
    );
    info!("{} catalogued events", catalog.len());

    let mut sim = Simulation::from_state(&state);
    let cfg = state.step_config();

    for _ in 0..args.steps {
        let sample = sim.tick(&cfg);
        if sim.frame % 100 == 0 {
            debug!(
                "t={:.2} | R={:.4} | mean_amp={:.4}",
                sample.t, sample.order_parameter, sample.mean_amplitude
            );
        }
    }

    if let Some(last) = sim.metrics.latest() {
        info!(
            "finished at t={:.3}: R={:.4}, mean_amp={:.4}, energy_var={:.4}, field_mean={:.4}",
            last.t,
            last.order_parameter,
            last.mean_amplitude,
            last.energy_variance,
            sim.field.mean()
        );
    }

    if let Some(path) = &args.metrics_out {
        sim.metrics.write_csv(path)?;
        info!("metrics written to {}", path.display());
    }
    if let Some(path) = &args.snapshot_out {
        std::fs::write(path, sim.snapshot().to_json()?)?;
        info!("snapshot written to {}", path.display());
    }

    let params = args.chirp_params();
    if let Some(path) = &args.params_out {
        std::fs::write(path, export::to_json(&params)?)?;
        info!("parameters written to {}", path.display());
    }
    if let Some(path) = &args.wav_out {
        std::fs::write(path, audio::chirp_wav(&params, DEFAULT_VOLUME)?)?;
        info!("chirp audio written to {}", path.display());
    }

    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let args = Args::parse_from(["gw-vivarium"]);
        assert!(!args.headless);
        assert_eq!(args.steps, 600);
        assert_eq!(args.chirp_params(), SimulationParams::default());
    }

    #[test]
    fn test_seed_override() {
        let args = Args::parse_from(["gw-vivarium", "--seed", "1234"]);
        assert_eq!(args.load_state().unwrap().seed, 1234);
    }

    #[test]
    fn test_headless_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{ "node_count": 8, "grid_size": 6 }"#).unwrap();
        let metrics = dir.path().join("metrics.csv");
        let params = dir.path().join("params.json");
        let snapshot = dir.path().join("snapshot.json");

        let args = Args::parse_from([
            "gw-vivarium",
            "--headless",
            "--steps",
            "25",
            "--config",
            config.to_str().unwrap(),
            "--metrics-out",
            metrics.to_str().unwrap(),
            "--params-out",
            params.to_str().unwrap(),
            "--snapshot-out",
            snapshot.to_str().unwrap(),
            "--mass-a",
            "12.5",
        ]);
        let sim = run_headless(&args).unwrap();

        assert_eq!(sim.frame, 25);
        assert_eq!(sim.network.len(), 8);
        let csv = std::fs::read_to_string(&metrics).unwrap();
        assert_eq!(csv.lines().count(), 26);
        let exported = export::from_json(&std::fs::read_to_string(&params).unwrap()).unwrap();
        assert_eq!(exported.mass_a, 12.5);
        let snap: crate::engine::Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
        assert_eq!(snap, sim.snapshot());
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let args = Args::parse_from(["gw-vivarium", "--config", "/nonexistent/vivarium.json"]);
        assert!(args.load_state().is_err());
    }
}
