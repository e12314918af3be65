use crate::field::DiffusionField;
use crate::metrics::{MetricSample, MetricsLog};
use crate::oscillator::OscillatorNetwork;
use crate::error::Result;
use crate::state::{SimState, StepConfig};
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Frozen copy of the world, exported as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f32,
    pub node_count: usize,
    pub positions: Vec<[f32; 2]>,
    pub node_amplitude: Vec<f32>,
    pub node_phase: Vec<f32>,
    pub field_width: usize,
    pub field_height: usize,
    /// Row-major, scaled so the densest cell is 1.
    pub field: Vec<f32>,
}

impl Snapshot {
    pub fn file_name(&self) -> String {
        format!("snapshot_t{:.3}.json", self.time)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything the frame driver advances: oscillators, background field,
/// clock and the metrics history.
#[derive(Resource, Debug, Clone, Default)]
pub struct Simulation {
    pub network: OscillatorNetwork,
    pub field: DiffusionField,
    pub time: f32,
    pub frame: u64,
    pub metrics: MetricsLog,
}

impl Simulation {
    /// Fresh, seeded world. Same state in, same world out.
    pub fn from_state(state: &SimState) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(state.seed);
        let network = OscillatorNetwork::generate(state, &mut rng);
        let field = DiffusionField::random(state.grid_size, state.grid_size, &mut rng);

        tracing::info!(
            nodes = network.len(),
            edges = network.graph().edge_count(),
            grid = state.grid_size,
            seed = state.seed,
            "built simulation"
        );

        Self {
            network,
            field,
            time: 0.0,
            frame: 0,
            metrics: MetricsLog::default(),
        }
    }

    /// One frame: oscillators, then the field, then bookkeeping.
    pub fn tick(&mut self, cfg: &StepConfig) -> MetricSample {
        self.network.step(cfg);
        self.field.step(cfg.diffusion, cfg.decay);
        self.time += cfg.dt;
        self.frame += 1;

        let sample = MetricSample {
            t: self.time,
            mean_amplitude: self.network.mean_amplitude(),
            order_parameter: self.network.order_parameter(),
            energy_variance: self.network.energy_variance(),
            field_mean: self.field.mean(),
        };
        self.metrics.push(sample);
        sample
    }

    pub fn run(&mut self, cfg: &StepConfig, steps: u64) -> Option<MetricSample> {
        (0..steps).map(|_| self.tick(cfg)).last()
    }

    pub fn snapshot(&self) -> Snapshot {
        let nodes = self.network.nodes();
        let peak = self.field.cells().iter().copied().fold(0.0f32, f32::max);
        let scale = if peak > 0.0 { 1.0 / peak } else { 1.0 };

        Snapshot {
            time: self.time,
            node_count: nodes.len(),
            positions: self.network.positions().iter().map(|p| [p.x, p.y]).collect(),
            node_amplitude: nodes.iter().map(|n| n.amplitude).collect(),
            node_phase: nodes.iter().map(|n| n.phase).collect(),
            field_width: self.field.width(),
            field_height: self.field.height(),
            field: self.field.cells().iter().map(|v| v * scale).collect(),
        }
    }
}

// --- Systems ---

pub fn simulation_tick_system(mut sim: ResMut<Simulation>, state: Res<SimState>) {
    if state.paused || state.rebuild_requested {
        return;
    }
    let cfg = state.step_config();
    sim.tick(&cfg);
}
