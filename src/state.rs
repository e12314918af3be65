use crate::error::{Result, VivariumError};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the neighbour graph is generated on rebuild.
pub const MIN_NODE_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Each node samples a random, distinct set of peers.
    Random,
    /// Peers are the node's Delaunay neighbours in the plane.
    Delaunay,
}

/// Whose coupling coefficient weights a neighbour's pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingSource {
    /// The receiving node's own coefficient.
    Own,
    /// The neighbour's coefficient (legacy animation behaviour).
    Neighbor,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimState {
    // Topology
    pub node_count: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub topology: Topology,
    pub seed: u64,

    // Oscillators
    pub coupling: f32,
    pub coupling_source: CouplingSource,
    pub frequency_scale: f32,
    pub dt: f32,

    // Background field
    pub grid_size: usize,
    pub diffusion: f32,
    pub decay: f32,

    // View
    pub rotation_speed: f32,
    pub paused: bool,

    #[serde(skip)]
    pub rebuild_requested: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            node_count: 40,
            min_degree: 2,
            max_degree: 6,
            topology: Topology::Random,
            seed: 42,
            coupling: 0.25,
            coupling_source: CouplingSource::Own,
            frequency_scale: 1.0,
            dt: 0.02,
            grid_size: 64,
            diffusion: 0.08,
            decay: 0.005,
            rotation_speed: 0.3,
            paused: false,
            rebuild_requested: true,
        }
    }
}

/// The per-tick slice of [`SimState`] handed to the update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    pub dt: f32,
    pub coupling: f32,
    pub coupling_source: CouplingSource,
    pub frequency_scale: f32,
    pub diffusion: f32,
    pub decay: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        SimState::default().step_config()
    }
}

impl SimState {
    pub fn step_config(&self) -> StepConfig {
        StepConfig {
            dt: self.dt,
            coupling: self.coupling,
            coupling_source: self.coupling_source,
            frequency_scale: self.frequency_scale,
            diffusion: self.diffusion,
            decay: self.decay,
        }
    }

    /// Parses a (possibly partial) JSON override on top of the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut state: SimState = serde_json::from_str(json)?;
        state.rebuild_requested = true;
        state.validate()?;
        Ok(state)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_count < MIN_NODE_COUNT {
            return Err(VivariumError::invalid_config(format!(
                "node_count must be at least {MIN_NODE_COUNT}, got {}",
                self.node_count
            )));
        }
        if self.min_degree > self.max_degree {
            return Err(VivariumError::invalid_config(format!(
                "min_degree ({}) exceeds max_degree ({})",
                self.min_degree, self.max_degree
            )));
        }
        if self.dt.is_nan() || self.dt <= 0.0 {
            return Err(VivariumError::invalid_config(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        Ok(())
    }
}
