use crate::state::{CouplingSource, SimState, StepConfig, Topology};
use bevy::math::Vec2;
use rand::Rng;
use rand::seq::index;
use std::collections::BTreeSet;
use std::f32::consts::TAU;
use voronator::delaunator::{self, Point};

pub const DOMAIN_SIZE: f32 = 20.0;

const MIN_SCALE: f32 = 0.4;
const SCALE_RANGE: f32 = 1.2;

// --- Nodes ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorNode {
    pub phase: f32,             // rad, kept in [0, 2π)
    pub natural_frequency: f32, // rad/s
    pub amplitude: f32,
    pub coupling_gain: f32,
}

impl OscillatorNode {
    pub fn new(phase: f32, natural_frequency: f32, amplitude: f32) -> Self {
        Self {
            phase: wrap_phase(phase),
            natural_frequency,
            amplitude,
            coupling_gain: 1.0,
        }
    }

    pub fn with_gain(mut self, coupling_gain: f32) -> Self {
        self.coupling_gain = coupling_gain;
        self
    }

    /// Instantaneous displacement `a · cos φ`.
    pub fn displacement(&self) -> f32 {
        self.amplitude * self.phase.cos()
    }

    pub fn visual(&self) -> NodeVisual {
        let intensity = self.amplitude * (0.5 + 0.5 * self.phase.sin());
        NodeVisual {
            scale: MIN_SCALE + SCALE_RANGE * intensity,
            hue: self.phase / TAU * 360.0,
            intensity,
        }
    }
}

/// Render attributes derived from a node's current phase. Recomputed every
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVisual {
    pub scale: f32,
    /// Degrees in [0, 360).
    pub hue: f32,
    pub intensity: f32,
}

pub fn wrap_phase(phase: f32) -> f32 {
    phase.rem_euclid(TAU)
}

// --- Topology ---

/// Directed influence graph: `neighbors(i)` are the nodes pulling on `i`.
///
/// Lists never contain `i` itself and never repeat an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborGraph {
    adjacency: Vec<Vec<usize>>,
}

impl NeighborGraph {
    /// Builds a graph from explicit lists, dropping self-loops and repeats.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Self {
        let adjacency = adjacency
            .into_iter()
            .enumerate()
            .map(|(i, list)| {
                let set: BTreeSet<usize> = list.into_iter().filter(|&j| j != i).collect();
                set.into_iter().collect()
            })
            .collect();
        Self { adjacency }
    }

    /// Each node draws a degree in `[min_degree, max_degree]` (capped at
    /// `n - 1`) and samples that many distinct peers other than itself.
    pub fn random<R: Rng + ?Sized>(
        node_count: usize,
        min_degree: usize,
        max_degree: usize,
        rng: &mut R,
    ) -> Self {
        if node_count < 2 {
            return Self {
                adjacency: vec![Vec::new(); node_count],
            };
        }

        let others = node_count - 1;
        let lo = min_degree.min(others);
        let hi = max_degree.min(others).max(lo);

        let adjacency = (0..node_count)
            .map(|i| {
                let degree = rng.gen_range(lo..=hi);
                // Sample from the n-1 slots that skip `i`, then shift past it.
                let mut picks: Vec<usize> = index::sample(&mut *rng, others, degree)
                    .into_iter()
                    .map(|j| if j >= i { j + 1 } else { j })
                    .collect();
                picks.sort_unstable();
                picks
            })
            .collect();

        Self { adjacency }
    }

    /// Symmetric graph from the Delaunay triangulation of the node sites.
    /// Degenerate site sets (fewer than three, or collinear) give no edges.
    pub fn delaunay(positions: &[Vec2]) -> Self {
        let points: Vec<Point> = positions
            .iter()
            .map(|p| Point {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect();

        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); positions.len()];

        if let Some(triangulation) = delaunator::triangulate(&points) {
            for tri in triangulation.triangles.chunks_exact(3) {
                for &u in tri {
                    for &v in tri {
                        if u != v {
                            adjacency[u].insert(v);
                        }
                    }
                }
            }
        }

        Self {
            adjacency: adjacency
                .into_iter()
                .map(|set| set.into_iter().collect())
                .collect(),
        }
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Directed edges as `(target, source)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, list)| list.iter().map(move |&j| (i, j)))
    }
}

// --- Network ---

#[derive(Debug, Clone, Default)]
pub struct OscillatorNetwork {
    nodes: Vec<OscillatorNode>,
    positions: Vec<Vec2>,
    graph: NeighborGraph,
    next_phases: Vec<f32>,
}

impl OscillatorNetwork {
    pub fn new(nodes: Vec<OscillatorNode>, positions: Vec<Vec2>, graph: NeighborGraph) -> Self {
        debug_assert_eq!(nodes.len(), positions.len());
        debug_assert_eq!(nodes.len(), graph.len());
        Self {
            next_phases: Vec::with_capacity(nodes.len()),
            nodes,
            positions,
            graph,
        }
    }

    /// Random phases, frequencies and placement; topology per `state`.
    /// Every node gets unit gain, so all pulls use the shared `K`.
    pub fn generate<R: Rng + ?Sized>(state: &SimState, rng: &mut R) -> Self {
        let half = DOMAIN_SIZE / 2.0 * 0.9;

        let positions: Vec<Vec2> = (0..state.node_count)
            .map(|_| Vec2::new(rng.gen_range(-half..half), rng.gen_range(-half..half)))
            .collect();

        let nodes: Vec<OscillatorNode> = (0..state.node_count)
            .map(|_| {
                OscillatorNode::new(
                    rng.gen_range(0.0..TAU),
                    rng.gen_range(0.2..2.0) * TAU,
                    rng.gen_range(0.3..1.0),
                )
            })
            .collect();

        let graph = match state.topology {
            Topology::Random => {
                NeighborGraph::random(state.node_count, state.min_degree, state.max_degree, rng)
            }
            Topology::Delaunay => NeighborGraph::delaunay(&positions),
        };

        Self::new(nodes, positions, graph)
    }

    pub fn nodes(&self) -> &[OscillatorNode] {
        &self.nodes
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `dφ_i/dt = ω_i·s + Σ_j K_c·sin(φ_j − φ_i)` evaluated on current phases.
    pub fn phase_velocity(&self, index: usize, cfg: &StepConfig) -> f32 {
        let me = &self.nodes[index];
        let mut pull = 0.0;

        for &j in self.graph.neighbors(index) {
            if let Some(neighbor) = self.nodes.get(j) {
                let gain = match cfg.coupling_source {
                    CouplingSource::Own => me.coupling_gain,
                    CouplingSource::Neighbor => neighbor.coupling_gain,
                };
                pull += cfg.coupling * gain * (neighbor.phase - me.phase).sin();
            }
        }

        me.natural_frequency * cfg.frequency_scale + pull
    }

    /// One explicit Euler step. Every velocity is evaluated against the
    /// phases from before the step.
    pub fn step(&mut self, cfg: &StepConfig) {
        let mut next = std::mem::take(&mut self.next_phases);
        next.clear();
        next.extend(
            (0..self.nodes.len())
                .map(|i| wrap_phase(self.nodes[i].phase + cfg.dt * self.phase_velocity(i, cfg))),
        );

        for (node, &phase) in self.nodes.iter_mut().zip(&next) {
            node.phase = phase;
        }
        self.next_phases = next;
    }

    /// Nudges one node's phase, e.g. when it is clicked.
    pub fn kick(&mut self, index: usize, delta: f32) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.phase = wrap_phase(node.phase + delta);
        }
    }

    pub fn visual(&self, index: usize) -> Option<NodeVisual> {
        self.nodes.get(index).map(OscillatorNode::visual)
    }

    /// Kuramoto order parameter `R = |⟨e^{iφ}⟩|`.
    pub fn order_parameter(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let n = self.nodes.len() as f32;
        let (sin_sum, cos_sum) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(s, c), node| (s + node.phase.sin(), c + node.phase.cos()));
        ((sin_sum / n).powi(2) + (cos_sum / n).powi(2))
            .sqrt()
            .clamp(0.0, 1.0)
    }

    pub fn mean_amplitude(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.nodes.iter().map(|n| n.displacement().abs()).sum::<f32>() / self.nodes.len() as f32
    }

    /// Population variance of the node displacements.
    pub fn energy_variance(&self) -> f32 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let n = self.nodes.len() as f32;
        let mean = self.nodes.iter().map(OscillatorNode::displacement).sum::<f32>() / n;
        self.nodes
            .iter()
            .map(|node| (node.displacement() - mean).powi(2))
            .sum::<f32>()
            / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn pair(gain_a: f32, gain_b: f32) -> OscillatorNetwork {
        OscillatorNetwork::new(
            vec![
                OscillatorNode::new(0.0, 0.0, 1.0).with_gain(gain_a),
                OscillatorNode::new(FRAC_PI_2, 0.0, 1.0).with_gain(gain_b),
            ],
            vec![Vec2::ZERO, Vec2::X],
            NeighborGraph::from_adjacency(vec![vec![1], vec![0]]),
        )
    }

    fn cfg(coupling: f32, source: CouplingSource) -> StepConfig {
        StepConfig {
            dt: 0.1,
            coupling,
            coupling_source: source,
            frequency_scale: 1.0,
            diffusion: 0.0,
            decay: 0.0,
        }
    }

    #[test]
    fn test_uncoupled_nodes_advance_at_natural_frequency() {
        let mut net = OscillatorNetwork::new(
            vec![OscillatorNode::new(1.0, 2.0, 1.0), OscillatorNode::new(0.5, 3.0, 1.0)],
            vec![Vec2::ZERO, Vec2::X],
            NeighborGraph::from_adjacency(vec![vec![1], vec![0]]),
        );
        let mut c = cfg(0.0, CouplingSource::Own);
        c.frequency_scale = 0.5;
        net.step(&c);

        assert_relative_eq!(net.nodes()[0].phase, 1.0 + 0.1 * 2.0 * 0.5, epsilon = 1e-6);
        assert_relative_eq!(net.nodes()[1].phase, 0.5 + 0.1 * 3.0 * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_own_versus_neighbor_coefficient() {
        let mut own = pair(1.0, 3.0);
        own.step(&cfg(1.0, CouplingSource::Own));
        // sin(π/2 − 0) = 1, own gain 1.
        assert_relative_eq!(own.nodes()[0].phase, 0.1, epsilon = 1e-6);

        let mut legacy = pair(1.0, 3.0);
        legacy.step(&cfg(1.0, CouplingSource::Neighbor));
        // Neighbour's gain 3 is used instead.
        assert_relative_eq!(legacy.nodes()[0].phase, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_generated_network_uses_shared_coupling() {
        let state = SimState {
            node_count: 16,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let net = OscillatorNetwork::generate(&state, &mut rng);
        assert!(net.nodes().iter().all(|n| n.coupling_gain == 1.0));

        let before: Vec<f32> = net.nodes().iter().map(|n| n.phase).collect();
        let expected: Vec<f32> = (0..net.len())
            .map(|i| {
                let pull: f32 = net
                    .graph()
                    .neighbors(i)
                    .iter()
                    .map(|&j| (before[j] - before[i]).sin())
                    .sum();
                wrap_phase(before[i] + 0.1 * 1.0 * pull)
            })
            .collect();

        for source in [CouplingSource::Own, CouplingSource::Neighbor] {
            let mut stepped = net.clone();
            let mut c = cfg(1.0, source);
            c.frequency_scale = 0.0;
            stepped.step(&c);
            for (node, &want) in stepped.nodes().iter().zip(&expected) {
                let diff = (node.phase - want).abs();
                assert!(diff.min(TAU - diff) < 1e-5, "{} vs {}", node.phase, want);
            }
        }
    }

    #[test]
    fn test_step_reads_previous_phases() {
        let mut net = pair(1.0, 1.0);
        net.step(&cfg(1.0, CouplingSource::Own));
        // Node 1 sees node 0 at its old phase 0: sin(0 − π/2) = −1.
        assert_relative_eq!(net.nodes()[1].phase, FRAC_PI_2 - 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_phases_stay_wrapped() {
        let mut net = OscillatorNetwork::new(
            vec![OscillatorNode::new(TAU - 0.01, 10.0, 1.0)],
            vec![Vec2::ZERO],
            NeighborGraph::from_adjacency(vec![vec![]]),
        );
        net.step(&cfg(0.0, CouplingSource::Own));
        let phase = net.nodes()[0].phase;
        assert!((0.0..TAU).contains(&phase));
        assert_relative_eq!(phase, 0.99, epsilon = 1e-4);
    }

    #[test]
    fn test_order_parameter_extremes() {
        let synced = OscillatorNetwork::new(
            vec![OscillatorNode::new(0.7, 1.0, 1.0); 5],
            vec![Vec2::ZERO; 5],
            NeighborGraph::from_adjacency(vec![vec![]; 5]),
        );
        assert_relative_eq!(synced.order_parameter(), 1.0, epsilon = 1e-5);

        let opposed = OscillatorNetwork::new(
            vec![OscillatorNode::new(0.0, 1.0, 1.0), OscillatorNode::new(PI, 1.0, 1.0)],
            vec![Vec2::ZERO; 2],
            NeighborGraph::from_adjacency(vec![vec![], vec![]]),
        );
        assert!(opposed.order_parameter() < 1e-5);
    }

    #[test]
    fn test_strong_coupling_synchronises() {
        let state = SimState {
            node_count: 12,
            min_degree: 11,
            max_degree: 11,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut net = OscillatorNetwork::generate(&state, &mut rng);
        let c = StepConfig {
            dt: 0.01,
            coupling: 5.0,
            frequency_scale: 0.0,
            ..cfg(0.0, CouplingSource::Own)
        };
        for _ in 0..2000 {
            net.step(&c);
        }
        assert!(net.order_parameter() > 0.95);
    }

    #[test]
    fn test_random_graph_is_injective_and_self_free() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let graph = NeighborGraph::random(50, 2, 6, &mut rng);
        assert_eq!(graph.len(), 50);
        for i in 0..50 {
            let list = graph.neighbors(i);
            assert!((2..=6).contains(&list.len()));
            assert!(!list.contains(&i));
            let unique: BTreeSet<_> = list.iter().collect();
            assert_eq!(unique.len(), list.len());
            assert!(list.iter().all(|&j| j < 50));
        }
    }

    #[test]
    fn test_random_graph_caps_degree_at_population() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let graph = NeighborGraph::random(2, 4, 6, &mut rng);
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0]);
    }

    #[test]
    fn test_delaunay_graph_is_symmetric() {
        let sites = vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(0.1, 0.05),
        ];
        let graph = NeighborGraph::delaunay(&sites);
        assert_eq!(graph.neighbors(4).len(), 4);
        for (i, j) in graph.edges() {
            assert_ne!(i, j);
            assert!(graph.neighbors(j).contains(&i));
        }
    }

    #[test]
    fn test_from_adjacency_drops_self_and_repeats() {
        let graph = NeighborGraph::from_adjacency(vec![vec![0, 1, 1], vec![1]]);
        assert_eq!(graph.neighbors(0), &[1]);
        assert!(graph.neighbors(1).is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_visual_follows_phase() {
        let node = OscillatorNode::new(FRAC_PI_2, 1.0, 1.0);
        let visual = node.visual();
        assert_relative_eq!(visual.scale, MIN_SCALE + SCALE_RANGE, epsilon = 1e-6);
        assert_relative_eq!(visual.hue, 90.0, epsilon = 1e-4);
    }

    proptest! {
        #[test]
        fn prop_step_is_deterministic(
            seed in any::<u64>(),
            coupling in 0.0f32..2.0,
            dt in 0.001f32..0.1,
            neighbor_source in any::<bool>(),
        ) {
            let state = SimState { node_count: 16, ..Default::default() };
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let network = OscillatorNetwork::generate(&state, &mut rng);
            let source = if neighbor_source { CouplingSource::Neighbor } else { CouplingSource::Own };
            let c = StepConfig { dt, ..cfg(coupling, source) };

            let mut a = network.clone();
            let mut b = network;
            a.step(&c);
            b.step(&c);

            prop_assert_eq!(a.nodes(), b.nodes());
        }
    }
}
