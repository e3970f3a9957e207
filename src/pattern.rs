//! Traffic patterns.
//!
//! A traffic pattern picks the destination of each new packet. Patterns are
//! built per class by name through the [`PatternRegistry`](crate::registry::PatternRegistry)
//! and reset at the start of every simulation trial.

use crate::random::{RandomSource, SimRng};
use crate::types::NodeIndex;

/// Destination selection for one traffic class.
pub trait TrafficPattern: Send {
    /// Returns the destination of a packet issued by `source`.
    fn dest(&mut self, source: NodeIndex, rng: &mut dyn RandomSource) -> NodeIndex;

    /// Restores the pattern's initial state.
    fn reset(&mut self) {}

    /// Name the pattern was registered under.
    fn name(&self) -> &str;
}

/// Every node, including the source, with equal probability.
#[derive(Clone, Debug)]
pub struct UniformPattern {
    nodes: usize,
}

impl UniformPattern {
    pub fn new(nodes: usize) -> Self {
        Self { nodes }
    }
}

impl TrafficPattern for UniformPattern {
    fn dest(&mut self, _source: NodeIndex, rng: &mut dyn RandomSource) -> NodeIndex {
        rng.random_int(self.nodes as u64 - 1) as NodeIndex
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

/// The next node in index order.
#[derive(Clone, Debug)]
pub struct NeighborPattern {
    nodes: usize,
}

impl NeighborPattern {
    pub fn new(nodes: usize) -> Self {
        Self { nodes }
    }
}

impl TrafficPattern for NeighborPattern {
    fn dest(&mut self, source: NodeIndex, _rng: &mut dyn RandomSource) -> NodeIndex {
        (source + 1) % self.nodes
    }

    fn name(&self) -> &str {
        "neighbor"
    }
}

/// The node just short of halfway around the ring.
#[derive(Clone, Debug)]
pub struct TornadoPattern {
    nodes: usize,
}

impl TornadoPattern {
    pub fn new(nodes: usize) -> Self {
        Self { nodes }
    }
}

impl TrafficPattern for TornadoPattern {
    fn dest(&mut self, source: NodeIndex, _rng: &mut dyn RandomSource) -> NodeIndex {
        (source + (self.nodes + 1) / 2 - 1) % self.nodes
    }

    fn name(&self) -> &str {
        "tornado"
    }
}

/// The node whose index is the bitwise complement of the source.
///
/// Requires a power-of-two node count.
#[derive(Clone, Debug)]
pub struct BitComplementPattern {
    mask: usize,
}

impl BitComplementPattern {
    /// Returns `None` unless `nodes` is a power of two.
    pub fn new(nodes: usize) -> Option<Self> {
        nodes.is_power_of_two().then(|| Self { mask: nodes - 1 })
    }
}

impl TrafficPattern for BitComplementPattern {
    fn dest(&mut self, source: NodeIndex, _rng: &mut dyn RandomSource) -> NodeIndex {
        !source & self.mask
    }

    fn name(&self) -> &str {
        "bitcomp"
    }
}

/// A fixed random permutation drawn from its own seed.
///
/// Resetting redraws the permutation from the same seed, so every trial
/// sees the same mapping.
#[derive(Clone, Debug)]
pub struct RandomPermutationPattern {
    seed: u64,
    dest: Vec<NodeIndex>,
}

impl RandomPermutationPattern {
    pub fn new(nodes: usize, seed: u64) -> Self {
        let mut pattern = Self {
            seed,
            dest: (0..nodes).collect(),
        };
        pattern.shuffle();
        pattern
    }

    fn shuffle(&mut self) {
        let mut rng = SimRng::new(self.seed);
        let n = self.dest.len();
        self.dest.iter_mut().enumerate().for_each(|(i, d)| *d = i);
        for i in (1..n).rev() {
            let j = rng.random_int(i as u64) as usize;
            self.dest.swap(i, j);
        }
    }
}

impl TrafficPattern for RandomPermutationPattern {
    fn dest(&mut self, source: NodeIndex, _rng: &mut dyn RandomSource) -> NodeIndex {
        self.dest[source]
    }

    fn reset(&mut self) {
        self.shuffle();
    }

    fn name(&self) -> &str {
        "randperm"
    }
}
