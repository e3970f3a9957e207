//! Network collaborator.
//!
//! The traffic engine never routes flits itself; it pushes them into a
//! [`Network`] at their source and takes them out at their destination.
//! [`DelayNetwork`] is a fixed-latency stand-in fabric: each source owns an
//! injection [`Buffer`], one flit per source per cycle leaves that buffer and
//! is delivered `latency` cycles later.

use std::collections::VecDeque;

use crate::buffer::Buffer;
use crate::config::NetworkParams;
use crate::flit::Flit;
use crate::types::{NodeIndex, SimTime, VcIndex};

/// The interface the traffic engine drives every cycle.
pub trait Network {
    /// Number of terminal nodes.
    fn nodes(&self) -> usize;

    /// Number of virtual channels at each injection port.
    fn num_vcs(&self) -> usize;

    /// Offers `flit` to the injection port of `source` on lane `vc`.
    ///
    /// A full lane hands the flit back; the caller retries on a later cycle.
    fn try_inject(&mut self, source: NodeIndex, vc: VcIndex, flit: Flit) -> Result<(), Flit>;

    /// Moves flits forward by one cycle.
    fn advance(&mut self, time: SimTime);

    /// Removes every flit that has reached its destination by `time`.
    ///
    /// Flits are returned with the node they arrived at, in arrival order.
    fn eject(&mut self, time: SimTime) -> Vec<(NodeIndex, Flit)>;

    /// Number of flits held anywhere in the network.
    fn in_flight(&self) -> usize;

    /// Drops every held flit.
    fn reset(&mut self);
}

/// A network with a fixed source-to-destination latency.
#[derive(Debug)]
pub struct DelayNetwork {
    latency: SimTime,
    ports: Vec<Buffer>,
    next_vc: Vec<VcIndex>,
    in_transit: VecDeque<(SimTime, Flit)>,
}

impl DelayNetwork {
    /// Creates a network of `nodes` injection ports, each with `num_vcs`
    /// lanes of `vc_buf_size` flits.
    pub fn new(nodes: usize, num_vcs: usize, vc_buf_size: usize, latency: SimTime) -> Self {
        assert!(latency > 0, "network latency must be at least one cycle");
        let ports = (0..nodes)
            .map(|n| Buffer::new(format!("inject_{}", n), num_vcs, vc_buf_size))
            .collect();
        Self {
            latency,
            ports,
            next_vc: vec![0; nodes],
            in_transit: VecDeque::new(),
        }
    }

    /// Creates a network from configuration.
    pub fn from_params(params: &NetworkParams) -> Self {
        Self::new(params.nodes, params.num_vcs, params.vc_buf_size, params.latency)
    }

    /// Source-to-destination latency.
    pub fn latency(&self) -> SimTime {
        self.latency
    }

    /// Injection buffer of `source`.
    pub fn port(&self, source: NodeIndex) -> &Buffer {
        &self.ports[source]
    }
}

impl Network for DelayNetwork {
    fn nodes(&self) -> usize {
        self.ports.len()
    }

    fn num_vcs(&self) -> usize {
        self.ports.first().map(Buffer::num_vcs).unwrap_or(0)
    }

    fn try_inject(&mut self, source: NodeIndex, vc: VcIndex, flit: Flit) -> Result<(), Flit> {
        self.ports[source].add_flit(vc, flit)
    }

    fn advance(&mut self, time: SimTime) {
        for (source, port) in self.ports.iter_mut().enumerate() {
            let num_vcs = port.num_vcs();
            let start = self.next_vc[source];
            // Round-robin over lanes, one flit per port per cycle
            let ready = (0..num_vcs)
                .map(|offset| (start + offset) % num_vcs)
                .find(|&vc| !port.is_empty(vc));
            if let Some(vc) = ready {
                if let Some(flit) = port.remove_flit(vc) {
                    self.in_transit.push_back((time + self.latency, flit));
                }
                self.next_vc[source] = (vc + 1) % num_vcs;
            }
        }
    }

    fn eject(&mut self, time: SimTime) -> Vec<(NodeIndex, Flit)> {
        let mut arrived = Vec::new();
        while self
            .in_transit
            .front()
            .map_or(false, |(due, _)| *due <= time)
        {
            if let Some((_, flit)) = self.in_transit.pop_front() {
                arrived.push((flit.dest, flit));
            }
        }
        arrived
    }

    fn in_flight(&self) -> usize {
        self.in_transit.len() + self.ports.iter().map(Buffer::total_occupancy).sum::<usize>()
    }

    fn reset(&mut self) {
        self.ports.iter_mut().for_each(Buffer::clear);
        self.next_vc.iter_mut().for_each(|v| *v = 0);
        self.in_transit.clear();
    }
}
