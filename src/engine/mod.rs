//! Traffic engines and the simulation driver.
//!
//! A traffic engine decides what enters the network and what happens when
//! packets leave it. Every engine holds a [`TrafficCore`] and exposes it
//! through the [`TrafficEngine`] trait; the phase hooks default to the core's
//! behaviour and engines override them to call through first and then add
//! their own bookkeeping.
//!
//! [`Simulator`] pairs an engine with a [`Network`] and runs trials:
//!
//! ```text
//! reset -> warm-up -> clear stats -> running -> draining -> overall stats
//! ```
//!
//! Within each cycle the order is fixed: arrivals are retired, the engine
//! generates new packets, waiting flits are offered to the network, the
//! network advances and the clock ticks.

pub mod base;
pub mod synthetic;

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationParams, TrafficConfig};
use crate::flit::Flit;
use crate::network::{DelayNetwork, Network};
use crate::types::{ClassId, NodeIndex, SimTime};

pub use self::base::{LatencySummary, SimState, ThroughputSummary, TrafficCore};
pub use self::synthetic::SyntheticTrafficEngine;

/// Errors that can end a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Draining started at cycle {drain_time} did not finish within {elapsed} cycles")]
    DrainTimeout { drain_time: SimTime, elapsed: SimTime },
}

/// Phase hooks of a traffic engine.
///
/// Only `core`, `core_mut`, `inject` and `retire_packet` are required.
/// Overriding implementations of the remaining hooks call the core's
/// version before adding their own behaviour.
pub trait TrafficEngine {
    fn core(&self) -> &TrafficCore;

    fn core_mut(&mut self) -> &mut TrafficCore;

    /// Generates this cycle's new packets.
    fn inject(&mut self);

    /// Handles a packet whose tail flit arrived at `dest`.
    fn retire_packet(&mut self, head: &Flit, tail: &Flit, dest: NodeIndex);

    /// Restores the start-of-trial state.
    fn reset_phase(&mut self) {
        self.core_mut().reset_phase();
    }

    /// Starts a new measurement window.
    fn clear_stats(&mut self) {
        self.core_mut().clear_stats();
    }

    /// Returns true while the draining phase must continue.
    fn packets_outstanding(&self) -> bool {
        self.core().packets_outstanding()
    }

    /// Folds the finished trial into the overall results.
    fn update_overall_stats(&mut self) {
        self.core_mut().update_overall_stats();
    }

    /// CSV header of the overall results.
    fn report_header(&self) -> String {
        self.core().overall_stats_header_csv()
    }

    /// CSV row of the overall results of class `cl`.
    fn report_row(&self, cl: ClassId) -> String {
        self.core().overall_class_stats_csv(cl)
    }

    /// Writes the current window of class `cl` for offline analysis.
    fn write_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        self.core().write_class_stats(cl, out)
    }

    /// Writes the human-readable overall summary of class `cl`.
    fn display_overall_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        self.core().display_overall_class_stats(cl, out)
    }
}

/// Drives a traffic engine and a network through simulation trials.
#[derive(Debug)]
pub struct Simulator<E, N> {
    engine: E,
    network: N,
    params: SimulationParams,
}

impl Simulator<SyntheticTrafficEngine, DelayNetwork> {
    /// Builds a synthetic workload on a fixed-latency network.
    pub fn from_config(config: &TrafficConfig) -> Result<Self, SimError> {
        let engine = SyntheticTrafficEngine::new(config)?;
        let network = DelayNetwork::from_params(&config.network);
        Ok(Self::new(engine, network, config.simulation.clone()))
    }
}

impl<E: TrafficEngine, N: Network> Simulator<E, N> {
    /// Pairs `engine` with `network`.
    ///
    /// # Panics
    /// Panics if the two disagree on the number of nodes.
    pub fn new(engine: E, network: N, params: SimulationParams) -> Self {
        assert_eq!(
            engine.core().nodes(),
            network.nodes(),
            "engine and network disagree on the node count"
        );
        Self {
            engine,
            network,
            params,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Current cycle.
    pub fn time(&self) -> SimTime {
        self.engine.core().time()
    }

    /// Releases the engine and the network.
    pub fn into_parts(self) -> (E, N) {
        (self.engine, self.network)
    }

    /// Simulates one cycle.
    pub fn step(&mut self) {
        let time = self.engine.core().time();

        for (dest, mut flit) in self.network.eject(time) {
            flit.atime = time;
            if let Some((head, tail)) = self.engine.core_mut().retire_flit(flit, dest) {
                self.engine.retire_packet(&head, &tail, dest);
            }
        }

        self.engine.inject();
        self.engine.core_mut().inject_flits(&mut self.network);
        self.network.advance(time);
        self.engine.core_mut().advance_time();
    }

    /// Simulates `cycles` cycles.
    pub fn run_cycles(&mut self, cycles: SimTime) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Runs one trial and folds its results into the overall statistics.
    pub fn run_trial(&mut self) -> Result<(), SimError> {
        self.engine.reset_phase();
        self.network.reset();

        let period = self.params.sample_period;
        debug!(cycles = self.params.warmup_periods * period, "warming up");
        self.run_cycles(self.params.warmup_periods * period);
        self.engine.clear_stats();

        self.engine.core_mut().set_sim_state(SimState::Running);
        debug!(time = self.time(), cycles = self.params.max_samples * period, "measuring");
        self.run_cycles(self.params.max_samples * period);

        self.engine.core_mut().set_sim_state(SimState::Draining);
        let drain_time = self.engine.core().drain_time();
        debug!(time = drain_time, "draining");
        while self.engine.packets_outstanding() {
            let elapsed = self.time() - drain_time;
            if elapsed >= self.params.drain_timeout {
                return Err(SimError::DrainTimeout {
                    drain_time,
                    elapsed,
                });
            }
            self.step();
        }

        self.engine.update_overall_stats();
        Ok(())
    }

    /// Runs every configured trial.
    pub fn run(&mut self) -> Result<(), SimError> {
        for trial in 0..self.params.sim_count {
            info!(trial, of = self.params.sim_count, "starting trial");
            self.run_trial()?;
            info!(trial, time = self.time(), "trial complete");
        }
        Ok(())
    }
}
