//! Offered-load sweeps.
//!
//! A sweep runs one complete, independent simulation per injection rate.
//! With the `parallel` feature the points run on the rayon pool; each point
//! builds its own engine and random stream from the shared configuration, so
//! the results do not depend on which path executed them.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::TrafficConfig;
use crate::engine::{SimError, Simulator};
use crate::report::SimulationReport;

/// Result of one sweep point.
#[derive(Clone, Debug, Serialize)]
pub struct SweepPoint {
    /// Injection rate applied to every class
    pub rate: f64,
    pub report: SimulationReport,
}

/// Simulates `config` once per entry of `rates`.
///
/// Each rate replaces the injection rate of every class. Points are returned
/// in the order of `rates`; the first failing point aborts the sweep.
pub fn run_load_sweep(config: &TrafficConfig, rates: &[f64]) -> Result<Vec<SweepPoint>, SimError> {
    #[cfg(feature = "parallel")]
    let points = rates.par_iter().map(|&rate| run_point(config, rate)).collect();

    #[cfg(not(feature = "parallel"))]
    let points = rates.iter().map(|&rate| run_point(config, rate)).collect();

    points
}

fn run_point(config: &TrafficConfig, rate: f64) -> Result<SweepPoint, SimError> {
    let mut config = config.clone();
    config.traffic.injection_rate = vec![rate];
    config.validate()?;

    let mut sim = Simulator::from_config(&config)?;
    sim.run()?;
    info!(rate, time = sim.time(), "sweep point complete");

    Ok(SweepPoint {
        rate,
        report: SimulationReport::from_engine(sim.engine()),
    })
}
