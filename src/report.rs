//! Result reporting.
//!
//! Three text surfaces are produced from any [`TrafficEngine`]:
//!
//! - an overall CSV table, one row per class, averaged over trials
//! - per-class MATLAB assignments for the last measurement window,
//!   including the `pair_tlat(c,:)` matrix of the synthetic engine
//! - a human-readable summary of trial-averaged latencies and rates
//!
//! [`SimulationReport`] captures the same overall numbers of a synthetic
//! run as a serde value for JSON export.

use std::io::{self, Write};

use serde::Serialize;

use crate::engine::{LatencySummary, SyntheticTrafficEngine, ThroughputSummary, TrafficEngine};
use crate::types::ClassId;

/// Writes the CSV header and one row per class.
pub fn write_overall_csv(engine: &dyn TrafficEngine, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", engine.report_header())?;
    for c in 0..engine.core().classes() {
        writeln!(out, "{}", engine.report_row(c))?;
    }
    Ok(())
}

/// Writes the per-class assignments of every class.
pub fn write_class_stats(engine: &dyn TrafficEngine, out: &mut dyn Write) -> io::Result<()> {
    for c in 0..engine.core().classes() {
        engine.write_class_stats(c, out)?;
    }
    Ok(())
}

/// Writes the overall summary of every measured class.
pub fn display_overall_stats(engine: &dyn TrafficEngine, out: &mut dyn Write) -> io::Result<()> {
    for c in 0..engine.core().classes() {
        if engine.core().measures(c) {
            engine.display_overall_class_stats(c, out)?;
        }
    }
    Ok(())
}

/// Trial-averaged results of one class.
#[derive(Clone, Debug, Serialize)]
pub struct ClassSummary {
    pub class: ClassId,
    pub traffic: String,
    pub avg_packet_size: f64,
    pub measured: bool,
    pub packet_latency: LatencySummary,
    pub flit_latency: LatencySummary,
    pub transaction_latency: LatencySummary,
    pub throughput: ThroughputSummary,
}

/// Trial-averaged results of a synthetic run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub total_sims: usize,
    pub injection_rate: Vec<f64>,
    pub classes: Vec<ClassSummary>,
}

impl SimulationReport {
    /// Collects the overall results of `engine`.
    pub fn from_engine(engine: &SyntheticTrafficEngine) -> Self {
        let core = engine.core();
        let classes = (0..core.classes())
            .map(|c| ClassSummary {
                class: c,
                traffic: engine.class_spec(c).traffic.clone(),
                avg_packet_size: engine.average_packet_size(c),
                measured: core.measures(c),
                packet_latency: core.overall_plat(c),
                flit_latency: core.overall_flat(c),
                transaction_latency: engine.overall_tlat(c),
                throughput: core.overall_throughput(c),
            })
            .collect();

        Self {
            total_sims: core.total_sims(),
            injection_rate: (0..core.classes())
                .map(|c| engine.class_spec(c).injection_rate)
                .collect(),
            classes,
        }
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// Averages of classes without samples are written as `null`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes one line per measured class.
    pub fn write_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} trial(s)", self.total_sims)?;
        for class in self.classes.iter().filter(|c| c.measured) {
            writeln!(
                out,
                "class {} ({}, psize {}): plat {:.2}  tlat {:.2}  accepted {:.4} flits/node/cycle",
                class.class,
                class.traffic,
                class.avg_packet_size,
                class.packet_latency.avg,
                class.transaction_latency.avg,
                class.throughput.accepted_flits
            )?;
        }
        Ok(())
    }
}
