//! Synthetic request/reply workload.
//!
//! [`SyntheticTrafficEngine`] drives every (class, source) pair from an
//! injection timer, draws destinations from the class's traffic pattern and
//! packet sizes from its weighted size distribution, turns retired requests
//! into replies and records one transaction-latency sample per completed
//! transaction.
//!
//! # Example
//!
//! ```
//! use flitsim::config::TrafficConfigBuilder;
//! use flitsim::engine::{SyntheticTrafficEngine, TrafficEngine};
//!
//! let config = TrafficConfigBuilder::new()
//!     .nodes(4)
//!     .classes(2)
//!     .reply_class(vec![1, -1])
//!     .packet_size(vec![vec![1], vec![4]])
//!     .build()
//!     .unwrap();
//!
//! let engine = SyntheticTrafficEngine::new(&config).unwrap();
//! assert_eq!(engine.average_packet_size(1), 4.0);
//! assert!(engine.report_header().ends_with("min_tlat,avg_tlat,max_tlat"));
//! ```

use std::io::{self, Write};

use tracing::{debug, info, warn};

use super::base::{LatencySummary, SimState, TrafficCore};
use super::TrafficEngine;
use crate::config::{ClassSpec, ConfigError, ConfigResult, TrafficConfig};
use crate::flit::Flit;
use crate::injection::InjectionProcess;
use crate::pattern::TrafficPattern;
use crate::random::RandomSource;
use crate::registry::{create_default_registry, PatternParams, PatternRegistry};
use crate::stats::{StatId, Stats};
use crate::types::{ClassId, NodeIndex, SimTime};

/// Traffic engine for synthetic workloads.
pub struct SyntheticTrafficEngine {
    core: TrafficCore,
    classes: Vec<ClassSpec>,
    patterns: Vec<Box<dyn TrafficPattern>>,
    injection: Vec<Box<dyn InjectionProcess>>,

    /// Next cycle each (class, source) timer examines
    qtime: Vec<Vec<SimTime>>,
    qdrained: Vec<Vec<bool>>,

    tlat: Vec<StatId>,
    /// Indexed `[class][i * nodes + j]`
    pair_tlat: Vec<Vec<StatId>>,
    overall_tlat: Vec<LatencySummary>,
}

impl SyntheticTrafficEngine {
    /// Builds the engine with patterns from the built-in registry.
    pub fn new(config: &TrafficConfig) -> ConfigResult<Self> {
        Self::with_registry(config, &create_default_registry())
    }

    /// Builds the engine with patterns looked up in `registry`.
    pub fn with_registry(config: &TrafficConfig, registry: &PatternRegistry) -> ConfigResult<Self> {
        config.validate()?;
        let specs = config.resolve_classes()?;
        let nodes = config.network.nodes;
        let params = PatternParams {
            seed: config.simulation.seed,
        };

        let patterns = specs
            .iter()
            .map(|spec| registry.create(&spec.traffic, nodes, &params))
            .collect::<ConfigResult<Vec<_>>>()?;
        let injection = specs
            .iter()
            .map(|spec| spec.injection_process.build(nodes, spec.injection_rate))
            .collect();

        Ok(Self::assemble(config, specs, patterns, injection))
    }

    /// Builds the engine around caller-supplied patterns and injection
    /// processes, one of each per class.
    pub fn with_collaborators(
        config: &TrafficConfig,
        patterns: Vec<Box<dyn TrafficPattern>>,
        injection: Vec<Box<dyn InjectionProcess>>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let specs = config.resolve_classes()?;
        if patterns.len() != specs.len() || injection.len() != specs.len() {
            return Err(ConfigError::Validation(format!(
                "{} classes need as many patterns and injection processes, got {} and {}",
                specs.len(),
                patterns.len(),
                injection.len()
            )));
        }
        Ok(Self::assemble(config, specs, patterns, injection))
    }

    fn assemble(
        config: &TrafficConfig,
        classes: Vec<ClassSpec>,
        patterns: Vec<Box<dyn TrafficPattern>>,
        injection: Vec<Box<dyn InjectionProcess>>,
    ) -> Self {
        let nodes = config.network.nodes;
        let num_classes = classes.len();
        let mut core = TrafficCore::new(nodes, &classes, &config.simulation);

        let stats = core.stats_mut();
        let tlat: Vec<StatId> = (0..num_classes)
            .map(|c| stats.register(format!("tlat_stat_{}", c), 1.0, 1000))
            .collect();
        let pair_tlat: Vec<Vec<StatId>> = (0..num_classes)
            .map(|c| {
                (0..nodes * nodes)
                    .map(|k| {
                        let name = format!("pair_tlat_stat_{}_{}_{}", c, k / nodes, k % nodes);
                        stats.register(name, 1.0, 250)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        debug!(
            nodes,
            classes = num_classes,
            collectors = core.stats().len(),
            "synthetic traffic engine ready"
        );

        Self {
            core,
            classes,
            patterns,
            injection,
            qtime: vec![vec![0; nodes]; num_classes],
            qdrained: vec![vec![false; nodes]; num_classes],
            tlat,
            pair_tlat,
            overall_tlat: vec![LatencySummary::default(); num_classes],
        }
    }

    /// Resolved parameters of class `cl`.
    pub fn class_spec(&self, cl: ClassId) -> &ClassSpec {
        &self.classes[cl]
    }

    /// Draws the size of the next packet of class `cl`.
    pub fn next_packet_size(&mut self, cl: ClassId) -> u32 {
        Self::sample_packet_size(&self.classes[cl], self.core.rng_mut())
    }

    /// Draws a packet size from the weighted size list of `spec`.
    ///
    /// A single size is returned without drawing. Otherwise one integer in
    /// `[0, rate_sum - 1]` is drawn and the rates are subtracted in order
    /// until the remainder falls below the current rate.
    ///
    /// # Panics
    /// Panics if the draw falls past the last entry.
    pub fn sample_packet_size(spec: &ClassSpec, rng: &mut dyn RandomSource) -> u32 {
        let sizes = &spec.packet_sizes;
        if sizes.len() == 1 {
            return sizes[0];
        }

        let rates = &spec.packet_size_rates;
        let mut pct = rng.random_int(spec.packet_size_rate_sum - 1);
        let last = sizes.len() - 1;
        for (&size, &limit) in sizes[..last].iter().zip(rates) {
            if limit > pct {
                return size;
            }
            pct -= limit;
        }
        assert!(
            rates[last] > pct,
            "packet size draw {} exhausted the size distribution",
            pct
        );
        sizes[last]
    }

    /// Expected packet size of class `cl`.
    pub fn average_packet_size(&self, cl: ClassId) -> f64 {
        let spec = &self.classes[cl];
        if spec.packet_sizes.len() == 1 {
            return spec.packet_sizes[0] as f64;
        }
        let weighted: u64 = spec
            .packet_sizes
            .iter()
            .zip(&spec.packet_size_rates)
            .map(|(&size, &rate)| size as u64 * rate)
            .sum();
        weighted as f64 / spec.packet_size_rate_sum as f64
    }

    /// Asks the class's injection process and pattern for a packet examined
    /// at cycle `at`, and queues it if one is issued.
    fn issue_packet(&mut self, source: NodeIndex, cl: ClassId, at: SimTime) -> bool {
        if !self.injection[cl].test(source, self.core.rng_mut()) {
            return false;
        }
        let dest = self.patterns[cl].dest(source, self.core.rng_mut());
        let size = self.next_packet_size(cl);
        self.core.generate_packet(source, dest, size, cl, at, None);
        true
    }

    /// Next cycle the timer of (`cl`, `source`) examines.
    pub fn qtime(&self, cl: ClassId, source: NodeIndex) -> SimTime {
        self.qtime[cl][source]
    }

    /// Returns true once (`cl`, `source`) has passed the drain deadline.
    pub fn is_drained(&self, cl: ClassId, source: NodeIndex) -> bool {
        self.qdrained[cl][source]
    }

    /// Live transactions of class `cl` started by `source`.
    pub fn requests_outstanding(&self, cl: ClassId, source: NodeIndex) -> usize {
        self.core.requests_outstanding(cl, source)
    }

    /// Transaction latency collector of class `cl`.
    pub fn tlat_stats(&self, cl: ClassId) -> &Stats {
        self.core.stats().get(self.tlat[cl])
    }

    /// Transaction latency between a pair of nodes.
    ///
    /// `i` is the node where the transaction completed and `j` the source
    /// of its terminal packet.
    pub fn pair_tlat_stats(&self, cl: ClassId, i: NodeIndex, j: NodeIndex) -> &Stats {
        let nodes = self.core.nodes();
        self.core.stats().get(self.pair_tlat[cl][i * nodes + j])
    }

    /// Transaction latency of class `cl` averaged over completed trials.
    pub fn overall_tlat(&self, cl: ClassId) -> LatencySummary {
        self.overall_tlat[cl].averaged(self.core.total_sims())
    }
}

impl TrafficEngine for SyntheticTrafficEngine {
    fn core(&self) -> &TrafficCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrafficCore {
        &mut self.core
    }

    fn inject(&mut self) {
        let time = self.core.time();
        let draining = self.core.sim_state() == SimState::Draining;
        let drain_time = self.core.drain_time();

        for c in 0..self.classes.len() {
            for source in 0..self.core.nodes() {
                if !self.core.partial_packets_empty(c, source) || self.qdrained[c][source] {
                    continue;
                }
                if self.classes[c].is_reply() {
                    // Replies are queued by retirement only
                    self.qtime[c][source] = time;
                } else {
                    while self.qtime[c][source] <= time {
                        let at = self.qtime[c][source];
                        self.qtime[c][source] += 1;
                        if self.issue_packet(source, c, at) {
                            self.core.issue_request(c, source);
                            break;
                        }
                    }
                }
                if draining && self.qtime[c][source] > drain_time {
                    self.qdrained[c][source] = true;
                }
            }
        }
    }

    fn retire_packet(&mut self, head: &Flit, tail: &Flit, dest: NodeIndex) {
        let (reply_class, request_class) = {
            let spec = &self.classes[tail.cl];
            (spec.reply_class, spec.request_class)
        };

        match reply_class {
            None => {
                if tail.watch {
                    info!(
                        target: "watch",
                        time = self.core.time(),
                        node = dest,
                        "completing transaction {} (lat = {}, src = {}, dest = {})",
                        tail.tid,
                        tail.atime.saturating_sub(head.ttime),
                        head.src,
                        head.dest
                    );
                }

                let cl = match request_class {
                    // A lone packet completes its own transaction on arrival
                    None => {
                        self.core.complete_request(tail.cl, tail.src);
                        tail.cl
                    }
                    // A reply completes the request issued from here
                    Some(request) => {
                        self.core.complete_request(request, dest);
                        request
                    }
                };

                if self.core.sim_state() == SimState::WarmingUp || tail.record {
                    let latency = tail.transaction_latency() as f64;
                    let pair = self.pair_tlat[cl][dest * self.core.nodes() + tail.src];
                    let stats = self.core.stats_mut();
                    stats.add_sample(self.tlat[cl], latency);
                    stats.add_sample(pair, latency);
                }
            }
            Some(reply) => {
                self.core.bump_packet_seq(tail.cl, dest);
                let size = self.next_packet_size(reply);
                self.core.generate_packet(
                    head.dest,
                    head.src,
                    size,
                    reply,
                    tail.atime + 1,
                    Some(tail),
                );
            }
        }
    }

    fn reset_phase(&mut self) {
        self.core.reset_phase();
        for c in 0..self.classes.len() {
            self.qtime[c].iter_mut().for_each(|t| *t = 0);
            self.qdrained[c].iter_mut().for_each(|d| *d = false);
            self.patterns[c].reset();
            self.injection[c].reset();
        }
    }

    fn clear_stats(&mut self) {
        let stats = self.core.stats_mut();
        for (tlat, pairs) in self.tlat.iter().zip(&self.pair_tlat) {
            stats.clear(*tlat);
            pairs.iter().for_each(|&id| stats.clear(id));
        }
        self.core.clear_stats();
    }

    fn packets_outstanding(&self) -> bool {
        if self.core.packets_outstanding() {
            return true;
        }
        (0..self.classes.len()).any(|c| {
            self.core.measures(c) && self.qdrained[c].iter().any(|&drained| !drained)
        })
    }

    fn update_overall_stats(&mut self) {
        self.core.update_overall_stats();
        for c in 0..self.classes.len() {
            // Reply samples are recorded under their request class
            if !self.core.measures(c) || self.classes[c].is_reply() {
                continue;
            }
            let tlat = self.core.stats().get(self.tlat[c]);
            if tlat.num_samples() == 0 {
                warn!(class = c, "measured class completed no transactions this trial");
                continue;
            }
            self.overall_tlat[c].accumulate(tlat);
        }
    }

    fn report_header(&self) -> String {
        format!(
            "traffic,psize,{},min_tlat,avg_tlat,max_tlat",
            self.core.overall_stats_header_csv()
        )
    }

    fn report_row(&self, cl: ClassId) -> String {
        let tlat = self.overall_tlat(cl);
        format!(
            "{},{},{},{},{},{}",
            self.classes[cl].traffic,
            self.average_packet_size(cl),
            self.core.overall_class_stats_csv(cl),
            tlat.min,
            tlat.avg,
            tlat.max
        )
    }

    fn write_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        self.core.write_class_stats(cl, out)?;
        write!(out, "pair_tlat({},:) = [ ", cl + 1)?;
        for &id in &self.pair_tlat[cl] {
            write!(out, "{} ", self.core.stats().get(id).average())?;
        }
        writeln!(out, "];")
    }

    fn display_overall_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        self.core.display_overall_class_stats(cl, out)?;
        let sims = self.core.total_sims();
        let tlat = self.overall_tlat(cl);
        for (label, value) in [("minimum", tlat.min), ("average", tlat.avg), ("maximum", tlat.max)] {
            writeln!(
                out,
                "Overall {} transaction latency = {} ({} samples)",
                label, value, sims
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SyntheticTrafficEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<_> = self.patterns.iter().map(|p| p.name()).collect();
        f.debug_struct("SyntheticTrafficEngine")
            .field("time", &self.core.time())
            .field("state", &self.core.sim_state())
            .field("patterns", &patterns)
            .finish()
    }
}
