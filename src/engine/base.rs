//! Shared base of every traffic engine.
//!
//! [`TrafficCore`] owns the state all workloads need: the clock and phase,
//! the per-(class, source) queues of generated but not yet injected flits,
//! outstanding-transaction counters, flit and packet retirement, and the
//! packet and flit latency statistics. Workload engines hold a core and call
//! through to it from their own hooks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ClassSpec, SimulationParams};
use crate::flit::Flit;
use crate::network::Network;
use crate::random::SimRng;
use crate::stats::{StatId, Stats, StatsRegistry};
use crate::types::{ClassId, FlitId, NodeIndex, PacketId, SimTime, TransactionId};

/// Phase of a simulation trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SimState {
    /// Reaching steady state; everything retired is sampled, then discarded.
    WarmingUp,
    /// Measuring.
    Running,
    /// No new measured traffic; waiting for measured traffic to leave.
    Draining,
}

/// Minimum, average and maximum of a latency collector, summed over trials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl LatencySummary {
    pub(crate) fn accumulate(&mut self, stats: &Stats) {
        self.min += stats.min();
        self.avg += stats.average();
        self.max += stats.max();
    }

    /// Divides the sums by the number of trials.
    pub fn averaged(&self, trials: usize) -> Self {
        let n = trials as f64;
        Self {
            min: self.min / n,
            avg: self.avg / n,
            max: self.max / n,
        }
    }
}

/// Sent and accepted rates, in packets or flits per node per cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ThroughputSummary {
    pub sent_packets: f64,
    pub accepted_packets: f64,
    pub sent_flits: f64,
    pub accepted_flits: f64,
}

impl ThroughputSummary {
    fn accumulate(&mut self, other: &Self) {
        self.sent_packets += other.sent_packets;
        self.accepted_packets += other.accepted_packets;
        self.sent_flits += other.sent_flits;
        self.accepted_flits += other.accepted_flits;
    }

    /// Divides the sums by the number of trials.
    pub fn averaged(&self, trials: usize) -> Self {
        let n = trials as f64;
        Self {
            sent_packets: self.sent_packets / n,
            accepted_packets: self.accepted_packets / n,
            sent_flits: self.sent_flits / n,
            accepted_flits: self.accepted_flits / n,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct WindowCounters {
    sent_packets: u64,
    accepted_packets: u64,
    sent_flits: u64,
    accepted_flits: u64,
}

/// Base traffic engine state.
#[derive(Debug)]
pub struct TrafficCore {
    nodes: usize,
    classes: usize,
    time: SimTime,
    sim_state: SimState,
    drain_time: SimTime,
    measure_stats: Vec<bool>,

    /// Generated flits waiting for injection, per class and source
    partial_packets: Vec<Vec<VecDeque<Flit>>>,
    /// Class whose packet a source is part-way through injecting
    in_progress: Vec<Option<ClassId>>,
    requests_outstanding: Vec<Vec<usize>>,
    packet_seq_no: Vec<Vec<u64>>,
    measured_in_flight: Vec<HashSet<FlitId>>,
    /// Heads of multi-flit packets whose tail has not arrived yet
    retired_heads: HashMap<PacketId, Flit>,

    next_flit_id: FlitId,
    next_packet_id: PacketId,
    next_tid: TransactionId,
    watch: HashSet<PacketId>,
    rng: SimRng,

    stats: StatsRegistry,
    plat: Vec<StatId>,
    flat: Vec<StatId>,
    window: Vec<WindowCounters>,
    reset_time: SimTime,

    overall_plat: Vec<LatencySummary>,
    overall_flat: Vec<LatencySummary>,
    overall_throughput: Vec<ThroughputSummary>,
    total_sims: usize,
}

impl TrafficCore {
    /// Creates the base state for `nodes` terminals and one class per spec.
    pub fn new(nodes: usize, specs: &[ClassSpec], params: &SimulationParams) -> Self {
        let classes = specs.len();
        let mut stats = StatsRegistry::new();
        let plat = (0..classes)
            .map(|c| stats.register(format!("plat_stat_{}", c), 1.0, 1000))
            .collect();
        let flat = (0..classes)
            .map(|c| stats.register(format!("flat_stat_{}", c), 1.0, 1000))
            .collect();

        Self {
            nodes,
            classes,
            time: 0,
            sim_state: SimState::WarmingUp,
            drain_time: 0,
            measure_stats: specs.iter().map(|s| s.measure_stats).collect(),
            partial_packets: vec![vec![VecDeque::new(); nodes]; classes],
            in_progress: vec![None; nodes],
            requests_outstanding: vec![vec![0; nodes]; classes],
            packet_seq_no: vec![vec![0; nodes]; classes],
            measured_in_flight: vec![HashSet::new(); classes],
            retired_heads: HashMap::new(),
            next_flit_id: 0,
            next_packet_id: 0,
            next_tid: 0,
            watch: params.watch_packets.iter().copied().collect(),
            rng: SimRng::new(params.seed),
            stats,
            plat,
            flat,
            window: vec![WindowCounters::default(); classes],
            reset_time: 0,
            overall_plat: vec![LatencySummary::default(); classes],
            overall_flat: vec![LatencySummary::default(); classes],
            overall_throughput: vec![ThroughputSummary::default(); classes],
            total_sims: 0,
        }
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Current cycle.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Moves the clock to the next cycle.
    pub fn advance_time(&mut self) {
        self.time += 1;
    }

    pub fn sim_state(&self) -> SimState {
        self.sim_state
    }

    /// Switches phase. Entering [`SimState::Draining`] fixes the drain
    /// deadline at the current cycle.
    pub fn set_sim_state(&mut self, state: SimState) {
        if state == SimState::Draining && self.sim_state != SimState::Draining {
            self.drain_time = self.time;
        }
        self.sim_state = state;
    }

    /// Cycle the draining phase began.
    pub fn drain_time(&self) -> SimTime {
        self.drain_time
    }

    /// Returns true if class `cl` contributes to measured statistics.
    pub fn measures(&self, cl: ClassId) -> bool {
        self.measure_stats[cl]
    }

    /// The simulation's random stream.
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Returns true if no flit of class `cl` waits for injection at `source`.
    pub fn partial_packets_empty(&self, cl: ClassId, source: NodeIndex) -> bool {
        self.partial_packets[cl][source].is_empty()
    }

    /// Flits of class `cl` waiting for injection at `source`.
    pub fn pending_flits(&self, cl: ClassId, source: NodeIndex) -> usize {
        self.partial_packets[cl][source].len()
    }

    /// The waiting flits themselves, oldest first.
    pub fn partial_packets(&self, cl: ClassId, source: NodeIndex) -> &VecDeque<Flit> {
        &self.partial_packets[cl][source]
    }

    /// Live transactions of class `cl` started by `source`.
    pub fn requests_outstanding(&self, cl: ClassId, source: NodeIndex) -> usize {
        self.requests_outstanding[cl][source]
    }

    /// Packets of class `cl` sequenced at `node`.
    pub fn packet_seq_no(&self, cl: ClassId, node: NodeIndex) -> u64 {
        self.packet_seq_no[cl][node]
    }

    /// Counts a new transaction of class `cl` at `source`.
    pub fn issue_request(&mut self, cl: ClassId, source: NodeIndex) {
        self.requests_outstanding[cl][source] += 1;
        self.packet_seq_no[cl][source] += 1;
    }

    /// Advances the packet sequence number of class `cl` at `node`.
    pub fn bump_packet_seq(&mut self, cl: ClassId, node: NodeIndex) {
        self.packet_seq_no[cl][node] += 1;
    }

    /// Completes one transaction of class `cl` started by `node`.
    ///
    /// # Panics
    /// Panics if no transaction is outstanding.
    pub fn complete_request(&mut self, cl: ClassId, node: NodeIndex) {
        let count = &mut self.requests_outstanding[cl][node];
        assert!(
            *count > 0,
            "class {} at node {} completed a transaction with none outstanding",
            cl,
            node
        );
        *count -= 1;
    }

    /// Measured flits of class `cl` generated but not yet retired.
    pub fn measured_in_flight(&self, cl: ClassId) -> usize {
        self.measured_in_flight[cl].len()
    }

    /// Queues a packet of `size` flits from `src` to `dest`, created at `time`.
    ///
    /// A packet without a `request` starts a new transaction at `time` and is
    /// recorded if its class is measured and it was created before the drain
    /// deadline. A reply passes the tail of the request it answers and takes
    /// over that request's transaction id, start time and record flag, so a
    /// measured transaction stays measured until its last packet retires.
    pub fn generate_packet(
        &mut self,
        src: NodeIndex,
        dest: NodeIndex,
        size: u32,
        cl: ClassId,
        time: SimTime,
        request: Option<&Flit>,
    ) -> PacketId {
        assert!(size > 0, "packets carry at least one flit");
        assert!(
            src < self.nodes && dest < self.nodes,
            "packet {} -> {} outside {} nodes",
            src,
            dest,
            self.nodes
        );

        let pid = self.next_packet_id;
        self.next_packet_id += 1;
        let (tid, ttime, record) = match request {
            Some(request) => (request.tid, request.ttime, request.record),
            None => {
                let tid = self.next_tid;
                self.next_tid += 1;
                let record = self.measure_stats[cl]
                    && (self.sim_state == SimState::Running
                        || (self.sim_state == SimState::Draining && time < self.drain_time));
                (tid, time, record)
            }
        };
        let watch = self.watch.contains(&pid);

        for i in 0..size {
            let mut flit = Flit::new(self.next_flit_id, pid, cl, src, dest);
            self.next_flit_id += 1;
            flit.tid = tid;
            flit.head = i == 0;
            flit.tail = i == size - 1;
            flit.ctime = time;
            flit.ttime = ttime;
            flit.record = record;
            flit.watch = watch;
            if record {
                self.measured_in_flight[cl].insert(flit.id);
            }
            self.partial_packets[cl][src].push_back(flit);
        }

        if watch {
            info!(
                target: "watch",
                time = self.time,
                node = src,
                "enqueuing packet {} (tid {}, class {}, {} flits) for node {} at time {}",
                pid, tid, cl, size, dest, time
            );
        }
        pid
    }

    /// Offers at most one waiting flit per source to the network.
    ///
    /// Sources are visited in index order. A source part-way through a
    /// packet only continues that packet; otherwise the lowest class whose
    /// front flit is due and accepted goes. Class `c` uses lane
    /// `c % num_vcs`; a refused flit stays at the front of its queue.
    pub fn inject_flits(&mut self, network: &mut dyn Network) {
        let num_vcs = network.num_vcs();
        for source in 0..self.nodes {
            let candidates = match self.in_progress[source] {
                Some(c) => c..c + 1,
                None => 0..self.classes,
            };
            for c in candidates {
                let due = self.partial_packets[c][source]
                    .front()
                    .map_or(false, |f| f.ctime <= self.time);
                if !due {
                    continue;
                }
                let Some(mut flit) = self.partial_packets[c][source].pop_front() else {
                    continue;
                };
                let vc = c % num_vcs;
                flit.itime = self.time;
                flit.vc = Some(vc);
                let (id, head, tail, watch) = (flit.id, flit.head, flit.tail, flit.watch);

                match network.try_inject(source, vc, flit) {
                    Ok(()) => {
                        let window = &mut self.window[c];
                        window.sent_flits += 1;
                        if head {
                            window.sent_packets += 1;
                        }
                        self.in_progress[source] = if tail { None } else { Some(c) };
                        if watch {
                            info!(
                                target: "watch",
                                time = self.time,
                                node = source,
                                "injecting flit {} on vc {}",
                                id, vc
                            );
                        }
                        break;
                    }
                    Err(mut flit) => {
                        flit.vc = None;
                        self.partial_packets[c][source].push_front(flit);
                    }
                }
            }
        }
    }

    /// Retires a flit that arrived at `dest`.
    ///
    /// Returns the packet's head and tail once the tail has arrived.
    pub fn retire_flit(&mut self, flit: Flit, dest: NodeIndex) -> Option<(Flit, Flit)> {
        assert_eq!(
            flit.dest, dest,
            "flit {} for node {} arrived at node {}",
            flit.id, flit.dest, dest
        );
        let cl = flit.cl;
        let sampled = self.sim_state == SimState::WarmingUp || flit.record;
        if flit.record {
            self.measured_in_flight[cl].remove(&flit.id);
        }
        self.window[cl].accepted_flits += 1;
        if sampled {
            self.stats
                .add_sample(self.flat[cl], flit.network_latency() as f64);
        }
        if flit.watch {
            info!(
                target: "watch",
                time = self.time,
                node = dest,
                "retiring flit {} (packet {}, network latency {})",
                flit.id,
                flit.pid,
                flit.network_latency()
            );
        }

        if !flit.tail {
            if flit.head {
                self.retired_heads.insert(flit.pid, flit);
            }
            return None;
        }

        let head = if flit.head {
            flit.clone()
        } else {
            let Some(head) = self.retired_heads.remove(&flit.pid) else {
                panic!("tail of packet {} arrived before its head", flit.pid);
            };
            head
        };
        self.window[cl].accepted_packets += 1;
        if sampled {
            self.stats
                .add_sample(self.plat[cl], flit.packet_latency() as f64);
        }
        Some((head, flit))
    }

    /// Restores the start-of-trial state.
    pub fn reset_phase(&mut self) {
        self.time = 0;
        self.sim_state = SimState::WarmingUp;
        self.drain_time = 0;
        self.reset_time = 0;
        for queues in &mut self.partial_packets {
            queues.iter_mut().for_each(VecDeque::clear);
        }
        self.in_progress.iter_mut().for_each(|c| *c = None);
        for counts in &mut self.requests_outstanding {
            counts.iter_mut().for_each(|n| *n = 0);
        }
        for seq in &mut self.packet_seq_no {
            seq.iter_mut().for_each(|n| *n = 0);
        }
        self.measured_in_flight.iter_mut().for_each(HashSet::clear);
        self.retired_heads.clear();
    }

    /// Starts a new measurement window.
    pub fn clear_stats(&mut self) {
        for c in 0..self.classes {
            self.stats.clear(self.plat[c]);
            self.stats.clear(self.flat[c]);
        }
        self.window.iter_mut().for_each(|w| *w = WindowCounters::default());
        self.reset_time = self.time;
    }

    /// Returns true while measured flits are in flight or a measured class
    /// has transactions awaiting completion.
    pub fn packets_outstanding(&self) -> bool {
        (0..self.classes).any(|c| {
            self.measure_stats[c]
                && (!self.measured_in_flight[c].is_empty()
                    || self.requests_outstanding[c].iter().any(|&n| n > 0))
        })
    }

    /// Folds the finished trial into the overall sums.
    pub fn update_overall_stats(&mut self) {
        self.total_sims += 1;
        for c in 0..self.classes {
            if !self.measure_stats[c] {
                continue;
            }
            let plat = self.stats.get(self.plat[c]);
            if plat.num_samples() == 0 {
                warn!(class = c, "measured class retired no packets this trial");
                continue;
            }
            self.overall_plat[c].accumulate(plat);
            self.overall_flat[c].accumulate(self.stats.get(self.flat[c]));
            let throughput = self.throughput(c);
            self.overall_throughput[c].accumulate(&throughput);
        }
    }

    /// Completed trials.
    pub fn total_sims(&self) -> usize {
        self.total_sims
    }

    /// The engine's statistics registry.
    pub fn stats(&self) -> &StatsRegistry {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsRegistry {
        &mut self.stats
    }

    /// Packet latency collector of class `cl`.
    pub fn plat_stats(&self, cl: ClassId) -> &Stats {
        self.stats.get(self.plat[cl])
    }

    /// Flit latency collector of class `cl`.
    pub fn flat_stats(&self, cl: ClassId) -> &Stats {
        self.stats.get(self.flat[cl])
    }

    /// Rates of class `cl` over the current measurement window.
    pub fn throughput(&self, cl: ClassId) -> ThroughputSummary {
        let w = &self.window[cl];
        let cycles = self.time.saturating_sub(self.reset_time);
        if cycles == 0 {
            return ThroughputSummary::default();
        }
        let scale = cycles as f64 * self.nodes as f64;
        ThroughputSummary {
            sent_packets: w.sent_packets as f64 / scale,
            accepted_packets: w.accepted_packets as f64 / scale,
            sent_flits: w.sent_flits as f64 / scale,
            accepted_flits: w.accepted_flits as f64 / scale,
        }
    }

    /// Packet latency of class `cl` averaged over completed trials.
    pub fn overall_plat(&self, cl: ClassId) -> LatencySummary {
        self.overall_plat[cl].averaged(self.total_sims)
    }

    /// Flit latency of class `cl` averaged over completed trials.
    pub fn overall_flat(&self, cl: ClassId) -> LatencySummary {
        self.overall_flat[cl].averaged(self.total_sims)
    }

    /// Rates of class `cl` averaged over completed trials.
    pub fn overall_throughput(&self, cl: ClassId) -> ThroughputSummary {
        self.overall_throughput[cl].averaged(self.total_sims)
    }

    pub fn overall_stats_header_csv(&self) -> String {
        [
            "min_plat",
            "avg_plat",
            "max_plat",
            "min_flat",
            "avg_flat",
            "max_flat",
            "sent_packets",
            "accepted_packets",
            "sent_flits",
            "accepted_flits",
        ]
        .join(",")
    }

    pub fn overall_class_stats_csv(&self, cl: ClassId) -> String {
        let plat = self.overall_plat(cl);
        let flat = self.overall_flat(cl);
        let rates = self.overall_throughput(cl);
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            plat.min,
            plat.avg,
            plat.max,
            flat.min,
            flat.avg,
            flat.max,
            rates.sent_packets,
            rates.accepted_packets,
            rates.sent_flits,
            rates.accepted_flits
        )
    }

    /// Writes the current window of class `cl` as MATLAB assignments.
    pub fn write_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        let n = cl + 1;
        let plat = self.plat_stats(cl);
        writeln!(out, "plat({}) = {};", n, plat.average())?;
        write!(out, "plat_hist({},:) = [ ", n)?;
        for count in plat.histogram() {
            write!(out, "{} ", count)?;
        }
        writeln!(out, "];")?;
        writeln!(out, "flat({}) = {};", n, self.flat_stats(cl).average())?;

        let rates = self.throughput(cl);
        writeln!(out, "sent_packets({}) = {};", n, rates.sent_packets)?;
        writeln!(out, "accepted_packets({}) = {};", n, rates.accepted_packets)?;
        writeln!(out, "sent_flits({}) = {};", n, rates.sent_flits)?;
        writeln!(out, "accepted_flits({}) = {};", n, rates.accepted_flits)
    }

    /// Writes the trial-averaged summary of class `cl`.
    pub fn display_overall_class_stats(&self, cl: ClassId, out: &mut dyn Write) -> io::Result<()> {
        let sims = self.total_sims;
        let plat = self.overall_plat(cl);
        let flat = self.overall_flat(cl);
        let rates = self.overall_throughput(cl);

        writeln!(out, "====== Traffic class {} ======", cl)?;
        for (label, value) in [("minimum", plat.min), ("average", plat.avg), ("maximum", plat.max)] {
            writeln!(out, "Overall {} packet latency = {} ({} samples)", label, value, sims)?;
        }
        for (label, value) in [("minimum", flat.min), ("average", flat.avg), ("maximum", flat.max)] {
            writeln!(out, "Overall {} flit latency = {} ({} samples)", label, value, sims)?;
        }
        writeln!(out, "Overall injected packet rate = {} ({} samples)", rates.sent_packets, sims)?;
        writeln!(out, "Overall accepted packet rate = {} ({} samples)", rates.accepted_packets, sims)?;
        writeln!(out, "Overall injected flit rate = {} ({} samples)", rates.sent_flits, sims)?;
        writeln!(out, "Overall accepted flit rate = {} ({} samples)", rates.accepted_flits, sims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrafficConfigBuilder;
    use crate::network::DelayNetwork;

    fn core(classes: usize, nodes: usize) -> TrafficCore {
        let config = TrafficConfigBuilder::new()
            .nodes(nodes)
            .classes(classes)
            .build()
            .unwrap();
        let specs = config.resolve_classes().unwrap();
        TrafficCore::new(nodes, &specs, &config.simulation)
    }

    fn run_until_retired(core: &mut TrafficCore, net: &mut DelayNetwork) -> Vec<(Flit, Flit)> {
        let mut done = Vec::new();
        for _ in 0..100 {
            let time = core.time();
            for (dest, mut flit) in net.eject(time) {
                flit.atime = time;
                done.extend(core.retire_flit(flit, dest));
            }
            core.inject_flits(net);
            net.advance(time);
            core.advance_time();
        }
        done
    }

    #[test]
    fn test_generate_packet_shapes_flits() {
        let mut core = core(1, 4);
        let pid = core.generate_packet(0, 3, 3, 0, 0, None);
        assert_eq!(core.pending_flits(0, 0), 3);

        let flits: Vec<_> = core.partial_packets[0][0].iter().cloned().collect();
        assert!(flits[0].head && !flits[0].tail);
        assert!(!flits[1].head && !flits[1].tail);
        assert!(!flits[2].head && flits[2].tail);
        assert!(flits.iter().all(|f| f.pid == pid && f.dest == 3));
    }

    #[test]
    fn test_record_rule() {
        let mut core = core(1, 2);
        core.generate_packet(0, 1, 1, 0, 0, None);
        assert_eq!(core.measured_in_flight(0), 0);

        core.set_sim_state(SimState::Running);
        core.generate_packet(0, 1, 1, 0, 0, None);
        assert_eq!(core.measured_in_flight(0), 1);

        core.time = 5;
        core.set_sim_state(SimState::Draining);
        assert_eq!(core.drain_time(), 5);
        core.generate_packet(0, 1, 1, 0, 4, None);
        core.generate_packet(0, 1, 1, 0, 5, None);
        assert_eq!(core.measured_in_flight(0), 2);
    }

    #[test]
    fn test_reply_keeps_transaction() {
        let mut core = core(1, 2);
        let mut request = Flit::new(0, 0, 0, 0, 1);
        request.tid = 7;
        request.ttime = 3;
        request.record = true;

        // Still warming up, yet the reply belongs to a recorded transaction
        core.generate_packet(1, 0, 1, 0, 12, Some(&request));
        let flit = core.partial_packets[0][1].front().unwrap();
        assert_eq!(flit.tid, 7);
        assert_eq!(flit.ttime, 3);
        assert_eq!(flit.ctime, 12);
        assert!(flit.record);
        assert_eq!(core.measured_in_flight(0), 1);
    }

    #[test]
    fn test_multi_flit_packet_retires_once() {
        let mut core = core(1, 2);
        let mut net = DelayNetwork::new(2, 1, 4, 3);
        core.generate_packet(0, 1, 4, 0, 0, None);

        let done = run_until_retired(&mut core, &mut net);
        assert_eq!(done.len(), 1);
        let (head, tail) = &done[0];
        assert!(head.head && tail.tail);
        assert_eq!(head.pid, tail.pid);
        // Four flits, one per cycle, three cycles of latency
        assert_eq!(tail.atime, 6);
        assert_eq!(core.plat_stats(0).num_samples(), 1);
        assert_eq!(core.flat_stats(0).num_samples(), 4);
    }

    #[test]
    fn test_future_packets_wait() {
        let mut core = core(1, 2);
        let mut net = DelayNetwork::new(2, 1, 4, 1);
        core.generate_packet(0, 1, 1, 0, 5, None);
        for _ in 0..5 {
            let time = core.time();
            core.inject_flits(&mut net);
            net.advance(time);
            core.advance_time();
        }
        assert_eq!(core.pending_flits(0, 0), 1);
        core.inject_flits(&mut net);
        assert_eq!(core.pending_flits(0, 0), 0);
    }

    #[test]
    fn test_backpressure_keeps_flit_queued() {
        let mut core = core(1, 2);
        let mut net = DelayNetwork::new(2, 1, 1, 1);
        core.generate_packet(0, 1, 2, 0, 0, None);

        core.inject_flits(&mut net);
        core.inject_flits(&mut net);
        assert_eq!(core.pending_flits(0, 0), 1);
        assert_eq!(net.port(0).total_occupancy(), 1);
    }

    #[test]
    fn test_source_finishes_packet_before_switching_class() {
        let mut core = core(2, 2);
        let mut net = DelayNetwork::new(2, 2, 4, 1);
        core.generate_packet(0, 1, 2, 1, 0, None);
        core.inject_flits(&mut net);
        core.generate_packet(0, 1, 1, 0, 0, None);
        core.inject_flits(&mut net);

        assert_eq!(core.pending_flits(1, 0), 0);
        assert_eq!(core.pending_flits(0, 0), 1);
    }

    #[test]
    #[should_panic(expected = "none outstanding")]
    fn test_complete_request_underflow_panics() {
        let mut core = core(1, 2);
        core.complete_request(0, 0);
    }

    #[test]
    fn test_request_counters() {
        let mut core = core(1, 2);
        core.issue_request(0, 1);
        core.issue_request(0, 1);
        core.complete_request(0, 1);
        assert_eq!(core.requests_outstanding(0, 1), 1);
        assert_eq!(core.packet_seq_no(0, 1), 2);
    }

    #[test]
    fn test_open_transaction_keeps_packets_outstanding() {
        let mut core = core(2, 2);
        core.issue_request(0, 1);
        assert_eq!(core.measured_in_flight(0), 0);
        assert!(core.packets_outstanding());

        core.complete_request(0, 1);
        assert!(!core.packets_outstanding());

        core.measure_stats[1] = false;
        core.issue_request(1, 0);
        assert!(!core.packets_outstanding());
    }

    #[test]
    fn test_reset_phase() {
        let mut core = core(1, 2);
        core.set_sim_state(SimState::Running);
        core.generate_packet(0, 1, 2, 0, 0, None);
        core.issue_request(0, 0);
        core.time = 40;

        core.reset_phase();
        assert_eq!(core.time(), 0);
        assert_eq!(core.sim_state(), SimState::WarmingUp);
        assert!(core.partial_packets_empty(0, 0));
        assert_eq!(core.requests_outstanding(0, 0), 0);
        assert!(!core.packets_outstanding());
    }

    #[test]
    fn test_overall_stats_average_over_trials() {
        let mut core = core(1, 2);
        for latency in [10.0, 20.0] {
            core.clear_stats();
            core.stats.add_sample(core.plat[0], latency);
            core.stats.add_sample(core.flat[0], latency);
            core.update_overall_stats();
        }
        assert_eq!(core.total_sims(), 2);
        assert_eq!(core.overall_plat(0).avg, 15.0);
        assert_eq!(core.overall_plat(0).min, 15.0);
    }

    #[test]
    fn test_overall_display() {
        let mut core = core(1, 2);
        core.stats.add_sample(core.plat[0], 8.0);
        core.stats.add_sample(core.flat[0], 8.0);
        core.time = 10;
        core.update_overall_stats();

        let mut out = Vec::new();
        core.display_overall_class_stats(0, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Overall average packet latency = 8 (1 samples)"));
    }
}
