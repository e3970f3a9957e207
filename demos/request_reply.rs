//! Request/Reply Traffic Example
//!
//! This example runs a small read/write workload on a fixed-latency network:
//! - Class 0 issues short read requests answered by long class 1 replies
//! - Class 2 issues unanswered long writes with a tornado pattern
//!
//! It then prints the overall CSV table, the per-class text summary and a
//! short load sweep of the read class.
//!
//! Run with: `cargo run --example request_reply`
//! Watch one packet with: `RUST_LOG=warn,watch=info cargo run --example request_reply`

use std::io;

use flitsim::config::TrafficConfig;
use flitsim::report::{self, SimulationReport};
use flitsim::sweep::run_load_sweep;
use flitsim::Simulator;

const CONFIG: &str = r#"
simulation:
  seed: 11
  sample_period: 500
  warmup_periods: 2
  max_samples: 4
  sim_count: 2
  watch_packets: [42]
  log_level: info

network:
  nodes: 16
  num_vcs: 3
  vc_buf_size: 8
  latency: 12

traffic:
  classes: 3
  traffic: [uniform, uniform, tornado]
  packet_size: [[1], [5], [5]]
  reply_class: [1, -1, -1]
  injection_rate: [0.03, 0.0, 0.01]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TrafficConfig::from_yaml(CONFIG)?;
    flitsim::init_logging(&config.simulation.log_level);

    println!("=== Request/Reply Simulation ===");
    println!(
        "{} nodes, {} classes, latency {}\n",
        config.network.nodes, config.traffic.classes, config.network.latency
    );

    let mut sim = Simulator::from_config(&config)?;
    sim.run()?;

    let mut stdout = io::stdout();
    report::write_overall_csv(sim.engine(), &mut stdout)?;
    println!();
    report::display_overall_stats(sim.engine(), &mut stdout)?;
    println!();
    SimulationReport::from_engine(sim.engine()).write_summary(&mut stdout)?;

    println!("\n=== Read Load Sweep ===");
    let mut reads = config.clone();
    reads.traffic.classes = 2;
    for point in run_load_sweep(&reads, &[0.01, 0.03, 0.05, 0.07])? {
        let read = &point.report.classes[0];
        println!(
            "rate {:.2}: tlat {:>7.2}  plat {:>7.2}",
            point.rate, read.transaction_latency.avg, read.packet_latency.avg
        );
    }

    Ok(())
}
