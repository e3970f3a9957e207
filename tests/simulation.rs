//! Whole-simulation tests: configuration files in, reports out.

use flitsim::config::{TrafficConfig, TrafficConfigBuilder};
use flitsim::engine::{SimError, Simulator, TrafficEngine};
use flitsim::report::{self, SimulationReport};
use flitsim::sweep::run_load_sweep;

const REQUEST_REPLY: &str = r#"
simulation:
  seed: 17
  sample_period: 100
  warmup_periods: 1
  max_samples: 3
  sim_count: 2

network:
  nodes: 8
  num_vcs: 2
  vc_buf_size: 4
  latency: 6

traffic:
  classes: 2
  traffic: [uniform]
  packet_size: [[1, 4], [2]]
  packet_size_rate: [[3, 1]]
  reply_class: [1, -1]
  injection_rate: [0.04]
"#;

fn run_to_csv(config: &TrafficConfig) -> String {
    let mut sim = Simulator::from_config(config).unwrap();
    sim.run().unwrap();
    let mut out = Vec::new();
    report::write_overall_csv(sim.engine(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_request_reply_run() {
    let config = TrafficConfig::from_yaml(REQUEST_REPLY).unwrap();
    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run().unwrap();

    let engine = sim.engine();
    assert_eq!(engine.core().total_sims(), 2);
    assert!(!engine.packets_outstanding());
    assert_eq!(engine.average_packet_size(0), 1.75);
    assert_eq!(engine.average_packet_size(1), 2.0);

    // Two traversals plus a turnaround cycle
    let tlat = engine.overall_tlat(0);
    assert!(tlat.min >= 13.0, "min tlat {}", tlat.min);
    assert!(tlat.avg >= tlat.min && tlat.max >= tlat.avg);

    // Replies are accounted under their request class
    assert_eq!(engine.tlat_stats(1).num_samples(), 0);
}

#[test]
fn test_runs_are_reproducible() {
    let config = TrafficConfig::from_yaml(REQUEST_REPLY).unwrap();
    assert_eq!(run_to_csv(&config), run_to_csv(&config));
}

#[test]
fn test_seed_changes_results() {
    let config = TrafficConfig::from_yaml(REQUEST_REPLY).unwrap();
    let mut other = config.clone();
    other.simulation.seed += 1;
    assert_ne!(run_to_csv(&config), run_to_csv(&other));
}

#[test]
fn test_csv_columns() {
    let config = TrafficConfig::from_yaml(REQUEST_REPLY).unwrap();
    let csv = run_to_csv(&config);
    let mut lines = csv.lines();

    let header: Vec<_> = lines.next().unwrap().split(',').collect();
    assert_eq!(&header[..2], &["traffic", "psize"]);
    assert_eq!(&header[header.len() - 3..], &["min_tlat", "avg_tlat", "max_tlat"]);

    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("uniform,1.75,"));
    assert!(rows[1].starts_with("uniform,2,"));
    for row in rows {
        assert_eq!(row.split(',').count(), header.len());
    }
}

#[test]
fn test_text_reports() {
    let config = TrafficConfig::from_yaml(REQUEST_REPLY).unwrap();
    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run().unwrap();

    let mut out = Vec::new();
    report::write_class_stats(sim.engine(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("pair_tlat(1,:) = [ "));
    assert!(text.contains("pair_tlat(2,:) = [ "));

    let mut out = Vec::new();
    report::display_overall_stats(sim.engine(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Overall minimum transaction latency = "));
    assert!(text.contains("Overall maximum transaction latency = "));
    assert!(text.contains("(2 samples)"));

    let report = SimulationReport::from_engine(sim.engine());
    assert_eq!(report.classes[1].traffic, "uniform");
}

#[test]
fn test_every_builtin_pattern_runs() {
    for pattern in ["uniform", "neighbor", "tornado", "bitcomp", "randperm"] {
        let config = TrafficConfigBuilder::new()
            .seed(4)
            .nodes(8)
            .latency(3)
            .phases(50, 1, 2)
            .traffic([pattern])
            .injection_rate(vec![0.1])
            .build()
            .unwrap();
        let mut sim = Simulator::from_config(&config).unwrap();
        sim.run().unwrap_or_else(|e| panic!("{} failed: {}", pattern, e));
        assert!(sim.engine().tlat_stats(0).num_samples() > 0, "{}", pattern);
    }
}

#[test]
fn test_on_off_injection_runs() {
    let yaml = r#"
simulation:
  sample_period: 200
  warmup_periods: 1
  max_samples: 2
network:
  nodes: 4
  latency: 2
traffic:
  injection_rate: [0.1]
  injection_process:
    - type: on_off
      alpha: 0.1
      beta: 0.3
"#;
    let config = TrafficConfig::from_yaml(yaml).unwrap();
    let mut sim = Simulator::from_config(&config).unwrap();
    sim.run().unwrap();
    assert!(sim.engine().overall_tlat(0).avg >= 2.0);
}

#[test]
fn test_invalid_configuration_builds_nothing() {
    let yaml = r#"
traffic:
  classes: 3
  reply_class: [2, 2, -1]
"#;
    assert!(TrafficConfig::from_yaml(yaml).is_err());

    let mut config = TrafficConfig::new();
    config.traffic.traffic = vec!["hotspot".to_string()];
    let result = Simulator::from_config(&config);
    assert!(matches!(result, Err(SimError::Config(_))));
}

#[test]
fn test_load_sweep_latency_grows_with_load() {
    let config = TrafficConfigBuilder::new()
        .seed(2)
        .nodes(8)
        .latency(5)
        .phases(200, 1, 3)
        .packet_size(vec![vec![4]])
        .build()
        .unwrap();

    let points = run_load_sweep(&config, &[0.02, 0.2]).unwrap();
    let light = points[0].report.classes[0].transaction_latency.avg;
    let heavy = points[1].report.classes[0].transaction_latency.avg;
    assert!(light >= 8.0, "light load latency {}", light);
    assert!(heavy > light, "{} should exceed {}", heavy, light);
}
