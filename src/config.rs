//! Configuration for the traffic engine.
//!
//! Configuration is loaded from YAML or JSON into typed sections and
//! resolved once, at engine construction, into one [`ClassSpec`] per traffic
//! class. Per-class fields are arrays; [`TrafficConfig::resolve_classes`]
//! broadcasts each array to the configured number of classes by repeating its
//! last element.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   seed: 42
//!   sample_period: 1000
//!   warmup_periods: 3
//!   max_samples: 10
//!
//! network:
//!   nodes: 16
//!   num_vcs: 4
//!   vc_buf_size: 8
//!   latency: 10
//!
//! traffic:
//!   classes: 2
//!   traffic: [uniform]
//!   packet_size: [[1, 8]]
//!   packet_size_rate: [[3, 1]]
//!   reply_class: [1, -1]
//!   injection_rate: [0.05]
//!   injection_process:
//!     - type: bernoulli
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::injection::InjectionKind;
use crate::types::{ClassId, PacketId, SimTime};

/// Errors that can occur during configuration loading and resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error("Unknown traffic pattern: {0}")]
    UnknownPattern(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Simulation phase parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Seed of the simulation's random stream
    #[serde(default)]
    pub seed: u64,

    /// Cycles per sample period
    #[serde(default = "default_sample_period")]
    pub sample_period: SimTime,

    /// Sample periods spent warming up before measurement
    #[serde(default = "default_warmup_periods")]
    pub warmup_periods: u64,

    /// Sample periods measured per trial
    #[serde(default = "default_max_samples")]
    pub max_samples: u64,

    /// Independent trials averaged into the overall results
    #[serde(default = "default_sim_count")]
    pub sim_count: usize,

    /// Cycles the draining phase may last before the trial is abandoned
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: SimTime,

    /// Packet ids whose flits emit watch records
    #[serde(default)]
    pub watch_packets: Vec<PacketId>,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_sample_period() -> SimTime {
    1000
}

fn default_warmup_periods() -> u64 {
    3
}

fn default_max_samples() -> u64 {
    10
}

fn default_sim_count() -> usize {
    1
}

fn default_drain_timeout() -> SimTime {
    100_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            sample_period: default_sample_period(),
            warmup_periods: default_warmup_periods(),
            max_samples: default_max_samples(),
            sim_count: default_sim_count(),
            drain_timeout: default_drain_timeout(),
            watch_packets: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

/// Network shape seen by the traffic engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Number of terminal nodes
    #[serde(default = "default_nodes")]
    pub nodes: usize,

    /// Virtual channels per buffer
    #[serde(default = "default_num_vcs")]
    pub num_vcs: usize,

    /// Depth of each virtual channel, in flits
    #[serde(default = "default_vc_buf_size")]
    pub vc_buf_size: usize,

    /// Link latency of the fixed-latency network, in cycles
    #[serde(default = "default_latency")]
    pub latency: SimTime,
}

fn default_nodes() -> usize {
    16
}

fn default_num_vcs() -> usize {
    4
}

fn default_vc_buf_size() -> usize {
    8
}

fn default_latency() -> SimTime {
    10
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            num_vcs: default_num_vcs(),
            vc_buf_size: default_vc_buf_size(),
            latency: default_latency(),
        }
    }
}

/// Per-class traffic parameters, as written in the file.
///
/// Every array is broadcast to `classes` entries by repeating its last
/// element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficParams {
    /// Number of traffic classes
    #[serde(default = "default_classes")]
    pub classes: usize,

    /// Traffic pattern name per class
    #[serde(default = "default_traffic")]
    pub traffic: Vec<String>,

    /// Packet sizes (in flits) per class
    #[serde(default = "default_packet_size")]
    pub packet_size: Vec<Vec<u32>>,

    /// Relative rate of each packet size per class
    #[serde(default = "default_packet_size_rate")]
    pub packet_size_rate: Vec<Vec<i64>>,

    /// Reply class per class; negative means no reply
    #[serde(default = "default_reply_class")]
    pub reply_class: Vec<i64>,

    /// Offered load per class, in packets per node per cycle
    #[serde(default = "default_injection_rate")]
    pub injection_rate: Vec<f64>,

    /// Injection process per class
    #[serde(default = "default_injection_process")]
    pub injection_process: Vec<InjectionKind>,

    /// Whether each class contributes to measured statistics
    #[serde(default = "default_measure_stats")]
    pub measure_stats: Vec<bool>,
}

fn default_classes() -> usize {
    1
}

fn default_traffic() -> Vec<String> {
    vec!["uniform".to_string()]
}

fn default_packet_size() -> Vec<Vec<u32>> {
    vec![vec![1]]
}

fn default_packet_size_rate() -> Vec<Vec<i64>> {
    vec![vec![1]]
}

fn default_reply_class() -> Vec<i64> {
    vec![-1]
}

fn default_injection_rate() -> Vec<f64> {
    vec![0.1]
}

fn default_injection_process() -> Vec<InjectionKind> {
    vec![InjectionKind::Bernoulli]
}

fn default_measure_stats() -> Vec<bool> {
    vec![true]
}

impl Default for TrafficParams {
    fn default() -> Self {
        Self {
            classes: default_classes(),
            traffic: default_traffic(),
            packet_size: default_packet_size(),
            packet_size_rate: default_packet_size_rate(),
            reply_class: default_reply_class(),
            injection_rate: default_injection_rate(),
            injection_process: default_injection_process(),
            measure_stats: default_measure_stats(),
        }
    }
}

/// Fully resolved parameters of one traffic class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassSpec {
    /// Traffic pattern name
    pub traffic: String,
    /// Packet sizes, in flits
    pub packet_sizes: Vec<u32>,
    /// Relative rate of each entry in `packet_sizes`
    pub packet_size_rates: Vec<u64>,
    /// Sum of `packet_size_rates`
    pub packet_size_rate_sum: u64,
    /// Class whose packet answers a packet of this class
    pub reply_class: Option<ClassId>,
    /// Class whose packets are answered by packets of this class
    pub request_class: Option<ClassId>,
    /// Offered load
    pub injection_rate: f64,
    /// Injection process
    pub injection_process: InjectionKind,
    /// Contributes to measured statistics
    pub measure_stats: bool,
}

impl ClassSpec {
    /// Returns true if packets of this class are only ever created as replies.
    pub fn is_reply(&self) -> bool {
        self.request_class.is_some()
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Simulation phase parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Network shape
    #[serde(default)]
    pub network: NetworkParams,

    /// Traffic classes
    #[serde(default)]
    pub traffic: TrafficParams,
}

impl TrafficConfig {
    /// Creates a configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: TrafficConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: TrafficConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("traffic.classes", self.traffic.classes as u64),
            ("network.nodes", self.network.nodes as u64),
            ("network.num_vcs", self.network.num_vcs as u64),
            ("network.vc_buf_size", self.network.vc_buf_size as u64),
            ("network.latency", self.network.latency),
            ("simulation.sample_period", self.simulation.sample_period),
            ("simulation.sim_count", self.simulation.sim_count as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{} must be positive", field)));
            }
        }

        self.resolve_classes().map(|_| ())
    }

    /// Resolves the per-class arrays into one [`ClassSpec`] per class.
    ///
    /// Every array is broadcast to `traffic.classes` entries by repeating its
    /// last element; each class's rates are broadcast the same way to the
    /// length of its size list. Fails if any class invariant is violated.
    pub fn resolve_classes(&self) -> ConfigResult<Vec<ClassSpec>> {
        let t = &self.traffic;
        let classes = t.classes;

        let traffic = broadcast("traffic.traffic", &t.traffic, classes)?;
        let packet_size = broadcast("traffic.packet_size", &t.packet_size, classes)?;
        let packet_size_rate = broadcast("traffic.packet_size_rate", &t.packet_size_rate, classes)?;
        let reply = broadcast("traffic.reply_class", &t.reply_class, classes)?;
        let injection_rate = broadcast("traffic.injection_rate", &t.injection_rate, classes)?;
        let injection_process = broadcast("traffic.injection_process", &t.injection_process, classes)?;
        let measure_stats = broadcast("traffic.measure_stats", &t.measure_stats, classes)?;

        let mut reply_class = Vec::with_capacity(classes);
        for (c, &r) in reply.iter().enumerate() {
            if r < 0 {
                reply_class.push(None);
            } else if (r as usize) < classes {
                reply_class.push(Some(r as ClassId));
            } else {
                return Err(ConfigError::Validation(format!(
                    "Class {} names reply class {} but only {} classes exist",
                    c, r, classes
                )));
            }
        }

        let mut request_class: Vec<Option<ClassId>> = vec![None; classes];
        for (c, r) in reply_class.iter().enumerate() {
            if let Some(r) = *r {
                if let Some(other) = request_class[r] {
                    return Err(ConfigError::Validation(format!(
                        "Classes {} and {} both name reply class {}",
                        other, c, r
                    )));
                }
                request_class[r] = Some(c);
            }
        }

        for c in 0..classes {
            if let (Some(req), Some(rep)) = (request_class[c], reply_class[c]) {
                return Err(ConfigError::Validation(format!(
                    "Class {} replies to class {} and cannot itself expect reply class {}",
                    c, req, rep
                )));
            }
        }

        let mut specs = Vec::with_capacity(classes);
        for c in 0..classes {
            let sizes = packet_size[c].clone();
            if sizes.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Class {} has no packet sizes",
                    c
                )));
            }
            if sizes.contains(&0) {
                return Err(ConfigError::Validation(format!(
                    "Class {} has a zero packet size",
                    c
                )));
            }

            let rates = broadcast("traffic.packet_size_rate", &packet_size_rate[c], sizes.len())?;
            if let Some(rate) = rates.iter().find(|&&r| r < 0) {
                return Err(ConfigError::Validation(format!(
                    "Class {} has negative packet size rate {}",
                    c, rate
                )));
            }
            let rates: Vec<u64> = rates.into_iter().map(|r| r as u64).collect();
            let rate_sum: u64 = rates.iter().sum();
            if sizes.len() > 1 && rate_sum == 0 {
                return Err(ConfigError::Validation(format!(
                    "Class {} has several packet sizes but their rates sum to zero",
                    c
                )));
            }

            let rate = injection_rate[c];
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!(
                    "Class {} injection rate {} is outside [0, 1]",
                    c, rate
                )));
            }
            injection_process[c].validate(rate).map_err(|msg| {
                ConfigError::Validation(format!("Class {}: {}", c, msg))
            })?;

            specs.push(ClassSpec {
                traffic: traffic[c].clone(),
                packet_sizes: sizes,
                packet_size_rates: rates,
                packet_size_rate_sum: rate_sum,
                reply_class: reply_class[c],
                request_class: request_class[c],
                injection_rate: rate,
                injection_process: injection_process[c].clone(),
                measure_stats: measure_stats[c],
            });
        }

        Ok(specs)
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Repeats the last element of `values` out to `len` entries, truncating
/// longer arrays.
fn broadcast<T: Clone>(field: &str, values: &[T], len: usize) -> ConfigResult<Vec<T>> {
    let last = values
        .last()
        .ok_or_else(|| ConfigError::Validation(format!("{} must not be empty", field)))?;
    let mut out: Vec<T> = values.iter().take(len).cloned().collect();
    out.resize(len, last.clone());
    Ok(out)
}

/// Builder for creating a [`TrafficConfig`] programmatically.
#[derive(Default)]
pub struct TrafficConfigBuilder {
    config: TrafficConfig,
}

impl TrafficConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.simulation.seed = seed;
        self
    }

    /// Sets the sample period and the number of warm-up and measured periods.
    pub fn phases(mut self, sample_period: SimTime, warmup_periods: u64, max_samples: u64) -> Self {
        self.config.simulation.sample_period = sample_period;
        self.config.simulation.warmup_periods = warmup_periods;
        self.config.simulation.max_samples = max_samples;
        self
    }

    /// Sets the number of independent trials.
    pub fn sim_count(mut self, count: usize) -> Self {
        self.config.simulation.sim_count = count;
        self
    }

    /// Sets the draining-phase timeout.
    pub fn drain_timeout(mut self, cycles: SimTime) -> Self {
        self.config.simulation.drain_timeout = cycles;
        self
    }

    /// Watches the flits of a packet.
    pub fn watch_packet(mut self, pid: PacketId) -> Self {
        self.config.simulation.watch_packets.push(pid);
        self
    }

    /// Sets the number of nodes.
    pub fn nodes(mut self, nodes: usize) -> Self {
        self.config.network.nodes = nodes;
        self
    }

    /// Sets the number of VCs and their depth.
    pub fn vcs(mut self, num_vcs: usize, vc_buf_size: usize) -> Self {
        self.config.network.num_vcs = num_vcs;
        self.config.network.vc_buf_size = vc_buf_size;
        self
    }

    /// Sets the fixed network latency.
    pub fn latency(mut self, latency: SimTime) -> Self {
        self.config.network.latency = latency;
        self
    }

    /// Sets the number of traffic classes.
    pub fn classes(mut self, classes: usize) -> Self {
        self.config.traffic.classes = classes;
        self
    }

    /// Sets the traffic pattern per class.
    pub fn traffic<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.config.traffic.traffic = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the packet sizes per class.
    pub fn packet_size(mut self, sizes: Vec<Vec<u32>>) -> Self {
        self.config.traffic.packet_size = sizes;
        self
    }

    /// Sets the packet size rates per class.
    pub fn packet_size_rate(mut self, rates: Vec<Vec<i64>>) -> Self {
        self.config.traffic.packet_size_rate = rates;
        self
    }

    /// Sets the reply class per class.
    pub fn reply_class(mut self, reply: Vec<i64>) -> Self {
        self.config.traffic.reply_class = reply;
        self
    }

    /// Sets the injection rate per class.
    pub fn injection_rate(mut self, rates: Vec<f64>) -> Self {
        self.config.traffic.injection_rate = rates;
        self
    }

    /// Sets the injection process per class.
    pub fn injection_process(mut self, kinds: Vec<InjectionKind>) -> Self {
        self.config.traffic.injection_process = kinds;
        self
    }

    /// Sets which classes are measured.
    pub fn measure_stats(mut self, measure: Vec<bool>) -> Self {
        self.config.traffic.measure_stats = measure;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<TrafficConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrafficConfig::new();
        assert_eq!(config.network.nodes, 16);
        assert_eq!(config.traffic.classes, 1);
        assert!(config.validate().is_ok());

        let specs = config.resolve_classes().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].traffic, "uniform");
        assert_eq!(specs[0].packet_sizes, vec![1]);
        assert_eq!(specs[0].reply_class, None);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
simulation:
  seed: 5
  sample_period: 100

network:
  nodes: 8
  num_vcs: 2

traffic:
  classes: 2
  traffic: [uniform, tornado]
  packet_size: [[1, 8]]
  packet_size_rate: [[3, 1]]
  reply_class: [1, -1]
  injection_rate: [0.05]
  injection_process:
    - type: on_off
      alpha: 0.5
      beta: 0.5
"#;

        let config = TrafficConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.seed, 5);
        assert_eq!(config.network.nodes, 8);
        assert_eq!(config.network.vc_buf_size, 8);

        let specs = config.resolve_classes().unwrap();
        assert_eq!(specs[1].traffic, "tornado");
        assert_eq!(specs[1].packet_sizes, vec![1, 8]);
        assert_eq!(specs[1].packet_size_rates, vec![3, 1]);
        assert_eq!(specs[0].reply_class, Some(1));
        assert_eq!(specs[1].request_class, Some(0));
        assert!(specs[1].is_reply());
        assert_eq!(
            specs[1].injection_process,
            InjectionKind::OnOff { alpha: 0.5, beta: 0.5 }
        );
    }

    #[test]
    fn test_json_parsing() {
        let json = r#"{
            "network": { "nodes": 4 },
            "traffic": { "classes": 1, "traffic": ["neighbor"] }
        }"#;

        let config = TrafficConfig::from_json(json).unwrap();
        assert_eq!(config.network.nodes, 4);
        assert_eq!(config.resolve_classes().unwrap()[0].traffic, "neighbor");
    }

    #[test]
    fn test_broadcast_repeats_last_element() {
        let config = TrafficConfigBuilder::new()
            .classes(3)
            .traffic(["uniform", "tornado"])
            .injection_rate(vec![0.1, 0.2, 0.3, 0.4])
            .build()
            .unwrap();

        let specs = config.resolve_classes().unwrap();
        let traffic: Vec<_> = specs.iter().map(|s| s.traffic.as_str()).collect();
        assert_eq!(traffic, vec!["uniform", "tornado", "tornado"]);
        let rates: Vec<_> = specs.iter().map(|s| s.injection_rate).collect();
        assert_eq!(rates, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_rates_broadcast_to_sizes() {
        let config = TrafficConfigBuilder::new()
            .packet_size(vec![vec![1, 2, 4]])
            .packet_size_rate(vec![vec![2]])
            .build()
            .unwrap();

        let spec = &config.resolve_classes().unwrap()[0];
        assert_eq!(spec.packet_size_rates, vec![2, 2, 2]);
        assert_eq!(spec.packet_size_rate_sum, 6);
    }

    #[test]
    fn test_validation_negative_rate() {
        let result = TrafficConfigBuilder::new()
            .packet_size(vec![vec![1, 2]])
            .packet_size_rate(vec![vec![1, -1]])
            .build();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_zero_rate_sum() {
        let result = TrafficConfigBuilder::new()
            .packet_size(vec![vec![1, 2]])
            .packet_size_rate(vec![vec![0]])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_single_size_ignores_rates() {
        let result = TrafficConfigBuilder::new()
            .packet_size(vec![vec![4]])
            .packet_size_rate(vec![vec![0]])
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_validation_reply_class_out_of_range() {
        let result = TrafficConfigBuilder::new()
            .classes(2)
            .reply_class(vec![2, -1])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_duplicate_reply_target() {
        let result = TrafficConfigBuilder::new()
            .classes(3)
            .reply_class(vec![2, 2, -1])
            .build();
        let err = result.unwrap_err().to_string();
        assert!(err.contains("both name reply class 2"));
    }

    #[test]
    fn test_validation_reply_cycle() {
        let result = TrafficConfigBuilder::new()
            .classes(2)
            .reply_class(vec![1, 0])
            .build();
        assert!(result.is_err());

        let self_reply = TrafficConfigBuilder::new().reply_class(vec![0]).build();
        assert!(self_reply.is_err());
    }

    #[test]
    fn test_validation_injection_rate() {
        let result = TrafficConfigBuilder::new().injection_rate(vec![1.5]).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_zero_nodes() {
        let result = TrafficConfigBuilder::new().nodes(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_array() {
        let yaml = r#"
traffic:
  traffic: []
"#;
        let result = TrafficConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unknown_format() {
        let result = TrafficConfig::from_file("config.toml");
        assert!(matches!(result, Err(ConfigError::UnknownFormat(_))));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = TrafficConfigBuilder::new()
            .nodes(8)
            .classes(2)
            .reply_class(vec![1, -1])
            .build()
            .unwrap();

        let yaml = config.to_yaml().unwrap();
        let restored = TrafficConfig::from_yaml(&yaml).unwrap();

        assert_eq!(config.network.nodes, restored.network.nodes);
        assert_eq!(
            config.resolve_classes().unwrap(),
            restored.resolve_classes().unwrap()
        );
    }
}
