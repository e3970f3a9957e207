//! Sample collectors and the statistics registry.
//!
//! A [`Stats`] collector keeps the running sum, minimum and maximum of its
//! samples plus a fixed-width histogram. Collectors live in a
//! [`StatsRegistry`] arena owned by the engine; callers keep the returned
//! [`StatId`] handles and look collectors up by handle, or by name for
//! diagnostics.

use serde::Serialize;
use std::collections::HashMap;

/// A running sample collector with a histogram.
///
/// Minimum, maximum and average are `NaN` while no samples are held.
#[derive(Clone, Debug, Serialize)]
pub struct Stats {
    name: String,
    bin_size: f64,
    hist: Vec<u64>,
    num_samples: u64,
    sample_sum: f64,
    min: f64,
    max: f64,
}

impl Stats {
    /// Creates an empty collector with `num_bins` bins of width `bin_size`.
    ///
    /// Samples beyond the last bin are counted in the last bin.
    pub fn new(name: impl Into<String>, bin_size: f64, num_bins: usize) -> Self {
        assert!(bin_size > 0.0, "histogram bin size must be positive");
        assert!(num_bins > 0, "histogram needs at least one bin");
        Self {
            name: name.into(),
            bin_size,
            hist: vec![0; num_bins],
            num_samples: 0,
            sample_sum: 0.0,
            min: f64::NAN,
            max: f64::NAN,
        }
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.hist.iter_mut().for_each(|b| *b = 0);
        self.num_samples = 0;
        self.sample_sum = 0.0;
        self.min = f64::NAN;
        self.max = f64::NAN;
    }

    /// Adds one sample.
    pub fn add_sample(&mut self, value: f64) {
        self.num_samples += 1;
        self.sample_sum += value;
        // NaN compares false, so the first sample always lands
        if !(value >= self.min) {
            self.min = value;
        }
        if !(value <= self.max) {
            self.max = value;
        }

        let last = self.hist.len() - 1;
        let bin = if value <= 0.0 {
            0
        } else {
            ((value / self.bin_size) as usize).min(last)
        };
        self.hist[bin] += 1;
    }

    /// Mean of the samples.
    pub fn average(&self) -> f64 {
        if self.num_samples == 0 {
            return f64::NAN;
        }
        self.sample_sum / self.num_samples as f64
    }

    /// Smallest sample.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of the samples.
    pub fn sum(&self) -> f64 {
        self.sample_sum
    }

    /// Number of samples.
    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }

    /// Histogram bin counts.
    pub fn histogram(&self) -> &[u64] {
        &self.hist
    }

    /// Width of one histogram bin.
    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    /// Name of the collector.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Handle to a collector inside a [`StatsRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatId(usize);

/// An arena of named collectors.
///
/// Collectors are registered once and live exactly as long as the registry.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    collectors: Vec<Stats>,
    names: HashMap<String, StatId>,
}

impl StatsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new collector and returns its handle.
    ///
    /// Registering the same name twice is a programming error and panics.
    pub fn register(&mut self, name: impl Into<String>, bin_size: f64, num_bins: usize) -> StatId {
        let name = name.into();
        assert!(
            !self.names.contains_key(&name),
            "statistic {} registered twice",
            name
        );
        let id = StatId(self.collectors.len());
        self.collectors.push(Stats::new(name.clone(), bin_size, num_bins));
        self.names.insert(name, id);
        id
    }

    /// Returns the collector behind `id`.
    pub fn get(&self, id: StatId) -> &Stats {
        &self.collectors[id.0]
    }

    /// Returns the collector behind `id` mutably.
    pub fn get_mut(&mut self, id: StatId) -> &mut Stats {
        &mut self.collectors[id.0]
    }

    /// Looks a collector up by name.
    pub fn find(&self, name: &str) -> Option<&Stats> {
        self.names.get(name).map(|&id| self.get(id))
    }

    /// Adds a sample to the collector behind `id`.
    pub fn add_sample(&mut self, id: StatId, value: f64) {
        self.get_mut(id).add_sample(value);
    }

    /// Clears the collector behind `id`.
    pub fn clear(&mut self, id: StatId) {
        self.get_mut(id).clear();
    }

    /// Iterates over every collector in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Stats> {
        self.collectors.iter()
    }

    /// Returns the number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Exports every collector's summary as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let entries: serde_json::Map<String, serde_json::Value> = self
            .collectors
            .iter()
            .map(|s| {
                (
                    s.name().to_string(),
                    serde_json::json!({
                        "samples": s.num_samples(),
                        "min": finite_or_null(s.min()),
                        "avg": finite_or_null(s.average()),
                        "max": finite_or_null(s.max()),
                    }),
                )
            })
            .collect();
        serde_json::Value::Object(entries)
    }
}

fn finite_or_null(value: f64) -> serde_json::Value {
    if value.is_finite() {
        serde_json::json!(value)
    } else {
        serde_json::Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = Stats::new("lat", 1.0, 10);
        assert_eq!(stats.num_samples(), 0);
        assert!(stats.average().is_nan());
        assert!(stats.min().is_nan());
        assert!(stats.max().is_nan());
    }

    #[test]
    fn test_min_avg_max() {
        let mut stats = Stats::new("lat", 1.0, 10);
        for v in [4.0, 2.0, 9.0] {
            stats.add_sample(v);
        }
        assert_eq!(stats.num_samples(), 3);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
        assert_eq!(stats.average(), 5.0);
        assert_eq!(stats.sum(), 15.0);
    }

    #[test]
    fn test_histogram_saturates_last_bin() {
        let mut stats = Stats::new("lat", 2.0, 4);
        stats.add_sample(0.0);
        stats.add_sample(3.0);
        stats.add_sample(100.0);
        assert_eq!(stats.histogram(), &[1, 1, 0, 1]);
    }

    #[test]
    fn test_clear() {
        let mut stats = Stats::new("lat", 1.0, 4);
        stats.add_sample(3.0);
        stats.clear();
        assert_eq!(stats.num_samples(), 0);
        assert!(stats.min().is_nan());
        assert_eq!(stats.histogram(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_registry() {
        let mut registry = StatsRegistry::new();
        let a = registry.register("a", 1.0, 10);
        let b = registry.register("b", 1.0, 10);
        registry.add_sample(a, 5.0);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).num_samples(), 1);
        assert_eq!(registry.get(b).num_samples(), 0);
        assert_eq!(registry.find("a").map(Stats::average), Some(5.0));
        assert!(registry.find("missing").is_none());

        registry.clear(a);
        assert_eq!(registry.get(a).num_samples(), 0);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_registry_duplicate_name() {
        let mut registry = StatsRegistry::new();
        registry.register("a", 1.0, 10);
        registry.register("a", 1.0, 10);
    }

    #[test]
    fn test_registry_json() {
        let mut registry = StatsRegistry::new();
        let a = registry.register("a", 1.0, 10);
        registry.register("empty", 1.0, 10);
        registry.add_sample(a, 2.0);

        let json = registry.to_json();
        assert_eq!(json["a"]["samples"], 1);
        assert_eq!(json["a"]["avg"], 2.0);
        assert!(json["empty"]["avg"].is_null());
    }
}
