//! Traffic-pattern factory registry.
//!
//! The registry maps pattern names, as they appear in configuration, to
//! factories, so the traffic engine can build one pattern per class without
//! knowing the concrete types.
//!
//! # Example
//!
//! ```
//! use flitsim::registry::{PatternParams, PatternRegistry};
//! use flitsim::pattern::TrafficPattern;
//! use flitsim::random::RandomSource;
//!
//! // Define a custom pattern
//! struct ToZero;
//! impl TrafficPattern for ToZero {
//!     fn dest(&mut self, _source: usize, _rng: &mut dyn RandomSource) -> usize { 0 }
//!     fn name(&self) -> &str { "to_zero" }
//! }
//!
//! // Create and populate registry
//! let mut registry = PatternRegistry::new();
//! registry.register("to_zero", |_nodes, _params| Ok(Box::new(ToZero)));
//!
//! // Create pattern from registry
//! let pattern = registry.create("to_zero", 4, &PatternParams::default()).unwrap();
//! assert_eq!(pattern.name(), "to_zero");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, ConfigResult};
use crate::pattern::{
    BitComplementPattern, NeighborPattern, RandomPermutationPattern, TornadoPattern,
    TrafficPattern, UniformPattern,
};

/// Parameters available to every pattern factory.
#[derive(Clone, Debug, Default)]
pub struct PatternParams {
    /// Seed for patterns that draw a fixed random structure
    pub seed: u64,
}

/// Type alias for pattern factory functions.
pub type PatternFactory =
    Arc<dyn Fn(usize, &PatternParams) -> ConfigResult<Box<dyn TrafficPattern>> + Send + Sync>;

/// A registry for traffic-pattern factories.
#[derive(Default, Clone)]
pub struct PatternRegistry {
    factories: HashMap<String, PatternFactory>,
}

impl PatternRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pattern factory with the given name.
    ///
    /// The factory receives the node count and the shared parameters.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(usize, &PatternParams) -> ConfigResult<Box<dyn TrafficPattern>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a pattern by name for a network of `nodes` nodes.
    pub fn create(
        &self,
        name: &str,
        nodes: usize,
        params: &PatternParams,
    ) -> ConfigResult<Box<dyn TrafficPattern>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPattern(name.to_string()))?;
        factory(nodes, params)
    }

    /// Returns true if a pattern is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the number of registered patterns.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no patterns are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered pattern names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a pattern.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }
}

impl std::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("PatternRegistry")
            .field("patterns", &names)
            .finish()
    }
}

/// Creates a registry with every built-in pattern registered.
///
/// Registered patterns:
/// - `uniform`
/// - `neighbor`
/// - `tornado`
/// - `bitcomp` (power-of-two node counts only)
/// - `randperm` (seeded from [`PatternParams::seed`])
pub fn create_default_registry() -> PatternRegistry {
    let mut registry = PatternRegistry::new();

    registry.register("uniform", |nodes, _| Ok(Box::new(UniformPattern::new(nodes))));
    registry.register("neighbor", |nodes, _| Ok(Box::new(NeighborPattern::new(nodes))));
    registry.register("tornado", |nodes, _| Ok(Box::new(TornadoPattern::new(nodes))));
    registry.register("bitcomp", |nodes, _| {
        BitComplementPattern::new(nodes)
            .map(|p| Box::new(p) as Box<dyn TrafficPattern>)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "bitcomp traffic needs a power-of-two node count, got {}",
                    nodes
                ))
            })
    });
    registry.register("randperm", |nodes, params| {
        Ok(Box::new(RandomPermutationPattern::new(nodes, params.seed)))
    });

    registry
}
