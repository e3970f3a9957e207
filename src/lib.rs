//! # flitsim
//!
//! The packet-flow core of a cycle-accurate interconnection-network
//! simulator: virtual-channel buffering with flow control, and a synthetic
//! traffic engine that drives request/reply transactions into a network and
//! collects per-class and per-pair latency statistics.
//!
//! ## Design Principles
//!
//! - **Time-Stepped**: everything advances in discrete global cycles, in a
//!   fixed per-cycle order, from one seeded random stream. Identical
//!   configuration and seed give identical results.
//! - **Composition over Hierarchy**: workload engines hold a shared
//!   [`TrafficCore`] and override phase hooks of the [`TrafficEngine`] trait.
//! - **Narrow Collaborators**: the network, traffic patterns, injection
//!   processes and the random source are traits; the engine never routes.
//! - **Typed Configuration**: per-class arrays are resolved once, at
//!   construction, and invalid configurations never produce an engine.
//!
//! ## Features
//!
//! - `parallel` - Run the points of a load sweep on a rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use flitsim::{Simulator, TrafficConfigBuilder, TrafficEngine};
//!
//! // Two classes: class 0 requests are answered by class 1 replies
//! let config = TrafficConfigBuilder::new()
//!     .seed(7)
//!     .nodes(8)
//!     .latency(10)
//!     .phases(100, 1, 3)
//!     .classes(2)
//!     .reply_class(vec![1, -1])
//!     .injection_rate(vec![0.05])
//!     .build()
//!     .unwrap();
//!
//! let mut sim = Simulator::from_config(&config).unwrap();
//! sim.run().unwrap();
//!
//! let tlat = sim.engine().overall_tlat(0);
//! assert!(tlat.avg >= 21.0);
//! println!("{}", sim.engine().report_header());
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use flitsim::{Simulator, TrafficConfig};
//!
//! let config = TrafficConfig::from_file("traffic.yaml")?;
//! flitsim::init_logging(&config.simulation.log_level);
//! let mut sim = Simulator::from_config(&config)?;
//! sim.run()?;
//! ```

pub mod types;
pub mod flit;
pub mod buffer;
pub mod config;
pub mod random;
pub mod pattern;
pub mod registry;
pub mod injection;
pub mod stats;
pub mod network;
pub mod engine;
pub mod report;
pub mod sweep;

// Re-export commonly used types
pub use types::{ClassId, FlitId, NodeIndex, PacketId, SimTime, TransactionId, VcIndex};
pub use flit::Flit;
pub use buffer::{Buffer, VirtualChannel};
pub use config::{ClassSpec, ConfigError, TrafficConfig, TrafficConfigBuilder};
pub use random::{RandomSource, SimRng};
pub use pattern::TrafficPattern;
pub use registry::{create_default_registry, PatternRegistry};
pub use injection::{InjectionKind, InjectionProcess};
pub use stats::{StatId, Stats, StatsRegistry};
pub use network::{DelayNetwork, Network};
pub use engine::{SimError, SimState, Simulator, SyntheticTrafficEngine, TrafficCore, TrafficEngine};
pub use report::SimulationReport;
pub use sweep::{run_load_sweep, SweepPoint};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// overrides `level` when set. Flits of watched packets log on the `watch`
/// target, so `RUST_LOG=warn,watch=info` shows only those.
///
/// # Example
///
/// ```rust,ignore
/// flitsim::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}
