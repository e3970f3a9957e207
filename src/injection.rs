//! Injection processes.
//!
//! An injection process decides, once per examined cycle and source, whether
//! a new packet is issued. A `false` answer is the ordinary "nothing to send
//! this cycle" outcome that keeps the injection timer advancing.

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::types::NodeIndex;

/// Injection process selection, as written in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InjectionKind {
    /// Issue with probability `rate` every cycle.
    #[default]
    Bernoulli,
    /// Two-state Markov source: an off source turns on with probability
    /// `alpha`, an on source turns off with probability `beta`, and an on
    /// source issues with the probability that yields `rate` on average.
    OnOff { alpha: f64, beta: f64 },
}

impl InjectionKind {
    /// Checks that this process can produce the offered load `rate`.
    pub fn validate(&self, rate: f64) -> Result<(), String> {
        match *self {
            InjectionKind::Bernoulli => Ok(()),
            InjectionKind::OnOff { alpha, beta } => {
                if !(alpha > 0.0 && alpha <= 1.0) || !(beta > 0.0 && beta <= 1.0) {
                    return Err(format!(
                        "on/off parameters alpha={} beta={} must lie in (0, 1]",
                        alpha, beta
                    ));
                }
                let on_rate = rate * (alpha + beta) / alpha;
                if on_rate > 1.0 {
                    return Err(format!(
                        "rate {} needs on-state probability {} above 1",
                        rate, on_rate
                    ));
                }
                Ok(())
            }
        }
    }

    /// Builds the process for `nodes` sources at offered load `rate`.
    pub fn build(&self, nodes: usize, rate: f64) -> Box<dyn InjectionProcess> {
        match *self {
            InjectionKind::Bernoulli => Box::new(BernoulliProcess::new(rate)),
            InjectionKind::OnOff { alpha, beta } => {
                Box::new(OnOffProcess::new(nodes, rate, alpha, beta))
            }
        }
    }
}

/// Per-source issue decision.
pub trait InjectionProcess: Send {
    /// Returns true if `source` issues a packet in the examined cycle.
    fn test(&mut self, source: NodeIndex, rng: &mut dyn RandomSource) -> bool;

    /// Restores the initial per-source state.
    fn reset(&mut self) {}
}

/// Issues with a fixed probability every cycle.
#[derive(Clone, Debug)]
pub struct BernoulliProcess {
    rate: f64,
}

impl BernoulliProcess {
    /// Creates a process issuing with probability `rate`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl InjectionProcess for BernoulliProcess {
    fn test(&mut self, _source: NodeIndex, rng: &mut dyn RandomSource) -> bool {
        rng.random_f64() < self.rate
    }
}

/// Bursty two-state source with independent state per node.
#[derive(Clone, Debug)]
pub struct OnOffProcess {
    alpha: f64,
    beta: f64,
    on_rate: f64,
    state: Vec<bool>,
}

impl OnOffProcess {
    /// Creates a process for `nodes` sources, all starting off.
    pub fn new(nodes: usize, rate: f64, alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            beta,
            on_rate: rate * (alpha + beta) / alpha,
            state: vec![false; nodes],
        }
    }

    /// Returns true if `source` is currently on.
    pub fn is_on(&self, source: NodeIndex) -> bool {
        self.state[source]
    }
}

impl InjectionProcess for OnOffProcess {
    fn test(&mut self, source: NodeIndex, rng: &mut dyn RandomSource) -> bool {
        let on = self.state[source];
        self.state[source] = if on {
            rng.random_f64() >= self.beta
        } else {
            rng.random_f64() < self.alpha
        };
        self.state[source] && rng.random_f64() < self.on_rate
    }

    fn reset(&mut self) {
        self.state.iter_mut().for_each(|s| *s = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SimRng;

    #[test]
    fn test_bernoulli_extremes() {
        let mut rng = SimRng::new(1);
        let mut never = BernoulliProcess::new(0.0);
        let mut always = BernoulliProcess::new(1.0);
        for source in 0..100 {
            assert!(!never.test(source % 4, &mut rng));
            assert!(always.test(source % 4, &mut rng));
        }
    }

    #[test]
    fn test_bernoulli_rate() {
        let mut rng = SimRng::new(2);
        let mut process = BernoulliProcess::new(0.25);
        let n = 40_000;
        let hits = (0..n).filter(|_| process.test(0, &mut rng)).count();
        let rate = hits as f64 / n as f64;
        assert!((rate - 0.25).abs() < 0.01, "observed rate {}", rate);
    }

    #[test]
    fn test_on_off_average_rate() {
        let mut rng = SimRng::new(3);
        let mut process = OnOffProcess::new(1, 0.1, 0.2, 0.2);
        let n = 100_000;
        let hits = (0..n).filter(|_| process.test(0, &mut rng)).count();
        let rate = hits as f64 / n as f64;
        assert!((rate - 0.1).abs() < 0.01, "observed rate {}", rate);
    }

    #[test]
    fn test_on_off_reset() {
        let mut rng = SimRng::new(4);
        let mut process = OnOffProcess::new(2, 0.5, 1.0, 1.0);
        process.test(0, &mut rng);
        assert!(process.is_on(0));
        process.reset();
        assert!(!process.is_on(0));
        assert!(!process.is_on(1));
    }

    #[test]
    fn test_validate() {
        assert!(InjectionKind::Bernoulli.validate(0.5).is_ok());
        assert!(InjectionKind::OnOff { alpha: 0.5, beta: 0.5 }.validate(0.4).is_ok());
        assert!(InjectionKind::OnOff { alpha: 0.1, beta: 0.9 }.validate(0.5).is_err());
        assert!(InjectionKind::OnOff { alpha: 0.0, beta: 0.5 }.validate(0.0).is_err());
    }

    #[test]
    fn test_kind_serde() {
        let kind: InjectionKind =
            serde_json::from_str(r#"{"type":"on_off","alpha":0.25,"beta":0.75}"#).unwrap();
        assert_eq!(kind, InjectionKind::OnOff { alpha: 0.25, beta: 0.75 });
        let kind: InjectionKind = serde_json::from_str(r#"{"type":"bernoulli"}"#).unwrap();
        assert_eq!(kind, InjectionKind::Bernoulli);
    }
}
