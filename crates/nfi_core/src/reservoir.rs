//! Liquid State Machine Reservoir
//!
//! A fixed random recurrent transform used purely as a nonlinear feature
//! extractor: weights are sampled once at construction and frozen, and only
//! the state vector mutates afterwards. The state accumulates history, so
//! the transform is deliberately not idempotent: evaluating the same input
//! twice yields different states while decay < 1.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::encoder::SpikeFeature;
use crate::error::{FleetError, Result};

/// Magnitude bound for sampled reservoir weights.
const WEIGHT_SCALE: f32 = 0.1;

/// Tunable reservoir parameters, frozen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservoirConfig {
    /// Number of reservoir units. The state vector keeps exactly this
    /// length for the reservoir's lifetime.
    pub units: usize,
    /// Retention factor applied to the previous state each update. Must lie
    /// strictly inside (0, 1).
    pub decay: f32,
    /// Proportionality constant mapping spike intensity to driven units: an
    /// input of intensity `i` activates `floor(i * units / input_scale)`
    /// leading units, bounded by `units`.
    pub input_scale: f32,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            units: 50,
            decay: 0.9,
            input_scale: 10.0,
        }
    }
}

impl ReservoirConfig {
    pub fn validate(&self) -> Result<()> {
        if self.units == 0 {
            return Err(FleetError::InvalidParameter(
                "reservoir unit count must be positive".to_string(),
            ));
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(FleetError::InvalidParameter(format!(
                "decay must lie strictly in (0, 1), got {}",
                self.decay
            )));
        }
        if !(self.input_scale > 0.0) {
            return Err(FleetError::InvalidParameter(format!(
                "input scale must be positive, got {}",
                self.input_scale
            )));
        }
        Ok(())
    }
}

/// Versioned reservoir state: one activation per unit, each in (-1, 1).
///
/// Represents accumulated history, not just the current input. Each
/// [`Reservoir::process`] call consumes the previous version by value and
/// installs the next one, so exactly one current version exists and
/// snapshots handed out for logging or tests can never change underneath
/// their holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    values: Vec<f32>,
    version: u64,
}

impl StateVector {
    /// The zero state, version 0.
    pub fn zero(units: usize) -> Self {
        Self {
            values: vec![0.0; units],
            version: 0,
        }
    }

    /// An arbitrary snapshot, version 0. For diagnostics and tests; inside
    /// the pipeline only a reservoir produces states.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self { values, version: 0 }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// How many updates produced this state.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mean absolute activation across units; the raw confidence signal.
    pub fn mean_abs(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|v| v.abs()).sum::<f32>() / self.values.len() as f32
    }
}

/// The reservoir itself: a frozen `units x units` weight matrix plus the
/// single current state version.
#[derive(Debug, Clone)]
pub struct Reservoir {
    config: ReservoirConfig,
    /// Row-major weight matrix, sampled once and never updated.
    weights: Vec<f32>,
    state: StateVector,
}

impl Reservoir {
    /// Reservoir with weights drawn from the thread RNG.
    pub fn new(config: ReservoirConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_rng(config, &mut rand::thread_rng()))
    }

    /// Reservoir with weights drawn from a seeded ChaCha stream. Identical
    /// seeds give identical weight matrices, which makes whole pipelines
    /// reproducible in tests.
    pub fn with_seed(config: ReservoirConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_rng(config, &mut ChaCha8Rng::seed_from_u64(seed)))
    }

    fn from_rng(config: ReservoirConfig, rng: &mut impl Rng) -> Self {
        let n = config.units;
        let weights = (0..n * n)
            .map(|_| rng.gen_range(-1.0f32..1.0) * WEIGHT_SCALE)
            .collect();
        Self {
            config,
            weights,
            state: StateVector::zero(n),
        }
    }

    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    /// The current state version.
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Drive the reservoir one step with a spike feature. Never fails for
    /// finite inputs; the returned vector is an independent copy.
    ///
    /// Update rule: `state = tanh(state * decay + W . input)`, element-wise.
    /// Calls on one reservoir must not interleave; `&mut self` enforces that
    /// within safe code.
    pub fn process(&mut self, feature: &SpikeFeature) -> StateVector {
        let n = self.config.units;
        let input = self.input_vector(feature);

        // Consume the previous version; exactly one current state survives.
        let prev = std::mem::replace(&mut self.state, StateVector::zero(n));

        let mut values = Vec::with_capacity(n);
        for row in 0..n {
            let row_weights = &self.weights[row * n..(row + 1) * n];
            let drive: f32 = row_weights.iter().zip(&input).map(|(w, x)| w * x).sum();
            values.push((prev.values[row] * self.config.decay + drive).tanh());
        }

        let next = StateVector {
            values,
            version: prev.version + 1,
        };
        self.state = next.clone();
        next
    }

    /// Map a spike feature to the input vector: intensity sets a
    /// proportional number of leading units (see
    /// [`ReservoirConfig::input_scale`]), the rest stay zero.
    fn input_vector(&self, feature: &SpikeFeature) -> Vec<f32> {
        let n = self.config.units;
        let mut input = vec![0.0f32; n];
        let active = ((feature.intensity * n as f32 / self.config.input_scale) as usize).min(n);
        for slot in &mut input[..active] {
            *slot = feature.intensity;
        }
        input
    }
}
