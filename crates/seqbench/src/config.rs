//! Sampler configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Error validating a [`SamplerConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `alpha` is outside `(0, 1)`.
    #[error("`alpha` must be in (0, 1), got {0}")]
    Alpha(f64),
    /// `beta_min` is outside `(0, 1)`.
    #[error("`beta_min` must be in (0, 1), got {0}")]
    BetaMin(f64),
    /// `min_incr` is zero.
    #[error("`min_incr` must be positive")]
    MinIncrement,
    /// `max_incr` is less than `min_incr`.
    #[error("`max_incr` ({max_incr}) must not be less than `min_incr` ({min_incr})")]
    MaxIncrement {
        /// Minimum batch increment.
        min_incr: u64,
        /// Maximum batch increment.
        max_incr: u64,
    },
    /// `max_rounds` is zero.
    #[error("`max_rounds` must be positive")]
    MaxRounds,
    /// `n_init` is zero.
    #[error("`n_init` must be positive")]
    InitialBatch,
}

/// Configuration of a [`Sampler`](crate::Sampler).
///
/// A session stops once the running minimum is within `beta_min` relative error of the true floor
/// with confidence `1 - alpha`, or after `max_rounds` rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplerConfig {
    /// Bound on the probability that the target error isn't achieved.
    pub alpha: f64,
    /// Target relative error of the floor estimate.
    pub beta_min: f64,
    /// Minimum number of trials added in a round after the first one.
    pub min_incr: u64,
    /// Maximum number of trials added in a round after the first one.
    pub max_incr: u64,
    /// Maximum number of rounds in a session.
    pub max_rounds: usize,
    /// Batch size for the first round.
    pub n_init: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta_min: 0.05,
            min_incr: 10,
            max_incr: 1_000,
            max_rounds: 20,
            n_init: 30,
        }
    }
}

impl SamplerConfig {
    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_interval = |value: f64| value > 0.0 && value < 1.0;
        if !unit_interval(self.alpha) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        if !unit_interval(self.beta_min) {
            return Err(ConfigError::BetaMin(self.beta_min));
        }
        if self.min_incr == 0 {
            return Err(ConfigError::MinIncrement);
        }
        if self.max_incr < self.min_incr {
            return Err(ConfigError::MaxIncrement {
                min_incr: self.min_incr,
                max_incr: self.max_incr,
            });
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::MaxRounds);
        }
        if self.n_init == 0 {
            return Err(ConfigError::InitialBatch);
        }
        Ok(())
    }

    /// Chooses the batch size for the next round given the projected and current total trial counts.
    pub(crate) fn next_batch(&self, projected_total: u64, total_trials: u64) -> u64 {
        if projected_total < total_trials {
            // The projection is inconsistent with the trials already taken
            self.min_incr
        } else {
            (projected_total - total_trials).clamp(self.min_incr, self.max_incr)
        }
    }
}
