//! Outputs produced by the sampler.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Channel;

/// Identifier of a sampling session: an optional benchmark name and the input size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub(crate) name: Option<String>,
    pub(crate) input_size: u64,
}

impl SessionId {
    pub(crate) fn new(name: Option<&str>, input_size: u64) -> Self {
        Self {
            name: name.map(str::to_owned),
            input_size,
        }
    }

    /// Returns the benchmark name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the input size.
    pub fn input_size(&self) -> u64 {
        self.input_size
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(formatter, "{name}/{}", self.input_size)
        } else {
            write!(formatter, "{}", self.input_size)
        }
    }
}

/// How a sampling session has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Outcome {
    /// The target relative error was reached.
    Converged,
    /// The round budget was exhausted before reaching the target relative error.
    Exhausted,
}

/// Aggregate output of a sampling session for a single input size.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct SessionOutput {
    /// Input size passed to the workload.
    pub input_size: u64,
    /// Channel which counts were sampled.
    pub channel: Channel,
    /// Sum of counts over all executed trials.
    pub sum: i128,
    /// Estimated floor (minimum count over all trials).
    pub floor: i64,
    /// Total trial count as accounted by the statistical model. Each round executes one trial
    /// more than it accounts for.
    pub total_trials: u64,
    /// Number of trials actually executed.
    pub trials: u64,
    /// Number of executed rounds.
    pub rounds: usize,
    /// Relative error of the floor estimate after the last round.
    pub beta: f64,
    /// How the session has ended.
    pub outcome: Outcome,
}

impl SessionOutput {
    /// Returns the mean count per executed trial.
    #[allow(clippy::cast_precision_loss)] // fine for reporting
    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.trials as f64
    }

    /// Checks whether the session has reached the target relative error.
    pub fn is_converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }
}

/// Summary of a single round within a session.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct RoundSummary {
    /// 1-based round index.
    pub round: usize,
    /// Batch size for this round; the round executes `batch + 1` trials.
    pub batch: u64,
    /// Total trial count accounted by the model after this round.
    pub total_trials: u64,
    /// Floor estimate after this round.
    pub floor: i64,
    /// Relative error after this round.
    pub beta: f64,
    /// Batch size chosen for the next round, or `None` if the session has converged.
    pub next_batch: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId::new(Some("sort"), 64).to_string(), "sort/64");
        assert_eq!(SessionId::new(None, 128).to_string(), "128");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializing_output() {
        let output = SessionOutput {
            input_size: 64,
            channel: Channel::Instructions,
            sum: 31_000,
            floor: 1_000,
            total_trials: 30,
            trials: 31,
            rounds: 1,
            beta: 0.5,
            outcome: Outcome::Converged,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["channel"], "instructions");
        assert_eq!(json["outcome"], "converged");
        assert_eq!(json["floor"], 1_000);

        let restored: SessionOutput = serde_json::from_value(json).unwrap();
        assert_eq!(restored, output);
    }
}
