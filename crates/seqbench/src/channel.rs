//! Counter channels.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Event source which can be counted by a [`CounterSource`](crate::CounterSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Channel {
    /// Software task clock (nanoseconds the task was running).
    TaskClock,
    /// Software CPU clock (nanoseconds of a per-CPU high-resolution timer).
    CpuClock,
    /// Hardware count of retired instructions.
    Instructions,
    /// Hardware reference cycles (not affected by frequency scaling).
    RefCycles,
}

impl Channel {
    /// Channels requested from a counter source when a [`Sampler`](crate::Sampler) is created,
    /// in the order they are opened.
    pub const REQUESTED: [Self; 4] = [
        Self::TaskClock,
        Self::CpuClock,
        Self::Instructions,
        Self::RefCycles,
    ];

    /// Channels that may drive the sampler, from the most to the least preferred.
    pub(crate) const PRIORITY: [Self; 2] = [Self::Instructions, Self::TaskClock];

    /// Returns the human-readable channel name.
    pub fn name(self) -> &'static str {
        match self {
            Self::TaskClock => "task-clock",
            Self::CpuClock => "cpu-clock",
            Self::Instructions => "instructions",
            Self::RefCycles => "ref-cycles",
        }
    }

    /// Checks whether this channel is backed by a hardware performance counter.
    pub fn is_hardware(self) -> bool {
        matches!(self, Self::Instructions | Self::RefCycles)
    }

    /// Selects the channel driving the statistical model given the open statuses of `channels`.
    /// Returns the index of the selected channel in `channels`.
    pub(crate) fn select(channels: &[Self], statuses: &[bool]) -> Option<(usize, Self)> {
        Self::PRIORITY.into_iter().find_map(|preferred| {
            channels
                .iter()
                .zip(statuses)
                .position(|(&channel, &is_open)| channel == preferred && is_open)
                .map(|idx| (idx, preferred))
        })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_preferred() {
        let selected = Channel::select(&Channel::REQUESTED, &[true, true, true, true]);
        assert_eq!(selected, Some((2, Channel::Instructions)));
    }

    #[test]
    fn falling_back_to_task_clock() {
        let selected = Channel::select(&Channel::REQUESTED, &[true, true, false, true]);
        assert_eq!(selected, Some((0, Channel::TaskClock)));
    }

    #[test]
    fn cpu_clock_and_cycles_are_not_selected() {
        let selected = Channel::select(&Channel::REQUESTED, &[false, true, false, true]);
        assert_eq!(selected, None);
        assert_eq!(Channel::select(&Channel::REQUESTED, &[]), None);
    }

    #[test]
    fn channel_names() {
        let names: Vec<_> = Channel::REQUESTED.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            ["task-clock", "cpu-clock", "instructions", "ref-cycles"]
        );
        assert!(Channel::RefCycles.is_hardware());
        assert!(!Channel::CpuClock.is_hardware());
    }
}
