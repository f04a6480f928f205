//! Counter source based on Linux `perf_event_open`.

use std::{fmt, io};

use perf_event::{
    events::{Hardware, Software},
    Builder, Counter,
};

use super::{CounterError, CounterSource};
use crate::Channel;

/// Counter source backed by Linux performance counters observing the current process.
///
/// Kernel-mode events are excluded. Counter file descriptors are closed when the source is dropped
/// or when [`open()`](CounterSource::open()) is called again.
///
/// Depending on `kernel.perf_event_paranoid`, opening hardware counters may require
/// the `CAP_PERFMON` capability. Channels which cannot be opened are reported as unavailable.
#[derive(Default)]
pub struct PerfCounters {
    slots: Vec<(Channel, Option<Counter>)>,
    counts: Vec<i64>,
}

impl fmt::Debug for PerfCounters {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels: Vec<_> = self
            .slots
            .iter()
            .map(|(channel, counter)| (*channel, counter.is_some()))
            .collect();
        formatter
            .debug_struct("PerfCounters")
            .field("channels", &channels)
            .field("counts", &self.counts)
            .finish()
    }
}

impl PerfCounters {
    /// Creates a source without open channels.
    pub fn new() -> Self {
        Self::default()
    }

    fn build_counter(channel: Channel) -> io::Result<Counter> {
        let mut builder = match channel {
            Channel::TaskClock => Builder::new(Software::TASK_CLOCK),
            Channel::CpuClock => Builder::new(Software::CPU_CLOCK),
            Channel::Instructions => Builder::new(Hardware::INSTRUCTIONS),
            Channel::RefCycles => Builder::new(Hardware::REF_CPU_CYCLES),
        };
        builder.exclude_kernel(true);
        builder.build()
    }
}

impl CounterSource for PerfCounters {
    fn open(&mut self, channels: &[Channel]) -> Vec<bool> {
        self.slots = channels
            .iter()
            .map(|&channel| (channel, Self::build_counter(channel).ok()))
            .collect();
        self.counts = vec![0; channels.len()];
        self.slots
            .iter()
            .map(|(_, counter)| counter.is_some())
            .collect()
    }

    fn start(&mut self) -> Result<(), CounterError> {
        for ((channel, counter), count) in self.slots.iter_mut().zip(&mut self.counts) {
            if let Some(counter) = counter {
                counter.reset().map_err(|error| CounterError::Start {
                    channel: *channel,
                    error,
                })?;
                counter.enable().map_err(|error| CounterError::Start {
                    channel: *channel,
                    error,
                })?;
            }
            *count = 0;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CounterError> {
        for ((channel, counter), count) in self.slots.iter_mut().zip(&mut self.counts) {
            if let Some(counter) = counter {
                counter.disable().map_err(|error| CounterError::Stop {
                    channel: *channel,
                    error,
                })?;
                let value = counter.read().map_err(|error| CounterError::Read {
                    channel: *channel,
                    error,
                })?;
                *count = i64::try_from(value).unwrap_or(i64::MAX);
            }
        }
        Ok(())
    }

    fn counts(&self) -> &[i64] {
        &self.counts
    }

    fn status(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|(_, counter)| counter.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Whether counters can be opened depends on the environment.
    #[test]
    fn opening_counters() {
        let mut counters = PerfCounters::new();
        let statuses = counters.open(&Channel::REQUESTED);
        assert_eq!(statuses.len(), 4);
        for (idx, &is_open) in statuses.iter().enumerate() {
            assert_eq!(counters.status(idx), is_open);
        }
        assert!(!counters.status(4));
        assert_eq!(counters.counts(), [0; 4]);

        if statuses.iter().any(|&is_open| is_open) {
            counters.start().unwrap();
            let sum: u64 = (0..10_000_u64).map(std::hint::black_box).sum();
            std::hint::black_box(sum);
            counters.stop().unwrap();
            for (&count, &is_open) in counters.counts().iter().zip(&statuses) {
                assert!(count >= 0);
                if !is_open {
                    assert_eq!(count, 0);
                }
            }
        }
    }
}
