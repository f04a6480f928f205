//! Portable counter source based on the monotonic clock.

use std::time::Instant;

use super::{CounterError, CounterSource};
use crate::Channel;

/// Counter source measuring elapsed time with [`Instant`].
///
/// Only [`Channel::TaskClock`] can be opened; its counts are elapsed nanoseconds between
/// [`start()`](CounterSource::start()) and [`stop()`](CounterSource::stop()). Unlike the kernel task clock,
/// this includes time when the thread was descheduled.
#[derive(Debug, Default)]
pub struct ClockCounters {
    statuses: Vec<bool>,
    counts: Vec<i64>,
    started_at: Option<Instant>,
}

impl ClockCounters {
    /// Creates a source without open channels.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterSource for ClockCounters {
    fn open(&mut self, channels: &[Channel]) -> Vec<bool> {
        self.statuses = channels
            .iter()
            .map(|&channel| channel == Channel::TaskClock)
            .collect();
        self.counts = vec![0; channels.len()];
        self.started_at = None;
        self.statuses.clone()
    }

    fn start(&mut self) -> Result<(), CounterError> {
        self.counts.fill(0);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CounterError> {
        let elapsed = self.started_at.take().ok_or(CounterError::NotStarted)?.elapsed();
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        for (count, &is_open) in self.counts.iter_mut().zip(&self.statuses) {
            if is_open {
                *count = nanos;
            }
        }
        Ok(())
    }

    fn counts(&self) -> &[i64] {
        &self.counts
    }

    fn status(&self, index: usize) -> bool {
        self.statuses.get(index).copied().unwrap_or(false)
    }
}
