//! Counter sources: facilities opening, starting, stopping and reading event counters.

use std::{fmt, io};

#[cfg(all(feature = "perf", target_os = "linux"))]
pub use self::perf::PerfCounters;
pub use self::clock::ClockCounters;
use crate::Channel;

mod clock;
#[cfg(all(feature = "perf", target_os = "linux"))]
mod perf;

/// Error performing a control operation on an open counter channel.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CounterError {
    /// Error resetting or enabling a counter.
    #[error("failed starting `{channel}` counter: {error}")]
    Start {
        /// Channel that has failed.
        channel: Channel,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },
    /// Error disabling a counter.
    #[error("failed stopping `{channel}` counter: {error}")]
    Stop {
        /// Channel that has failed.
        channel: Channel,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },
    /// Error reading the accumulated count.
    #[error("failed reading `{channel}` counter: {error}")]
    Read {
        /// Channel that has failed.
        channel: Channel,
        /// Underlying I/O error.
        #[source]
        error: io::Error,
    },
    /// Counters were stopped without being started.
    #[error("counters were stopped without being started")]
    NotStarted,
}

/// Source of event counts for a set of [`Channel`]s.
///
/// Implementations acquire OS-level handles in [`Self::open()`] and must release them when dropped.
/// A single source must not be shared among concurrently running measurements: starting and stopping
/// toggles the state of all open channels.
pub trait CounterSource: fmt::Debug {
    /// Opens the requested channels, replacing previously opened ones. Returns the open status
    /// of each requested channel; failing to open a channel is not an error.
    fn open(&mut self, channels: &[Channel]) -> Vec<bool>;

    /// Resets and enables all open channels.
    ///
    /// # Errors
    ///
    /// Returns an error if a control operation on an open channel fails.
    fn start(&mut self) -> Result<(), CounterError>;

    /// Disables all open channels and reads their accumulated counts.
    ///
    /// # Errors
    ///
    /// Returns an error if a control or read operation on an open channel fails.
    fn stop(&mut self) -> Result<(), CounterError>;

    /// Returns counts read by the latest [`Self::stop()`] call, one per channel in the order they
    /// were requested in [`Self::open()`]. Unavailable channels report 0.
    fn counts(&self) -> &[i64];

    /// Checks whether the channel with the specified index (in the order passed to [`Self::open()`])
    /// is usable.
    fn status(&self, index: usize) -> bool;
}

impl<C: CounterSource + ?Sized> CounterSource for Box<C> {
    fn open(&mut self, channels: &[Channel]) -> Vec<bool> {
        (**self).open(channels)
    }

    fn start(&mut self) -> Result<(), CounterError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), CounterError> {
        (**self).stop()
    }

    fn counts(&self) -> &[i64] {
        (**self).counts()
    }

    fn status(&self, index: usize) -> bool {
        (**self).status(index)
    }
}
