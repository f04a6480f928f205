//! Reporting of sampling progress and diagnostics.

use std::fmt;

pub(crate) use self::{
    printer::{PrintingReporter, Verbosity},
    seq::SeqReporter,
};
use crate::{RoundSummary, SessionId, SessionOutput};

mod printer;
mod seq;

/// Reporter of sampling events that allows to extend or observe sampling logic.
#[allow(unused_variables)]
pub trait Reporter: fmt::Debug {
    /// Reports debug information (e.g., which counter channels are available).
    ///
    /// The default implementation does nothing.
    fn debug(&mut self, info: &dyn fmt::Display) {
        // do nothing
    }

    /// Reports a warning not related to a specific session.
    ///
    /// The default implementation does nothing.
    fn warning(&mut self, warning: &dyn fmt::Display) {
        // do nothing
    }

    /// Initializes a test (a single unmeasured workload execution) with the specified name.
    ///
    /// The default implementation returns a no-op reporter.
    fn new_test(&mut self, name: &str) -> Box<dyn TestReporter> {
        Box::new(())
    }

    /// Initializes a sampling session with the specified ID.
    fn new_session(&mut self, id: &SessionId) -> Box<dyn SessionReporter>;
}

/// Reporter of events for a single workload run in the test mode.
pub trait TestReporter {
    /// Finishes the test successfully.
    fn ok(self: Box<Self>);
    /// Fails the test with the specified error or panic message.
    fn fail(self: Box<Self>, error: &dyn fmt::Display);
}

/// No-op implementation.
impl TestReporter for () {
    fn ok(self: Box<Self>) {
        // do nothing
    }

    fn fail(self: Box<Self>, _error: &dyn fmt::Display) {
        // do nothing
    }
}

/// Reporter of events for a single sampling session.
#[allow(unused_variables)]
pub trait SessionReporter: fmt::Debug {
    /// Reports that the session started executing.
    ///
    /// The default implementation does nothing.
    fn start_execution(&mut self) {
        // do nothing
    }

    /// Reports a completed round.
    ///
    /// The default implementation does nothing.
    fn round_completed(&mut self, round: &RoundSummary) {
        // do nothing
    }

    /// Reports a warning for the session (e.g., a degenerate estimate or an exhausted round budget).
    ///
    /// The default implementation does nothing.
    fn warning(&mut self, warning: &dyn fmt::Display) {
        // do nothing
    }

    /// Reports the session output.
    fn ok(self: Box<Self>, output: &SessionOutput);

    /// Reports an error that has aborted the session.
    ///
    /// The default implementation does nothing.
    fn error(self: Box<Self>, error: &dyn fmt::Display) {
        // do nothing
    }
}
