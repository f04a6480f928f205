//! Sequential reporter implementation.

use std::fmt;

use super::{Reporter, SessionReporter, TestReporter};
use crate::{RoundSummary, SessionId, SessionOutput};

#[derive(Debug, Default)]
pub(crate) struct SeqReporter(pub(crate) Vec<Box<dyn Reporter>>);

impl Reporter for SeqReporter {
    fn debug(&mut self, info: &dyn fmt::Display) {
        for reporter in &mut self.0 {
            reporter.debug(info);
        }
    }

    fn warning(&mut self, warning: &dyn fmt::Display) {
        for reporter in &mut self.0 {
            reporter.warning(warning);
        }
    }

    fn new_test(&mut self, name: &str) -> Box<dyn TestReporter> {
        struct Seq(Vec<Box<dyn TestReporter>>);

        impl TestReporter for Seq {
            fn ok(self: Box<Self>) {
                for reporter in self.0 {
                    reporter.ok();
                }
            }

            fn fail(self: Box<Self>, error: &dyn fmt::Display) {
                for reporter in self.0 {
                    reporter.fail(error);
                }
            }
        }

        let reporters = self.0.iter_mut().map(|reporter| reporter.new_test(name));
        Box::new(Seq(reporters.collect()))
    }

    fn new_session(&mut self, id: &SessionId) -> Box<dyn SessionReporter> {
        #[derive(Debug)]
        struct Seq(Vec<Box<dyn SessionReporter>>);

        impl SessionReporter for Seq {
            fn start_execution(&mut self) {
                for reporter in &mut self.0 {
                    reporter.start_execution();
                }
            }

            fn round_completed(&mut self, round: &RoundSummary) {
                for reporter in &mut self.0 {
                    reporter.round_completed(round);
                }
            }

            fn warning(&mut self, warning: &dyn fmt::Display) {
                for reporter in &mut self.0 {
                    reporter.warning(warning);
                }
            }

            fn ok(self: Box<Self>, output: &SessionOutput) {
                for reporter in self.0 {
                    reporter.ok(output);
                }
            }

            fn error(self: Box<Self>, error: &dyn fmt::Display) {
                for reporter in self.0 {
                    reporter.error(error);
                }
            }
        }

        let reporters = self.0.iter_mut().map(|reporter| reporter.new_session(id));
        Box::new(Seq(reporters.collect()))
    }
}
