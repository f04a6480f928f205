//! [`Bencher`] and tightly related types.

use std::{any::Any, convert::Infallible, panic, process, thread};

use crate::{
    counters::CounterSource,
    options::{BenchOptions, IdMatcher},
    reporter::{PrintingReporter, Reporter, SeqReporter},
    workload::WorkloadError,
    Sampler, Workload,
};

/// Mode in which the bencher is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BenchMode {
    /// Testing the benchmark code. Enabled by running benchmarks via `cargo test`.
    Test,
    /// Collecting benchmark data (i.e., the main / default mode).
    Bench,
    /// Listing benchmark names. Enabled by specifying `--list` command-line arg.
    List,
}

/// Mode-specific data.
#[derive(Debug)]
enum BenchModeData {
    Test {
        should_fail: bool,
        reporter: SeqReporter,
    },
    Bench {
        sampler: Sampler<Box<dyn CounterSource>>,
    },
    List,
}

impl BenchModeData {
    fn mode(&self) -> BenchMode {
        match self {
            Self::Test { .. } => BenchMode::Test,
            Self::Bench { .. } => BenchMode::Bench,
            Self::List => BenchMode::List,
        }
    }
}

/// Benchmarking manager providing ability to define and run benchmarks.
///
/// In the bench mode, each benchmark is sampled by a [`Sampler`] for a sequence of input sizes
/// doubling after each session. In the test mode, each benchmark workload is executed once
/// for the initial input size without sampling.
///
/// # Examples
///
/// See [crate docs](index.html) for the examples of usage.
#[derive(Debug)]
pub struct Bencher {
    options: BenchOptions,
    id_matcher: IdMatcher,
    printer: PrintingReporter,
    mode: BenchModeData,
}

/// Parses configuration options from the environment.
impl Default for Bencher {
    fn default() -> Self {
        Self::new(clap::Parser::parse())
    }
}

impl Drop for Bencher {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        if let BenchModeData::Test { should_fail, .. } = &self.mode {
            if *should_fail {
                self.printer.report_error(None, &"There were test failures");
                process::exit(1);
            }
        }
    }
}

impl Bencher {
    fn new(options: BenchOptions) -> Self {
        let printer = PrintingReporter::new(options.styling(), options.verbosity());
        let id_matcher = match options.id_matcher() {
            Ok(matcher) => matcher,
            Err(err) => {
                printer.report_error(None, &err);
                process::exit(1);
            }
        };

        let mode = match options.mode() {
            BenchMode::Test => BenchModeData::Test {
                should_fail: false,
                reporter: SeqReporter(vec![Box::new(printer.clone())]),
            },
            BenchMode::Bench => BenchModeData::Bench {
                sampler: Self::create_sampler(&options, &printer),
            },
            BenchMode::List => BenchModeData::List,
        };

        Self {
            options,
            id_matcher,
            printer,
            mode,
        }
    }

    fn create_sampler(
        options: &BenchOptions,
        printer: &PrintingReporter,
    ) -> Sampler<Box<dyn CounterSource>> {
        let counters = match options.counter_source() {
            Ok(counters) => counters,
            Err(err) => {
                printer.report_error(None, &err);
                process::exit(1);
            }
        };
        printer.report_debug(format_args!("using counters: {counters:?}"));

        let config = options.sampler_config();
        match Sampler::with_reporter(config, counters, printer.clone()) {
            Ok(sampler) => sampler,
            Err(err) => {
                printer.report_error(None, &err);
                process::exit(1);
            }
        }
    }

    /// Adds a reporter to the bencher. Beware that bencher initialization may skew benchmark results.
    #[doc(hidden)] // not stable yet
    pub fn add_reporter(&mut self, reporter: impl Reporter + 'static) -> &mut Self {
        match &mut self.mode {
            BenchModeData::Test { reporter: seq, .. } => seq.0.push(Box::new(reporter)),
            BenchModeData::Bench { sampler } => {
                sampler.add_reporter(reporter);
            }
            BenchModeData::List => { /* nothing to report */ }
        }
        self
    }

    /// Gets the benchmarking mode.
    pub fn mode(&self) -> BenchMode {
        self.mode.mode()
    }

    /// Benchmarks a workload with the specified name.
    ///
    /// In the bench mode, a workload or counter error is reported and terminates the process
    /// with a non-zero exit code.
    pub fn bench(&mut self, name: &str, mut workload: impl Workload) -> &mut Self {
        if !self.id_matcher.matches(name) {
            return self;
        }

        let initial_size = self.options.initial_size;
        match &mut self.mode {
            BenchModeData::Test {
                should_fail,
                reporter,
            } => {
                let test_reporter = reporter.new_test(name);
                let result = if cfg!(panic = "unwind") {
                    let wrapped =
                        panic::AssertUnwindSafe(|| test_once(&mut workload, initial_size));
                    panic::catch_unwind(wrapped)
                        .unwrap_or_else(|payload| Err(panic_message(payload).into()))
                } else {
                    test_once(&mut workload, initial_size)
                };

                match result {
                    Ok(()) => test_reporter.ok(),
                    Err(err) => {
                        test_reporter.fail(&err);
                        *should_fail = true;
                    }
                }
            }
            BenchModeData::Bench { sampler } => {
                let iterations = self.options.iterations;
                let result =
                    sampler.collect_inner(Some(name), initial_size, iterations, &mut workload, |_| {
                        // outputs are consumed by reporters
                    });
                if result.is_err() {
                    // The error is already reported by the sampler
                    process::exit(1);
                }
            }
            BenchModeData::List => {
                PrintingReporter::report_list_item(name);
            }
        }
        self
    }

    /// Benchmarks a function taking the input size. Dropping the function output is not measured.
    pub fn bench_fn<T>(&mut self, name: &str, run: impl FnMut(u64) -> T) -> &mut Self {
        self.bench(name, OutputWorkload { run, output: None })
    }
}

/// Workload that drops the output of the previous run during teardown.
struct OutputWorkload<F, T> {
    run: F,
    output: Option<T>,
}

impl<F: FnMut(u64) -> T, T> Workload for OutputWorkload<F, T> {
    type Error = Infallible;

    fn run(&mut self, input_size: u64) -> Result<(), Self::Error> {
        self.output = Some((self.run)(input_size));
        Ok(())
    }

    fn teardown(&mut self, _input_size: u64) -> Result<(), Self::Error> {
        self.output = None;
        Ok(())
    }
}

fn test_once<W: Workload>(workload: &mut W, input_size: u64) -> Result<(), WorkloadError> {
    workload.setup(input_size).map_err(Into::into)?;
    workload.run(input_size).map_err(Into::into)?;
    workload.teardown(input_size).map_err(Into::into)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "workload panicked".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fmt, mem, rc::Rc};

    use clap::Parser;

    use super::*;
    use crate::{
        reporter::{SessionReporter, TestReporter},
        workload, SessionId, SessionOutput,
    };

    #[derive(Debug, Default, Clone)]
    struct TestLog(Rc<RefCell<Vec<String>>>);

    impl TestLog {
        fn take(&self) -> Vec<String> {
            mem::take(&mut *self.0.borrow_mut())
        }
    }

    impl Reporter for TestLog {
        fn new_test(&mut self, name: &str) -> Box<dyn TestReporter> {
            struct Test(TestLog, String);

            impl TestReporter for Test {
                fn ok(self: Box<Self>) {
                    self.0 .0.borrow_mut().push(format!("ok: {}", self.1));
                }

                fn fail(self: Box<Self>, error: &dyn fmt::Display) {
                    self.0 .0.borrow_mut().push(format!("fail: {}: {error}", self.1));
                }
            }

            Box::new(Test(self.clone(), name.to_owned()))
        }

        fn new_session(&mut self, id: &SessionId) -> Box<dyn SessionReporter> {
            #[derive(Debug)]
            struct Session(TestLog, SessionId);

            impl SessionReporter for Session {
                fn ok(self: Box<Self>, output: &SessionOutput) {
                    let message = format!("session: {} ({} trials)", self.1, output.trials);
                    self.0 .0.borrow_mut().push(message);
                }
            }

            Box::new(Session(self.clone(), id.clone()))
        }
    }

    fn test_bencher(args: &[&str]) -> Bencher {
        let args = ["bench", "--color=never", "-q"].iter().chain(args);
        Bencher::new(BenchOptions::try_parse_from(args).unwrap())
    }

    #[test]
    fn running_workloads_in_test_mode() {
        let log = TestLog::default();
        let mut bencher = test_bencher(&[]);
        assert_eq!(bencher.mode(), BenchMode::Test);
        bencher.add_reporter(log.clone());

        let mut sizes = vec![];
        bencher.bench_fn("sum", |size| {
            sizes.push(size);
            (0..size).sum::<u64>()
        });
        assert_eq!(sizes, [64]);
        assert_eq!(log.take(), ["ok: sum"]);
    }

    #[test]
    fn workload_errors_fail_tests() {
        let log = TestLog::default();
        let mut bencher = test_bencher(&["--initial-size", "16"]);
        bencher.add_reporter(log.clone());

        let workload = workload::from_fns(|_| {}, |_| {}, |_| {});
        bencher.bench("fine", workload);
        bencher.bench("failing", FailingWorkload);
        bencher.bench_fn("panicking", |size| {
            assert!(size > 100, "size is too small: {size}");
        });

        let log_lines = log.take();
        assert_eq!(log_lines.len(), 3, "{log_lines:?}");
        assert_eq!(log_lines[0], "ok: fine");
        assert_eq!(log_lines[1], "fail: failing: cannot run with size 16");
        assert!(
            log_lines[2].starts_with("fail: panicking: size is too small: 16"),
            "{log_lines:?}"
        );

        // Prevent the process from exiting on drop.
        if let BenchModeData::Test { should_fail, .. } = &mut bencher.mode {
            assert!(*should_fail);
            *should_fail = false;
        }
    }

    #[derive(Debug)]
    struct FailingWorkload;

    impl Workload for FailingWorkload {
        type Error = String;

        fn run(&mut self, input_size: u64) -> Result<(), Self::Error> {
            Err(format!("cannot run with size {input_size}"))
        }
    }

    #[test]
    fn filtering_benchmarks() {
        let log = TestLog::default();
        let mut bencher = test_bencher(&["--exact", "sum"]);
        bencher.add_reporter(log.clone());

        bencher
            .bench_fn("sum", |size| size * 2)
            .bench_fn("sum_fast", |size| size * 3);
        assert_eq!(log.take(), ["ok: sum"]);
    }

    #[test]
    fn sampling_in_bench_mode() {
        let log = TestLog::default();
        let mut bencher = test_bencher(&[
            "--bench",
            "--source=clock",
            "--iterations=2",
            "--initial-size=8",
            "--max-rounds=3",
        ]);
        assert_eq!(bencher.mode(), BenchMode::Bench);
        bencher.add_reporter(log.clone());

        bencher.bench_fn("sum", |size| (0..size).map(std::hint::black_box).sum::<u64>());
        let log_lines = log.take();
        assert_eq!(log_lines.len(), 2, "{log_lines:?}");
        assert!(log_lines[0].starts_with("session: sum/8 ("), "{log_lines:?}");
        assert!(log_lines[1].starts_with("session: sum/16 ("), "{log_lines:?}");
    }

    #[test]
    fn panic_messages() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload), "static message");
        let payload = panic::catch_unwind(|| panic!("formatted: {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload), "formatted: 42");
    }
}
