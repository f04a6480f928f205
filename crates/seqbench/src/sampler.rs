//! [`Sampler`] and tightly related types.

use crate::{
    counters::{CounterError, CounterSource},
    reporter::{Reporter, SeqReporter, SessionReporter},
    workload::{self, WorkloadError},
    Channel, ConfigError, Estimate, Outcome, RoundSummary, SamplerConfig, SessionId,
    SessionOutput, Workload,
};

/// Errors that can occur when creating or running a [`Sampler`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SamplerError {
    /// Invalid configuration.
    #[error("invalid sampler configuration: {0}")]
    Config(#[from] ConfigError),
    /// Neither of the channels able to drive the sampler could be opened.
    #[error(
        "neither `instructions` nor `task-clock` counter could be opened; check that \
         performance counters are supported and permitted (e.g., `kernel.perf_event_paranoid`)"
    )]
    NoUsableChannel,
    /// Control operation on an open counter has failed.
    #[error(transparent)]
    Counter(#[from] CounterError),
    /// Workload has failed.
    #[error("workload failed for input size {input_size}: {error}")]
    Workload {
        /// Input size of the failed trial.
        input_size: u64,
        /// Error returned by the workload.
        #[source]
        error: WorkloadError,
    },
}

impl SamplerError {
    fn workload(input_size: u64, error: impl Into<WorkloadError>) -> Self {
        Self::Workload {
            input_size,
            error: error.into(),
        }
    }
}

/// Running statistics of a session.
#[derive(Debug)]
struct SessionStats {
    sum: i128,
    floor: i64,
    total_trials: u64,
    trials: u64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            sum: 0,
            // Lowered to the first count of the session
            floor: i64::MAX,
            total_trials: 0,
            trials: 0,
        }
    }

    fn push(&mut self, count: i64) {
        self.sum += i128::from(count);
        self.floor = self.floor.min(count);
        self.trials += 1;
    }
}

/// Adaptive sequential sampler.
///
/// For each input size, the sampler runs trials of a [`Workload`] in rounds, modeling counts
/// of the selected [`Channel`] as a shifted exponential distribution. After each round, it estimates
/// the relative error of the running minimum and either stops or chooses how many trials to add.
///
/// # Examples
///
/// ```
/// use seqbench::{black_box, ClockCounters, Sampler, SamplerConfig};
///
/// let mut sampler = Sampler::new(SamplerConfig::default(), ClockCounters::new())?;
/// let mut sizes = vec![];
/// sampler.collect_with(
///     64,
///     3,
///     |_| { /* untimed setup */ },
///     |_| { /* untimed teardown */ },
///     |size| {
///         black_box((0..size).map(black_box).sum::<u64>());
///     },
///     |output| sizes.push(output.input_size),
/// )?;
/// assert_eq!(sizes, [64, 128, 256]);
/// # Ok::<_, seqbench::SamplerError>(())
/// ```
#[derive(Debug)]
pub struct Sampler<C> {
    config: SamplerConfig,
    counters: C,
    channel_index: usize,
    channel: Channel,
    reporter: SeqReporter,
}

impl<C: CounterSource> Sampler<C> {
    /// Creates a sampler opening counter channels using the provided source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if neither the instruction counter
    /// nor the task clock can be opened.
    pub fn new(config: SamplerConfig, counters: C) -> Result<Self, SamplerError> {
        Self::from_parts(config, counters, SeqReporter::default())
    }

    /// Creates a sampler with the specified reporter. The reporter receives diagnostics about
    /// channel selection in addition to session events.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::new()`].
    pub fn with_reporter(
        config: SamplerConfig,
        counters: C,
        reporter: impl Reporter + 'static,
    ) -> Result<Self, SamplerError> {
        Self::from_parts(config, counters, SeqReporter(vec![Box::new(reporter)]))
    }

    fn from_parts(
        config: SamplerConfig,
        mut counters: C,
        mut reporter: SeqReporter,
    ) -> Result<Self, SamplerError> {
        config.validate()?;

        let statuses = counters.open(&Channel::REQUESTED);
        for (channel, &is_open) in Channel::REQUESTED.iter().zip(&statuses) {
            if !is_open {
                reporter.debug(&format_args!("counter `{channel}` is unavailable"));
            }
        }
        let (channel_index, channel) =
            Channel::select(&Channel::REQUESTED, &statuses).ok_or(SamplerError::NoUsableChannel)?;
        reporter.debug(&format_args!("sampling `{channel}` counter"));

        Ok(Self {
            config,
            counters,
            channel_index,
            channel,
            reporter,
        })
    }

    /// Adds a reporter to the sampler.
    pub fn add_reporter(&mut self, reporter: impl Reporter + 'static) -> &mut Self {
        self.reporter.0.push(Box::new(reporter));
        self
    }

    /// Returns the sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Returns the channel driving the statistical model.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the counter source.
    pub fn counters(&self) -> &C {
        &self.counters
    }

    /// Runs a session for each of `iteration_count` input sizes, starting from `initial_input_size`
    /// and doubling it after each session. The output of each session is passed to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workload or a counter control operation fails. The sessions
    /// completed before the error are passed to `sink`.
    pub fn collect<W: Workload>(
        &mut self,
        initial_input_size: u64,
        iteration_count: usize,
        mut workload: W,
        sink: impl FnMut(&SessionOutput),
    ) -> Result<(), SamplerError> {
        self.collect_inner(
            None,
            initial_input_size,
            iteration_count,
            &mut workload,
            sink,
        )
    }

    /// Same as [`Self::collect()`], but with the workload specified as infallible closures:
    /// untimed `setup` and `teardown`, and timed `run`.
    ///
    /// # Errors
    ///
    /// Returns an error if a counter control operation fails.
    pub fn collect_with(
        &mut self,
        initial_input_size: u64,
        iteration_count: usize,
        setup: impl FnMut(u64),
        teardown: impl FnMut(u64),
        run: impl FnMut(u64),
        sink: impl FnMut(&SessionOutput),
    ) -> Result<(), SamplerError> {
        let workload = workload::from_fns(setup, run, teardown);
        self.collect(initial_input_size, iteration_count, workload, sink)
    }

    pub(crate) fn collect_inner<W: Workload>(
        &mut self,
        name: Option<&str>,
        initial_input_size: u64,
        iteration_count: usize,
        workload: &mut W,
        mut sink: impl FnMut(&SessionOutput),
    ) -> Result<(), SamplerError> {
        let mut input_size = initial_input_size;
        for _ in 0..iteration_count {
            let id = SessionId::new(name, input_size);
            let output = self.run_reported_session(&id, workload)?;
            sink(&output);
            input_size = input_size.saturating_mul(2);
        }
        Ok(())
    }

    /// Runs a single sampling session for the specified input size.
    ///
    /// # Errors
    ///
    /// Returns an error if the workload or a counter control operation fails.
    pub fn run_session<W: Workload>(
        &mut self,
        input_size: u64,
        mut workload: W,
    ) -> Result<SessionOutput, SamplerError> {
        let id = SessionId::new(None, input_size);
        self.run_reported_session(&id, &mut workload)
    }

    fn run_reported_session<W: Workload>(
        &mut self,
        id: &SessionId,
        workload: &mut W,
    ) -> Result<SessionOutput, SamplerError> {
        let mut reporter = self.reporter.new_session(id);
        reporter.start_execution();
        match self.sample(id.input_size, workload, reporter.as_mut()) {
            Ok(output) => {
                reporter.ok(&output);
                Ok(output)
            }
            Err(err) => {
                reporter.error(&err);
                Err(err)
            }
        }
    }

    fn sample<W: Workload>(
        &mut self,
        input_size: u64,
        workload: &mut W,
        reporter: &mut dyn SessionReporter,
    ) -> Result<SessionOutput, SamplerError> {
        let config = self.config;
        let mut stats = SessionStats::new();
        let mut batch = config.n_init;
        let mut beta = f64::INFINITY;
        let mut outcome = Outcome::Exhausted;
        let mut rounds = 0;

        while rounds < config.max_rounds {
            rounds += 1;
            for _ in 0..=batch {
                let count = self.trial(input_size, workload)?;
                stats.push(count);
            }
            stats.total_trials += batch;

            let estimate = Estimate::new(stats.sum, stats.floor, stats.total_trials, config.alpha);
            beta = estimate.beta;
            if estimate.is_degenerate() {
                reporter.warning(&format_args!(
                    "mean count doesn't exceed the minimum ({}) after {} trials; \
                     treating the estimate as exact",
                    stats.floor, stats.trials
                ));
            } else if beta.is_infinite() {
                reporter.warning(&format_args!(
                    "non-positive minimum count ({}); relative error is undefined",
                    stats.floor
                ));
            }

            let next_batch = (beta > config.beta_min).then(|| {
                let projected_total = estimate.projected_total(config.alpha, config.beta_min);
                config.next_batch(projected_total, stats.total_trials)
            });
            reporter.round_completed(&RoundSummary {
                round: rounds,
                batch,
                total_trials: stats.total_trials,
                floor: stats.floor,
                beta,
                next_batch,
            });

            match next_batch {
                None => {
                    outcome = Outcome::Converged;
                    break;
                }
                Some(next_batch) => batch = next_batch,
            }
        }

        if outcome == Outcome::Exhausted {
            reporter.warning(&format_args!(
                "relative error did not converge to {:.2}% in {rounds} rounds",
                config.beta_min * 100.0
            ));
        }

        Ok(SessionOutput {
            input_size,
            channel: self.channel,
            sum: stats.sum,
            floor: stats.floor,
            total_trials: stats.total_trials,
            trials: stats.trials,
            rounds,
            beta,
            outcome,
        })
    }

    fn trial<W: Workload>(&mut self, input_size: u64, workload: &mut W) -> Result<i64, SamplerError> {
        workload
            .setup(input_size)
            .map_err(|err| SamplerError::workload(input_size, err))?;
        self.counters.start()?;
        let run_result = workload.run(input_size);
        self.counters.stop()?;
        run_result.map_err(|err| SamplerError::workload(input_size, err))?;
        workload
            .teardown(input_size)
            .map_err(|err| SamplerError::workload(input_size, err))?;
        Ok(self.counters.counts()[self.channel_index])
    }
}
