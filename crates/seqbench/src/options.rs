use std::{io, io::IsTerminal};

use clap::{ColorChoice, Parser, ValueEnum};
use regex::Regex;

use crate::{
    bencher::BenchMode,
    counters::{ClockCounters, CounterSource},
    reporter::Verbosity,
    SamplerConfig,
};

/// Source of counters used by benchmark executables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SourceKind {
    /// Linux performance counters.
    Perf,
    /// Monotonic clock; only measures elapsed time.
    Clock,
}

impl SourceKind {
    const DEFAULT: Self = if cfg!(all(feature = "perf", target_os = "linux")) {
        Self::Perf
    } else {
        Self::Clock
    };
}

#[derive(Debug, thiserror::Error)]
#[error("`perf` counters are not supported by this build; use `--source clock`")]
pub(crate) struct UnsupportedSource;

#[allow(clippy::struct_excessive_bools)] // fine for command-line args
#[derive(Debug, Clone, Parser)]
pub(crate) struct BenchOptions {
    /// Whether to run benchmarks as opposed to tests.
    #[arg(long, hide = true)]
    bench: bool,

    /// Source of counters.
    #[arg(long, value_enum, env = "SEQBENCH_SOURCE", default_value_t = SourceKind::DEFAULT)]
    pub source: SourceKind,
    /// Bound on the probability that the target relative error isn't achieved.
    #[arg(long, env = "SEQBENCH_ALPHA", default_value_t = SamplerConfig::default().alpha)]
    pub alpha: f64,
    /// Target relative error of the estimated floor.
    #[arg(long, env = "SEQBENCH_BETA_MIN", default_value_t = SamplerConfig::default().beta_min)]
    pub beta_min: f64,
    /// Minimum number of trials added in a round.
    #[arg(long, value_name = "TRIALS", env = "SEQBENCH_MIN_INCR", default_value_t = SamplerConfig::default().min_incr)]
    pub min_incr: u64,
    /// Maximum number of trials added in a round.
    #[arg(long, value_name = "TRIALS", env = "SEQBENCH_MAX_INCR", default_value_t = SamplerConfig::default().max_incr)]
    pub max_incr: u64,
    /// Maximum number of rounds for a single input size.
    #[arg(long, env = "SEQBENCH_MAX_ROUNDS", default_value_t = SamplerConfig::default().max_rounds)]
    pub max_rounds: usize,
    /// Number of trials in the first round.
    #[arg(long, value_name = "TRIALS", env = "SEQBENCH_N_INIT", default_value_t = SamplerConfig::default().n_init)]
    pub n_init: u64,
    /// Input size for the first session. Doubled for each following session.
    #[arg(long, value_name = "SIZE", env = "SEQBENCH_INITIAL_SIZE", default_value_t = 64)]
    pub initial_size: u64,
    /// Number of input sizes to sample.
    #[arg(long, env = "SEQBENCH_ITERATIONS", default_value_t = 4)]
    pub iterations: usize,

    /// Sets coloring of the program output.
    #[arg(long, env = "COLOR", default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
    /// Output detailed sampling information.
    #[arg(long)]
    pub verbose: bool,
    /// Output only basic sampling information.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// List all benchmarks instead of running them.
    #[arg(long)]
    list: bool,
    /// Match benchmark names exactly.
    #[arg(long)]
    exact: bool,
    /// Skip benchmarks whose names do not match FILTER (a regular expression).
    #[arg(name = "FILTER")]
    filter: Option<String>,
}

impl BenchOptions {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            alpha: self.alpha,
            beta_min: self.beta_min,
            min_incr: self.min_incr,
            max_incr: self.max_incr,
            max_rounds: self.max_rounds,
            n_init: self.n_init,
        }
    }

    pub fn mode(&self) -> BenchMode {
        if self.list {
            BenchMode::List
        } else if self.bench {
            BenchMode::Bench
        } else {
            BenchMode::Test
        }
    }

    pub fn styling(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stderr().is_terminal(),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    pub fn id_matcher(&self) -> Result<IdMatcher, regex::Error> {
        Ok(match &self.filter {
            None => IdMatcher::Any,
            Some(str) if self.exact => IdMatcher::Exact(str.clone()),
            Some(re) => IdMatcher::Regex(Regex::new(re)?),
        })
    }

    pub fn counter_source(&self) -> Result<Box<dyn CounterSource>, UnsupportedSource> {
        match self.source {
            #[cfg(all(feature = "perf", target_os = "linux"))]
            SourceKind::Perf => Ok(Box::new(crate::counters::PerfCounters::new())),
            #[cfg(not(all(feature = "perf", target_os = "linux")))]
            SourceKind::Perf => Err(UnsupportedSource),
            SourceKind::Clock => Ok(Box::new(ClockCounters::new())),
        }
    }
}

#[derive(Debug)]
pub(crate) enum IdMatcher {
    Any,
    Exact(String),
    Regex(Regex),
}

impl IdMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(s) => s == name,
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = BenchOptions::try_parse_from(["bench"]).unwrap();
        assert_eq!(options.mode(), BenchMode::Test);
        assert_eq!(options.sampler_config(), SamplerConfig::default());
        assert_eq!(options.initial_size, 64);
        assert_eq!(options.verbosity(), Verbosity::Normal);
        assert!(matches!(options.id_matcher().unwrap(), IdMatcher::Any));
    }

    #[test]
    fn parsing_sampler_options() {
        let args = [
            "bench",
            "--bench",
            "--source",
            "clock",
            "--alpha",
            "0.01",
            "--max-rounds=5",
            "--n-init",
            "10",
            "--iterations",
            "3",
            "-q",
        ];
        let options = BenchOptions::try_parse_from(args).unwrap();
        assert_eq!(options.mode(), BenchMode::Bench);
        assert_eq!(options.source, SourceKind::Clock);
        assert_eq!(options.verbosity(), Verbosity::Quiet);
        assert_eq!(options.iterations, 3);

        let config = options.sampler_config();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.n_init, 10);
        assert_eq!(config.beta_min, SamplerConfig::default().beta_min);

        let counters = options.counter_source().unwrap();
        assert!(format!("{counters:?}").contains("ClockCounters"));
    }

    #[test]
    fn list_mode_and_filters() {
        let options = BenchOptions::try_parse_from(["bench", "--list", "--exact", "sort"]).unwrap();
        assert_eq!(options.mode(), BenchMode::List);
        let matcher = options.id_matcher().unwrap();
        assert!(matcher.matches("sort"));
        assert!(!matcher.matches("sort_fast"));

        let options = BenchOptions::try_parse_from(["bench", "^so"]).unwrap();
        let matcher = options.id_matcher().unwrap();
        assert!(matcher.matches("sort_fast"));
        assert!(!matcher.matches("resort"));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        let result = BenchOptions::try_parse_from(["bench", "--verbose", "--quiet"]);
        assert!(result.is_err());
    }
}
