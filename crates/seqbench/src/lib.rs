//! `seqbench` is an in-process micro-benchmarking engine with an **adaptive sequential sampler**.
//! Instead of running a fixed number of iterations, it measures a workload in rounds and stops
//! as soon as the minimum observed count (e.g., the number of retired instructions) is estimated
//! with the requested relative error.
//!
//! # How it works
//!
//! Counts of a measured workload are modeled as a shifted exponential distribution: a hard floor
//! (the cost of the workload without any interference) plus an exponentially distributed
//! noise. After each round of trials, the sampler computes the maximum likelihood estimates
//! of the floor and the noise rate, and derives the relative error `beta` of the floor estimate
//! that holds with probability at least `1 - alpha`. Sampling for an input size stops once
//! `beta` drops to the target; otherwise, the sampler projects how many trials are needed and
//! schedules a bounded batch of them.
//!
//! Counts are collected via [Linux performance counters](https://man7.org/linux/man-pages/man2/perf_event_open.2.html)
//! (the retired instruction counter if available, with the task clock as a fallback),
//! or via a monotonic clock on other platforms.
//!
//! # How to use
//!
//! Define a benchmark binary and include it into your crate manifest:
//!
//! ```toml
//! [[bench]]
//! name = "your_bench"
//! harness = false
//! ```
//!
//! In the bench source (`benches/your_bench.rs`), define a function with signature `fn(&mut` [`Bencher`]`)`
//! and wrap it in the [`main!`] macro:
//!
//! ```
//! use seqbench::Bencher;
//!
//! fn benchmarks(bencher: &mut Bencher) {
//!     // define your benchmarking code here
//! }
//!
//! seqbench::main!(benchmarks);
//! ```
//!
//! Run benchmarks as usual using `cargo bench` (or `cargo test --bench ...` to test them).
//!
//! ## Configuration options
//!
//! Run `cargo bench ... -- --help` to get help on the supported configuration options. Some of the
//! common options are:
//!
//! - `--list`: lists benchmarks without running them.
//! - `--alpha` / `--beta-min`: confidence parameter and the target relative error.
//! - `--initial-size` / `--iterations`: the first input size and the number of sizes to sample.
//!   The input size is doubled after each session.
//! - `--source clock`: uses the monotonic clock instead of performance counters.
//!
//! Sampler options can also be set via `SEQBENCH_*` env vars, e.g. `SEQBENCH_ALPHA`.
//!
//! # Crate features
//!
//! ## `perf`
//!
//! *(On by default)*
//!
//! Enables [`PerfCounters`] based on `perf_event_open`. Only has an effect on Linux.
//!
//! ## `serde`
//!
//! *(Off by default)*
//!
//! Derives `serde::{Serialize, Deserialize}` for [`SessionOutput`], [`SamplerConfig`] and related
//! types. Useful to export outputs with a custom [`Reporter`](reporter::Reporter).
//!
//! # Examples
//!
//! The entrypoint for defining benchmarks is [`Bencher`].
//!
//! ```
//! use seqbench::{black_box, Bencher, Workload};
//! use std::convert::Infallible;
//!
//! /// Sorting workload with untimed setup.
//! #[derive(Debug, Default)]
//! struct Sort {
//!     values: Vec<u64>,
//! }
//!
//! impl Workload for Sort {
//!     type Error = Infallible;
//!
//!     fn setup(&mut self, input_size: u64) -> Result<(), Self::Error> {
//!         self.values = (0..input_size).rev().collect();
//!         Ok(())
//!     }
//!
//!     fn run(&mut self, _input_size: u64) -> Result<(), Self::Error> {
//!         black_box(&mut self.values).sort_unstable();
//!         Ok(())
//!     }
//! }
//!
//! fn benchmarks(bencher: &mut Bencher) {
//!     bencher
//!         .bench_fn("sum", |size| (0..black_box(size)).sum::<u64>())
//!         .bench("sort", Sort::default());
//! }
//!
//! seqbench::main!(benchmarks);
//! ```
//!
//! The sampler can be used directly as well:
//!
//! ```
//! use seqbench::{black_box, ClockCounters, Sampler, SamplerConfig};
//!
//! let config = SamplerConfig {
//!     alpha: 0.01,
//!     ..SamplerConfig::default()
//! };
//! let mut sampler = Sampler::new(config, ClockCounters::new())?;
//! let mut workload = seqbench::from_fns(|_| {}, |size| drop(black_box(vec![0_u8; size as usize])), |_| {});
//! let output = sampler.run_session(1_024, &mut workload)?;
//! assert!(output.floor > 0);
//! assert!(output.total_trials >= config.n_init);
//! # Ok::<_, seqbench::SamplerError>(())
//! ```

// Documentation settings.
#![doc(html_root_url = "https://docs.rs/seqbench/0.1.0")]
// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

pub use std::hint::black_box;

#[cfg(all(feature = "perf", target_os = "linux"))]
pub use crate::counters::PerfCounters;
pub use crate::{
    bencher::{BenchMode, Bencher},
    channel::Channel,
    config::{ConfigError, SamplerConfig},
    counters::{ClockCounters, CounterError, CounterSource},
    estimate::Estimate,
    output::{Outcome, RoundSummary, SessionId, SessionOutput},
    sampler::{Sampler, SamplerError},
    workload::{from_fns, FnWorkload, Workload, WorkloadError},
};

mod bencher;
mod channel;
mod config;
mod counters;
mod estimate;
mod options;
mod output;
pub mod reporter;
mod sampler;
mod workload;

/// Wraps a provided function to create the entrypoint for a benchmark executable. The function
/// must have `fn(&mut` [`Bencher`]`)` signature.
///
/// # Examples
///
/// See [crate docs](index.html) for the examples of usage.
#[macro_export]
macro_rules! main {
    ($function:path) => {
        fn main() {
            $function(&mut $crate::Bencher::default());
        }
    };
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
