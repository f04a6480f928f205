//! Workloads measured by the sampler.

use std::{convert::Infallible, error::Error as StdError, fmt};

/// Boxed error returned by a failed workload.
pub type WorkloadError = Box<dyn StdError + Send + Sync>;

/// Workload parameterized by the input size. Only [`Self::run()`] is measured; [`Self::setup()`]
/// and [`Self::teardown()`] are executed around it for every trial.
#[allow(unused_variables)]
pub trait Workload {
    /// Error returned by the workload.
    type Error: Into<WorkloadError>;

    /// Prepares a trial. Not measured.
    ///
    /// The default implementation does nothing.
    ///
    /// # Errors
    ///
    /// Workload errors abort the sampling.
    fn setup(&mut self, input_size: u64) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Executes the measured body of a trial.
    ///
    /// # Errors
    ///
    /// Workload errors abort the sampling.
    fn run(&mut self, input_size: u64) -> Result<(), Self::Error>;

    /// Cleans up after a trial. Not measured.
    ///
    /// The default implementation does nothing.
    ///
    /// # Errors
    ///
    /// Workload errors abort the sampling.
    fn teardown(&mut self, input_size: u64) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<W: Workload + ?Sized> Workload for &mut W {
    type Error = W::Error;

    fn setup(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (**self).setup(input_size)
    }

    fn run(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (**self).run(input_size)
    }

    fn teardown(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (**self).teardown(input_size)
    }
}

/// Infallible [`Workload`] composed of three closures. Created with [`from_fns()`].
pub struct FnWorkload<S, R, T> {
    setup: S,
    run: R,
    teardown: T,
}

impl<S, R, T> fmt::Debug for FnWorkload<S, R, T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("FnWorkload").finish_non_exhaustive()
    }
}

impl<S, R, T> Workload for FnWorkload<S, R, T>
where
    S: FnMut(u64),
    R: FnMut(u64),
    T: FnMut(u64),
{
    type Error = Infallible;

    fn setup(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (self.setup)(input_size);
        Ok(())
    }

    fn run(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (self.run)(input_size);
        Ok(())
    }

    fn teardown(&mut self, input_size: u64) -> Result<(), Self::Error> {
        (self.teardown)(input_size);
        Ok(())
    }
}

/// Creates a workload from untimed `setup`, timed `run` and untimed `teardown` closures.
pub fn from_fns<S, R, T>(setup: S, run: R, teardown: T) -> FnWorkload<S, R, T>
where
    S: FnMut(u64),
    R: FnMut(u64),
    T: FnMut(u64),
{
    FnWorkload {
        setup,
        run,
        teardown,
    }
}
