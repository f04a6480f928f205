use std::convert::Infallible;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use seqbench::{black_box, Bencher, Workload};

use crate::exporter::SessionExporter;
pub use crate::exporter::EXPORTER_OUTPUT_VAR;

mod exporter;

const RNG_SEED: u64 = 123;

/// Sorts a freshly generated random vector; generation is not measured.
#[derive(Debug)]
struct SortWorkload {
    rng: SmallRng,
    values: Vec<u32>,
}

impl SortWorkload {
    fn new() -> Self {
        Self {
            rng: SmallRng::seed_from_u64(RNG_SEED),
            values: vec![],
        }
    }
}

impl Workload for SortWorkload {
    type Error = Infallible;

    fn setup(&mut self, input_size: u64) -> Result<(), Self::Error> {
        let rng = &mut self.rng;
        self.values = (0..input_size).map(|_| rng.gen()).collect();
        Ok(())
    }

    fn run(&mut self, _input_size: u64) -> Result<(), Self::Error> {
        black_box(&mut self.values).sort_unstable();
        Ok(())
    }

    fn teardown(&mut self, _input_size: u64) -> Result<(), Self::Error> {
        assert!(self.values.is_sorted());
        self.values.clear();
        Ok(())
    }
}

/// Workload with a fixed cost that fails for large inputs.
#[derive(Debug)]
struct BoundedWorkload;

impl Workload for BoundedWorkload {
    type Error = String;

    fn run(&mut self, input_size: u64) -> Result<(), Self::Error> {
        if input_size > 1_000_000 {
            return Err(format!("input size {input_size} is too large"));
        }
        black_box((0..black_box(16_u64)).product::<u64>());
        Ok(())
    }
}

pub fn main() {
    let mut bencher = Bencher::default();
    bencher.add_reporter(SessionExporter::default());

    bencher
        .bench_fn("sum", |size| (0..black_box(size)).sum::<u64>())
        .bench_fn("alloc", |size| vec![0_u8; black_box(size) as usize])
        .bench("sort", SortWorkload::new())
        .bench("bounded", BoundedWorkload);
}
