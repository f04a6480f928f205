//! Should preferably run in the release mode to emulate real benchmark env.

use std::{
    collections::{HashMap, HashSet},
    fs, io,
    path::Path,
    process::Command,
};

use seqbench::{Channel, SessionOutput};
use seqbench_e2e_tests::EXPORTER_OUTPUT_VAR;

const EXE_PATH: &str = env!("CARGO_BIN_EXE_seqbench-e2e-tests");

const EXPECTED_BENCH_NAMES: &[&str] = &["sum", "alloc", "sort", "bounded"];

fn read_outputs(path: &Path) -> HashMap<String, SessionOutput> {
    let reader = fs::File::open(path).unwrap();
    serde_json::from_reader(io::BufReader::new(reader)).unwrap()
}

fn tested_names(stderr: &str) -> HashSet<&str> {
    stderr
        .lines()
        .filter_map(|line| line.strip_prefix("[√] ")?.split_whitespace().next())
        .collect()
}

#[test]
fn testing_benchmarks() {
    // Without `--bench` argument, benches should be tested.
    let output = Command::new(EXE_PATH).output().unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!stderr.contains('\u{1b}')); // no ANSI escape sequences since stderr is not a TTY
    let test_names = tested_names(&stderr);
    assert_eq!(test_names, HashSet::from_iter(EXPECTED_BENCH_NAMES.iter().copied()));
}

#[test]
fn testing_with_filter() {
    let output = Command::new(EXE_PATH).arg("^s").output().unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(tested_names(&stderr), HashSet::from(["sum", "sort"]));
}

#[test]
fn failing_test() {
    let output = Command::new(EXE_PATH)
        .args(["--initial-size", "2000000", "--exact", "bounded"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.contains("[x] bounded: FAILED (input size 2000000 is too large)"),
        "{stderr}"
    );
    assert!(stderr.contains("There were test failures"), "{stderr}");
}

#[test]
fn listing_benchmarks() {
    let output = Command::new(EXE_PATH).arg("--list").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<_> = stdout
        .lines()
        .filter_map(|line| line.strip_suffix(": benchmark"))
        .collect();
    assert_eq!(names, EXPECTED_BENCH_NAMES);
}

#[test]
fn benchmarking_everything() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let out_path = temp_dir.path().join("out.json");

    let output = Command::new(EXE_PATH)
        .args(["--bench", "--source", "clock", "--iterations", "3"])
        .args(["--initial-size", "64"])
        .env(EXPORTER_OUTPUT_VAR, &out_path)
        .output()
        .expect("failed running benches");
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!stderr.contains('\u{1b}')); // no ANSI escape sequences since stderr is not a TTY

    let outputs = read_outputs(&out_path);
    let expected_ids: HashSet<_> = EXPECTED_BENCH_NAMES
        .iter()
        .flat_map(|name| [64, 128, 256].map(|size| format!("{name}/{size}")))
        .collect();
    let ids: HashSet<_> = outputs.keys().cloned().collect();
    assert_eq!(ids, expected_ids);

    for (id, output) in &outputs {
        assert_eq!(output.channel, Channel::TaskClock, "{id}");
        assert!(output.rounds >= 1 && output.rounds <= 20, "{id}: {output:?}");
        assert!(output.total_trials >= 30, "{id}: {output:?}");
        assert_eq!(
            output.trials,
            output.total_trials + output.rounds as u64,
            "{id}: {output:?}"
        );
        assert!(output.mean() >= output.floor as f64, "{id}: {output:?}");
        assert!(id.ends_with(&format!("/{}", output.input_size)), "{id}");
    }
}

#[test]
fn benchmarking_with_custom_config() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let out_path = temp_dir.path().join("out.json");

    let output = Command::new(EXE_PATH)
        .args(["--bench", "--exact", "sum", "--iterations", "2"])
        .args(["--max-rounds", "2", "--n-init", "10"])
        .env("SEQBENCH_SOURCE", "clock")
        .env("SEQBENCH_INITIAL_SIZE", "1000")
        .env(EXPORTER_OUTPUT_VAR, &out_path)
        .output()
        .expect("failed running benches");
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("sum/1000"), "{stderr}");
    assert!(stderr.contains("sum/2000"), "{stderr}");

    let outputs = read_outputs(&out_path);
    assert_eq!(outputs.len(), 2);
    for output in outputs.values() {
        assert!(output.rounds <= 2, "{output:?}");
        if !output.is_converged() {
            assert_eq!(output.rounds, 2, "{output:?}");
        }
        assert!(output.total_trials >= 10, "{output:?}");
    }
}

#[test]
fn failing_benchmark() {
    let output = Command::new(EXE_PATH)
        .args(["--bench", "--source", "clock", "--exact", "bounded"])
        .args(["--initial-size", "600000", "--iterations", "3"])
        .output()
        .expect("failed running benches");
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("bounded/600000"), "{stderr}");
    assert!(
        stderr.contains("ERROR: bounded/1200000: workload failed for input size 1200000"),
        "{stderr}"
    );
}
