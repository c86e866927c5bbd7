use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use indoc::indoc;

const ARBOR_CMD: &str = env!("CARGO_BIN_EXE_arbor");

fn two_groups() -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    let mut text = String::from(indoc! {"
        dataset: 1.0
        category_counts: 0 2
        features: x label
    "});
    for i in 0..60 {
        let label = i % 2;
        let center = if label == 0 { -3.0 } else { 3.0 };
        let x = center + (i % 7) as f64 * 0.1;
        text.push_str(&format!("{x} {label}\n"));
    }
    f.write_all(text.as_bytes()).unwrap();
    f
}

fn config_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    f.write_all(
        indoc! {"
            min_instances_slice: 10
            independence_threshold: 0.3
            min_gain: 0.01
            max_depth: 12
            leaf_smoothing_alpha: 1.0
            variance_floor_epsilon: 0.000001
        "}
        .as_bytes(),
    )
    .unwrap();
    f
}

fn run(args: &[&str]) -> Output {
    Command::new(ARBOR_CMD).args(args).output().unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn build_circuit(data: &Path, out: &Path) {
    let config = config_file();
    let output = run(&[
        "build",
        path_str(data),
        path_str(out),
        "--config",
        path_str(config.path()),
    ]);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn info_lists_columns() {
    let data = two_groups();
    let output = run(&["info", path_str(data.path())]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Rows: 60"));
    assert!(stdout.contains("Columns: 2"));
    assert!(stdout.contains("Continuous"));
    assert!(stdout.contains("Categorical(2)"));
    assert!(stdout.contains("label"));
}

#[test]
fn info_on_malformed_data_fails() {
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    f.write_all(b"dataset: 1.0\n1.0 2.0\n").unwrap();
    let output = run(&["info", path_str(f.path())]);
    assert!(!output.status.success());
}

#[test]
fn build_with_config_writes_a_circuit() {
    let data = two_groups();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("circuit.json");
    build_circuit(data.path(), &out);

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("\"metadata_version\""));
    assert!(text.contains("\"nodes\""));
}

#[test]
fn build_with_inline_flags() {
    let data = two_groups();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("circuit.yaml");
    let output = run(&[
        "build",
        path_str(data.path()),
        path_str(&out),
        "--min-instances-slice",
        "10",
        "--independence-threshold",
        "0.3",
        "--min-gain",
        "0.01",
        "--max-depth",
        "12",
        "--leaf-smoothing-alpha",
        "1.0",
        "--variance-floor-epsilon",
        "1e-6",
        "--impurity",
        "gini",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert!(out.exists());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Depth"));
}

#[test]
fn build_with_zero_depth_fails() {
    let data = two_groups();
    let config = config_file();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("circuit.yaml");
    let output = run(&[
        "build",
        path_str(data.path()),
        path_str(&out),
        "--config",
        path_str(config.path()),
        "--max-depth",
        "0",
    ]);
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn loglike_prints_one_value_per_row() {
    let data = two_groups();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("circuit.bincode");
    build_circuit(data.path(), &out);

    let output = run(&[
        "loglike",
        path_str(&out),
        path_str(data.path()),
        "--per-row",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lls: Vec<f64> = stdout.lines().map(|s| s.parse().unwrap()).collect();
    assert_eq!(lls.len(), 60);
    assert!(lls.iter().all(|ll| ll.is_finite()));

    let output = run(&["loglike", path_str(&out), path_str(data.path())]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mean: f64 = stdout.trim().parse().unwrap();
    let expected = lls.iter().sum::<f64>() / 60.0;
    approx::assert_relative_eq!(mean, expected, epsilon = 1E-8);
}

#[test]
fn sample_writes_a_dataset() {
    let data = two_groups();
    let dir = tempfile::tempdir().unwrap();
    let circuit = dir.path().join("circuit.yaml");
    build_circuit(data.path(), &circuit);

    let samples_a = dir.path().join("a.txt");
    let samples_b = dir.path().join("b.txt");
    for out in [&samples_a, &samples_b] {
        let output = run(&[
            "sample",
            path_str(&circuit),
            path_str(out),
            "-n",
            "25",
            "--seed",
            "1337",
        ]);
        assert!(output.status.success(), "{output:?}");
    }

    let a = fs::read_to_string(&samples_a).unwrap();
    assert_eq!(a, fs::read_to_string(&samples_b).unwrap());
    assert!(a.contains("category_counts: 0 2"));

    let output = run(&["info", path_str(&samples_a)]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Rows: 25"));
}

#[test]
fn loading_a_missing_circuit_fails() {
    let data = two_groups();
    let output = run(&["loglike", "does-not-exist.yaml", path_str(data.path())]);
    assert!(!output.status.success());
}

#[test]
fn check_accepts_a_built_circuit() {
    let data = two_groups();
    let dir = tempfile::tempdir().unwrap();
    let circuit = dir.path().join("circuit.bincode");
    build_circuit(data.path(), &circuit);

    let output = run(&["check", path_str(&circuit)]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("smooth: yes"));
    assert!(stdout.contains("decomposable: yes"));
    assert!(stdout.contains("Depth"));
}

fn write_circuit_json(nodes: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let text = format!(
        r#"{{"metadata_version":1,"circuit":{{"schema":{{"coltypes":["continuous"]}},"nodes":{nodes}}}}}"#
    );
    f.write_all(text.as_bytes()).unwrap();
    f
}

#[test]
fn check_reports_a_product_over_a_shared_column() {
    let circuit = write_circuit_json(
        r#"[
            {"product":{"children":[1,2]}},
            {"leaf":{"factors":[{"gaussian":{"column":0,"mu":0.0,"sigma":1.0}}]}},
            {"leaf":{"factors":[{"gaussian":{"column":0,"mu":1.0,"sigma":1.0}}]}}
        ]"#,
    );
    let output = run(&["check", path_str(circuit.path())]);
    assert!(!output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("decomposable: no"), "{stdout}");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("share column 0"), "{stderr}");
}

#[test]
fn check_reports_a_child_index_pointing_back_to_the_root() {
    let circuit = write_circuit_json(
        r#"[
            {"sum":{"children":[1,0],"weights":[0.5,0.5]}},
            {"leaf":{"factors":[{"gaussian":{"column":0,"mu":0.0,"sigma":1.0}}]}}
        ]"#,
    );
    let output = run(&["check", path_str(circuit.path())]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid circuit"), "{stderr}");
}
