use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_appliance_cli"))
}

fn write_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    let config = r#"{
        "sampling": { "sampling_interval": 0.001, "time_column": "time", "current_column": "current" },
        "scales": { "mode": "frequency", "min_hz": 20.0, "max_hz": 200.0, "count": 16 }
    }"#;
    fs::write(&path, config).expect("write config");
    path.to_string_lossy().into_owned()
}

fn synth(dir: &Path, name: &str, frequency: &str) -> String {
    let path = dir.join(name).to_string_lossy().into_owned();
    let output = cli()
        .args([
            "synth",
            "--pattern",
            "sine",
            "--frequency",
            frequency,
            "--interval",
            "0.001",
            "--samples",
            "1000",
            "--output",
            &path,
        ])
        .output()
        .expect("failed to run appliance_cli synth");
    assert!(output.status.success(), "synth exited with {:?}", output.status.code());
    path
}

#[test]
fn analyze_synthetic_trace_succeeds() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let input = synth(dir.path(), "ceiling_fan.csv", "50");

    let output = cli()
        .args(["--config", &config, "analyze", "--input", &input])
        .output()
        .expect("failed to run appliance_cli analyze");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("appliance report JSON payload");
    assert_eq!(json["label"], "Ceiling Fan");
    assert_eq!(json["normalization"], "zscore");
    assert_eq!(json["power"].as_array().map(Vec::len), Some(16));
    assert_eq!(json["time"].as_array().map(Vec::len), Some(1000));
}

#[test]
fn analyze_windows_emits_one_report_per_window() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let input = synth(dir.path(), "kettle.csv", "50");

    let output = cli()
        .args(["--config", &config, "analyze", "--input", &input, "--windows"])
        .output()
        .expect("failed to run windowed analyze");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("window reports JSON");
    // default windowing: 1000 samples, 50% overlap -> a single window
    assert_eq!(json.as_array().map(Vec::len), Some(1));
}

#[test]
fn compare_below_threshold_exits_with_two() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let a = synth(dir.path(), "fan.csv", "50");
    let b = synth(dir.path(), "drill.csv", "150");
    let report = dir.path().join("comparison.json");

    let output = cli()
        .args([
            "--config",
            &config,
            "compare",
            "--a",
            &a,
            "--b",
            &b,
            "--threshold",
            "0.95",
            "--output",
            &report.to_string_lossy(),
        ])
        .output()
        .expect("failed to run compare");
    assert_eq!(output.status.code(), Some(2));

    let json: Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).expect("comparison JSON");
    assert_eq!(json["label_a"], "Fan");
    assert_eq!(json["passed"], false);
    assert!(json["similarity"]["valid_cells"].as_u64().unwrap_or_default() > 0);
}

#[test]
fn compare_identical_traces_passes() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let a = synth(dir.path(), "fan.csv", "50");

    let output = cli()
        .args([
            "--config",
            &config,
            "compare",
            "--a",
            &a,
            "--b",
            &a,
            "--threshold",
            "0.95",
            "--coherence",
        ])
        .output()
        .expect("failed to run compare");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("comparison JSON");
    assert_eq!(json["passed"], true);
    assert!(json["mean_coherence"].as_f64().unwrap_or_default() > 0.99);
}

#[test]
fn missing_input_reports_error_code() {
    let output = cli()
        .args(["analyze", "--input", "/nonexistent/trace.csv"])
        .output()
        .expect("failed to run analyze");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("code 1001"), "expected IO error code, got {stderr}");
}

#[test]
fn batch_reports_each_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let inputs = dir.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    synth(&inputs, "fan.csv", "50");
    fs::write(
        inputs.join("flat.csv"),
        (0..200)
            .map(|i| format!("{},1.0\n", i as f64 * 0.001))
            .fold("time,current\n".to_string(), |acc, row| acc + &row),
    )
    .unwrap();
    let reports = dir.path().join("reports");

    let output = cli()
        .args([
            "--config",
            &config,
            "batch",
            "--dir",
            &inputs.to_string_lossy(),
            "--output-dir",
            &reports.to_string_lossy(),
        ])
        .output()
        .expect("failed to run batch");
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let entries: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("batch entry JSON"))
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["label"], "Fan");
    assert_eq!(entries[1]["error_code"], 1007);
    assert!(reports.join("fan_report.json").exists());
}

#[test]
fn batch_pairwise_compares_every_pair() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let inputs = dir.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    synth(&inputs, "drill.csv", "150");
    synth(&inputs, "fan.csv", "50");
    synth(&inputs, "kettle.csv", "50");
    let reports = dir.path().join("reports");

    let output = cli()
        .args([
            "--config",
            &config,
            "batch",
            "--dir",
            &inputs.to_string_lossy(),
            "--output-dir",
            &reports.to_string_lossy(),
            "--pairwise",
        ])
        .output()
        .expect("failed to run pairwise batch");
    assert!(
        output.status.success(),
        "batch exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let entries: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("batch entry JSON"))
        .collect();
    // three per-file entries, then three pairs
    assert_eq!(entries.len(), 6);
    let pairs: Vec<&Value> = entries.iter().filter(|e| e.get("file_a").is_some()).collect();
    assert_eq!(pairs.len(), 3);
    let fan_kettle = pairs[2];
    assert!(fan_kettle["file_a"].as_str().unwrap().ends_with("fan.csv"));
    assert!(fan_kettle["similarity"].as_f64().unwrap() > 0.99);
    assert!(pairs[0]["similarity"].as_f64().unwrap() < 0.5);
    assert!(reports.join("fan_vs_kettle_comparison.json").exists());
}

#[test]
fn dump_config_prints_defaults() {
    let output = cli()
        .args(["--normalization", "robust", "dump-config"])
        .output()
        .expect("failed to run dump-config");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("config JSON");
    assert_eq!(json["preprocessing"]["normalization"], "robust");
    assert_eq!(json["scales"]["mode"], "octaves");
    assert_eq!(json["limits"]["min_signal_length"], 100);
}
