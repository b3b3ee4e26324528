use std::path::PathBuf;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_windgrid-sim"))
        .args(args)
        .output()
        .expect("windgrid-sim process should run")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8")
}

fn temp_csv(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("windgrid-cli-{}-{name}.csv", std::process::id()))
}

/// Extracts the value after `label` from the report block.
fn report_field<'a>(stdout: &'a str, label: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .unwrap_or_else(|| panic!("missing report line \"{label}\" in:\n{stdout}"))
}

#[test]
fn grid_fault_scenario_reports_breaches_and_exports_csv() {
    let csv_path = temp_csv("grid-fault");
    let output = run_cli(&[
        "--scenario",
        "scenarios/grid_fault.toml",
        "--quiet",
        "--telemetry-out",
        csv_path.to_str().unwrap(),
    ]);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Scenario: grid_fault"));
    assert!(stdout.contains("--- Run Report ---"));
    assert_eq!(report_field(&stdout, "Ticks x turbines:"), "900 x 3");
    assert_ne!(report_field(&stdout, "Ride-through breaches:"), "0");
    assert!(report_field(&stdout, "Grid voltage range:").starts_with("0.200"));

    let csv = std::fs::read_to_string(&csv_path).expect("CSV should be written");
    std::fs::remove_file(&csv_path).ok();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 1 + 900 * 3);
    assert!(lines[0].starts_with("tick,timestamp_s,turbine_id,"));
}

#[test]
fn turbine_failure_scenario_reports_failed_turbine() {
    let stdout = stdout_of(&run_cli(&["--scenario", "scenarios/turbine_failure.toml", "--quiet"]));
    assert_eq!(report_field(&stdout, "Failed turbines:"), "WT02");
    assert_eq!(report_field(&stdout, "Ticks x turbines:"), "600 x 4");
}

#[test]
fn normal_scenario_stays_compliant() {
    let stdout = stdout_of(&run_cli(&["--scenario", "scenarios/normal.toml", "-q"]));
    assert_eq!(report_field(&stdout, "Ride-through breaches:"), "0");
    assert_eq!(report_field(&stdout, "Failed turbines:"), "none");
    assert_eq!(report_field(&stdout, "LVRT / HVRT ticks:"), "0 / 0");
}

#[test]
fn seed_override_changes_output() {
    let a = stdout_of(&run_cli(&["--preset", "storm", "--quiet", "--seed", "1"]));
    let b = stdout_of(&run_cli(&["--preset", "storm", "--quiet", "--seed", "1"]));
    let c = stdout_of(&run_cli(&["--preset", "storm", "--quiet", "--seed", "2"]));
    assert_eq!(a, b);
    assert_ne!(
        report_field(&a, "Fleet energy:"),
        report_field(&c, "Fleet energy:")
    );
}

#[test]
fn unknown_preset_fails() {
    let output = run_cli(&["--preset", "does_not_exist"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"));
}

#[test]
fn invalid_scenario_file_is_rejected() {
    let path = std::env::temp_dir().join(format!("windgrid-cli-{}-bad.toml", std::process::id()));
    std::fs::write(&path, "[fleet]\nturbines = 0\n").unwrap();
    let output = run_cli(&["--scenario", path.to_str().unwrap()]);
    std::fs::remove_file(&path).ok();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("fleet.turbines"));
}

fn temp_scenario(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "windgrid-cli-{}-{name}.toml",
        std::process::id()
    ));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn pipeline_section_sizes_the_cli_consumer_queue() {
    // A one-record queue with no tolerance fails as soon as the engine
    // outpaces the reader, which it does within the first tick.
    let path = temp_scenario(
        "tiny-pipeline",
        "[simulation]\nticks = 20000\n\n[fleet]\nturbines = 5\n\n[pipeline]\ncapacity = 1\nstall_limit = 0\n",
    );
    let output = run_cli(&["--scenario", path.to_str().unwrap(), "--quiet"]);
    std::fs::remove_file(&path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stalled"), "stderr: {stderr}");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("--- Run Report ---"));
}

#[test]
fn zero_pipeline_capacity_is_rejected() {
    let path = temp_scenario("zero-capacity", "[pipeline]\ncapacity = 0\n");
    let output = run_cli(&["--scenario", path.to_str().unwrap()]);
    std::fs::remove_file(&path).ok();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pipeline.capacity"));
}
