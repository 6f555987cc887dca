use predicates::str::contains;

fn scenario(devices: &str, tech: &str, strategy: &str) -> Vec<String> {
    [
        "run",
        "--devices",
        devices,
        "--edge-servers",
        "4",
        "--cloud-servers",
        "1",
        "--tech",
        tech,
        "--strategy",
        strategy,
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

#[test]
fn devices_zero_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("0", "4", "random"));
    cmd.assert()
        .failure()
        .stderr(contains("Error: devices must be greater than 0"));
}

#[test]
fn unknown_technology_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("10", "7", "random"));
    cmd.assert()
        .failure()
        .stderr(contains("Error: unknown network technology 7 (expected 1-6)"));
}

#[test]
fn alpha_out_of_range_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("10", "4", "annealing"))
        .args(["--alpha", "1.5"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: annealing alpha must be in (0, 1) (got 1.5)"));
}

#[test]
fn zero_trials_fail() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("10", "4", "annealing"))
        .args(["--trials", "0"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: annealing trials must be greater than 0"));
}

#[test]
fn annealing_cannot_seed_itself() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("10", "4", "annealing"))
        .args(["--initial", "annealing"]);
    cmd.assert().failure().stderr(contains(
        "Error: initial heuristic for annealing cannot be 'annealing'",
    ));
}

#[test]
fn missing_scenario_flag_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(["run", "--devices", "10", "--strategy", "random"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: missing --edge-servers (or pass --config)"));
}

#[test]
fn unknown_strategy_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args(scenario("10", "4", "best-fit"));
    cmd.assert()
        .failure()
        .stderr(contains("Error: "))
        .stderr(contains("'best-fit'"));
}
