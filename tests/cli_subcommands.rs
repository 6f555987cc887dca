use predicates::str::diff;

#[test]
fn list_strategies_prints_supported_values() {
    let expected = concat!(
        "random\n",
        "greedy-asc-asc\n",
        "greedy-asc-desc\n",
        "greedy-desc-asc\n",
        "greedy-desc-desc\n",
        "annealing\n",
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.arg("list-strategies");
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn show_config_prints_parsed_configuration() {
    let expected = concat!(
        "Strategy: greedy-asc-desc\n",
        "Devices: 100\n",
        "Edge servers: 20\n",
        "Cloud servers: 3\n",
        "Technology: 5 (radius: 0.6km, data rate: 1000Mbps)\n",
        "Seed: 7\n",
        "Bottleneck: deterministic\n",
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args([
        "show-config",
        "--devices",
        "100",
        "--edge-servers",
        "20",
        "--cloud-servers",
        "3",
        "--tech",
        "5",
        "--strategy",
        "greedy-asc-desc",
        "--seed",
        "7",
        "--bottleneck",
        "deterministic",
    ]);
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn show_config_without_seed_reports_entropy() {
    let expected = concat!(
        "Strategy: annealing\n",
        "Devices: 10\n",
        "Edge servers: 2\n",
        "Cloud servers: 1\n",
        "Technology: 1 (radius: 20km, data rate: 0.0024Mbps)\n",
        "Seed: entropy\n",
        "Bottleneck: off\n",
        "Annealing:\n",
        "- temperature: 100\n",
        "- alpha: 0.9\n",
        "- trials: 120\n",
        "- initial: random\n",
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("edge-alloc");
    cmd.args([
        "show-config",
        "--devices",
        "10",
        "--edge-servers",
        "2",
        "--cloud-servers",
        "1",
        "--tech",
        "1",
        "--strategy",
        "annealing",
        "--alpha",
        "0.9",
        "--initial",
        "random",
    ]);
    cmd.assert().success().stdout(diff(expected));
}
