use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::state::{Device, RunState, Server, ServerKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Inputs {
    pub devices: usize,
    pub edge_servers: usize,
    pub cloud_servers: usize,
    pub tech: u8,
}

impl Inputs {
    pub fn servers(&self) -> usize {
        self.edge_servers + self.cloud_servers
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Outputs {
    pub execution_time_sec: f64,
    pub devices_covered: usize,
    pub devices_served: usize,
    pub devices_served_edge: usize,
    pub devices_served_cloud: usize,
    pub servers_used: usize,
    pub servers_used_edge: usize,
    pub servers_used_cloud: usize,
    pub cost_servers_used: f64,
    pub cost_non_coverage: f64,
    pub cost_non_service: f64,
    pub total_cost: f64,
    pub avg_response_ms: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub inputs: Inputs,
    pub outputs: Outputs,
}

impl Metrics {
    pub fn new(inputs: Inputs) -> Self {
        Self {
            inputs,
            outputs: Outputs::default(),
        }
    }
}

/// Recomputes the assignment-dependent outputs of `state` from scratch.
///
/// Coverage figures and execution time are owned by pre-calculation and the
/// strategies respectively and are left untouched, so calling this any number
/// of times on the same state yields the same metrics.
pub fn aggregate(state: &mut RunState) {
    recompute(&state.devices, &state.servers, &mut state.metrics.outputs);
}

fn recompute(devices: &[Device], servers: &[Server], out: &mut Outputs) {
    out.devices_served = 0;
    out.devices_served_edge = 0;
    out.devices_served_cloud = 0;
    out.servers_used = 0;
    out.servers_used_edge = 0;
    out.servers_used_cloud = 0;
    out.cost_servers_used = 0.0;
    out.cost_non_service = 0.0;
    out.total_cost = 0.0;
    out.avg_response_ms = 0.0;

    let mut response_sum = 0.0;
    for device in devices {
        match device.server {
            Some(link) if device.served => {
                out.devices_served += 1;
                response_sum += link.response_ms;
                match servers[link.server].kind {
                    ServerKind::Edge => out.devices_served_edge += 1,
                    ServerKind::Cloud => out.devices_served_cloud += 1,
                }
            }
            _ if device.covered => out.cost_non_service += device.non_service_cost,
            _ => {}
        }
    }

    for server in servers.iter().filter(|server| server.active) {
        out.cost_servers_used += server.activation_cost;
        match server.kind {
            ServerKind::Edge => out.servers_used_edge += 1,
            ServerKind::Cloud => out.servers_used_cloud += 1,
        }
    }

    if out.devices_served > 0 {
        out.avg_response_ms = response_sum / out.devices_served as f64;
    }
    out.servers_used = out.servers_used_edge + out.servers_used_cloud;
    out.total_cost = out.cost_non_coverage + out.cost_non_service + out.cost_servers_used;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AlgorithmDetail {
    Heuristic,
    Exact {
        status: String,
        objective: f64,
        gap: f64,
    },
    Annealing {
        initial: String,
        temperature: f64,
        alpha: f64,
    },
}

impl AlgorithmDetail {
    pub fn simulation(&self) -> &'static str {
        match self {
            AlgorithmDetail::Heuristic => "Heuristic",
            AlgorithmDetail::Exact { .. } => "Mathematical",
            AlgorithmDetail::Annealing { .. } => "MetaHeuristic",
        }
    }
}

/// Metrics of one finished run plus the parameters of the algorithm behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub algorithm: String,
    pub metrics: Metrics,
    pub detail: AlgorithmDetail,
}

impl Report {
    pub fn new(algorithm: impl Into<String>, metrics: Metrics, detail: AlgorithmDetail) -> Self {
        Self {
            algorithm: algorithm.into(),
            metrics,
            detail,
        }
    }
}

const BASE_HEADER: [&str; 16] = [
    "Devices",
    "Servers",
    "Tech",
    "ExeTime",
    "DCovered",
    "DServed",
    "DServedEC",
    "DServedCC",
    "SUsed",
    "SUsedEC",
    "SUsedCC",
    "TotalCost",
    "CostNCoverage",
    "CostNService",
    "CostS",
    "Avg.RTime",
];

pub fn header(report: &Report) -> Vec<&'static str> {
    let mut columns = BASE_HEADER.to_vec();
    match report.detail {
        AlgorithmDetail::Heuristic => {}
        AlgorithmDetail::Exact { .. } => columns.extend(["Status", "OF", "GAP"]),
        AlgorithmDetail::Annealing { .. } => columns.extend(["Temperature", "Alpha", "Heuristic"]),
    }
    columns
}

pub fn row(report: &Report) -> Vec<String> {
    let inputs = &report.metrics.inputs;
    let out = &report.metrics.outputs;
    let mut values = vec![
        inputs.devices.to_string(),
        inputs.servers().to_string(),
        inputs.tech.to_string(),
        decimal(out.execution_time_sec, 6),
        percentage(out.devices_covered, inputs.devices),
        percentage(out.devices_served, inputs.devices),
        percentage(out.devices_served_edge, out.devices_served),
        percentage(out.devices_served_cloud, out.devices_served),
        percentage(out.servers_used, inputs.servers()),
        percentage(out.servers_used_edge, inputs.edge_servers),
        percentage(out.servers_used_cloud, inputs.cloud_servers),
        decimal(out.total_cost, 6),
        decimal(out.cost_non_coverage, 6),
        decimal(out.cost_non_service, 6),
        decimal(out.cost_servers_used, 6),
        decimal(out.avg_response_ms, 6),
    ];
    match &report.detail {
        AlgorithmDetail::Heuristic => {}
        AlgorithmDetail::Exact {
            status,
            objective,
            gap,
        } => {
            values.push(status.clone());
            values.push(decimal(*objective, 6));
            values.push(decimal(*gap, 6));
        }
        AlgorithmDetail::Annealing {
            initial,
            temperature,
            alpha,
        } => {
            values.push(decimal(*temperature, 6));
            values.push(decimal(*alpha, 6));
            values.push(initial.clone());
        }
    }
    values
}

/// `root/<simulation>/<algorithm>[/<initial heuristic>]/D{n}_S{m}_{t}G.txt`
pub fn result_path(report: &Report, root: &Path) -> PathBuf {
    let mut dir = root
        .join(report.detail.simulation())
        .join(&report.algorithm);
    if let AlgorithmDetail::Annealing { initial, .. } = &report.detail {
        dir = dir.join(initial);
    }
    let inputs = &report.metrics.inputs;
    dir.join(format!(
        "D{}_S{}_{}G.txt",
        inputs.devices,
        inputs.servers(),
        inputs.tech
    ))
}

pub(crate) fn decimal(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

pub(crate) fn percentage(part: usize, whole: usize) -> String {
    if whole == 0 {
        return decimal(0.0, 4);
    }
    decimal(part as f64 / whole as f64 * 100.0, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::state::fixtures::{device, linked_state, server};

    fn sample_state() -> RunState {
        let at = Coordinates::new(45.46, 9.19);
        let servers = vec![
            server(0, ServerKind::Edge, at),
            server(1, ServerKind::Edge, at),
            server(2, ServerKind::Cloud, at),
        ];
        let devices = (0..4).map(|id| device(id, at)).collect();
        let mut state = linked_state(devices, servers);
        state.servers[2].activation_cost = 0.005;
        state.metrics.outputs.cost_non_coverage = 2.5;

        let edge = state.devices[0].candidates[0];
        let cloud = state.devices[1].candidates[2];
        assert!(state.try_commit(0, edge));
        assert!(state.try_commit(1, cloud));
        state
    }

    #[test]
    fn aggregate_counts_served_and_costs() {
        let mut state = sample_state();
        aggregate(&mut state);
        let out = &state.metrics.outputs;

        assert_eq!(out.devices_served, 2);
        assert_eq!(out.devices_served_edge, 1);
        assert_eq!(out.devices_served_cloud, 1);
        assert_eq!(out.servers_used, 2);
        assert_eq!(out.servers_used_edge, 1);
        assert_eq!(out.servers_used_cloud, 1);
        assert!((out.cost_servers_used - 0.006).abs() < 1e-12);
        assert!((out.cost_non_service - 10.6).abs() < 1e-12);
        assert!((out.total_cost - (2.5 + 10.6 + 0.006)).abs() < 1e-12);
        assert!((out.avg_response_ms - 11.0).abs() < 1e-12);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let mut state = sample_state();
        aggregate(&mut state);
        let first = state.metrics.clone();
        aggregate(&mut state);
        assert_eq!(state.metrics, first);
    }

    #[test]
    fn uncovered_devices_do_not_add_non_service_cost() {
        let mut state = sample_state();
        state.devices[3].covered = false;
        aggregate(&mut state);
        assert!((state.metrics.outputs.cost_non_service - 5.3).abs() < 1e-12);
    }

    #[test]
    fn average_response_is_zero_without_service() {
        let mut state = sample_state();
        state.clear_assignments();
        aggregate(&mut state);
        assert_eq!(state.metrics.outputs.devices_served, 0);
        assert_eq!(state.metrics.outputs.avg_response_ms, 0.0);
        assert_eq!(state.metrics.outputs.cost_servers_used, 0.0);
    }

    #[test]
    fn annealing_report_extends_header_and_path() {
        let mut state = sample_state();
        aggregate(&mut state);
        let report = Report::new(
            "SA",
            state.metrics.clone(),
            AlgorithmDetail::Annealing {
                initial: "greedy-desc-asc".to_string(),
                temperature: 100.0,
                alpha: 0.95,
            },
        );

        let columns = header(&report);
        assert_eq!(columns.len(), 19);
        assert_eq!(&columns[16..], &["Temperature", "Alpha", "Heuristic"]);

        let values = row(&report);
        assert_eq!(values.len(), columns.len());
        assert_eq!(values[0], "4");
        assert_eq!(values[1], "3");
        assert_eq!(values[5], "50.0000");
        assert_eq!(values[16], "100.000000");
        assert_eq!(values[18], "greedy-desc-asc");

        let path = result_path(&report, Path::new("Results"));
        assert_eq!(
            path,
            PathBuf::from("Results/MetaHeuristic/SA/greedy-desc-asc/D4_S3_4G.txt")
        );
    }

    #[test]
    fn exact_report_carries_solver_columns() {
        let report = Report::new(
            "minimize-cost",
            Metrics::default(),
            AlgorithmDetail::Exact {
                status: "Optimal".to_string(),
                objective: 1.25,
                gap: 0.0,
            },
        );
        assert_eq!(&header(&report)[16..], &["Status", "OF", "GAP"]);
        let values = row(&report);
        assert_eq!(values[16], "Optimal");
        assert_eq!(values[17], "1.250000");
        assert_eq!(values[4], "0.0000");
    }
}
