use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::technology_params;
use crate::metrics::{self, decimal, percentage, AlgorithmDetail, Report};
use crate::models::{SimConfig, StrategyConfig};

pub trait Formatter {
    fn write(&self, reports: &[Report]) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn write(&self, reports: &[Report]) -> String {
        let mut out = String::new();
        for (idx, report) in reports.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            write_report(&mut out, report);
        }
        out
    }
}

fn write_report(out: &mut String, report: &Report) {
    let inputs = &report.metrics.inputs;
    let res = &report.metrics.outputs;

    let _ = writeln!(out, "Metadata:");
    let _ = writeln!(out, "algorithm: {}", report.algorithm);
    let _ = writeln!(out, "simulation: {}", report.detail.simulation());
    let _ = writeln!(
        out,
        "scenario: {} devices, {} edge + {} cloud servers, tech {}",
        inputs.devices, inputs.edge_servers, inputs.cloud_servers, inputs.tech
    );
    match &report.detail {
        AlgorithmDetail::Heuristic => {}
        AlgorithmDetail::Exact {
            status,
            objective,
            gap,
        } => {
            let _ = writeln!(
                out,
                "solver: status {}, objective {}, gap {}",
                status,
                decimal(*objective, 6),
                decimal(*gap, 6)
            );
        }
        AlgorithmDetail::Annealing {
            initial,
            temperature,
            alpha,
        } => {
            let _ = writeln!(
                out,
                "annealing: initial {}, temperature {}, alpha {}",
                initial, temperature, alpha
            );
        }
    }

    let _ = writeln!(out, "Results:");
    let _ = writeln!(
        out,
        "execution time: {}s",
        decimal(res.execution_time_sec, 6)
    );
    let _ = writeln!(
        out,
        "devices covered: {} ({}%)",
        res.devices_covered,
        percentage(res.devices_covered, inputs.devices)
    );
    let _ = writeln!(
        out,
        "devices served: {} ({}%) [edge {}, cloud {}]",
        res.devices_served,
        percentage(res.devices_served, inputs.devices),
        res.devices_served_edge,
        res.devices_served_cloud
    );
    let _ = writeln!(
        out,
        "servers used: {} ({}%) [edge {}, cloud {}]",
        res.servers_used,
        percentage(res.servers_used, inputs.servers()),
        res.servers_used_edge,
        res.servers_used_cloud
    );
    let _ = writeln!(out, "total cost: {}", decimal(res.total_cost, 6));
    let _ = writeln!(
        out,
        "  non-coverage: {}",
        decimal(res.cost_non_coverage, 6)
    );
    let _ = writeln!(out, "  non-service: {}", decimal(res.cost_non_service, 6));
    let _ = writeln!(out, "  servers: {}", decimal(res.cost_servers_used, 6));
    let _ = writeln!(
        out,
        "avg response time: {}ms",
        decimal(res.avg_response_ms, 6)
    );
}

impl Formatter for SummaryFormatter {
    fn write(&self, reports: &[Report]) -> String {
        let mut out = String::new();
        for report in reports {
            let inputs = &report.metrics.inputs;
            let res = &report.metrics.outputs;
            let _ = writeln!(
                out,
                "{}: served {}/{} ({}%), servers {}/{}, total cost {}, avg response {}ms",
                report.algorithm,
                res.devices_served,
                inputs.devices,
                percentage(res.devices_served, inputs.devices),
                res.servers_used,
                inputs.servers(),
                decimal(res.total_cost, 6),
                decimal(res.avg_response_ms, 6)
            );
        }
        out
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, reports: &[Report]) -> String {
        match serde_json::to_string_pretty(reports) {
            Ok(json) => format!("{}\n", json),
            Err(err) => format!("{{\"error\": \"{}\"}}\n", err),
        }
    }
}

/// Human-readable dump of a resolved configuration.
pub fn describe_config(config: &SimConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Strategy: {}", config.strategy);
    let _ = writeln!(out, "Devices: {}", config.devices);
    let _ = writeln!(out, "Edge servers: {}", config.edge_servers);
    let _ = writeln!(out, "Cloud servers: {}", config.cloud_servers);
    match technology_params(config.tech) {
        Ok(profile) => {
            let _ = writeln!(
                out,
                "Technology: {} (radius: {}km, data rate: {}Mbps)",
                config.tech, profile.radius_km, profile.data_rate_mbps
            );
        }
        Err(_) => {
            let _ = writeln!(out, "Technology: {}", config.tech);
        }
    }
    match config.seed {
        Some(seed) => {
            let _ = writeln!(out, "Seed: {}", seed);
        }
        None => {
            let _ = writeln!(out, "Seed: entropy");
        }
    }
    let _ = writeln!(out, "Bottleneck: {}", config.bottleneck);
    if config.strategy == StrategyConfig::Annealing {
        let annealing = &config.annealing;
        let _ = writeln!(out, "Annealing:");
        let _ = writeln!(out, "- temperature: {}", annealing.temperature);
        let _ = writeln!(out, "- alpha: {}", annealing.alpha);
        let _ = writeln!(out, "- trials: {}", annealing.trials);
        let _ = writeln!(out, "- initial: {}", annealing.initial);
    }
    if let Some(dir) = &config.data_dir {
        let _ = writeln!(out, "Data dir: {}", dir.display());
    }
    if let Some(dir) = &config.results_dir {
        let _ = writeln!(out, "Results dir: {}", dir.display());
    }
    out
}

/// Appends reports to `;`-delimited files under a results root, one file per
/// algorithm and scenario size.
pub struct ResultsWriter {
    root: PathBuf,
}

impl ResultsWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the header first when the file is new. Returns the file path.
    pub fn append(&self, report: &Report) -> Result<PathBuf> {
        let path = metrics::result_path(report, &self.root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error("create", parent, err))?;
        }

        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| io_error("open", &path, err))?;

        let mut text = String::new();
        if is_new {
            text.push_str(&metrics::header(report).join(";"));
            text.push('\n');
        }
        text.push_str(&metrics::row(report).join(";"));
        text.push('\n');
        file.write_all(text.as_bytes())
            .map_err(|err| io_error("write", &path, err))?;

        debug!(path = %path.display(), is_new, "result appended");
        Ok(path)
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> Error {
    Error::ResultsIo(format!(
        "failed to {} '{}': {}",
        action,
        path.display(),
        err
    ))
}
