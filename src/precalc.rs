use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{info, warn};

use crate::dataset::{DataSource, DeviceRecord, ServerRecord};
use crate::error::{Error, Result};
use crate::geo::{distance, technology_params, EARTH_RADIUS_KM};
use crate::metrics::{Inputs, Metrics, Outputs};
use crate::state::{CandidateLink, Device, RunState, Server, ServerKind, Supply};

/// Edge-to-cloud backbone rate; servers are never bandwidth constrained by it.
pub const BACKBONE_BANDWIDTH_MBPS: f64 = 100_000.0;
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;
/// Measured round trip between the edge region and the cloud data centre.
pub const INTER_DC_LATENCY_MS: f64 = 111.86;
/// Highest non-service cost a service profile can carry.
pub const MAX_NON_SERVICE_COST: f64 = 9.9;
const BOTTLENECK_FILL: f64 = 0.999999;

/// Loads the scenario described by `inputs` from `source` and runs coverage
/// and timing on it. The returned state has no commitments yet.
pub fn pre_calculation(inputs: Inputs, source: &mut dyn DataSource) -> Result<RunState> {
    validate_inputs(&inputs)?;

    let device_records = source.devices(inputs.devices)?;
    let edge_records = source.edge_servers(inputs.edge_servers)?;
    let cloud_records = source.cloud_servers(inputs.cloud_servers)?;
    if device_records.is_empty() {
        return Err(Error::EmptyDataset("device"));
    }
    if edge_records.is_empty() {
        return Err(Error::EmptyDataset("edge server"));
    }
    if cloud_records.is_empty() {
        return Err(Error::EmptyDataset("cloud server"));
    }

    let loaded = Inputs {
        devices: device_records.len(),
        edge_servers: edge_records.len(),
        cloud_servers: cloud_records.len(),
        tech: inputs.tech,
    };
    if loaded != inputs {
        warn!(
            requested_devices = inputs.devices,
            loaded_devices = loaded.devices,
            requested_edge = inputs.edge_servers,
            loaded_edge = loaded.edge_servers,
            requested_cloud = inputs.cloud_servers,
            loaded_cloud = loaded.cloud_servers,
            "dataset smaller than requested"
        );
    }

    let devices = device_records
        .iter()
        .enumerate()
        .map(|(id, record)| build_device(id, record))
        .collect();
    let servers = edge_records
        .iter()
        .map(|record| (ServerKind::Edge, record))
        .chain(cloud_records.iter().map(|record| (ServerKind::Cloud, record)))
        .enumerate()
        .map(|(id, (kind, record))| build_server(id, kind, record))
        .collect();

    let mut state = RunState {
        devices,
        servers,
        covered: Vec::new(),
        metrics: Metrics::new(loaded),
    };
    coverage(&mut state)?;

    info!(
        devices = state.devices.len(),
        servers = state.servers.len(),
        covered = state.covered.len(),
        tech = loaded.tech,
        cost_non_coverage = state.metrics.outputs.cost_non_coverage,
        "pre-calculation complete"
    );
    Ok(state)
}

pub fn validate_inputs(inputs: &Inputs) -> Result<()> {
    if inputs.devices == 0 {
        return Err(Error::InvalidCount { what: "devices" });
    }
    if inputs.edge_servers == 0 {
        return Err(Error::InvalidCount {
            what: "edge servers",
        });
    }
    if inputs.cloud_servers == 0 {
        return Err(Error::InvalidCount {
            what: "cloud servers",
        });
    }
    technology_params(inputs.tech)?;
    Ok(())
}

fn build_device(id: usize, record: &DeviceRecord) -> Device {
    Device {
        id,
        position: record.position,
        service: record.service,
        non_service_cost: record.non_service_cost,
        pcc: record.pcc,
        cores: record.cores,
        memory: record.memory,
        storage: record.storage,
        workload: record.workload,
        bandwidth: 0.0,
        covered: false,
        served: false,
        server: None,
        candidates: Vec::new(),
    }
}

fn build_server(id: usize, kind: ServerKind, record: &ServerRecord) -> Server {
    Server {
        id,
        kind,
        position: record.position,
        activation_cost: record.activation_cost,
        pcc_per_core: record.pcc_per_core,
        pcc_total: record.pcc_per_core * record.cores as f64,
        cores: record.cores,
        memory: record.memory,
        storage: record.storage,
        bandwidth: 0.0,
        unit_processing_ms: record.unit_processing_ms,
        active: false,
        supply: Supply::default(),
    }
}

/// Bandwidth, coverage and timing for an already loaded state.
pub fn coverage(state: &mut RunState) -> Result<()> {
    let profile = technology_params(state.metrics.inputs.tech)?;
    assign_bandwidth(
        &mut state.devices,
        &mut state.servers,
        profile.data_rate_mbps,
    );
    state.covered = find_covering(
        &mut state.devices,
        &state.servers,
        profile.radius_km,
        &mut state.metrics.outputs,
    );
    compute_timings(&mut state.devices, &state.servers);
    Ok(())
}

pub fn assign_bandwidth(devices: &mut [Device], servers: &mut [Server], data_rate_mbps: f64) {
    for device in devices {
        device.bandwidth = data_rate_mbps;
    }
    for server in servers {
        server.bandwidth = BACKBONE_BANDWIDTH_MBPS;
    }
}

/// Marks devices within `radius_km` of an edge server as covered and fills
/// their candidate lists. Cloud servers are only reachable through edge
/// coverage. Uncovered devices are charged to the non-coverage cost.
pub fn find_covering(
    devices: &mut [Device],
    servers: &[Server],
    radius_km: f64,
    outputs: &mut Outputs,
) -> Vec<usize> {
    let mut covered = Vec::new();
    outputs.cost_non_coverage = 0.0;

    for device in devices.iter_mut() {
        device.covered = false;
        device.candidates.clear();

        for server in servers.iter().filter(|s| s.kind == ServerKind::Edge) {
            let km = distance(device.position, server.position);
            if km <= radius_km {
                device.candidates.push(CandidateLink::new(server.id, km));
                device.covered = true;
            }
        }

        if device.covered {
            covered.push(device.id);
            for server in servers.iter().filter(|s| s.kind == ServerKind::Cloud) {
                let km = distance(device.position, server.position);
                device.candidates.push(CandidateLink::new(server.id, km));
            }
        } else {
            outputs.cost_non_coverage += device.non_service_cost;
        }
    }

    outputs.devices_covered = covered.len();
    covered
}

/// Fills connection, processing and response time for every candidate link
/// of every covered device. Cloud links travel device -> nearest edge -> cloud.
pub fn compute_timings(devices: &mut [Device], servers: &[Server]) {
    for device in devices.iter_mut().filter(|d| d.covered) {
        let mut nearest: Option<(usize, f64)> = None;
        let mut best_km = EARTH_RADIUS_KM;
        for link in &device.candidates {
            if servers[link.server].kind == ServerKind::Edge && link.distance_km < best_km {
                best_km = link.distance_km;
                nearest = Some((link.server, link.distance_km));
            }
        }

        let transmission_ms = device.workload / device.bandwidth * 1000.0;
        for link in &mut device.candidates {
            let server = &servers[link.server];
            link.processing_ms = device.workload * server.unit_processing_ms;

            link.connection_ms = match (server.kind, nearest) {
                (ServerKind::Cloud, Some((edge, edge_km))) => {
                    link.via_edge = Some(edge);
                    let path_km = edge_km + distance(servers[edge].position, server.position);
                    transmission_ms + path_km / SPEED_OF_LIGHT_KM_S * 1000.0 + INTER_DC_LATENCY_MS
                }
                (ServerKind::Cloud, None) => {
                    transmission_ms
                        + link.distance_km / SPEED_OF_LIGHT_KM_S * 1000.0
                        + INTER_DC_LATENCY_MS
                }
                (ServerKind::Edge, _) => {
                    transmission_ms + link.distance_km / SPEED_OF_LIGHT_KM_S * 1000.0
                }
            };
            link.response_ms = link.connection_ms + link.processing_ms;
        }
    }
}

/// Saturates each cloud server with one covered device: its memory and
/// storage demand are set just under the server's capacity and its
/// non-service cost to the maximum, so a greedy pass cannot skip it.
///
/// Returns the number of devices modified.
pub fn inject_bottleneck(
    state: &mut RunState,
    randomize: bool,
    rng: &mut dyn RngCore,
) -> Result<usize> {
    if state.has_assignments() || state.devices.iter().any(|d| d.served) {
        return Err(Error::BottleneckAfterAllocation);
    }

    let targets = state
        .servers
        .iter()
        .filter(|server| server.kind == ServerKind::Cloud)
        .map(|server| (server.memory, server.storage))
        .collect::<Vec<_>>();

    let mut order = state.covered.clone();
    if randomize {
        order.shuffle(rng);
    }
    if order.len() < targets.len() {
        warn!(
            covered = order.len(),
            cloud_servers = targets.len(),
            "not enough covered devices to saturate every cloud server"
        );
    }

    let mut injected = 0;
    for (&device_idx, &(memory, storage)) in order.iter().zip(targets.iter()) {
        let device = &mut state.devices[device_idx];
        device.memory = memory * BOTTLENECK_FILL;
        device.storage = storage * BOTTLENECK_FILL;
        device.non_service_cost = MAX_NON_SERVICE_COST;
        injected += 1;
    }
    info!(injected, randomize, "bottleneck injected");
    Ok(injected)
}
