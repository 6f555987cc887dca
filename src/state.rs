use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::metrics::Metrics;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum ServerKind {
    Edge,
    Cloud,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Edge => write!(f, "EC"),
            ServerKind::Cloud => write!(f, "CC"),
        }
    }
}

/// A legal device/server pairing with its precomputed timings (all times in ms).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CandidateLink {
    pub server: usize,
    pub distance_km: f64,
    /// Nearest edge server the traffic is routed through; set on cloud links only.
    pub via_edge: Option<usize>,
    pub connection_ms: f64,
    pub processing_ms: f64,
    pub response_ms: f64,
}

impl CandidateLink {
    pub fn new(server: usize, distance_km: f64) -> Self {
        Self {
            server,
            distance_km,
            via_edge: None,
            connection_ms: 0.0,
            processing_ms: 0.0,
            response_ms: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Device {
    pub id: usize,
    pub position: Coordinates,
    pub service: u32,
    /// Penalty paid when the device is left without a server.
    pub non_service_cost: f64,
    pub pcc: f64,
    pub cores: u32,
    pub memory: f64,
    pub storage: f64,
    /// Size of the task shipped to the server.
    pub workload: f64,
    pub bandwidth: f64,
    pub covered: bool,
    pub served: bool,
    pub server: Option<CandidateLink>,
    pub candidates: Vec<CandidateLink>,
}

/// Demand currently committed to a server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Supply {
    pub cores: u32,
    pub non_service_cost: f64,
    pub pcc: f64,
    pub memory: f64,
    pub storage: f64,
    pub bandwidth: f64,
    pub devices: BTreeSet<usize>,
}

#[derive(Clone, Debug)]
pub struct Server {
    pub id: usize,
    pub kind: ServerKind,
    pub position: Coordinates,
    pub activation_cost: f64,
    pub pcc_per_core: f64,
    pub pcc_total: f64,
    pub cores: u32,
    pub memory: f64,
    pub storage: f64,
    pub bandwidth: f64,
    /// Processing time per unit of workload.
    pub unit_processing_ms: f64,
    pub active: bool,
    pub supply: Supply,
}

impl Server {
    pub fn can_serve(&self, device: &Device) -> bool {
        self.supply.pcc + device.pcc <= self.pcc_total
            && self.supply.cores + device.cores <= self.cores
            && self.supply.memory + device.memory <= self.memory
            && self.supply.storage + device.storage <= self.storage
            && self.supply.bandwidth + device.bandwidth <= self.bandwidth
    }

    /// Binds `device` to this server through `link`. Capacity is not checked
    /// here; callers run [`Server::can_serve`] first.
    pub fn commit(&mut self, device: &mut Device, link: CandidateLink) -> bool {
        if !self.supply.devices.insert(device.id) {
            return false;
        }

        self.active = true;
        self.supply.non_service_cost += device.non_service_cost;
        self.supply.pcc += device.pcc;
        self.supply.cores += device.cores;
        self.supply.memory += device.memory;
        self.supply.storage += device.storage;
        self.supply.bandwidth += device.bandwidth;
        device.served = true;
        device.server = Some(link);
        true
    }

    pub fn release(&mut self, device: &mut Device) -> bool {
        if !self.supply.devices.remove(&device.id) {
            return false;
        }

        self.supply.non_service_cost -= device.non_service_cost;
        self.supply.pcc -= device.pcc;
        self.supply.cores -= device.cores;
        self.supply.memory -= device.memory;
        self.supply.storage -= device.storage;
        self.supply.bandwidth -= device.bandwidth;
        device.served = false;
        device.server = None;

        if self.supply.devices.is_empty() {
            self.active = false;
        }
        true
    }
}

/// Everything a strategy needs: devices, servers, covered device indices and
/// the metrics of the current assignment.
#[derive(Clone, Debug)]
pub struct RunState {
    pub devices: Vec<Device>,
    pub servers: Vec<Server>,
    pub covered: Vec<usize>,
    pub metrics: Metrics,
}

impl RunState {
    /// Commits `devices[device]` to the server behind `link` if it has room.
    pub fn try_commit(&mut self, device: usize, link: CandidateLink) -> bool {
        let device = &mut self.devices[device];
        let server = &mut self.servers[link.server];
        if !server.can_serve(device) {
            return false;
        }
        server.commit(device, link)
    }

    pub fn release(&mut self, device: usize) -> bool {
        let device = &mut self.devices[device];
        match device.server {
            Some(link) => self.servers[link.server].release(device),
            None => false,
        }
    }

    /// Drops every commitment, leaving coverage and candidate links untouched.
    pub fn clear_assignments(&mut self) {
        for device in &mut self.devices {
            device.served = false;
            device.server = None;
        }
        for server in &mut self.servers {
            server.active = false;
            server.supply = Supply::default();
        }
    }

    pub fn has_assignments(&self) -> bool {
        self.servers.iter().any(|server| server.active)
    }
}
