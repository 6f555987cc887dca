use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::Serialize;
use tracing::debug;

use crate::algorithms::{finish, AllocationContext, AllocationStrategy};
use crate::error::{Error, Result};
use crate::metrics::aggregate;
use crate::state::{CandidateLink, RunState, Server};

/// Neighbors evaluated per temperature level before cooling, absent improvements.
pub const INNER_ATTEMPTS: usize = 10;
pub const MIN_TEMPERATURE: f64 = 1e-3;
/// Candidates examined when looking for a neighbor of one device.
pub const MAX_NEIGHBOR_TRIES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnealingParams {
    pub temperature: f64,
    pub alpha: f64,
}

impl AnnealingParams {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(Error::InvalidTemperature(self.temperature));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidAlpha(self.alpha));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnealingStats {
    pub levels: usize,
    pub attempts: usize,
    pub accepted: usize,
    pub improved: usize,
    /// Best objective seen at the end of each temperature level.
    pub best_cost_trace: Vec<f64>,
}

/// Improves an existing assignment by moving single devices between servers,
/// minimizing non-service plus activation cost.
pub struct SimulatedAnnealing {
    params: AnnealingParams,
}

/// What a neighbor move changed, enough to put it back.
struct Move {
    device: usize,
    from: Option<CandidateLink>,
    to: CandidateLink,
    cost_non_service: f64,
    cost_servers_used: f64,
}

struct Snapshot {
    servers: Vec<Server>,
    links: Vec<Option<CandidateLink>>,
}

impl Snapshot {
    fn capture(state: &RunState) -> Self {
        Self {
            servers: state.servers.clone(),
            links: state.devices.iter().map(|d| d.server).collect(),
        }
    }

    fn restore(self, state: &mut RunState) {
        state.servers = self.servers;
        for (device, link) in state.devices.iter_mut().zip(self.links) {
            device.served = link.is_some();
            device.server = link;
        }
    }
}

impl SimulatedAnnealing {
    pub fn new(params: AnnealingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> AnnealingParams {
        self.params
    }

    /// Anneals `state` in place, leaving it at the best assignment found.
    pub fn anneal(&self, state: &mut RunState, rng: &mut dyn RngCore) -> AnnealingStats {
        let started = Instant::now();
        aggregate(state);

        let mut cost_non_service = state.metrics.outputs.cost_non_service;
        let mut cost_servers_used = state.metrics.outputs.cost_servers_used;
        let mut current = cost_non_service + cost_servers_used;
        let mut best_cost = current;
        let mut best = Snapshot::capture(state);
        let mut stats = AnnealingStats::default();

        let mut temperature = self.params.temperature;
        while temperature > MIN_TEMPERATURE {
            let mut attempt = 0;
            while attempt < INNER_ATTEMPTS {
                stats.attempts += 1;
                let applied = neighbor(state, rng, &mut cost_non_service, &mut cost_servers_used);
                let candidate = cost_non_service + cost_servers_used;
                let delta = candidate - current;

                if delta < 0.0 {
                    stats.accepted += 1;
                    stats.improved += 1;
                    current = candidate;
                    attempt = 0;
                    if current < best_cost {
                        best_cost = current;
                        best = Snapshot::capture(state);
                    }
                } else if rng.gen::<f64>() < (-delta / temperature).exp() {
                    stats.accepted += 1;
                    current = candidate;
                } else if let Some(applied) = applied {
                    undo(state, &applied);
                    cost_non_service = applied.cost_non_service;
                    cost_servers_used = applied.cost_servers_used;
                }
                attempt += 1;
            }

            stats.levels += 1;
            stats.best_cost_trace.push(best_cost);
            debug!(temperature, current, best = best_cost, "temperature level done");
            temperature *= self.params.alpha;
        }

        best.restore(state);
        finish(&self.label(), state, started);
        stats
    }
}

impl AllocationStrategy for SimulatedAnnealing {
    fn label(&self) -> String {
        "annealing".to_string()
    }

    fn allocate(&mut self, ctx: &mut AllocationContext) {
        self.anneal(&mut *ctx.state, &mut *ctx.rng);
    }
}

/// Moves one random covered device to another candidate server with room,
/// keeping the running cost terms in step. Returns `None` when nothing moved.
fn neighbor(
    state: &mut RunState,
    rng: &mut dyn RngCore,
    cost_non_service: &mut f64,
    cost_servers_used: &mut f64,
) -> Option<Move> {
    let device_idx = *state.covered.choose(&mut *rng)?;
    let count = state.devices[device_idx].candidates.len();
    if count == 0 {
        return None;
    }

    let mut order = (0..count).collect::<Vec<_>>();
    order.shuffle(&mut *rng);

    let device = &mut state.devices[device_idx];
    let current = device.server;
    for &pick in order.iter().take(MAX_NEIGHBOR_TRIES) {
        let link = device.candidates[pick];
        if current.map(|c| c.server) == Some(link.server) {
            continue;
        }
        if !state.servers[link.server].can_serve(device) {
            continue;
        }

        let applied = Move {
            device: device_idx,
            from: current,
            to: link,
            cost_non_service: *cost_non_service,
            cost_servers_used: *cost_servers_used,
        };

        if !state.servers[link.server].active {
            *cost_servers_used += state.servers[link.server].activation_cost;
        }
        match current {
            Some(old) => {
                let old_server = &mut state.servers[old.server];
                old_server.release(device);
                if !old_server.active {
                    *cost_servers_used -= old_server.activation_cost;
                }
            }
            None => *cost_non_service -= device.non_service_cost,
        }
        state.servers[link.server].commit(device, link);
        return Some(applied);
    }
    None
}

fn undo(state: &mut RunState, applied: &Move) {
    let device = &mut state.devices[applied.device];
    state.servers[applied.to.server].release(device);
    if let Some(from) = applied.from {
        state.servers[from.server].commit(device, from);
    }
}
