mod annealing;
mod greedy;
mod random;

use std::time::Instant;

use rand::RngCore;
use tracing::info;

use crate::geo::Direction;
use crate::metrics::aggregate;
use crate::models::{AnnealingConfig, StrategyConfig};
use crate::state::RunState;

pub use annealing::{AnnealingParams, AnnealingStats, SimulatedAnnealing};
pub use greedy::GreedyStrategy;
pub use random::RandomStrategy;

/// Commits devices of a pre-calculated state to servers, then refreshes its metrics.
pub trait AllocationStrategy {
    fn label(&self) -> String;
    fn allocate(&mut self, ctx: &mut AllocationContext);
}

pub struct AllocationContext<'a> {
    pub state: &'a mut RunState,
    pub rng: &'a mut dyn RngCore,
}

pub fn build_strategy(
    strategy: StrategyConfig,
    annealing: &AnnealingConfig,
) -> Box<dyn AllocationStrategy> {
    use Direction::{Ascending, Descending};

    match strategy {
        StrategyConfig::Random => Box::new(RandomStrategy),
        StrategyConfig::GreedyAscAsc => Box::new(GreedyStrategy::new(Ascending, Ascending)),
        StrategyConfig::GreedyAscDesc => Box::new(GreedyStrategy::new(Ascending, Descending)),
        StrategyConfig::GreedyDescAsc => Box::new(GreedyStrategy::new(Descending, Ascending)),
        StrategyConfig::GreedyDescDesc => Box::new(GreedyStrategy::new(Descending, Descending)),
        StrategyConfig::Annealing => Box::new(SimulatedAnnealing::new(annealing.params())),
    }
}

/// Books the time spent since `started` and re-aggregates the state.
pub(crate) fn finish(label: &str, state: &mut RunState, started: Instant) {
    state.metrics.outputs.execution_time_sec += started.elapsed().as_secs_f64();
    aggregate(state);
    let out = &state.metrics.outputs;
    info!(
        strategy = label,
        served = out.devices_served,
        servers_used = out.servers_used,
        total_cost = out.total_cost,
        "allocation complete"
    );
}

#[cfg(test)]
pub(crate) mod invariants {
    use std::collections::HashSet;

    use crate::state::RunState;

    const EPS: f64 = 1e-9;

    /// Asserts every structural property a committed assignment must satisfy.
    pub fn assert_consistent(state: &RunState) {
        for server in &state.servers {
            assert_eq!(
                server.active,
                !server.supply.devices.is_empty(),
                "server {} activation flag out of sync",
                server.id
            );

            let members = server
                .supply
                .devices
                .iter()
                .map(|&id| &state.devices[id])
                .collect::<Vec<_>>();
            let pcc = members.iter().map(|d| d.pcc).sum::<f64>();
            let cores = members.iter().map(|d| d.cores).sum::<u32>();
            let memory = members.iter().map(|d| d.memory).sum::<f64>();
            let storage = members.iter().map(|d| d.storage).sum::<f64>();
            let bandwidth = members.iter().map(|d| d.bandwidth).sum::<f64>();
            assert!(pcc <= server.pcc_total + EPS, "server {} pcc", server.id);
            assert!(cores <= server.cores, "server {} cores", server.id);
            assert!(memory <= server.memory + EPS, "server {} memory", server.id);
            assert!(storage <= server.storage + EPS, "server {} storage", server.id);
            assert!(bandwidth <= server.bandwidth + EPS, "server {} bandwidth", server.id);
        }

        let mut seen = HashSet::new();
        for server in &state.servers {
            for &id in &server.supply.devices {
                assert!(seen.insert(id), "device {} held by two servers", id);
            }
        }

        for device in &state.devices {
            match device.server {
                Some(link) => {
                    assert!(device.served);
                    assert!(
                        device.candidates.iter().any(|c| c.server == link.server),
                        "device {} committed outside its candidate list",
                        device.id
                    );
                    assert!(state.servers[link.server]
                        .supply
                        .devices
                        .contains(&device.id));
                }
                None => {
                    assert!(!device.served);
                    assert!(!seen.contains(&device.id));
                }
            }
        }
    }
}
