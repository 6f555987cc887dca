use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::algorithms::{finish, AllocationContext, AllocationStrategy};

/// Visits covered devices in random order and offers each one a random
/// candidate. Drawing one past the last candidate leaves the device unserved
/// even when capacity remains.
#[derive(Default)]
pub struct RandomStrategy;

impl AllocationStrategy for RandomStrategy {
    fn label(&self) -> String {
        "random".to_string()
    }

    fn allocate(&mut self, ctx: &mut AllocationContext) {
        let started = Instant::now();
        let state = &mut *ctx.state;

        let mut order = state.covered.clone();
        order.shuffle(&mut *ctx.rng);

        for device_idx in order {
            let count = state.devices[device_idx].candidates.len();
            if count == 0 {
                continue;
            }
            let pick = ctx.rng.gen_range(0..=count);
            if pick == count {
                continue;
            }
            let link = state.devices[device_idx].candidates[pick];
            state.try_commit(device_idx, link);
        }

        finish(&self.label(), state, started);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::invariants::assert_consistent;
    use crate::geo::Coordinates;
    use crate::state::fixtures::{device, linked_state, server};
    use crate::state::ServerKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at() -> Coordinates {
        Coordinates::new(45.46, 9.19)
    }

    #[test]
    fn random_respects_capacity_and_legality() {
        let servers = vec![
            server(0, ServerKind::Edge, at()),
            server(1, ServerKind::Edge, at()),
            server(2, ServerKind::Cloud, at()),
        ];
        let devices = (0..30).map(|id| device(id, at())).collect();
        let mut state = linked_state(devices, servers);
        let mut rng = StdRng::seed_from_u64(7);

        let mut ctx = AllocationContext {
            state: &mut state,
            rng: &mut rng,
        };
        RandomStrategy.allocate(&mut ctx);

        assert_consistent(&state);
        // 3 servers x 4 cores bound the number of one-core devices served.
        assert!(state.metrics.outputs.devices_served <= 12);
        assert!(state.metrics.outputs.devices_served > 0);
    }

    #[test]
    fn random_is_reproducible_with_same_seed() {
        let build = || {
            let servers = vec![
                server(0, ServerKind::Edge, at()),
                server(1, ServerKind::Cloud, at()),
            ];
            let devices = (0..10).map(|id| device(id, at())).collect();
            linked_state(devices, servers)
        };

        let mut a = build();
        let mut b = build();
        for state in [&mut a, &mut b] {
            let mut rng = StdRng::seed_from_u64(21);
            let mut ctx = AllocationContext { state, rng: &mut rng };
            RandomStrategy.allocate(&mut ctx);
        }

        let links = |s: &crate::state::RunState| {
            s.devices
                .iter()
                .map(|d| d.server.map(|l| l.server))
                .collect::<Vec<_>>()
        };
        assert_eq!(links(&a), links(&b));
    }

    #[test]
    fn covered_device_without_candidates_stays_unserved() {
        let servers = vec![server(0, ServerKind::Edge, at())];
        let devices = vec![device(0, at()), device(1, at())];
        let mut state = linked_state(devices, servers);
        state.devices[1].candidates.clear();
        let mut rng = StdRng::seed_from_u64(1);

        let mut ctx = AllocationContext {
            state: &mut state,
            rng: &mut rng,
        };
        RandomStrategy.allocate(&mut ctx);

        assert!(!state.devices[1].served);
        assert!(state.metrics.outputs.cost_non_service >= state.devices[1].non_service_cost);
        assert_consistent(&state);
    }
}
