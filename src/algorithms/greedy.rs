use std::cmp::Ordering;
use std::time::Instant;

use crate::algorithms::{finish, AllocationContext, AllocationStrategy};
use crate::geo::{sort_indices, Direction};
use crate::state::CandidateLink;

/// Serves covered devices ordered by non-service cost, giving each the first
/// candidate with room when candidates are ordered by response time.
pub struct GreedyStrategy {
    devices: Direction,
    servers: Direction,
}

impl GreedyStrategy {
    pub fn new(devices: Direction, servers: Direction) -> Self {
        Self { devices, servers }
    }
}

fn short(direction: Direction) -> &'static str {
    match direction {
        Direction::Ascending => "asc",
        Direction::Descending => "desc",
    }
}

fn by_response(direction: Direction) -> impl Fn(&CandidateLink, &CandidateLink) -> Ordering {
    move |a, b| {
        let ord = a
            .response_ms
            .partial_cmp(&b.response_ms)
            .unwrap_or(Ordering::Equal);
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

impl AllocationStrategy for GreedyStrategy {
    fn label(&self) -> String {
        format!("greedy-{}-{}", short(self.devices), short(self.servers))
    }

    fn allocate(&mut self, ctx: &mut AllocationContext) {
        let started = Instant::now();
        let state = &mut *ctx.state;

        let mut order = state.covered.clone();
        let devices = &state.devices;
        sort_indices(&mut order, self.devices, |idx| devices[idx].non_service_cost);

        for device_idx in order {
            let mut links = state.devices[device_idx].candidates.clone();
            links.sort_by(by_response(self.servers));
            for link in links {
                if state.try_commit(device_idx, link) {
                    break;
                }
            }
        }

        finish(&self.label(), state, started);
    }
}
