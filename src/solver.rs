use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::metrics::{aggregate, AlgorithmDetail, Report};
use crate::state::RunState;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolverOutcome {
    /// Backend termination status, e.g. `Optimal` or `TimeLimit`.
    pub status: String,
    pub objective: f64,
    /// Relative optimality gap reported by the backend.
    pub gap: f64,
}

/// An integer-programming backend that assigns devices of a pre-calculated
/// state. Implementations commit through [`crate::state::Server::commit`] so
/// the usual metrics apply to their result.
pub trait ExactSolver {
    fn label(&self) -> String;
    fn solve(&mut self, state: &mut RunState, budget: Duration) -> Result<SolverOutcome>;
}

/// Runs `solver` on `state` and scores its assignment.
///
/// Solver failures do not propagate: they are logged, any partial assignment
/// is dropped and `None` is returned.
pub fn run_exact(
    solver: &mut dyn ExactSolver,
    state: &mut RunState,
    budget: Duration,
) -> Option<Report> {
    let label = solver.label();
    let started = Instant::now();
    let outcome = solver.solve(state, budget);
    state.metrics.outputs.execution_time_sec += started.elapsed().as_secs_f64();

    match outcome {
        Ok(outcome) => {
            aggregate(state);
            info!(
                solver = %label,
                status = %outcome.status,
                objective = outcome.objective,
                gap = outcome.gap,
                "exact solver finished"
            );
            Some(Report::new(
                label,
                state.metrics.clone(),
                AlgorithmDetail::Exact {
                    status: outcome.status,
                    objective: outcome.objective,
                    gap: outcome.gap,
                },
            ))
        }
        Err(err) => {
            warn!(solver = %label, error = %err, "exact solver produced no assignment");
            state.clear_assignments();
            aggregate(state);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::invariants::assert_consistent;
    use crate::error::Error;
    use crate::geo::Coordinates;
    use crate::state::fixtures::{device, linked_state, server};
    use crate::state::ServerKind;

    /// Commits every device to the first candidate with room.
    struct FirstFit;

    impl ExactSolver for FirstFit {
        fn label(&self) -> String {
            "first-fit".to_string()
        }

        fn solve(&mut self, state: &mut RunState, _budget: Duration) -> Result<SolverOutcome> {
            for idx in state.covered.clone() {
                for link in state.devices[idx].candidates.clone() {
                    if state.try_commit(idx, link) {
                        break;
                    }
                }
            }
            Ok(SolverOutcome {
                status: "Optimal".to_string(),
                objective: 0.5,
                gap: 0.0,
            })
        }
    }

    /// Commits one device, then fails.
    struct Crashing;

    impl ExactSolver for Crashing {
        fn label(&self) -> String {
            "crashing".to_string()
        }

        fn solve(&mut self, state: &mut RunState, _budget: Duration) -> Result<SolverOutcome> {
            let link = state.devices[0].candidates[0];
            state.try_commit(0, link);
            Err(Error::Solver("license expired".to_string()))
        }
    }

    fn sample_state() -> RunState {
        let at = Coordinates::new(45.46, 9.19);
        let servers = vec![
            server(0, ServerKind::Edge, at),
            server(1, ServerKind::Cloud, at),
        ];
        let devices = (0..6).map(|id| device(id, at)).collect();
        linked_state(devices, servers)
    }

    #[test]
    fn successful_solve_produces_exact_report() {
        let mut state = sample_state();
        let report = run_exact(&mut FirstFit, &mut state, Duration::from_secs(1)).unwrap();

        assert_eq!(report.algorithm, "first-fit");
        assert_eq!(report.metrics.outputs.devices_served, 6);
        assert_eq!(
            report.detail,
            AlgorithmDetail::Exact {
                status: "Optimal".to_string(),
                objective: 0.5,
                gap: 0.0,
            }
        );
        assert_consistent(&state);
    }

    #[test]
    fn failed_solve_returns_none_and_clears_partial_assignment() {
        let mut state = sample_state();
        let report = run_exact(&mut Crashing, &mut state, Duration::from_secs(1));

        assert!(report.is_none());
        assert!(!state.has_assignments());
        assert!(state.devices.iter().all(|d| !d.served));
        assert_eq!(state.metrics.outputs.devices_served, 0);
    }
}
