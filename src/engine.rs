use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::algorithms::{build_strategy, AllocationContext, SimulatedAnnealing};
use crate::dataset::{CachedSource, DataSource, SyntheticSource};
use crate::error::Result;
use crate::metrics::{AlgorithmDetail, Report};
use crate::models::{BottleneckConfig, SimConfig, StrategyConfig};
use crate::output::ResultsWriter;
use crate::precalc::{inject_bottleneck, pre_calculation, validate_inputs};
use crate::state::RunState;

/// Dataset seed used when the configuration leaves `seed` unset, so cached
/// tables stay comparable across entropy-seeded runs.
pub const DEFAULT_DATASET_SEED: u64 = 1;

pub fn validate_config(config: &SimConfig) -> Result<()> {
    validate_inputs(&config.inputs())?;
    if config.strategy == StrategyConfig::Annealing {
        config.annealing.validate()?;
    }
    Ok(())
}

/// Runs the configured scenario end to end and persists the reports when a
/// results directory is set.
pub fn run_simulation(config: &SimConfig) -> Result<Vec<Report>> {
    let dataset_seed = config.seed.unwrap_or(DEFAULT_DATASET_SEED);
    let mut source: Box<dyn DataSource> = match &config.data_dir {
        Some(dir) => Box::new(CachedSource::new(dir, SyntheticSource::new(dataset_seed))),
        None => Box::new(SyntheticSource::new(dataset_seed)),
    };
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let reports = run_with_source(config, source.as_mut(), &mut rng)?;

    if let Some(dir) = &config.results_dir {
        let writer = ResultsWriter::new(dir);
        for report in &reports {
            writer.append(report)?;
        }
    }
    Ok(reports)
}

/// Like [`run_simulation`], with the dataset and randomness supplied by the
/// caller and nothing written to disk.
pub fn run_with_source(
    config: &SimConfig,
    source: &mut dyn DataSource,
    rng: &mut dyn RngCore,
) -> Result<Vec<Report>> {
    validate_config(config)?;

    let mut state = pre_calculation(config.inputs(), source)?;
    match config.bottleneck {
        BottleneckConfig::Off => {}
        BottleneckConfig::Deterministic => {
            inject_bottleneck(&mut state, false, rng)?;
        }
        BottleneckConfig::Random => {
            inject_bottleneck(&mut state, true, rng)?;
        }
    }

    if config.strategy == StrategyConfig::Annealing {
        return Ok(run_annealing(config, &state, rng));
    }

    let mut strategy = build_strategy(config.strategy, &config.annealing);
    let mut ctx = AllocationContext {
        state: &mut state,
        rng,
    };
    strategy.allocate(&mut ctx);
    Ok(vec![Report::new(
        strategy.label(),
        state.metrics,
        AlgorithmDetail::Heuristic,
    )])
}

/// Independent annealing trials over copies of `base`. A deterministic initial
/// heuristic runs once and its result is copied into every trial; a random one
/// is re-run per trial.
fn run_annealing(config: &SimConfig, base: &RunState, rng: &mut dyn RngCore) -> Vec<Report> {
    let settings = &config.annealing;
    let annealer = SimulatedAnnealing::new(settings.params());
    let mut initial = build_strategy(settings.initial, settings);

    let seeded = if settings.initial.is_randomized() {
        None
    } else {
        let mut seeded = base.clone();
        initial.allocate(&mut AllocationContext {
            state: &mut seeded,
            rng: &mut *rng,
        });
        Some(seeded)
    };

    let mut reports = Vec::with_capacity(settings.trials);
    for trial in 0..settings.trials {
        let mut state = match &seeded {
            Some(seeded) => seeded.clone(),
            None => {
                let mut fresh = base.clone();
                initial.allocate(&mut AllocationContext {
                    state: &mut fresh,
                    rng: &mut *rng,
                });
                fresh
            }
        };

        let stats = annealer.anneal(&mut state, rng);
        debug!(
            trial,
            levels = stats.levels,
            attempts = stats.attempts,
            accepted = stats.accepted,
            improved = stats.improved,
            "annealing trial done"
        );

        reports.push(Report::new(
            "annealing",
            state.metrics,
            AlgorithmDetail::Annealing {
                initial: settings.initial.to_string(),
                temperature: settings.temperature,
                alpha: settings.alpha,
            },
        ));
    }

    info!(trials = reports.len(), initial = %settings.initial, "annealing finished");
    reports
}
