use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::algorithms::AnnealingParams;
use crate::error::{Error, Result};
use crate::metrics::Inputs;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    pub devices: usize,
    pub edge_servers: usize,
    pub cloud_servers: usize,
    pub tech: u8,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub annealing: AnnealingConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub bottleneck: BottleneckConfig,
    /// Cache directory for dataset tables; data is generated in memory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Root for `;`-delimited result files; nothing is persisted when unset.
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
}

impl SimConfig {
    pub fn inputs(&self) -> Inputs {
        Inputs {
            devices: self.devices,
            edge_servers: self.edge_servers,
            cloud_servers: self.cloud_servers,
            tech: self.tech,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyConfig {
    Random,
    GreedyAscAsc,
    GreedyAscDesc,
    GreedyDescAsc,
    GreedyDescDesc,
    Annealing,
}

impl StrategyConfig {
    pub const ALL: [StrategyConfig; 6] = [
        StrategyConfig::Random,
        StrategyConfig::GreedyAscAsc,
        StrategyConfig::GreedyAscDesc,
        StrategyConfig::GreedyDescAsc,
        StrategyConfig::GreedyDescDesc,
        StrategyConfig::Annealing,
    ];

    /// Whether two runs on the same state can produce different assignments.
    pub fn is_randomized(&self) -> bool {
        matches!(self, StrategyConfig::Random | StrategyConfig::Annealing)
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyConfig::Random => "random",
            StrategyConfig::GreedyAscAsc => "greedy-asc-asc",
            StrategyConfig::GreedyAscDesc => "greedy-asc-desc",
            StrategyConfig::GreedyDescAsc => "greedy-desc-asc",
            StrategyConfig::GreedyDescDesc => "greedy-desc-desc",
            StrategyConfig::Annealing => "annealing",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AnnealingConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Heuristic producing the starting solution of every trial.
    #[serde(default = "default_initial")]
    pub initial: StrategyConfig,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            alpha: default_alpha(),
            trials: default_trials(),
            initial: default_initial(),
        }
    }
}

impl AnnealingConfig {
    pub fn params(&self) -> AnnealingParams {
        AnnealingParams {
            temperature: self.temperature,
            alpha: self.alpha,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.params().validate()?;
        if self.trials == 0 {
            return Err(Error::TrialsZero);
        }
        if self.initial == StrategyConfig::Annealing {
            return Err(Error::InvalidInitialHeuristic(self.initial.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BottleneckConfig {
    #[default]
    Off,
    Deterministic,
    Random,
}

impl fmt::Display for BottleneckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BottleneckConfig::Off => write!(f, "off"),
            BottleneckConfig::Deterministic => write!(f, "deterministic"),
            BottleneckConfig::Random => write!(f, "random"),
        }
    }
}

fn default_temperature() -> f64 {
    100.0
}

fn default_alpha() -> f64 {
    0.95
}

fn default_trials() -> usize {
    120
}

fn default_initial() -> StrategyConfig {
    StrategyConfig::GreedyDescAsc
}
