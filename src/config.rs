use std::fs;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::validate_config;
use crate::error::{Error, Result};
use crate::models::{AnnealingConfig, BottleneckConfig, SimConfig, StrategyConfig};

#[derive(Parser, Debug)]
#[command(
    name = "edge-alloc",
    version,
    about = "Allocate devices to capacity-constrained edge and cloud servers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pre-calculate a scenario and run one allocation strategy on it.
    Run(RunArgs),
    /// Print the names accepted by --strategy and --initial.
    ListStrategies,
    /// Print the configuration a run would use, without running it.
    ShowConfig(ScenarioArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

/// Scenario options. Flags given alongside `--config` override the file.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub devices: Option<usize>,
    #[arg(long)]
    pub edge_servers: Option<usize>,
    #[arg(long)]
    pub cloud_servers: Option<usize>,
    #[arg(long, help = "Network technology generation, 1-6")]
    pub tech: Option<u8>,
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub alpha: Option<f64>,
    #[arg(long)]
    pub trials: Option<usize>,
    #[arg(long, value_enum, help = "Heuristic that seeds every annealing trial")]
    pub initial: Option<StrategyArg>,
    #[arg(
        long,
        help = "Seed for dataset generation and strategy randomness; omit for an entropy-seeded run"
    )]
    pub seed: Option<u64>,
    #[arg(long, value_enum)]
    pub bottleneck: Option<BottleneckArg>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    Random,
    GreedyAscAsc,
    GreedyAscDesc,
    GreedyDescAsc,
    GreedyDescDesc,
    Annealing,
}

impl From<StrategyArg> for StrategyConfig {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Random => StrategyConfig::Random,
            StrategyArg::GreedyAscAsc => StrategyConfig::GreedyAscAsc,
            StrategyArg::GreedyAscDesc => StrategyConfig::GreedyAscDesc,
            StrategyArg::GreedyDescAsc => StrategyConfig::GreedyDescAsc,
            StrategyArg::GreedyDescDesc => StrategyConfig::GreedyDescDesc,
            StrategyArg::Annealing => StrategyConfig::Annealing,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BottleneckArg {
    Off,
    Deterministic,
    Random,
}

impl From<BottleneckArg> for BottleneckConfig {
    fn from(value: BottleneckArg) -> Self {
        match value {
            BottleneckArg::Off => BottleneckConfig::Off,
            BottleneckArg::Deterministic => BottleneckConfig::Deterministic,
            BottleneckArg::Random => BottleneckConfig::Random,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

pub fn parse_args() -> Result<Cli> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => Err(Error::Cli(err.to_string().trim_end().to_string())),
    }
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Resolves a [`SimConfig`] from an optional config file plus flag overrides,
/// then validates it.
pub fn build_config(args: ScenarioArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig {
            devices: required(args.devices, "--devices")?,
            edge_servers: required(args.edge_servers, "--edge-servers")?,
            cloud_servers: required(args.cloud_servers, "--cloud-servers")?,
            tech: required(args.tech, "--tech")?,
            strategy: required(args.strategy, "--strategy")?.into(),
            annealing: AnnealingConfig::default(),
            seed: None,
            bottleneck: BottleneckConfig::Off,
            data_dir: None,
            results_dir: None,
        },
    };

    if let Some(devices) = args.devices {
        config.devices = devices;
    }
    if let Some(edge_servers) = args.edge_servers {
        config.edge_servers = edge_servers;
    }
    if let Some(cloud_servers) = args.cloud_servers {
        config.cloud_servers = cloud_servers;
    }
    if let Some(tech) = args.tech {
        config.tech = tech;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(temperature) = args.temperature {
        config.annealing.temperature = temperature;
    }
    if let Some(alpha) = args.alpha {
        config.annealing.alpha = alpha;
    }
    if let Some(trials) = args.trials {
        config.annealing.trials = trials;
    }
    if let Some(initial) = args.initial {
        config.annealing.initial = initial.into();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(bottleneck) = args.bottleneck {
        config.bottleneck = bottleneck.into();
    }
    if args.data_dir.is_some() {
        config.data_dir = args.data_dir;
    }
    if args.results_dir.is_some() {
        config.results_dir = args.results_dir;
    }

    validate_config(&config)?;
    Ok(config)
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| Error::Cli(format!("missing {} (or pass --config)", flag)))
}
