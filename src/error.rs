use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{what} must be greater than 0")]
    InvalidCount { what: &'static str },
    #[error("unknown network technology {0} (expected 1-6)")]
    UnknownTechnology(u8),
    #[error("annealing temperature must be > 0 (got {0})")]
    InvalidTemperature(f64),
    #[error("annealing alpha must be in (0, 1) (got {0})")]
    InvalidAlpha(f64),
    #[error("annealing trials must be greater than 0")]
    TrialsZero,
    #[error("initial heuristic for annealing cannot be '{0}'")]
    InvalidInitialHeuristic(String),
    #[error("no usable {0} records")]
    EmptyDataset(&'static str),
    #[error("{0}")]
    DataIo(String),
    #[error("bottleneck injection requires an unallocated state")]
    BottleneckAfterAllocation,
    #[error("solver failed: {0}")]
    Solver(String),
    #[error("{0}")]
    ResultsIo(String),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
}

pub type Result<T> = std::result::Result<T, Error>;
