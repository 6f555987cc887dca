use edge_alloc::config::{self, Command, FormatArg};
use edge_alloc::engine;
use edge_alloc::error::Result;
use edge_alloc::models::StrategyConfig;
use edge_alloc::output::{self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = config::parse_args()?;
    match cli.command {
        Command::Run(args) => {
            let config = config::build_config(args.scenario)?;
            let reports = engine::run_simulation(&config)?;
            let formatter = formatter_for(&args.format);
            print!("{}", formatter.write(&reports));
        }
        Command::ListStrategies => {
            for strategy in StrategyConfig::ALL {
                println!("{}", strategy);
            }
        }
        Command::ShowConfig(args) => {
            let config = config::build_config(args)?;
            print!("{}", output::describe_config(&config));
        }
    }
    Ok(())
}

fn formatter_for(format: &FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
