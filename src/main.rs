use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use groundmotion::{validate_input, Config, EventInfo, GroundMotionProcessor, Stream};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Strong-motion record processing
#[derive(Parser)]
#[command(name = "groundmotion")]
#[command(about = "Quality-control strong-motion records and compute intensity measures")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a stream and print its verdict and metrics as JSON
    Process {
        /// Stream file (JSON array of traces)
        input: PathBuf,

        /// Event origin time (RFC 3339)
        #[arg(long)]
        origin_time: DateTime<Utc>,

        /// Epicentral distance in km
        #[arg(long)]
        distance: f64,

        /// P-wave arrival at the station (RFC 3339)
        #[arg(long)]
        p_arrival: Option<DateTime<Utc>>,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Intensity measure components
        #[arg(long = "imc", default_values = ["channels", "greater_of_two_horizontals"])]
        imcs: Vec<String>,

        /// Intensity measure types
        #[arg(long = "imt", default_values = ["pga", "pgv", "sa1.0"])]
        imts: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = match (verbose, quiet) {
        (true, _) => "groundmotion=debug",
        (_, true) => "groundmotion=error",
        _ => "groundmotion=info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            origin_time,
            distance,
            p_arrival,
            config,
            imcs,
            imts,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_logging(verbose, quiet);

            // Load configuration
            let config = if let Some(config_path) = config {
                groundmotion::config::load_config(config_path)?
            } else {
                Config::default()
            };
            validate_input(&config)?;

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let stream: Stream = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", input.display()))?;

            let mut event = EventInfo::new(origin_time, distance);
            if let Some(pick) = p_arrival {
                event = event.with_p_arrival(pick);
            }

            let processor = GroundMotionProcessor::new(config);
            let (processed, summary) = processor.summarize(stream, &event, &imcs, &imts)?;

            let report = serde_json::json!({
                "stream": processed.id(),
                "passed": processed.passed(),
                "traces": processed
                    .iter()
                    .map(|t| serde_json::json!({ "id": t.id(), "processing": t.processing() }))
                    .collect::<Vec<_>>(),
                "metrics": summary.map(|s| s.table),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::ValidateConfig { config } => {
            let config = groundmotion::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
