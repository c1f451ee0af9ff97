//! RSVP staircase runner.
//!
//! Commands:
//! - `run` runs a full session (adaptive staircases or fixed-level sweep)
//! - `levels` prints the size and contrast levels in use
//! - `config` prints the default configuration or checks a config file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rsvp_experiment::{ExperimentConfig, SeedMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;
mod console;

use app::{Mode, RunOptions};

#[derive(Parser)]
#[command(
    name = "rsvp-staircase",
    about = "Adaptive size and contrast thresholds with rapid serial visual presentation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session for one participant.
    Run {
        /// JSON config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Participant identifier, used in output file names.
        #[arg(long)]
        participant: String,

        /// Directory holding conditions.csv and contrast_conditions.csv.
        #[arg(long, default_value = ".")]
        conditions_dir: PathBuf,

        /// Output directory for trial, threshold and summary files.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Adaptive)]
        mode: Mode,

        /// Replace the participant with a simulated observer on a virtual clock.
        #[arg(long, default_value_t = false)]
        simulate: bool,

        /// Session seed; makes every stream reproducible.
        #[arg(long)]
        seed: Option<u64>,

        /// Nominal display refresh rate.
        #[arg(long, default_value_t = 60.0)]
        display_hz: f64,
    },
    /// Print size levels in degrees and contrast levels as colors.
    Levels {
        #[arg(long, default_value = ".")]
        conditions_dir: PathBuf,

        /// Background gray on the -1..1 scale.
        #[arg(long, default_value_t = 0.0)]
        background: f64,
    },
    /// Print the default config, or validate an existing one.
    Config {
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            participant,
            conditions_dir,
            output_dir,
            mode,
            simulate,
            seed,
            display_hz,
        } => {
            let mut config = match config {
                Some(path) => ExperimentConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ExperimentConfig::default(),
            };
            if let Some(seed) = seed {
                config.seed = SeedMode::Session { seed };
            }
            if simulate {
                config.pause_between_trials = false;
            }
            app::run(RunOptions {
                config,
                participant,
                conditions_dir,
                output_dir,
                mode,
                simulate,
                refresh_hz: display_hz,
            })
        }
        Commands::Levels {
            conditions_dir,
            background,
        } => app::print_levels(&conditions_dir, background),
        Commands::Config { check: Some(path) } => {
            let config = ExperimentConfig::from_json_file(&path)
                .with_context(|| format!("checking {}", path.display()))?;
            println!("{} is valid", path.display());
            println!("  task: {:?}", config.task);
            println!("  stream length: {}", config.stream.length);
            println!("  seed: {:?}", config.seed);
            Ok(())
        }
        Commands::Config { check: None } => {
            println!("{}", serde_json::to_string_pretty(&ExperimentConfig::default())?);
            Ok(())
        }
    }
}
