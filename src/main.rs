//! Command-line front end for computing downwelling spectra.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use downwelling_rtm::{
    AttenuationProvider, Method, ProfileDatabase, ProfileSource, RunConfig, SaturationMethod,
    Species, StandardAttenuation,
};

#[derive(Debug, Parser)]
#[command(version, about = "Downwelling microwave brightness temperature spectra")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a spectrum for the sounding selected in a configuration file
    Run {
        /// TOML run configuration
        #[arg(short, long, env = "DOWNWELLING_CONFIG")]
        config: PathBuf,
        /// Number of worker threads, overriding the configuration
        #[arg(short, long)]
        workers: Option<NonZeroUsize>,
        /// Directory for the result and progress files, overriding the
        /// configuration
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List the available models and methods
    Models,
    /// List the soundings in a profile database
    Keys {
        /// JSON profile database
        #[arg(short, long)]
        database: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run {
            config,
            workers,
            output_dir,
        } => {
            let mut run_config = RunConfig::load(&config)
                .with_context(|| format!("reading configuration {}", config.display()))?;
            if let Some(workers) = workers {
                run_config.worker_count = Some(workers.get());
            }
            if let Some(output_dir) = output_dir {
                run_config.output_dir = output_dir;
            }

            let selection = run_config
                .profile
                .clone()
                .context("the configuration has no [profile] section")?;
            let database = ProfileDatabase::load(&selection.database).with_context(|| {
                format!("reading profile database {}", selection.database.display())
            })?;
            let raw = database.require(&selection.key())?;
            info!("Using sounding {}", selection.key());

            let spectrum = downwelling_rtm::run(&run_config, raw, &StandardAttenuation)
                .context("computing spectrum")?;
            info!(
                "Wrote {} samples to {}",
                spectrum.len(),
                run_config.output_dir.display()
            );
        }
        Command::Models => {
            for species in [Species::Oxygen, Species::WaterVapor] {
                println!("{species} models: {}", StandardAttenuation.models(species).join(", "));
            }
            let methods: Vec<_> = Method::ALL.iter().map(|m| m.name()).collect();
            println!("integration methods: {}", methods.join(", "));
            let humidity: Vec<_> = SaturationMethod::ALL.iter().map(|m| m.name()).collect();
            println!("humidity methods: {}", humidity.join(", "));
        }
        Command::Keys { database } => {
            let database = ProfileDatabase::load(&database)
                .with_context(|| format!("reading profile database {}", database.display()))?;
            for key in database.keys() {
                println!("{key}");
            }
        }
    }

    Ok(())
}
