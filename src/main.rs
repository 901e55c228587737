//! Carebench CLI - Acoustic Degradation Test Bench
//!
//! Command-line interface for degrading test utterances and running
//! scripted safety scenarios against the companion agent.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use carebench::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("Carebench v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Carebench v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Generate { output, duration } => {
            commands::generate(&output, duration)?;
        }
        Commands::Degrade {
            input,
            output,
            distance,
            snr,
            seed,
        } => {
            commands::degrade(&input, &output, distance, snr, seed)?;
        }
        #[cfg(not(feature = "remote-agent"))]
        Commands::Run {
            scenario,
            distance,
            snr,
            seed,
            baseline_dir,
            update_baseline,
        } => {
            commands::run(
                &scenario,
                distance,
                snr,
                seed,
                &baseline_dir,
                update_baseline,
                commands::scripted_agent(),
            )?;
        }
        #[cfg(feature = "remote-agent")]
        Commands::Run {
            scenario,
            distance,
            snr,
            seed,
            baseline_dir,
            update_baseline,
            endpoint,
        } => {
            let agent: Box<dyn carebench::agent::AgentClient> = match endpoint {
                Some(endpoint) => Box::new(carebench::agent::HttpAgent::new(endpoint, 10_000)),
                None => commands::scripted_agent(),
            };
            commands::run(
                &scenario,
                distance,
                snr,
                seed,
                &baseline_dir,
                update_baseline,
                agent,
            )?;
        }
        Commands::Baselines { baseline_dir } => {
            commands::list_baselines(&baseline_dir)?;
        }
    }

    Ok(())
}
