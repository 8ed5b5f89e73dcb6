//! configurador - apply UI-staged network settings
//!
//! Reads `/tmp/netcop-cfg.tmp`, validates it, rewrites the interface
//! descriptor, resolver file and bandwidth file, and reloads networking.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use netcop_configurador::config::DEFAULT_CONFIG_FILE;
use netcop_configurador::{Deployment, Reconciler, util};

#[derive(Parser, Debug)]
#[command(name = "configurador")]
#[command(about = "Apply network settings staged by the netcop UI", long_about = None)]
#[command(version)]
struct Cli {
    /// Deployment configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the staging file, write the configuration and reload networking.
    Apply,
    /// Print the configuration currently applied to the host.
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let deployment = Deployment::load(&cli.config)?;
    let reconciler = Reconciler::from_deployment(deployment);

    match cli.command.unwrap_or(Command::Apply) {
        Command::Apply => {
            if !util::is_root() {
                tracing::warn!("Not running as root, writing system files will likely fail");
            }
            reconciler.run().with_context(|| {
                format!(
                    "could not apply settings from {}",
                    reconciler.temp_file().display()
                )
            })?;
        }
        Command::Show => {
            let current = reconciler
                .current_state()
                .context("could not read current configuration")?;
            print!("{current}");
        }
    }
    Ok(())
}
