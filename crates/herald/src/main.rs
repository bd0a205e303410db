// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - a multi-tenant chat event dispatcher.
//!
//! This is the binary entry point for Herald.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod gate;
mod ndjson;
mod replay;
mod serve;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use herald_config::HeraldConfig;

/// Herald - a multi-tenant chat event dispatcher.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the XDG lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch NDJSON events read from stdin.
    Serve {
        /// Tenant to serve (defaults to the first `[[tenants]]` entry).
        #[arg(long)]
        tenant: Option<String>,
        /// NDJSON file of statuses missed while offline, viewed at start-up.
        #[arg(long, value_name = "FILE")]
        unseen: Option<PathBuf>,
    },
    /// Run a recorded NDJSON event file through the dispatcher.
    Replay {
        /// File with one inbound event per line.
        file: PathBuf,
        /// Tenant to replay as (defaults to the first `[[tenants]]` entry).
        #[arg(long)]
        tenant: Option<String>,
        /// Keep settings in memory instead of the configured database.
        #[arg(long)]
        in_memory: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> HeraldConfig {
    let loaded = match path {
        Some(path) => herald_config::load_and_validate_path(path),
        None => herald_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve { tenant, unseen }) => {
            init_tracing(&config.agent.log_level);
            serve::run_serve(config, tenant, unseen.as_deref()).await
        }
        Some(Commands::Replay {
            file,
            tenant,
            in_memory,
        }) => {
            init_tracing(&config.agent.log_level);
            replay::run_replay(config, &file, tenant, in_memory)
                .await
                .map(|_| ())
        }
        Some(Commands::Config) => match serde_json::to_string_pretty(&config) {
            Ok(rendered) => {
                println!("{rendered}");
                Ok(())
            }
            Err(e) => Err(herald_core::HeraldError::Internal(format!(
                "failed to render config: {e}"
            ))),
        },
        None => {
            println!("herald: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays a clean NDJSON action stream.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "herald={log_level},herald_dispatch={log_level},herald_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
