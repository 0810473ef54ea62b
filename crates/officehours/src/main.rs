// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! officehours - live help-queue server.

mod jobs;
mod serve;
mod shutdown;
mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use officehours_config::OfficeHoursConfig;

/// Live help queues for office hours.
#[derive(Parser, Debug)]
#[command(name = "officehours", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the HTTP/WebSocket server and the reclamation scheduler.
    Serve,
    /// Run the daily sweep once and exit.
    Sweep,
    /// Stale the live questions of one queue.
    Clean {
        /// Queue id.
        queue: i64,
        /// Clean even if staff are checked in.
        #[arg(long)]
        force: bool,
    },
    /// Check every staff member out of every queue.
    ForceCheckout,
    /// Validate the configuration and print where it was loaded from.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Option<OfficeHoursConfig> {
    let loaded = match path {
        Some(path) => officehours_config::load_and_validate_path(path),
        None => officehours_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            officehours_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sweep) => jobs::run_sweep(config).await,
        Some(Commands::Clean { queue, force }) => jobs::run_clean(config, queue, force).await,
        Some(Commands::ForceCheckout) => jobs::run_force_checkout(config).await,
        Some(Commands::CheckConfig) => {
            jobs::check_config(&config, cli.config.as_deref());
            Ok(())
        }
        None => {
            println!("officehours: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("officehours: {e}");
            ExitCode::FAILURE
        }
    }
}
