// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! replaykit binary entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use replaykit::cli::{Cli, Command};
use replaykit::commands::{run_inspect, run_play};
use replaykit::output::print_error;

/// Log to stderr so stdout stays a clean JSON-lines stream.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("replaykit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("replaykit=info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Command::Play(args) => run_play(args, &mut stdout).await,
        Command::Inspect(args) => run_inspect(args, &mut stdout),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(e);
            ExitCode::FAILURE
        }
    }
}
