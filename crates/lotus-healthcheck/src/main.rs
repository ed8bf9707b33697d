//! Container healthcheck for a Lotus node.
//!
//! Resolves the API port from the node's config.toml, then runs two
//! sequential probes against localhost: the daemon's sync state over
//! JSON-RPC and the miner's metrics endpoint over HTTP. Exit code 0
//! means ready; any failure prints a diagnostic to stdout and exits 1.
//! The orchestrator owns the retry cadence — this binary never loops.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::warn;

use lotus_healthcheck::{api_port, check_daemon_synced, check_miner_metrics, lotus_path};
use lotus_rpc::{Deadline, FullNodeClient};

#[derive(Parser)]
#[command(
    name = "lotus-healthcheck",
    about = "Readiness probe for a Lotus daemon + miner",
    version,
)]
struct Cli {
    /// Node repo directory holding config.toml (defaults to $LOTUS_PATH).
    #[arg(long)]
    lotus_path: Option<PathBuf>,

    /// Overall deadline for both probes, in seconds.
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".parse().unwrap()),
        )
        // stdout is reserved for the diagnostic the orchestrator records.
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let port = match lotus_path(cli.lotus_path).and_then(|base| api_port(&base)) {
        Ok(port) => port,
        Err(e) => return fail(format!("Unable to find port number: {e}")),
    };

    let deadline = Deadline::after(Duration::from_secs(cli.timeout_secs));
    let url = format!("ws://localhost:{port}/rpc/v0");

    let mut api = match FullNodeClient::connect(&url, None, deadline).await {
        Ok(api) => api,
        Err(e) => return fail(format!("Failed to create API: {e}")),
    };

    // Wait for `lotus daemon` to finish syncing, then for `lotus-miner run`
    // to start reporting. First failure short-circuits.
    let verdict = match check_daemon_synced(&mut api, deadline).await {
        Err(e) => Err(format!("lotus daemon not running: {e}")),
        Ok(()) => match check_miner_metrics(port, deadline).await {
            Err(e) => Err(format!("lotus-miner not running: {e}")),
            Ok(()) => Ok(()),
        },
    };

    // Release the session exactly once, whatever the probes decided.
    if let Err(e) = api.close().await {
        warn!(error = %e, "failed to close rpc session");
    }

    match verdict {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => fail(message),
    }
}

fn fail(message: String) -> ExitCode {
    println!("{message}");
    ExitCode::FAILURE
}
