//! End-to-end test of the published Lotus image.
//!
//! Boots the image under Docker, waits for its healthcheck to report
//! healthy, pulls the admin token out of the container filesystem, then
//! drives a storage deal over the node's JSON-RPC API until the provider
//! starts checking the proposal for acceptance.
//!
//! Needs a Docker daemon and the image name in `TEST_IMAGE`:
//!
//! ```text
//! TEST_IMAGE=lotus:dev cargo test --test image -- --ignored --nocapture
//! ```

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use rand::RngCore;

use lotus_rpc::{
    DEAL_CHECK_FOR_ACCEPTANCE, DataRef, Deadline, FileRef, FullNodeClient, StartDealParams,
    TRANSFER_GRAPHSYNC, deal_state_is_failed, deal_state_name,
};

/// Where the test volume is mounted inside the container.
const CONTAINER_TEST_DIR: &str = "/tmp/testdata";
const TEST_FILE: &str = "temp.bin";
/// API port the image exposes.
const API_PORT: u16 = 1234;
/// Admin token path inside the container.
const TOKEN_PATH: &str = "/home/lotus_user/.lotus-local-net/token";
/// Observed on-chain minimum deal duration in epochs (180 days), not the
/// 24-hour figure the lotus CLI suggests.
const MIN_DEAL_DURATION_EPOCHS: u64 = 518_400;

const POLL_ATTEMPTS: u32 = 50;
const POLL_DELAY: Duration = Duration::from_secs(5);

/// Stops the container when the test ends, pass or fail.
struct Container {
    id: String,
}

impl Drop for Container {
    fn drop(&mut self) {
        let _ = Command::new("docker").args(["stop", &self.id]).output();
    }
}

fn docker(args: &[&str]) -> Result<String> {
    let output = Command::new("docker")
        .args(args)
        .output()
        .context("invoke docker")?;
    ensure!(
        output.status.success(),
        "docker {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn wait_until_healthy(container: &Container) -> Result<()> {
    for attempt in 1..=POLL_ATTEMPTS {
        let status = docker(&[
            "inspect",
            "--format",
            "{{.State.Health.Status}}",
            &container.id,
        ])?;
        if status == "healthy" {
            eprintln!("container healthy after {attempt} polls");
            return Ok(());
        }
        eprintln!("health status: {status} ({attempt}/{POLL_ATTEMPTS})");
        tokio::time::sleep(POLL_DELAY).await;
    }
    bail!("container {} never became healthy", container.id)
}

/// Host port Docker mapped onto the image's API port.
fn published_port(container: &Container) -> Result<u16> {
    // Prints lines like `0.0.0.0:49155`, one per address family.
    let output = docker(&["port", &container.id, &format!("{API_PORT}/tcp")])?;
    let line = output.lines().next().context("no published port")?;
    let port = line.rsplit(':').next().context("malformed port line")?;
    port.trim().parse().context("parse published port")
}

async fn run_deal(api: &mut FullNodeClient, deadline: Deadline) -> Result<()> {
    let miners = api.state_list_miners(deadline).await?;
    ensure!(miners.len() == 1, "expected exactly one miner, got {miners:?}");
    let wallets = api.wallet_list(deadline).await?;
    ensure!(wallets.len() == 1, "expected exactly one wallet, got {wallets:?}");

    let imported = api
        .client_import(
            &FileRef {
                path: format!("{CONTAINER_TEST_DIR}/{TEST_FILE}"),
                is_car: false,
            },
            deadline,
        )
        .await?;

    let proposal = api
        .client_start_deal(
            &StartDealParams {
                data: DataRef {
                    transfer_type: TRANSFER_GRAPHSYNC.to_string(),
                    root: imported.root,
                },
                wallet: wallets[0].clone(),
                miner: miners[0].clone(),
                epoch_price: "1000".to_string(),
                min_blocks_duration: MIN_DEAL_DURATION_EPOCHS,
            },
            deadline,
        )
        .await?;

    // Poll until the provider is checking the proposal for acceptance. A
    // deal that lands in a terminal failure state aborts immediately
    // rather than burning the rest of the poll budget.
    for attempt in 1..=POLL_ATTEMPTS {
        let deal = api.client_get_deal_info(&proposal, deadline).await?;
        if deal.state == DEAL_CHECK_FOR_ACCEPTANCE {
            eprintln!("deal {proposal} reached acceptance check after {attempt} polls");
            return Ok(());
        }
        if deal_state_is_failed(deal.state) {
            bail!(
                "deal {proposal} failed in state {}: {}",
                deal_state_name(deal.state),
                deal.message
            );
        }
        eprintln!(
            "deal {proposal} is in state {} ({attempt}/{POLL_ATTEMPTS})",
            deal_state_name(deal.state)
        );
        tokio::time::sleep(POLL_DELAY).await;
    }
    bail!("deal {proposal} never reached the acceptance check")
}

#[tokio::test]
#[ignore = "requires a docker daemon and TEST_IMAGE"]
async fn image_boots_healthy_and_accepts_a_storage_deal() -> Result<()> {
    let Ok(image) = std::env::var("TEST_IMAGE") else {
        eprintln!("TEST_IMAGE not set; skipping image test");
        return Ok(());
    };

    let dir = tempfile::tempdir()?;
    let mut data = vec![0u8; 1024];
    rand::thread_rng().fill_bytes(&mut data);
    std::fs::write(dir.path().join(TEST_FILE), &data)?;

    let id = docker(&[
        "run",
        "--detach",
        &format!("--volume={}:{}", dir.path().display(), CONTAINER_TEST_DIR),
        &format!("--publish={API_PORT}"),
        &image,
    ])?;
    let container = Container { id };

    wait_until_healthy(&container).await?;

    // Pull the admin token out of the container filesystem.
    let token_file = dir.path().join("token");
    docker(&[
        "cp",
        &format!("{}:{TOKEN_PATH}", container.id),
        token_file.to_str().context("token path")?,
    ])?;
    let token = std::fs::read_to_string(&token_file)?.trim().to_string();

    let host_port = published_port(&container)?;
    ensure!(host_port != 0, "published port must be nonzero");

    let deadline = Deadline::after(Duration::from_secs(300));
    let url = format!("ws://localhost:{host_port}/rpc/v0");
    let mut api = FullNodeClient::connect(&url, Some(&token), deadline).await?;

    let verdict = run_deal(&mut api, deadline).await;
    if let Err(e) = api.close().await {
        eprintln!("failed to close rpc session: {e}");
    }
    verdict
}
