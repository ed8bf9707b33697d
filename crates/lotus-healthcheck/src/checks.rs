//! The two readiness probes.
//!
//! Both are one-shot: they report the node's state right now and leave
//! any retrying to the orchestrator that invokes the binary.

use http_body_util::BodyExt;
use tokio::time::timeout_at;
use tracing::debug;

use lotus_rpc::{Deadline, SyncApi, SyncStage};

use crate::error::CheckError;
use crate::metrics;

/// Metric family the miner exports once its worker is reporting. Its
/// presence alone marks the miner ready; the value is not interpreted.
pub const WORKER_HEIGHT_METRIC: &str = "lotus_chain_node_worker_height";

/// Verify that every active sync worker has reached the idle stage.
///
/// An empty set of active syncs passes vacuously. The first non-idle
/// worker fails the probe, naming the worker and its stage.
pub async fn check_daemon_synced(
    api: &mut impl SyncApi,
    deadline: Deadline,
) -> Result<(), CheckError> {
    let state = api.sync_state(deadline).await?;
    for sync in &state.active_syncs {
        if sync.stage != SyncStage::Idle {
            return Err(CheckError::SyncNotIdle {
                worker_id: sync.worker_id,
                stage: sync.stage,
            });
        }
    }
    debug!(workers = state.active_syncs.len(), "all sync workers idle");
    Ok(())
}

/// Verify that the miner has begun exporting telemetry.
///
/// Scrapes `http://localhost:<port>/debug/metrics` and requires the
/// [`WORKER_HEIGHT_METRIC`] family to be present.
pub async fn check_miner_metrics(port: u16, deadline: Deadline) -> Result<(), CheckError> {
    let body = fetch_metrics(port, deadline).await?;
    let families = metrics::parse_families(&body)?;
    if !families.contains_key(WORKER_HEIGHT_METRIC) {
        return Err(CheckError::MetricsMissing);
    }
    debug!(families = families.len(), "miner metrics present");
    Ok(())
}

/// Fetch the metrics body over a one-shot HTTP/1.1 connection.
async fn fetch_metrics(port: u16, deadline: Deadline) -> Result<bytes::Bytes, CheckError> {
    let address = format!("localhost:{port}");
    let uri = format!("http://{address}/debug/metrics");

    let fetch = async {
        let stream = tokio::net::TcpStream::connect(&address)
            .await
            .map_err(|e| CheckError::MetricsUnavailable(format!("connect {address}: {e}")))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| CheckError::MetricsUnavailable(format!("handshake: {e}")))?;

        // Drive the connection in the background; a failure after the
        // body has been collected only matters as a log line.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!(error = %e, "metrics connection ended with error");
            }
        });

        let request = http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", &address)
            .header("user-agent", "lotus-healthcheck/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| CheckError::MetricsRequest(e.to_string()))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| CheckError::MetricsUnavailable(format!("request: {e}")))?;

        debug!(status = %response.status(), %uri, "metrics scraped");

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| CheckError::MetricsUnavailable(format!("read body: {e}")))?
            .to_bytes();
        Ok(body)
    };

    timeout_at(deadline.instant(), fetch)
        .await
        .map_err(|_| CheckError::MetricsUnavailable("deadline exceeded".to_string()))?
}
