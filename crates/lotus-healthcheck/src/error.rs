//! Error taxonomy for the readiness checker.
//!
//! Every kind is terminal for a single invocation; retry cadence belongs
//! to whatever orchestrator runs the binary.

use std::path::PathBuf;

use thiserror::Error;

use lotus_rpc::{RpcError, SyncStage};

use crate::config::LOTUS_PATH_ENV;

/// Configuration failures while resolving the node's API port. Never
/// retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {LOTUS_PATH_ENV} environment variable")]
    MissingLotusPath,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("listen address {address:?} has fewer than five segments")]
    TooFewSegments { address: String },

    #[error("listen address {address:?} port segment {segment:?} is not a valid port")]
    InvalidPort { address: String, segment: String },
}

/// Failures of the two readiness probes.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A sync worker has not reached the idle stage yet. Expected while
    /// the daemon is still catching up; the poller simply tries again.
    #[error("sync {worker_id} is in stage {stage} rather than {}", SyncStage::Idle)]
    SyncNotIdle { worker_id: u64, stage: SyncStage },

    /// Transport or remote failure during the sync-state query, distinct
    /// from a "still syncing" verdict.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The metrics request could not even be built.
    #[error("failed to build metrics request: {0}")]
    MetricsRequest(String),

    /// The metrics endpoint could not be reached or read in time.
    #[error("metrics endpoint unavailable: {0}")]
    MetricsUnavailable(String),

    /// The response body is not valid exposition text.
    #[error("metrics body is not valid exposition text: {0}")]
    MetricsParse(String),

    /// The scrape decoded fine but the miner has not started reporting.
    #[error("missing miner metrics")]
    MetricsMissing,
}
