//! Readiness checks for a containerized Lotus node.
//!
//! Two independent judgments against one node: the daemon's sync workers
//! must all be idle, and the miner must be exporting its worker-height
//! metric. The binary in this crate runs both once and exits 0 or 1 —
//! the shape Docker-style healthchecks expect.

pub mod checks;
pub mod config;
pub mod error;
pub mod metrics;

pub use checks::{WORKER_HEIGHT_METRIC, check_daemon_synced, check_miner_metrics};
pub use config::{LOTUS_PATH_ENV, api_port, listen_port, lotus_path};
pub use error::{CheckError, ConfigError};
