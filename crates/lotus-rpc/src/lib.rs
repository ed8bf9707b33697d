//! lotus-rpc — minimal JSON-RPC client for the Lotus API.
//!
//! One WebSocket session per client, dispatching methods from the merged
//! `Filecoin` namespace. Deliberately covers only the handful of methods
//! the healthcheck and the image test invoke; it is not a general Lotus
//! API binding.

pub mod client;
pub mod deadline;
pub mod error;
pub mod types;

pub use client::{FullNodeClient, SyncApi};
pub use deadline::Deadline;
pub use error::{RpcError, RpcResult};
pub use types::{
    ActiveSync, Cid, DEAL_CHECK_FOR_ACCEPTANCE, DataRef, DealInfo, FileRef, ImportRes,
    StartDealParams, SyncStage, SyncState, TRANSFER_GRAPHSYNC, deal_state_is_failed,
    deal_state_name,
};
