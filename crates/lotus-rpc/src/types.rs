//! Wire types for the subset of the Lotus API this repository calls.
//!
//! Field names follow the Go JSON encoding of the upstream API, so every
//! struct renames its fields explicitly. Only the fields we read are
//! declared; unknown fields are ignored on decode.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Result of the `Filecoin.SyncState` query.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncState {
    /// One record per sync worker. The daemon reports `null` for an empty
    /// set, which decodes to an empty vec.
    #[serde(rename = "ActiveSyncs", default, deserialize_with = "nullable_vec")]
    pub active_syncs: Vec<ActiveSync>,
}

/// A single sync worker's progress record.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveSync {
    #[serde(rename = "WorkerID", default)]
    pub worker_id: u64,
    #[serde(rename = "Stage", default)]
    pub stage: SyncStage,
}

/// Stage of a sync worker, encoded as an integer on the wire.
///
/// Values this client does not know about decode to [`SyncStage::Other`],
/// which is never equal to [`SyncStage::Idle`] — a node reporting a future
/// stage is treated as still syncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum SyncStage {
    Idle,
    Headers,
    PersistHeaders,
    Messages,
    Complete,
    Errored,
    FetchingMessages,
    Other(u64),
}

impl Default for SyncStage {
    fn default() -> Self {
        SyncStage::Other(u64::MAX)
    }
}

impl From<u64> for SyncStage {
    fn from(value: u64) -> Self {
        match value {
            0 => SyncStage::Idle,
            1 => SyncStage::Headers,
            2 => SyncStage::PersistHeaders,
            3 => SyncStage::Messages,
            4 => SyncStage::Complete,
            5 => SyncStage::Errored,
            6 => SyncStage::FetchingMessages,
            other => SyncStage::Other(other),
        }
    }
}

impl From<SyncStage> for u64 {
    fn from(stage: SyncStage) -> Self {
        match stage {
            SyncStage::Idle => 0,
            SyncStage::Headers => 1,
            SyncStage::PersistHeaders => 2,
            SyncStage::Messages => 3,
            SyncStage::Complete => 4,
            SyncStage::Errored => 5,
            SyncStage::FetchingMessages => 6,
            SyncStage::Other(other) => other,
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Idle => write!(f, "idle"),
            SyncStage::Headers => write!(f, "header sync"),
            SyncStage::PersistHeaders => write!(f, "persisting headers"),
            SyncStage::Messages => write!(f, "message sync"),
            SyncStage::Complete => write!(f, "complete"),
            SyncStage::Errored => write!(f, "error"),
            SyncStage::FetchingMessages => write!(f, "fetching messages"),
            SyncStage::Other(value) => write!(f, "stage {value}"),
        }
    }
}

/// A content identifier in its JSON form, `{"/": "bafy..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cid {
    #[serde(rename = "/")]
    pub hash: String,
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// A local file to hand to `Filecoin.ClientImport`.
#[derive(Debug, Clone, Serialize)]
pub struct FileRef {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "IsCAR")]
    pub is_car: bool,
}

/// Result of `Filecoin.ClientImport`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRes {
    #[serde(rename = "Root")]
    pub root: Cid,
}

/// Payload description for a storage deal proposal.
#[derive(Debug, Clone, Serialize)]
pub struct DataRef {
    /// Transfer protocol; the only one we use is graphsync.
    #[serde(rename = "TransferType")]
    pub transfer_type: String,
    #[serde(rename = "Root")]
    pub root: Cid,
}

/// Graphsync transfer type identifier.
pub const TRANSFER_GRAPHSYNC: &str = "graphsync";

/// Parameters for `Filecoin.ClientStartDeal`.
///
/// Fields this client leaves unset keep their upstream zero values.
#[derive(Debug, Clone, Serialize)]
pub struct StartDealParams {
    #[serde(rename = "Data")]
    pub data: DataRef,
    #[serde(rename = "Wallet")]
    pub wallet: String,
    #[serde(rename = "Miner")]
    pub miner: String,
    /// Attofil per epoch, encoded as a decimal string on the wire.
    #[serde(rename = "EpochPrice")]
    pub epoch_price: String,
    #[serde(rename = "MinBlocksDuration")]
    pub min_blocks_duration: u64,
}

/// Result of `Filecoin.ClientGetDealInfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct DealInfo {
    #[serde(rename = "State")]
    pub state: u64,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Deal state in which the client is waiting for the provider to accept.
pub const DEAL_CHECK_FOR_ACCEPTANCE: u64 = 13;

/// Whether a deal state is a terminal failure — a deal in one of these
/// states will never reach acceptance, so polling it further is pointless.
pub fn deal_state_is_failed(state: u64) -> bool {
    matches!(
        state,
        1 // proposal not found
        | 2 // proposal rejected
        | 8 // expired
        | 9 // slashed
        | 11 // failing
        | 26 // error
    )
}

/// Human-readable name for a storage deal state.
pub fn deal_state_name(state: u64) -> &'static str {
    match state {
        0 => "StorageDealUnknown",
        1 => "StorageDealProposalNotFound",
        2 => "StorageDealProposalRejected",
        3 => "StorageDealProposalAccepted",
        4 => "StorageDealStaged",
        5 => "StorageDealSealing",
        6 => "StorageDealFinalizing",
        7 => "StorageDealActive",
        8 => "StorageDealExpired",
        9 => "StorageDealSlashed",
        10 => "StorageDealRejecting",
        11 => "StorageDealFailing",
        12 => "StorageDealFundsReserved",
        13 => "StorageDealCheckForAcceptance",
        14 => "StorageDealValidating",
        15 => "StorageDealAcceptWait",
        16 => "StorageDealStartDataTransfer",
        17 => "StorageDealTransferring",
        18 => "StorageDealWaitingForData",
        19 => "StorageDealVerifyData",
        20 => "StorageDealReserveProviderFunds",
        21 => "StorageDealReserveClientFunds",
        22 => "StorageDealProviderFunding",
        23 => "StorageDealClientFunding",
        24 => "StorageDealPublish",
        25 => "StorageDealPublishing",
        26 => "StorageDealError",
        _ => "StorageDealUnknown",
    }
}

/// Decode a JSON array that the Go side may encode as `null`.
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_stage_decodes_known_values() {
        assert_eq!(SyncStage::from(0), SyncStage::Idle);
        assert_eq!(SyncStage::from(4), SyncStage::Complete);
        assert_eq!(SyncStage::from(6), SyncStage::FetchingMessages);
    }

    #[test]
    fn unknown_sync_stage_is_not_idle() {
        let stage = SyncStage::from(99);
        assert_eq!(stage, SyncStage::Other(99));
        assert_ne!(stage, SyncStage::Idle);
        assert_eq!(stage.to_string(), "stage 99");
    }

    #[test]
    fn sync_state_decodes_from_wire_form() {
        let state: SyncState = serde_json::from_str(
            r#"{"ActiveSyncs":[{"WorkerID":3,"Stage":1,"Height":120}]}"#,
        )
        .unwrap();
        assert_eq!(state.active_syncs.len(), 1);
        assert_eq!(state.active_syncs[0].worker_id, 3);
        assert_eq!(state.active_syncs[0].stage, SyncStage::Headers);
    }

    #[test]
    fn null_active_syncs_decodes_empty() {
        let state: SyncState = serde_json::from_str(r#"{"ActiveSyncs":null}"#).unwrap();
        assert!(state.active_syncs.is_empty());
    }

    #[test]
    fn cid_round_trips_the_slash_key() {
        let cid: Cid = serde_json::from_str(r#"{"/":"bafyexample"}"#).unwrap();
        assert_eq!(cid.hash, "bafyexample");
        assert_eq!(serde_json::to_string(&cid).unwrap(), r#"{"/":"bafyexample"}"#);
    }

    #[test]
    fn deal_params_encode_with_upstream_field_names() {
        let params = StartDealParams {
            data: DataRef {
                transfer_type: TRANSFER_GRAPHSYNC.to_string(),
                root: Cid { hash: "bafyroot".to_string() },
            },
            wallet: "t3wallet".to_string(),
            miner: "t01000".to_string(),
            epoch_price: "1000".to_string(),
            min_blocks_duration: 518400,
        };
        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded["Data"]["TransferType"], "graphsync");
        assert_eq!(encoded["Data"]["Root"]["/"], "bafyroot");
        assert_eq!(encoded["EpochPrice"], "1000");
        assert_eq!(encoded["MinBlocksDuration"], 518400);
    }

    #[test]
    fn failed_deal_states_are_flagged() {
        assert!(deal_state_is_failed(26));
        assert!(deal_state_is_failed(2));
        assert!(!deal_state_is_failed(DEAL_CHECK_FOR_ACCEPTANCE));
        assert!(!deal_state_is_failed(12)); // funds reserved is still in flight
    }
}
