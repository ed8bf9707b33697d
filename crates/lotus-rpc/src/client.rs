//! WebSocket JSON-RPC 2.0 client for the Lotus API.
//!
//! Lotus exposes its common and full-node method sets as separate
//! namespaces behind one endpoint; upstream clients merge them into a
//! single handle. [`FullNodeClient`] is that merge client reduced to the
//! methods this repository actually invokes — everything dispatches as
//! `Filecoin.<Method>` over one persistent session.
//!
//! Calls are strictly sequential: a request is written, then frames are
//! read until the response with the matching id arrives. Unrelated frames
//! (pings, notifications, stale replies) are skipped.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::timeout_at;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::{RpcError, RpcResult};
use crate::types::{Cid, DealInfo, FileRef, ImportRes, StartDealParams, SyncState};

/// Method namespace shared by every Lotus API method.
const NAMESPACE: &str = "Filecoin";

/// Capability seam for the daemon readiness probe.
///
/// The probe only needs the sync-state query, so it depends on this trait
/// rather than on the full client handle.
#[async_trait]
pub trait SyncApi {
    /// Query the daemon's current sync workers.
    async fn sync_state(&mut self, deadline: Deadline) -> RpcResult<SyncState>;
}

/// One JSON-RPC session against a Lotus node.
#[derive(Debug)]
pub struct FullNodeClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

#[derive(Deserialize)]
struct ResponseFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl FullNodeClient {
    /// Open a session to `url` (e.g. `ws://localhost:1234/rpc/v0`).
    ///
    /// `token` is attached as a bearer credential when present; read-only
    /// methods such as the sync-state query work without one.
    pub async fn connect(
        url: &str,
        token: Option<&str>,
        deadline: Deadline,
    ) -> RpcResult<Self> {
        let connect_err = |reason: String| RpcError::Connect {
            url: url.to_string(),
            reason,
        };

        let mut request = url
            .into_client_request()
            .map_err(|e| connect_err(e.to_string()))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| connect_err(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, _) = timeout_at(deadline.instant(), connect_async(request))
            .await
            .map_err(|_| RpcError::DeadlineExceeded {
                operation: "websocket handshake".to_string(),
            })?
            .map_err(|e| connect_err(e.to_string()))?;

        debug!(%url, "rpc session established");
        Ok(Self { ws, next_id: 0 })
    }

    /// Query the addresses of all miner actors.
    pub async fn state_list_miners(&mut self, deadline: Deadline) -> RpcResult<Vec<String>> {
        // Empty tipset key selects the current head.
        self.call::<Option<Vec<String>>>("StateListMiners", json!([[]]), deadline)
            .await
            .map(Option::unwrap_or_default)
    }

    /// List the addresses held by the node's wallet.
    pub async fn wallet_list(&mut self, deadline: Deadline) -> RpcResult<Vec<String>> {
        self.call::<Option<Vec<String>>>("WalletList", json!([]), deadline)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Import a file from the node's local filesystem into the client store.
    pub async fn client_import(
        &mut self,
        file: &FileRef,
        deadline: Deadline,
    ) -> RpcResult<ImportRes> {
        self.call("ClientImport", json!([file]), deadline).await
    }

    /// Propose a storage deal; returns the proposal cid.
    pub async fn client_start_deal(
        &mut self,
        params: &StartDealParams,
        deadline: Deadline,
    ) -> RpcResult<Cid> {
        self.call("ClientStartDeal", json!([params]), deadline).await
    }

    /// Current state of a proposed deal.
    pub async fn client_get_deal_info(
        &mut self,
        proposal: &Cid,
        deadline: Deadline,
    ) -> RpcResult<DealInfo> {
        self.call("ClientGetDealInfo", json!([proposal]), deadline)
            .await
    }

    /// Close the session, sending a close frame and draining the peer's ack.
    ///
    /// Must be called exactly once per established session; failures are
    /// advisory and safe to downgrade to a warning.
    pub async fn close(mut self) -> RpcResult<()> {
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {}
            Err(e) => return Err(RpcError::Transport(e.to_string())),
        }
        // Bounded drain of the close ack; a peer that never acks must not
        // stall process exit.
        let drain = async {
            while let Some(Ok(_)) = self.ws.next().await {}
        };
        let _ = tokio::time::timeout(Duration::from_secs(1), drain).await;
        Ok(())
    }

    /// Issue one request and wait for its response, bounded by `deadline`.
    async fn call<R: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Value,
        deadline: Deadline,
    ) -> RpcResult<R> {
        self.next_id += 1;
        let id = self.next_id;
        let method = format!("{NAMESPACE}.{method}");

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method.as_str(),
            "params": params,
        });
        let frame = serde_json::to_string(&request)
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        let deadline_err = || RpcError::DeadlineExceeded {
            operation: method.clone(),
        };

        timeout_at(deadline.instant(), self.ws.send(Message::Text(frame)))
            .await
            .map_err(|_| deadline_err())?
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        loop {
            let message = timeout_at(deadline.instant(), self.ws.next())
                .await
                .map_err(|_| deadline_err())?;

            let message = match message {
                None => return Err(RpcError::SessionClosed),
                Some(m) => m.map_err(|e| RpcError::Transport(e.to_string()))?,
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => return Err(RpcError::SessionClosed),
                // Control and binary frames are not responses.
                _ => continue,
            };

            let response: ResponseFrame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "skipping undecodable frame");
                    continue;
                }
            };
            if response.id != Some(id) {
                debug!(got = ?response.id, expected = id, "skipping frame for another request");
                continue;
            }

            if let Some(error) = response.error {
                return Err(RpcError::Remote {
                    code: error.code,
                    message: error.message,
                });
            }
            let result = response.result.unwrap_or(Value::Null);
            return serde_json::from_value(result).map_err(|e| RpcError::Decode(e.to_string()));
        }
    }
}

#[async_trait]
impl SyncApi for FullNodeClient {
    async fn sync_state(&mut self, deadline: Deadline) -> RpcResult<SyncState> {
        self.call("SyncState", json!([]), deadline).await
    }
}
