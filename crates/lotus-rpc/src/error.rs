//! Error types for the Lotus RPC client.

use thiserror::Error;

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors that can occur while talking to the Lotus API.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The WebSocket session could not be established.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The shared deadline elapsed before the operation finished.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: String },

    /// A send or receive on the established session failed.
    #[error("websocket transport error: {0}")]
    Transport(String),

    /// The remote side returned a JSON-RPC error object.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// A response frame or result payload could not be decoded.
    #[error("failed to decode rpc response: {0}")]
    Decode(String),

    /// The peer closed the session while a response was outstanding.
    #[error("rpc session closed by peer")]
    SessionClosed,
}
