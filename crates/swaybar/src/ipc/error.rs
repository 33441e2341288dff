//! Error types for sway IPC operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when communicating with the compositor
#[derive(Debug, Error)]
pub enum IpcError {
    /// Neither SWAYSOCK nor `sway --get-socketpath` produced a path
    #[error("Unable to retrieve socket path - is sway running? Set SWAYSOCK or pass --socket")]
    SocketNotSet,

    /// The socket path does not exist
    #[error("Sway socket not found at {path}")]
    SocketNotFound { path: PathBuf },

    /// Failed to connect to the socket
    #[error("Failed to connect to sway socket at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to send a request
    #[error("Failed to send request to sway: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Failed to receive a message
    #[error("Failed to receive message from sway: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame did not start with the protocol magic
    #[error("Invalid IPC frame: bad magic {found:?}")]
    InvalidMagic { found: [u8; 6] },

    /// A frame header advertised a payload over the size limit
    #[error("IPC payload of {length} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { length: u32, max: u32 },

    /// A payload was not valid UTF-8
    #[error("IPC payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    /// Failed to serialize a request payload
    #[error("Failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// Failed to deserialize a reply payload
    #[error("Failed to deserialize reply: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// Sway refused the event subscription
    #[error("Sway rejected the subscription to {events:?}")]
    SubscribeRejected { events: Vec<String> },

    /// The requested output index is not in the get_outputs reply
    #[error("No output with index {index} (sway reports {available} output(s))")]
    OutputNotFound { index: usize, available: usize },

    /// Connection was closed by the compositor
    #[error("Connection to sway closed unexpectedly")]
    ConnectionClosed,
}
