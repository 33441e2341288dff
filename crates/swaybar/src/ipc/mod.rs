//! Sway IPC client
//!
//! This module talks to the compositor over its control socket. The bar uses
//! one connection for everything:
//! - One-shot queries (outputs, bar config, workspaces)
//! - A subscription to workspace change events
//!
//! ## Protocol
//!
//! Every message, in both directions, is a frame:
//!
//! ```text
//! +----------+------------+----------+-----------------+
//! | "i3-ipc" | length u32 | type u32 | payload (JSON)  |
//! +----------+------------+----------+-----------------+
//! ```
//!
//! Integers are little-endian. Replies echo the request type; events carry
//! the high bit (`0x8000_0000`) in their type, which is how
//! [`IpcMessage`] tells them apart.

mod client;
mod error;
mod events;
#[cfg(test)]
pub(crate) mod testing;
mod types;

pub use client::{get_socket_path, IpcClient};
pub use error::IpcError;
pub use events::{EventType, IpcEvent};
pub use types::{IpcMessage, MessageType, Reply, WorkspaceReply};

#[cfg(test)]
pub(crate) use client::encode_frame;
