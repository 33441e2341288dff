//! Sway IPC client implementation
//!
//! This module provides the `IpcClient` for communicating with sway. The
//! client handles socket discovery, framing, and typed reply decoding.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::{debug, warn};

use super::types::{IpcMessage, MessageType, OutputReply, Reply, SubscribeReply};
use super::{EventType, IpcError, IpcEvent};

/// Magic string opening every frame
pub const IPC_MAGIC: &[u8; 6] = b"i3-ipc";

/// Magic, payload length and message type
pub const HEADER_LEN: usize = 14;

/// Largest payload accepted from sway
///
/// Full `get_tree` replies on busy setups stay well under this.
pub const MAX_PAYLOAD_LEN: u32 = 64 * 1024 * 1024;

/// Bytes requested from the socket per read
const READ_CHUNK: usize = 4096;

/// Environment variable sway exports with its socket path
const SWAYSOCK_ENV: &str = "SWAYSOCK";

/// Discover the sway IPC socket path
///
/// Uses `$SWAYSOCK` when set, otherwise asks a `sway` binary on `$PATH`
/// via `sway --get-socketpath`. The path must exist.
///
/// # Errors
///
/// Returns `IpcError::SocketNotSet` if neither source yields a path.
/// Returns `IpcError::SocketNotFound` if the path doesn't exist.
pub fn get_socket_path() -> Result<PathBuf, IpcError> {
    socket_path_from(std::env::var(SWAYSOCK_ENV).ok(), ask_sway_for_socket_path)
}

fn socket_path_from(
    env_value: Option<String>,
    discover: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, IpcError> {
    let socket_path = match env_value.filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => discover().ok_or(IpcError::SocketNotSet)?,
    };

    if !socket_path.exists() {
        return Err(IpcError::SocketNotFound { path: socket_path });
    }

    Ok(socket_path)
}

fn ask_sway_for_socket_path() -> Option<PathBuf> {
    let output = Command::new("sway").arg("--get-socketpath").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let path = stdout.trim();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Build one wire frame
pub(crate) fn encode_frame(message_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(IPC_MAGIC);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&message_type.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Validate a frame header and return `(payload length, message type)`
///
/// `header` must hold at least `HEADER_LEN` bytes.
fn decode_header(header: &[u8]) -> Result<(u32, u32), IpcError> {
    let (magic, rest) = header.split_at(IPC_MAGIC.len());
    if magic != IPC_MAGIC {
        let mut found = [0u8; 6];
        found.copy_from_slice(magic);
        return Err(IpcError::InvalidMagic { found });
    }

    let length = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
    let message_type = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
    if length > MAX_PAYLOAD_LEN {
        return Err(IpcError::PayloadTooLarge {
            length,
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok((length, message_type))
}

/// Split one complete frame off the front of `buffer`
///
/// Returns `Ok(None)` while the header or payload is still incomplete; the
/// buffer is left untouched in that case.
fn take_frame(buffer: &mut Vec<u8>) -> Result<Option<IpcMessage>, IpcError> {
    if buffer.len() < HEADER_LEN {
        return Ok(None);
    }

    let (length, message_type) = decode_header(&buffer[..HEADER_LEN])?;
    let frame_len = HEADER_LEN + length as usize;
    if buffer.len() < frame_len {
        buffer.reserve(frame_len - buffer.len());
        return Ok(None);
    }

    let payload = buffer[HEADER_LEN..frame_len].to_vec();
    buffer.drain(..frame_len);
    let payload = String::from_utf8(payload).map_err(IpcError::InvalidUtf8)?;

    Ok(Some(match EventType::from_code(message_type) {
        Some(event) => IpcMessage::Event(IpcEvent { event, payload }),
        None => IpcMessage::Reply(Reply {
            message_type,
            payload,
        }),
    }))
}

/// Client for communicating with sway via IPC
///
/// One connection carries both request/reply traffic and, once subscribed,
/// asynchronous events. Events that arrive while [`send`](Self::send) waits
/// for a reply are queued and handed out by [`take_event`](Self::take_event).
///
/// # Example
///
/// ```ignore
/// let mut client = IpcClient::connect(&get_socket_path()?).await?;
/// let outputs = client.get_outputs().await?;
/// ```
#[derive(Debug)]
pub struct IpcClient {
    /// The Unix socket connection to sway
    stream: UnixStream,
    /// The socket path (stored for error messages)
    socket_path: PathBuf,
    /// Events read while waiting for a reply
    pending: VecDeque<IpcEvent>,
    /// Bytes received but not yet consumed as a whole frame
    read_buf: Vec<u8>,
}

impl IpcClient {
    /// Connect to the sway IPC socket at `socket_path`
    ///
    /// # Errors
    ///
    /// Returns `IpcError::ConnectionFailed` if the connection fails.
    pub async fn connect(socket_path: &Path) -> Result<Self, IpcError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| IpcError::ConnectionFailed {
                path: socket_path.to_path_buf(),
                source: e,
            })?;

        debug!(path = %socket_path.display(), "Connected to sway IPC");

        Ok(Self {
            stream,
            socket_path: socket_path.to_path_buf(),
            pending: VecDeque::new(),
            read_buf: Vec::with_capacity(READ_CHUNK),
        })
    }

    /// Path of the socket this client is connected to
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and wait for its reply
    ///
    /// Writes one frame, then reads frames until a reply arrives. There is no
    /// timeout and no pipelining: the caller is suspended until the full
    /// reply has been read.
    ///
    /// # Errors
    ///
    /// Returns `IpcError::SendFailed` if writing to the socket fails.
    /// Returns `IpcError::ConnectionClosed` if the socket closes.
    /// Returns `IpcError::InvalidMagic` or `IpcError::InvalidUtf8` for
    /// malformed frames.
    pub async fn send(&mut self, message_type: MessageType, payload: &str) -> Result<Reply, IpcError> {
        let frame = encode_frame(message_type.code(), payload.as_bytes());
        self.stream
            .write_all(&frame)
            .await
            .map_err(IpcError::SendFailed)?;
        self.stream.flush().await.map_err(IpcError::SendFailed)?;

        loop {
            match self.read_message().await? {
                IpcMessage::Reply(reply) => {
                    if reply.message_type != message_type.code() {
                        warn!(
                            expected = message_type.code(),
                            got = reply.message_type,
                            "Reply type does not match request"
                        );
                    }
                    return Ok(reply);
                }
                IpcMessage::Event(event) => {
                    debug!(event = ?event.event, "Queued event received while awaiting reply");
                    self.pending.push_back(event);
                }
            }
        }
    }

    /// Send a request and decode its JSON reply
    ///
    /// # Errors
    ///
    /// Returns any error from `send()`, or `IpcError::DeserializeFailed` if
    /// the reply does not decode as `T`.
    pub async fn query<T: DeserializeOwned>(
        &mut self,
        message_type: MessageType,
        payload: &str,
    ) -> Result<T, IpcError> {
        let reply = self.send(message_type, payload).await?;
        serde_json::from_str(&reply.payload).map_err(IpcError::DeserializeFailed)
    }

    /// Query the list of outputs
    pub async fn get_outputs(&mut self) -> Result<Vec<OutputReply>, IpcError> {
        self.query(MessageType::GetOutputs, "").await
    }

    /// Query a bar's configuration; returns the raw JSON payload
    pub async fn get_bar_config(&mut self, bar_id: &str) -> Result<String, IpcError> {
        Ok(self.send(MessageType::GetBarConfig, bar_id).await?.payload)
    }

    /// Query all workspaces; returns the raw JSON payload
    ///
    /// Left undecoded so the caller can choose how strictly to parse it.
    pub async fn get_workspaces(&mut self) -> Result<String, IpcError> {
        Ok(self.send(MessageType::GetWorkspaces, "").await?.payload)
    }

    /// Subscribe this connection to the given event classes
    ///
    /// # Errors
    ///
    /// Returns `IpcError::SubscribeRejected` if sway answers with
    /// `"success": false`.
    pub async fn subscribe(&mut self, events: &[EventType]) -> Result<(), IpcError> {
        let names: Vec<&str> = events.iter().filter_map(|event| event.name()).collect();
        let payload = serde_json::to_string(&names).map_err(IpcError::SerializeFailed)?;

        let reply: SubscribeReply = self.query(MessageType::Subscribe, &payload).await?;
        if !reply.success {
            return Err(IpcError::SubscribeRejected {
                events: names.iter().map(|name| name.to_string()).collect(),
            });
        }

        debug!(events = ?names, "Subscribed to sway events");
        Ok(())
    }

    /// Read exactly one framed message
    ///
    /// The payload is read by the length advertised in the header, never by
    /// delimiter. Partial frames stay buffered in the client, so the future
    /// is cancel-safe and can sit in a `select!` next to other sources.
    ///
    /// # Errors
    ///
    /// Returns `IpcError::ConnectionClosed` on EOF.
    /// Returns `IpcError::ReceiveFailed` if reading from the socket fails.
    /// Returns `IpcError::InvalidMagic` if the header is malformed.
    /// Returns `IpcError::PayloadTooLarge` if the header advertises more than
    /// `MAX_PAYLOAD_LEN` bytes.
    /// Returns `IpcError::InvalidUtf8` if the payload is not UTF-8.
    pub async fn read_message(&mut self) -> Result<IpcMessage, IpcError> {
        loop {
            if let Some(message) = take_frame(&mut self.read_buf)? {
                return Ok(message);
            }

            self.stream
                .readable()
                .await
                .map_err(IpcError::ReceiveFailed)?;

            let mut chunk = [0u8; READ_CHUNK];
            match self.stream.try_read(&mut chunk) {
                Ok(0) => return Err(IpcError::ConnectionClosed),
                Ok(n) => self.read_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(IpcError::ReceiveFailed(e)),
            }
        }
    }

    /// Pop the oldest event queued by `send()`
    pub fn take_event(&mut self) -> Option<IpcEvent> {
        self.pending.pop_front()
    }

    /// Drop all queued events of one class; returns how many were dropped
    pub fn discard_events(&mut self, event: EventType) -> usize {
        let before = self.pending.len();
        self.pending.retain(|queued| queued.event != event);
        before - self.pending.len()
    }
}
