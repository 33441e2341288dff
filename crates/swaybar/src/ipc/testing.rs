//! In-process stand-in for sway's IPC socket

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::mpsc;

use super::{encode_frame, EventType};

enum Outgoing {
    Bytes(Vec<u8>),
    Close,
}

/// Answers requests with canned JSON and pushes events on demand
///
/// Accepts a single connection. Replies and pushed frames share one writer
/// so they reach the client in the order they were produced.
pub(crate) struct FakeCompositor {
    _dir: TempDir,
    path: PathBuf,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    workspaces: Arc<Mutex<String>>,
    requests: Arc<Mutex<Vec<(u32, String)>>>,
}

impl FakeCompositor {
    /// Bind a socket in a fresh temp dir; must run inside a tokio runtime
    pub(crate) fn start(outputs: &str, bar_config: &str, workspaces: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("sway-ipc.sock");
        let listener = UnixListener::bind(&path).expect("Failed to bind fake sway socket");

        let (outgoing, mut rx) = mpsc::unbounded_channel::<Outgoing>();
        let workspaces = Arc::new(Mutex::new(workspaces.to_string()));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let replies = outgoing.clone();
        let outputs = outputs.to_string();
        let bar_config = bar_config.to_string();
        let ws = Arc::clone(&workspaces);
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (mut reader, mut writer) = stream.into_split();

            tokio::spawn(async move {
                loop {
                    let mut header = [0u8; 14];
                    if reader.read_exact(&mut header).await.is_err() {
                        break;
                    }
                    let length = u32::from_le_bytes(header[6..10].try_into().unwrap()) as usize;
                    let message_type = u32::from_le_bytes(header[10..14].try_into().unwrap());
                    let mut payload = vec![0u8; length];
                    if reader.read_exact(&mut payload).await.is_err() {
                        break;
                    }
                    let payload = String::from_utf8_lossy(&payload).into_owned();
                    log.lock().unwrap().push((message_type, payload));

                    let reply = match message_type {
                        1 => ws.lock().unwrap().clone(),
                        2 => r#"{"success":true}"#.to_string(),
                        3 => outputs.clone(),
                        6 => bar_config.clone(),
                        _ => "{}".to_string(),
                    };
                    let frame = encode_frame(message_type, reply.as_bytes());
                    if replies.send(Outgoing::Bytes(frame)).is_err() {
                        break;
                    }
                }
            });

            while let Some(message) = rx.recv().await {
                match message {
                    Outgoing::Bytes(bytes) => {
                        if writer.write_all(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Outgoing::Close => break,
                }
            }
        });

        Self {
            _dir: dir,
            path,
            outgoing,
            workspaces,
            requests,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the payload served for `get_workspaces`
    pub(crate) fn set_workspaces(&self, json: &str) {
        *self.workspaces.lock().unwrap() = json.to_string();
    }

    pub(crate) fn push_event(&self, event: EventType, payload: &str) {
        self.push_raw(encode_frame(event.code(), payload.as_bytes()));
    }

    pub(crate) fn push_raw(&self, bytes: Vec<u8>) {
        let _ = self.outgoing.send(Outgoing::Bytes(bytes));
    }

    /// Shut down the write side of the connection
    pub(crate) fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }

    /// Every request received so far, as `(type, payload)`
    pub(crate) fn requests(&self) -> Vec<(u32, String)> {
        self.requests.lock().unwrap().clone()
    }
}
