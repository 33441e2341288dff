//! Bar state and event loop

use anyhow::{Context, Result};
use swaybar_config::{BarConfig, Geometry};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

use crate::ipc::{EventType, IpcClient, IpcError, IpcEvent, IpcMessage};
use crate::render::render;
use crate::status::StatusCommand;
use crate::surface::{DisplayError, DisplayServer};
use crate::workspaces::WorkspaceCache;

/// Everything the renderer reads
#[derive(Debug)]
pub struct Bar {
    /// Name of the output the bar is on
    pub output: String,
    pub config: BarConfig,
    pub geometry: Geometry,
    pub workspaces: WorkspaceCache,
    /// Latest status line, newline stripped
    pub status: String,
    /// Something changed since the last frame
    pub dirty: bool,
}

/// Why the event loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The display connection or the bar window went away
    DisplayClosed,
    /// SIGINT or SIGTERM
    Signal,
}

enum Wake {
    Display(Result<(), DisplayError>),
    Ipc(Result<IpcMessage, IpcError>),
    Status(std::io::Result<Option<String>>),
    Signal(&'static str),
}

async fn next_status_line(status: &mut Option<StatusCommand>) -> std::io::Result<Option<String>> {
    match status {
        Some(command) => command.next_line().await,
        None => std::future::pending().await,
    }
}

/// Run the bar until the display goes away or a signal arrives
///
/// Each pass renders if something changed and the display accepts a frame,
/// dispatches display events, and then sleeps until the display, the sway
/// connection, the status command or a signal wakes it. Workspace events
/// that were queued while waiting for a reply are handled before sleeping.
///
/// # Errors
///
/// Fails if the sway connection breaks or a frame cannot be presented.
pub async fn run<D: DisplayServer>(
    bar: &mut Bar,
    client: &mut IpcClient,
    status: &mut Option<StatusCommand>,
    display: &mut D,
) -> Result<Exit> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    loop {
        if bar.dirty && display.prerender() {
            render(display.surface(), bar);
            display.present().context("Failed to present frame")?;
        }

        match display.dispatch_pending() {
            Ok(()) => {}
            Err(DisplayError::Closed) => {
                info!("Bar surface closed");
                return Ok(Exit::DisplayClosed);
            }
            Err(e) => {
                warn!("Display connection lost: {}", e);
                return Ok(Exit::DisplayClosed);
            }
        }

        bar.dirty = display.take_redraw_request();
        if bar.dirty {
            continue;
        }

        if let Some(event) = client.take_event() {
            handle_event(bar, client, event).await?;
            continue;
        }

        let wake = tokio::select! {
            result = display.read_events() => Wake::Display(result),
            message = client.read_message() => Wake::Ipc(message),
            line = next_status_line(status) => Wake::Status(line),
            _ = sigterm.recv() => Wake::Signal("SIGTERM"),
            _ = sigint.recv() => Wake::Signal("SIGINT"),
        };

        match wake {
            Wake::Display(Ok(())) => {}
            Wake::Display(Err(e)) => {
                warn!("Display connection lost: {}", e);
                return Ok(Exit::DisplayClosed);
            }
            Wake::Ipc(message) => {
                match message.context("Lost connection to sway")? {
                    IpcMessage::Event(event) => handle_event(bar, client, event).await?,
                    IpcMessage::Reply(reply) => {
                        debug!(kind = reply.message_type, "Ignoring unsolicited reply");
                    }
                }
            }
            Wake::Status(Ok(Some(line))) => {
                debug!(status = %line, "Status line updated");
                bar.status = line;
                bar.dirty = true;
            }
            Wake::Status(Ok(None)) => {}
            Wake::Status(Err(e)) => {
                warn!("Failed to read from status command: {}", e);
                *status = None;
            }
            Wake::Signal(name) => {
                info!("Received {}, shutting down", name);
                return Ok(Exit::Signal);
            }
        }
    }
}

async fn handle_event(bar: &mut Bar, client: &mut IpcClient, event: IpcEvent) -> Result<()> {
    match event.event {
        EventType::Workspace => {
            debug!(change = ?event.change(), "Workspace event");
            bar.workspaces
                .refresh(client)
                .await
                .context("Failed to refresh workspaces")?;
            bar.dirty = true;
        }
        other => debug!(event = ?other, "Ignoring event"),
    }
    Ok(())
}
