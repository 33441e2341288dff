//! swaybar
//!
//! Status bar for sway: one row of workspace buttons plus the latest line
//! printed by the configured status command.

mod bar;
mod ipc;
mod loader;
mod render;
mod status;
mod surface;
mod wayland;
mod workspaces;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::ipc::IpcClient;
use crate::status::StatusCommand;
use crate::surface::DisplayServer;
use crate::wayland::WaylandDisplay;

#[derive(Parser, Debug)]
#[command(name = "swaybar")]
#[command(about = "Status bar for the sway compositor")]
#[command(version, disable_version_flag = true)]
struct Args {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Index of the output to show the bar on
    output: usize,

    /// Connect to sway via this socket instead of $SWAYSOCK
    #[arg(short, long)]
    socket: Option<String>,

    /// Id of the bar block in sway's configuration
    #[arg(short = 'b', long = "bar_id", visible_alias = "bar-id")]
    bar_id: String,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn init_logging() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    handle
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let log_filter = init_logging();
    let args = Args::parse();

    let socket_path: PathBuf = match &args.socket {
        Some(path) => shellexpand::tilde(path).into_owned().into(),
        None => ipc::get_socket_path()?,
    };

    let mut client = IpcClient::connect(&socket_path).await?;
    tracing::info!("Connected to sway at {}", client.socket_path().display());

    let mut display =
        WaylandDisplay::connect(args.output).context("Failed to create bar window")?;

    let mut bar = loader::load(&mut client, display.surface(), args.output, &args.bar_id).await?;

    if bar.config.verbose {
        if let Err(e) = log_filter.reload(EnvFilter::new("debug")) {
            tracing::warn!("Failed to raise log level: {}", e);
        }
    }

    let mut status = match bar.config.status_command.as_deref() {
        Some(command) => Some(
            StatusCommand::spawn(command)
                .with_context(|| format!("Failed to start status command {command:?}"))?,
        ),
        None => None,
    };

    tracing::info!(
        "Bar {} ready on {} with {} workspace(s)",
        args.bar_id,
        bar.output,
        bar.workspaces.workspaces().len()
    );

    let exit = bar::run(&mut bar, &mut client, &mut status, &mut display).await?;
    tracing::info!(?exit, "Shutting down");

    Ok(())
}
