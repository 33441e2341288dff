//! Startup configuration
//!
//! Resolves everything the bar needs from the compositor before the event
//! loop starts. The steps run strictly in order and any failure is fatal.

use anyhow::{Context, Result};
use swaybar_config::{parse_bar_config, BarConfig, Geometry, MEASURE_TEXT};
use tracing::{debug, info, warn};

use crate::bar::Bar;
use crate::ipc::{EventType, IpcClient, IpcError};
use crate::surface::Surface;
use crate::workspaces::WorkspaceCache;

/// Query the compositor and configure `surface` for bar `bar_id`
///
/// 1. Pick output number `output_index` from `get_outputs`
/// 2. Fetch and merge the bar config
/// 3. Apply the position
/// 4. Apply the font (only `pango:` fonts are adopted)
/// 5. Fit the geometry to `bar_height`, if positive
/// 6. Colors (merged in step 2; a malformed one fails there)
/// 7. Subscribe to workspace events
/// 8. Fill the workspace cache
pub async fn load<S: Surface + ?Sized>(
    client: &mut IpcClient,
    surface: &mut S,
    output_index: usize,
    bar_id: &str,
) -> Result<Bar> {
    let outputs = client
        .get_outputs()
        .await
        .context("Failed to query outputs")?;
    let output = outputs.get(output_index).ok_or(IpcError::OutputNotFound {
        index: output_index,
        available: outputs.len(),
    })?;
    if !output.active {
        warn!("Output {} ({}) is not active", output_index, output.name);
    }
    let output = output.name.clone();
    info!("Using output {} ({})", output_index, output);

    let reply = client
        .get_bar_config(bar_id)
        .await
        .with_context(|| format!("Failed to query config for bar {bar_id:?}"))?;
    let raw = parse_bar_config(&reply)?;
    let mut config = BarConfig::default();
    config
        .apply(&raw)
        .with_context(|| format!("Invalid config for bar {bar_id:?}"))?;
    debug!(?config, "Bar config loaded");

    if raw.position.is_some() {
        surface.set_position(config.position);
    }

    if raw.font.is_some() {
        surface.set_font(&config.font);
    }

    let mut geometry = Geometry::default();
    if let Some(bar_height) = config.bar_height {
        let (_, text_height) = surface.text_size(MEASURE_TEXT);
        if geometry.fit_bar_height(bar_height, text_height) {
            debug!(
                bar_height,
                text_height,
                margin = geometry.margin,
                "Fitted geometry to bar height"
            );
            surface.set_height(geometry.height);
        }
    }

    client
        .subscribe(&[EventType::Workspace])
        .await
        .context("Failed to subscribe to workspace events")?;

    let mut workspaces = WorkspaceCache::new(output.clone());
    workspaces
        .refresh(client)
        .await
        .context("Failed to query workspaces")?;

    Ok(Bar {
        output,
        config,
        geometry,
        workspaces,
        status: String::new(),
        dirty: true,
    })
}
