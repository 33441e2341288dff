//! Bar rendering
//!
//! Every dirty pass repaints the whole bar: background, the status line
//! flush right, then one box per workspace from the left edge.

use swaybar_config::{BarColors, BoxColors, Geometry};

use crate::bar::Bar;
use crate::surface::{Rect, Surface};
use crate::workspaces::Workspace;

/// Colors for a workspace box
///
/// Urgent wins over focused, focused over visible.
pub fn box_colors<'a>(workspace: &Workspace, colors: &'a BarColors) -> &'a BoxColors {
    if workspace.urgent {
        &colors.urgent_workspace
    } else if workspace.focused {
        &colors.focused_workspace
    } else if workspace.visible {
        &colors.active_workspace
    } else {
        &colors.inactive_workspace
    }
}

/// Text shown in a workspace box
///
/// With `strip_numbers`, `"<num>:<rest>"` is shown as `<rest>`. Names
/// without a numeric prefix, or with nothing after the colon, are kept.
pub fn workspace_label(name: &str, strip_numbers: bool) -> &str {
    if !strip_numbers {
        return name;
    }

    match name.split_once(':') {
        Some((num, rest))
            if !rest.is_empty() && !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => name,
    }
}

/// Draw the whole bar onto `surface`
pub fn render<S: Surface + ?Sized>(surface: &mut S, bar: &Bar) {
    let colors = &bar.config.colors;
    let geometry = &bar.geometry;

    surface.clear();
    surface.paint(colors.background);

    if !bar.status.is_empty() {
        let (width, _) = surface.text_size(&bar.status);
        let x = surface.width() - geometry.margin - width;
        surface.show_text(
            x as f64,
            geometry.margin as f64,
            &bar.status,
            colors.statusline,
        );
    }

    if bar.config.workspace_buttons {
        render_workspaces(surface, bar, geometry);
    }
}

fn render_workspaces<S: Surface + ?Sized>(surface: &mut S, bar: &Bar, geometry: &Geometry) {
    let hpad = geometry.hor_padding as f64;
    let vpad = geometry.ver_padding;
    let mut x = 0.5;

    for workspace in bar.workspaces.workspaces() {
        let label = workspace_label(&workspace.name, bar.config.strip_workspace_numbers);
        let (width, height) = surface.text_size(label);
        let colors = box_colors(workspace, &bar.config.colors);

        let rect = Rect::new(
            x,
            1.5,
            width as f64 + hpad * 2.0 - 1.0,
            height as f64 + vpad * 2.0,
        );
        surface.fill_rect(rect, colors.background);
        surface.stroke_rect(rect, 1.0, colors.border);
        surface.show_text(x.floor() + hpad, geometry.margin as f64, label, colors.text);

        x += width as f64 + hpad * 2.0 + geometry.spacing as f64;
    }
}
