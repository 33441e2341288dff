//! Configuration data model

/// An RGBA color packed as `0xRRGGBBAA`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub u32);

impl Rgba {
    pub fn red(self) -> f64 {
        ((self.0 >> 24) & 0xFF) as f64 / 255.0
    }

    pub fn green(self) -> f64 {
        ((self.0 >> 16) & 0xFF) as f64 / 255.0
    }

    pub fn blue(self) -> f64 {
        ((self.0 >> 8) & 0xFF) as f64 / 255.0
    }

    pub fn alpha(self) -> f64 {
        (self.0 & 0xFF) as f64 / 255.0
    }
}

/// Border, background and text color of one workspace indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxColors {
    pub border: Rgba,
    pub background: Rgba,
    pub text: Rgba,
}

impl BoxColors {
    const fn new(border: u32, background: u32, text: u32) -> Self {
        Self {
            border: Rgba(border),
            background: Rgba(background),
            text: Rgba(text),
        }
    }
}

/// The bar's color palette
///
/// Starts from the built-in defaults; keys present in the compositor's bar
/// config overwrite individual fields. The binding mode triple is decoded
/// but nothing draws it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarColors {
    pub background: Rgba,
    pub statusline: Rgba,
    pub separator: Rgba,
    pub focused_workspace: BoxColors,
    pub active_workspace: BoxColors,
    pub inactive_workspace: BoxColors,
    pub urgent_workspace: BoxColors,
    pub binding_mode: BoxColors,
}

impl Default for BarColors {
    fn default() -> Self {
        Self {
            background: Rgba(0x000000FF),
            statusline: Rgba(0xFFFFFFFF),
            separator: Rgba(0x666666FF),
            focused_workspace: BoxColors::new(0x4C7899FF, 0x285577FF, 0xFFFFFFFF),
            active_workspace: BoxColors::new(0x333333FF, 0x5F676AFF, 0xFFFFFFFF),
            inactive_workspace: BoxColors::new(0x333333FF, 0x222222FF, 0x888888FF),
            urgent_workspace: BoxColors::new(0x2F343AFF, 0x900000FF, 0xFFFFFFFF),
            binding_mode: BoxColors::new(0x2F343AFF, 0x900000FF, 0xFFFFFFFF),
        }
    }
}

/// Screen edge the bar is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Bar configuration as reported by the compositor
///
/// Only `position`, `status_command`, `font`, `bar_height`,
/// `workspace_buttons`, `strip_workspace_numbers` and `colors` influence
/// what is drawn; the remaining fields are kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarConfig {
    pub id: Option<String>,
    pub tray_output: Option<String>,
    pub mode: Option<String>,
    pub hidden_state: Option<String>,
    pub position: Position,
    pub status_command: Option<String>,
    /// Pango font description, without the `pango:` prefix
    pub font: String,
    pub bar_height: Option<i32>,
    pub workspace_buttons: bool,
    pub strip_workspace_numbers: bool,
    pub binding_mode_indicator: bool,
    pub verbose: bool,
    pub colors: BarColors,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            id: None,
            tray_output: None,
            mode: None,
            hidden_state: None,
            position: Position::Bottom,
            status_command: None,
            font: DEFAULT_FONT.to_string(),
            bar_height: None,
            workspace_buttons: true,
            strip_workspace_numbers: false,
            binding_mode_indicator: true,
            verbose: false,
            colors: BarColors::default(),
        }
    }
}

/// Font used until the bar config names a different one
pub const DEFAULT_FONT: &str = "monospace 10";

/// Text measured to derive the bar's line height
pub const MEASURE_TEXT: &str = "Test string for measuring purposes";

/// Layout constants for the bar
///
/// `margin` and `ver_padding` follow the configured bar height; the rest are
/// fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Inset of text from the top edge and of the status line from the right
    pub margin: i32,
    /// Space between a workspace label and its box's left/right border
    pub hor_padding: i32,
    /// Space between a workspace label and its box's top/bottom border
    pub ver_padding: f64,
    /// Gap between neighbouring workspace boxes
    pub spacing: i32,
    /// Total height of the bar window
    pub height: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            margin: 3,
            hor_padding: 5,
            ver_padding: 1.5,
            spacing: 1,
            height: 30,
        }
    }
}

impl Geometry {
    /// Fit the geometry to a configured bar height
    ///
    /// `text_height` is the measured height of [`MEASURE_TEXT`]. Returns
    /// `false` and leaves everything untouched when `bar_height` is not
    /// positive.
    pub fn fit_bar_height(&mut self, bar_height: i32, text_height: i32) -> bool {
        if bar_height <= 0 {
            return false;
        }

        self.margin = (bar_height - text_height) / 2;
        self.ver_padding = self.margin as f64 - 1.5;
        self.height = (text_height + self.margin * 2).max(1) as u32;
        true
    }
}
