//! Drawing and display-server seam
//!
//! The bar core only ever talks to these two traits. [`Surface`] is the
//! drawable the renderer paints into; [`DisplayServer`] owns the connection
//! and decides when a frame may be drawn and shown. The Wayland
//! implementation lives in [`crate::wayland`].

use swaybar_config::{Position, Rgba};
use thiserror::Error;

/// Axis-aligned rectangle in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A drawable bar window
///
/// Drawing calls outside a frame (see [`DisplayServer::prerender`]) are
/// ignored.
pub trait Surface {
    /// Attach the window to a screen edge
    fn set_position(&mut self, position: Position);

    /// Use a Pango font description for all following text
    fn set_font(&mut self, font: &str);

    /// Resize the window along the axis perpendicular to its edge
    fn set_height(&mut self, height: u32);

    /// Pixel size `(width, height)` of `text` in the current font
    fn text_size(&mut self, text: &str) -> (i32, i32);

    /// Current window width in pixels
    fn width(&self) -> i32;

    /// Make every pixel fully transparent
    fn clear(&mut self);

    /// Fill the whole window with one color
    fn paint(&mut self, color: Rgba);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Rgba);

    /// Draw `text` with its top-left corner at `(x, y)`
    fn show_text(&mut self, x: f64, y: f64, text: &str, color: Rgba);
}

/// Errors raised by a display server backend
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Could not reach the display server at all
    #[error("Failed to connect to the display server: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The connection broke after it was established
    #[error("Lost connection to the display server: {0}")]
    Disconnected(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The compositor closed the bar window
    #[error("The bar surface was closed by the compositor")]
    Closed,

    /// The compositor lacks the panel protocol
    #[error("Compositor does not support the wlr-layer-shell protocol")]
    NoLayerShell,

    /// No display output with the requested index
    #[error("No display output with index {index} ({available} available)")]
    NoSuchOutput { index: usize, available: usize },

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Connection to a display server holding one bar window
///
/// The event loop drives it in a fixed order: `prerender` and `present`
/// when something changed, then `dispatch_pending`, then
/// `take_redraw_request`, and only then waits in `read_events`.
#[allow(async_fn_in_trait)]
pub trait DisplayServer {
    type Surface: Surface;

    fn surface(&mut self) -> &mut Self::Surface;

    /// Begin a frame; `false` if the window cannot accept one yet
    ///
    /// Refusing because a previous frame is still on screen arms a redraw
    /// request for when that frame is done.
    fn prerender(&mut self) -> bool;

    /// Show the frame started by the last successful `prerender`
    fn present(&mut self) -> Result<(), DisplayError>;

    /// Handle events already read from the connection and flush requests
    ///
    /// Returns `DisplayError::Closed` once the window is gone.
    fn dispatch_pending(&mut self) -> Result<(), DisplayError>;

    /// Whether the display asked for a repaint since the last call
    fn take_redraw_request(&mut self) -> bool;

    /// Wait until the connection is readable and read what arrived
    ///
    /// Must be cancel-safe: it is raced against other sources.
    async fn read_events(&mut self) -> Result<(), DisplayError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording doubles for the surface seam

    use super::*;

    /// Width in pixels of one character in [`RecordingSurface`]
    pub(crate) const CHAR_WIDTH: i32 = 8;
    /// Line height in pixels in [`RecordingSurface`]
    pub(crate) const LINE_HEIGHT: i32 = 14;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum DrawOp {
        Clear,
        Paint(Rgba),
        Fill(Rect, Rgba),
        Stroke(Rect, f64, Rgba),
        Text {
            x: f64,
            y: f64,
            text: String,
            color: Rgba,
        },
    }

    /// Monospace surface that records draw calls instead of drawing
    #[derive(Debug)]
    pub(crate) struct RecordingSurface {
        pub position: Position,
        pub font: String,
        pub height: u32,
        pub width: i32,
        pub ops: Vec<DrawOp>,
    }

    impl Default for RecordingSurface {
        fn default() -> Self {
            Self {
                position: Position::Bottom,
                font: swaybar_config::DEFAULT_FONT.to_string(),
                height: 30,
                width: 800,
                ops: Vec::new(),
            }
        }
    }

    impl RecordingSurface {
        /// Every text drawn, in order
        pub(crate) fn texts(&self) -> Vec<&str> {
            text_ops(&self.ops)
        }
    }

    pub(crate) fn text_ops(ops: &[DrawOp]) -> Vec<&str> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    impl Surface for RecordingSurface {
        fn set_position(&mut self, position: Position) {
            self.position = position;
        }

        fn set_font(&mut self, font: &str) {
            self.font = font.to_string();
        }

        fn set_height(&mut self, height: u32) {
            self.height = height;
        }

        fn text_size(&mut self, text: &str) -> (i32, i32) {
            (text.chars().count() as i32 * CHAR_WIDTH, LINE_HEIGHT)
        }

        fn width(&self) -> i32 {
            self.width
        }

        fn clear(&mut self) {
            self.ops.push(DrawOp::Clear);
        }

        fn paint(&mut self, color: Rgba) {
            self.ops.push(DrawOp::Paint(color));
        }

        fn fill_rect(&mut self, rect: Rect, color: Rgba) {
            self.ops.push(DrawOp::Fill(rect, color));
        }

        fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Rgba) {
            self.ops.push(DrawOp::Stroke(rect, line_width, color));
        }

        fn show_text(&mut self, x: f64, y: f64, text: &str, color: Rgba) {
            self.ops.push(DrawOp::Text {
                x,
                y,
                text: text.to_string(),
                color,
            });
        }
    }

    type ClosePredicate = Box<dyn Fn(&[Vec<DrawOp>]) -> bool>;

    /// Display that never produces events of its own
    ///
    /// Keeps every presented frame and reports the window as closed once
    /// `close_when` holds for the frames so far.
    pub(crate) struct FakeDisplay {
        pub surface: RecordingSurface,
        pub frames: Vec<Vec<DrawOp>>,
        pub redraw_requested: bool,
        close_when: ClosePredicate,
    }

    impl FakeDisplay {
        pub(crate) fn new(close_when: impl Fn(&[Vec<DrawOp>]) -> bool + 'static) -> Self {
            Self {
                surface: RecordingSurface::default(),
                frames: Vec::new(),
                redraw_requested: false,
                close_when: Box::new(close_when),
            }
        }
    }

    impl DisplayServer for FakeDisplay {
        type Surface = RecordingSurface;

        fn surface(&mut self) -> &mut RecordingSurface {
            &mut self.surface
        }

        fn prerender(&mut self) -> bool {
            self.surface.ops.clear();
            true
        }

        fn present(&mut self) -> Result<(), DisplayError> {
            self.frames.push(std::mem::take(&mut self.surface.ops));
            Ok(())
        }

        fn dispatch_pending(&mut self) -> Result<(), DisplayError> {
            if (self.close_when)(&self.frames) {
                return Err(DisplayError::Closed);
            }
            Ok(())
        }

        fn take_redraw_request(&mut self) -> bool {
            std::mem::take(&mut self.redraw_requested)
        }

        async fn read_events(&mut self) -> Result<(), DisplayError> {
            std::future::pending().await
        }
    }
}
