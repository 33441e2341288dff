//! Wayland panel backend
//!
//! The bar window is a wlr-layer-shell surface on the `top` layer. Frames are
//! drawn with cairo and pango into an image surface and copied into a
//! shared-memory buffer on present. Frame callbacks pace presentation: while
//! one is outstanding, new frames are refused and a redraw is requested once
//! it fires.

mod handlers;

use std::io;
use std::os::fd::{AsRawFd, RawFd};

use cairo::{Context, Format, ImageSurface, Operator};
use pango::FontDescription;
use smithay_client_toolkit::{
    compositor::CompositorState,
    output::OutputState,
    reexports::client::{
        backend::WaylandError, globals::registry_queue_init, protocol::wl_shm, Connection,
        EventQueue, QueueHandle,
    },
    registry::RegistryState,
    shell::{
        wlr_layer::{Anchor, Layer, LayerShell, LayerSurface},
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm,
    },
};
use swaybar_config::{Geometry, Position, Rgba, DEFAULT_FONT};
use tokio::io::{unix::AsyncFd, Interest};
use tracing::{debug, info, warn};

use crate::surface::{DisplayError, DisplayServer, Rect, Surface};

/// Layer-shell namespace of the bar window
const NAMESPACE: &str = "panel";

/// Initial shared-memory pool size; the pool grows on demand
const INITIAL_POOL_SIZE: usize = 1920 * 30 * 4;

fn connect_error(e: impl std::error::Error + Send + Sync + 'static) -> DisplayError {
    DisplayError::Connect(Box::new(e))
}

fn disconnected(e: impl std::error::Error + Send + Sync + 'static) -> DisplayError {
    DisplayError::Disconnected(Box::new(e))
}

fn draw_error(e: impl std::fmt::Display) -> DisplayError {
    DisplayError::Draw(e.to_string())
}

fn log_draw_error(result: Result<(), cairo::Error>) {
    if let Err(e) = result {
        warn!("Drawing failed: {}", e);
    }
}

/// A frame being drawn
struct Frame {
    image: ImageSurface,
    cr: Context,
    layout: pango::Layout,
}

impl Frame {
    fn new(width: u32, height: u32, font: &FontDescription) -> Result<Self, DisplayError> {
        let image =
            ImageSurface::create(Format::ARgb32, width as i32, height as i32).map_err(draw_error)?;
        let cr = Context::new(&image).map_err(draw_error)?;
        let layout = pangocairo::create_layout(&cr);
        layout.set_font_description(Some(font));
        Ok(Self { image, cr, layout })
    }

    fn set_source(&self, color: Rgba) {
        self.cr
            .set_source_rgba(color.red(), color.green(), color.blue(), color.alpha());
    }
}

/// Wayland-side state of the bar window
pub struct WaylandState {
    registry_state: RegistryState,
    output_state: OutputState,
    compositor_state: CompositorState,
    shm: Shm,
    layer_shell: LayerShell,
    layer: Option<LayerSurface>,
    pool: SlotPool,
    /// Buffer shown on screen; kept until the next present
    buffer: Option<Buffer>,
    qh: QueueHandle<WaylandState>,

    /// The first commit (which maps the window) has been sent
    mapped: bool,
    configured: bool,
    frame_pending: bool,
    missed_frame: bool,
    redraw_requested: bool,
    closed: bool,

    position: Position,
    /// Thickness requested from the compositor
    bar_height: u32,
    width: u32,
    height: u32,

    font: FontDescription,
    /// Layout used for measuring text outside a frame
    measure: pango::Layout,
    frame: Option<Frame>,
}

impl WaylandState {
    /// Push anchor, size and exclusive zone to the layer surface
    fn update_layer(&self) {
        let Some(layer) = &self.layer else {
            return;
        };

        let thickness = self.bar_height;
        let (anchor, width, height) = match self.position {
            Position::Top => (Anchor::TOP | Anchor::LEFT | Anchor::RIGHT, 0, thickness),
            Position::Bottom => (Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT, 0, thickness),
            Position::Left => (Anchor::LEFT | Anchor::TOP | Anchor::BOTTOM, thickness, 0),
            Position::Right => (Anchor::RIGHT | Anchor::TOP | Anchor::BOTTOM, thickness, 0),
        };
        layer.set_anchor(anchor);
        layer.set_size(width, height);
        layer.set_exclusive_zone(thickness as i32);

        if self.mapped {
            layer.commit();
        }
    }
}

impl Surface for WaylandState {
    fn set_position(&mut self, position: Position) {
        self.position = position;
        self.update_layer();
    }

    fn set_font(&mut self, font: &str) {
        self.font = FontDescription::from_string(font);
        self.measure.set_font_description(Some(&self.font));
    }

    fn set_height(&mut self, height: u32) {
        self.bar_height = height;
        self.update_layer();
    }

    fn text_size(&mut self, text: &str) -> (i32, i32) {
        self.measure.set_text(text);
        self.measure.pixel_size()
    }

    fn width(&self) -> i32 {
        self.width as i32
    }

    fn clear(&mut self) {
        if let Some(frame) = &self.frame {
            frame.cr.set_operator(Operator::Clear);
            log_draw_error(frame.cr.paint());
            frame.cr.set_operator(Operator::Over);
        }
    }

    fn paint(&mut self, color: Rgba) {
        if let Some(frame) = &self.frame {
            frame.set_source(color);
            log_draw_error(frame.cr.paint());
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if let Some(frame) = &self.frame {
            frame.set_source(color);
            frame.cr.rectangle(rect.x, rect.y, rect.width, rect.height);
            log_draw_error(frame.cr.fill());
        }
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Rgba) {
        if let Some(frame) = &self.frame {
            frame.set_source(color);
            frame.cr.set_line_width(line_width);
            frame.cr.rectangle(rect.x, rect.y, rect.width, rect.height);
            log_draw_error(frame.cr.stroke());
        }
    }

    fn show_text(&mut self, x: f64, y: f64, text: &str, color: Rgba) {
        if let Some(frame) = &self.frame {
            frame.set_source(color);
            frame.cr.move_to(x, y);
            frame.layout.set_text(text);
            pangocairo::show_layout(&frame.cr, &frame.layout);
        }
    }
}

/// Connection to the Wayland compositor holding the bar window
pub struct WaylandDisplay {
    /// Registered with the reactor; dropped before the connection
    fd: AsyncFd<RawFd>,
    event_queue: EventQueue<WaylandState>,
    state: WaylandState,
    _conn: Connection,
}

impl WaylandDisplay {
    /// Connect via `$WAYLAND_DISPLAY` and create the bar window on output
    /// number `output_index`
    ///
    /// The window is not mapped until the first frame is requested, so
    /// position and height can still be changed without extra round trips.
    ///
    /// # Errors
    ///
    /// Returns `DisplayError::NoLayerShell` if the compositor lacks
    /// wlr-layer-shell and `DisplayError::NoSuchOutput` if the index is out
    /// of range.
    pub fn connect(output_index: usize) -> Result<Self, DisplayError> {
        let conn = Connection::connect_to_env().map_err(connect_error)?;
        let (globals, mut event_queue) =
            registry_queue_init::<WaylandState>(&conn).map_err(connect_error)?;
        let qh = event_queue.handle();

        let compositor_state = CompositorState::bind(&globals, &qh).map_err(connect_error)?;
        let layer_shell =
            LayerShell::bind(&globals, &qh).map_err(|_| DisplayError::NoLayerShell)?;
        let shm = Shm::bind(&globals, &qh).map_err(connect_error)?;
        let output_state = OutputState::new(&globals, &qh);
        let registry_state = RegistryState::new(&globals);
        let pool = SlotPool::new(INITIAL_POOL_SIZE, &shm).map_err(connect_error)?;

        let measure_image = ImageSurface::create(Format::ARgb32, 1, 1).map_err(draw_error)?;
        let measure_cr = Context::new(&measure_image).map_err(draw_error)?;
        let measure = pangocairo::create_layout(&measure_cr);
        let font = FontDescription::from_string(DEFAULT_FONT);
        measure.set_font_description(Some(&font));

        let mut state = WaylandState {
            registry_state,
            output_state,
            compositor_state,
            shm,
            layer_shell,
            layer: None,
            pool,
            buffer: None,
            qh: qh.clone(),
            mapped: false,
            configured: false,
            frame_pending: false,
            missed_frame: false,
            redraw_requested: false,
            closed: false,
            position: Position::default(),
            bar_height: Geometry::default().height,
            width: 0,
            height: 0,
            font,
            measure,
            frame: None,
        };

        event_queue.roundtrip(&mut state).map_err(connect_error)?;

        let available = state.output_state.outputs().count();
        let output = state
            .output_state
            .outputs()
            .nth(output_index)
            .ok_or(DisplayError::NoSuchOutput {
                index: output_index,
                available,
            })?;

        let surface = state.compositor_state.create_surface(&qh);
        let layer = state.layer_shell.create_layer_surface(
            &qh,
            surface,
            Layer::Top,
            Some(NAMESPACE),
            Some(&output),
        );
        state.layer = Some(layer);
        state.update_layer();

        let fd = AsyncFd::with_interest(conn.backend().poll_fd().as_raw_fd(), Interest::READABLE)?;
        info!(output = output_index, "Created bar surface");

        Ok(Self {
            fd,
            event_queue,
            state,
            _conn: conn,
        })
    }
}

impl DisplayServer for WaylandDisplay {
    type Surface = WaylandState;

    fn surface(&mut self) -> &mut WaylandState {
        &mut self.state
    }

    fn prerender(&mut self) -> bool {
        let state = &mut self.state;
        let Some(layer) = &state.layer else {
            return false;
        };

        if !state.mapped {
            layer.commit();
            state.mapped = true;
            debug!("Mapped bar surface, waiting for configure");
            return false;
        }

        if !state.configured || state.width == 0 || state.height == 0 {
            return false;
        }

        if state.frame_pending {
            state.missed_frame = true;
            return false;
        }

        match Frame::new(state.width, state.height, &state.font) {
            Ok(frame) => {
                state.frame = Some(frame);
                true
            }
            Err(e) => {
                warn!("Failed to start frame: {}", e);
                false
            }
        }
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        let state = &mut self.state;
        let (Some(frame), Some(layer)) = (state.frame.take(), &state.layer) else {
            return Ok(());
        };

        let Frame {
            mut image,
            cr,
            layout,
        } = frame;
        drop(layout);
        drop(cr);
        image.flush();

        let width = image.width();
        let height = image.height();
        let stride = image.stride();
        let data = image.data().map_err(draw_error)?;

        let (buffer, canvas) = state
            .pool
            .create_buffer(width, height, stride, wl_shm::Format::Argb8888)
            .map_err(draw_error)?;
        canvas.copy_from_slice(&data[..canvas.len()]);

        let surface = layer.wl_surface();
        surface.damage_buffer(0, 0, width, height);
        surface.frame(&state.qh, surface.clone());
        buffer.attach_to(surface).map_err(draw_error)?;
        layer.commit();

        state.buffer = Some(buffer);
        state.frame_pending = true;
        Ok(())
    }

    fn dispatch_pending(&mut self) -> Result<(), DisplayError> {
        self.event_queue
            .dispatch_pending(&mut self.state)
            .map_err(disconnected)?;

        if self.state.closed {
            return Err(DisplayError::Closed);
        }

        self.event_queue.flush().map_err(disconnected)
    }

    fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.state.redraw_requested)
    }

    async fn read_events(&mut self) -> Result<(), DisplayError> {
        loop {
            let mut ready = self.fd.readable().await?;

            let Some(guard) = self.event_queue.prepare_read() else {
                return Ok(());
            };

            match guard.read() {
                Ok(_) => return Ok(()),
                Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                    ready.clear_ready();
                }
                Err(e) => return Err(disconnected(e)),
            }
        }
    }
}
