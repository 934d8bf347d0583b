// src/display/manager.rs
//! Display - the public handle tying a surface backend to its frame ring.
//!
//! Drawing goes into the writable buffer, `flip` presents it and moves to the
//! next one, `process_event` drains translated input one event at a time.

use crate::color::Colour;
use crate::config::{Config, CONFIG};
use crate::display::drivers;
use crate::display::events::{self, Event};
use crate::display::frame_ring::{FrameBuffer, FrameRing};
use crate::display::surface::{NativeEvent, SurfaceBackend, BITS_PER_PIXEL};
use crate::error::{DisplayError, Result};
use crate::rasterizer::Canvas;
use crate::snapshot;
use log::{debug, info, warn};
use std::path::Path;

/// Geometry of a display as reported by [`Display::info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub width: usize,
    pub height: usize,
    pub bpp: u32,
    pub stride: usize,
}

/// Position of the write cursor in the frame ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDetails {
    pub index: usize,
    pub count: usize,
}

pub struct Display {
    backend: Box<dyn SurfaceBackend>,
    ring: FrameRing,
    released: bool,
}

impl Display {
    /// Opens a display using the process-wide [`CONFIG`].
    pub fn init(title: &str, width: usize, height: usize) -> Result<Self> {
        Self::with_config(&CONFIG, title, width, height)
    }

    /// Opens a display with an explicit configuration.
    pub fn with_config(config: &Config, title: &str, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DisplayError::invalid(format!(
                "display must be at least 1x1, got {width}x{height}"
            )));
        }
        let backend = drivers::open(config, title, width, height)?;
        Self::with_backend(backend, config.display.frame_count)
    }

    /// Builds a display around an already opened surface. If the frame
    /// buffers cannot be set up the surface is released before returning.
    pub fn with_backend(mut backend: Box<dyn SurfaceBackend>, frame_count: usize) -> Result<Self> {
        let ring = match FrameRing::create(backend.as_mut(), frame_count) {
            Ok(ring) => ring,
            Err(e) => {
                backend.release();
                return Err(e);
            }
        };
        let geometry = backend.geometry();
        info!(
            "Display: {} surface {}x{} (stride {}), {} frames",
            backend.name(),
            geometry.width,
            geometry.height,
            geometry.stride,
            ring.len()
        );
        Ok(Self {
            backend,
            ring,
            released: false,
        })
    }

    pub fn info(&self) -> DisplayInfo {
        let geometry = self.backend.geometry();
        DisplayInfo {
            width: geometry.width,
            height: geometry.height,
            bpp: BITS_PER_PIXEL,
            stride: geometry.stride,
        }
    }

    pub fn frame_details(&self) -> FrameDetails {
        FrameDetails {
            index: self.ring.current_index(),
            count: self.ring.len(),
        }
    }

    /// The buffer drawing currently goes to.
    pub fn frame(&self) -> &FrameBuffer {
        self.ring.writable()
    }

    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        self.ring.writable_mut()
    }

    /// Drawing view over the writable buffer.
    pub fn canvas(&mut self) -> Canvas<'_> {
        self.ring.writable_mut().canvas()
    }

    /// Presents the writable buffer and advances to the next one. On error the
    /// cursor stays put and the same buffer is presented next time.
    pub fn flip(&mut self) -> Result<()> {
        self.ring.present(self.backend.as_mut())
    }

    /// Next translated event, or `None` once the native queue is empty.
    pub fn process_event(&mut self) -> Option<Event> {
        let native = self.backend.poll_native_event()?;
        if native == NativeEvent::Expose {
            debug!("Display: expose, re-presenting last frame");
            if let Err(e) = self.ring.represent(self.backend.as_mut()) {
                warn!("Display: redraw after expose failed: {}", e);
            }
        }
        let height = self.backend.geometry().height;
        Some(events::normalize(&native, height, self.backend.origin()))
    }

    /// Every event queued right now, in order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.process_event()).collect()
    }

    /// Writes the writable buffer as a binary PPM.
    pub fn save_frame(&self, path: impl AsRef<Path>) -> Result<()> {
        snapshot::save_frame(self.frame(), path.as_ref())
    }

    /// Releases the surface and every buffer.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.backend.release();
        info!("Display: {} surface shut down", self.backend.name());
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Colour) {
        self.canvas().set_pixel(x, y, colour);
    }

    pub fn fill_rectangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Colour) {
        self.canvas().fill_rectangle(x0, y0, x1, y1, colour);
    }

    pub fn draw_rectangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        colour: Colour,
        border_width: i32,
    ) {
        self.canvas()
            .draw_rectangle(x0, y0, x1, y1, colour, border_width);
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Colour, width_px: i32) {
        self.canvas().draw_line(x0, y0, x1, y1, colour, width_px);
    }

    pub fn draw_circle(&mut self, xc: i32, yc: i32, radius: i32, colour: Colour, border_width: i32) {
        self.canvas()
            .draw_circle(xc, yc, radius, colour, border_width);
    }

    pub fn draw_string(&mut self, x: i32, y: i32, text: impl AsRef<[u8]>, colour: Colour) -> Result<()> {
        self.canvas().draw_string(x, y, text, colour)
    }

    pub fn blit_rgb(
        &mut self,
        x: i32,
        y: i32,
        rgb: &[u8],
        data_width: usize,
        data_height: usize,
    ) -> Result<()> {
        self.canvas().blit_rgb(x, y, rgb, data_width, data_height)
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("backend", &self.backend.name())
            .field("info", &self.info())
            .field("frame", &self.frame_details())
            .finish()
    }
}
