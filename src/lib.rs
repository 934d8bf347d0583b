// src/lib.rs
//! Software frame composition on raw display surfaces.
//!
//! A [`Display`] owns a small ring of 32-bit pixel buffers on top of whatever
//! native surface is available (X11, a Linux framebuffer device, Cocoa, or an
//! in-memory headless surface). Callers draw into the writable buffer through
//! a [`Canvas`], present it with [`Display::flip`], and poll normalized input
//! with [`Display::process_event`].
//!
//! ```no_run
//! use raw_display::{Colour, Display, Event};
//!
//! let mut display = Display::init("demo", 320, 240)?;
//! display.canvas().clear(Colour::BLACK);
//! display.draw_string(8, 8, "hello", Colour::WHITE)?;
//! display.flip()?;
//! while let Some(event) = display.process_event() {
//!     if event == Event::Quit {
//!         break;
//!     }
//! }
//! display.shutdown();
//! # Ok::<(), raw_display::DisplayError>(())
//! ```

pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod glyph;
pub mod rasterizer;
pub mod snapshot;

pub use color::Colour;
pub use config::{Config, SurfaceKind, CONFIG};
pub use display::{
    Display, DisplayInfo, Event, FrameBuffer, FrameDetails, MouseButton, NativeEvent, Origin,
    SurfaceBackend, SurfaceGeometry,
};
pub use error::{DisplayError, Result};
pub use rasterizer::Canvas;
