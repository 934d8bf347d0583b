// src/display/mod.rs
//! Frame composition over a native surface.
//!
//! - SurfaceBackend: platform primitives (X11, framebuffer, Cocoa, headless)
//! - FrameRing: the buffers and the write cursor
//! - events: native input mapped to one closed set
//! - Display: the public handle over all of the above

pub mod drivers;
pub mod events;
pub mod frame_ring;
pub mod manager;
pub mod surface;

#[cfg(test)]
mod tests;

pub use drivers::{HeadlessProbe, HeadlessSurface};
pub use events::{Event, MouseButton};
pub use frame_ring::{FrameBuffer, FrameRing};
pub use manager::{Display, DisplayInfo, FrameDetails};
pub use surface::{NativeEvent, Origin, SurfaceBackend, SurfaceGeometry};
