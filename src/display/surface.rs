// src/display/surface.rs
//! SurfaceBackend trait - the minimal contract the core needs from a native
//! windowing or framebuffer subsystem.
//!
//! The core never touches native APIs itself. A backend provides:
//! - geometry of the surface it created (width, height, stride),
//! - the frame buffers the core draws into,
//! - presentation of one of those buffers (may block, e.g. on vsync),
//! - a non-blocking source of raw native events,
//! - release of every native resource.
//!
//! ## Lifecycle
//! 1. Backend constructor (`open`) - create window/surface, discover geometry
//! 2. `alloc_buffers` - once, from `FrameRing::create`
//! 3. `present` / `poll_native_event` - once per frame, any order
//! 4. `release` - once from `Display` drop/shutdown; must be idempotent

use crate::display::frame_ring::{allocate_frames, FrameBuffer};
use crate::error::{DisplayError, Result};

/// Bytes per pixel of the only supported format.
pub const BYTES_PER_PIXEL: usize = 4;
/// Bits per pixel of the only supported format.
pub const BITS_PER_PIXEL: u32 = 32;

/// Pixel geometry of a surface and of every buffer allocated for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub width: usize,
    pub height: usize,
    /// Bytes per row, `>= width * 4`.
    pub stride: usize,
}

impl SurfaceGeometry {
    /// Geometry with rows packed back to back (`stride == width * 4`).
    pub fn packed(width: usize, height: usize) -> Result<Self> {
        Self::aligned(width, height, 1)
    }

    /// Geometry whose stride is rounded up to a multiple of `alignment` bytes.
    pub fn aligned(width: usize, height: usize, alignment: usize) -> Result<Self> {
        if alignment == 0 {
            return Err(DisplayError::invalid("stride alignment must be non-zero"));
        }
        let row = width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| DisplayError::invalid(format!("width {width} overflows a row")))?;
        let stride = row
            .checked_next_multiple_of(alignment)
            .ok_or_else(|| DisplayError::invalid(format!("width {width} overflows a row")))?;
        Self::with_stride(width, height, stride)
    }

    /// Geometry with an explicit stride, as reported by a device.
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DisplayError::invalid(format!(
                "surface must be at least 1x1, got {width}x{height}"
            )));
        }
        if width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(DisplayError::invalid(format!(
                "surface {width}x{height} exceeds the addressable range"
            )));
        }
        if stride < width * BYTES_PER_PIXEL {
            return Err(DisplayError::invalid(format!(
                "stride {stride} is shorter than a {width} pixel row"
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
        })
    }

    /// Size in bytes of one frame buffer, `None` on overflow.
    pub fn frame_len(&self) -> Option<usize> {
        self.stride.checked_mul(self.height)
    }
}

/// Where a backend puts the origin of its native pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Y grows downward from the top edge (X11, evdev, Win32).
    #[default]
    TopLeft,
    /// Y grows upward from the bottom edge (AppKit).
    BottomLeft,
}

/// A raw event as a backend sees it, before normalisation.
///
/// Coordinates are in the backend's own space (see [`SurfaceBackend::origin`]).
/// Buttons use X11 numbering: 1 left, 2 middle, 3 right, 4/5 wheel up/down.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Key { code: u32 },
    ButtonPress { x: f64, y: f64, button: u8 },
    ButtonRelease { x: f64, y: f64, button: u8 },
    Motion { x: f64, y: f64 },
    /// Continuous wheel (AppKit); negative `delta_y` scrolls up.
    Scroll { x: f64, y: f64, delta_y: f64 },
    /// The surface lost its contents and wants the last frame again.
    Expose,
    /// Window manager close request.
    CloseRequested,
    /// Anything else; the value is the backend's native type code.
    Other(u32),
}

/// Platform-specific surface operations consumed by the display core.
///
/// A `Display` holds exactly one backend as `Box<dyn SurfaceBackend>`, chosen
/// once at construction. All calls happen on the thread that owns the Display.
pub trait SurfaceBackend {
    /// Short name for logs ("x11", "headless", ...).
    fn name(&self) -> &'static str;

    fn geometry(&self) -> SurfaceGeometry;

    fn origin(&self) -> Origin {
        Origin::TopLeft
    }

    /// Allocates `frame_count` zeroed buffers sized `stride * height`.
    ///
    /// All or nothing: on failure nothing allocated by this call survives.
    fn alloc_buffers(&mut self, frame_count: usize) -> Result<Vec<FrameBuffer>> {
        allocate_frames(self.geometry(), frame_count)
    }

    /// Shows buffer `index` of the ring. May block (vsync).
    fn present(&mut self, index: usize, frame: &FrameBuffer) -> Result<()>;

    /// Next queued native event, `None` when the queue is empty. Never blocks.
    fn poll_native_event(&mut self) -> Option<NativeEvent>;

    /// Releases native resources. Called at most once per Display but must
    /// tolerate repeated calls.
    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn it_should_pack_rows_without_padding() {
        let g = SurfaceGeometry::packed(800, 600).unwrap();
        assert_eq!(g.stride, 3200);
        assert_eq!(g.frame_len(), Some(3200 * 600));
    }

    #[test]
    fn it_should_round_the_stride_up_to_the_alignment() {
        let g = SurfaceGeometry::aligned(10, 4, 64).unwrap();
        assert_eq!(g.stride, 64);
        let g = SurfaceGeometry::aligned(16, 4, 64).unwrap();
        assert_eq!(g.stride, 64);
    }

    #[test]
    fn it_should_reject_empty_or_short_geometry() {
        assert!(matches!(
            SurfaceGeometry::packed(0, 10),
            Err(DisplayError::InvalidArgument(_))
        ));
        assert!(matches!(
            SurfaceGeometry::with_stride(10, 10, 39),
            Err(DisplayError::InvalidArgument(_))
        ));
        assert!(matches!(
            SurfaceGeometry::aligned(10, 10, 0),
            Err(DisplayError::InvalidArgument(_))
        ));
    }
}
