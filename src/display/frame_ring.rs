// src/display/frame_ring.rs
//! Frame buffers and the ring that cycles through them.
//!
//! The ring owns every buffer for the lifetime of its Display. Exactly one
//! buffer is writable at a time (the one at the cursor); `present` hands it to
//! the backend and moves the cursor on.

use crate::color::Colour;
use crate::display::surface::{SurfaceBackend, SurfaceGeometry, BYTES_PER_PIXEL};
use crate::error::{DisplayError, Result};
use crate::rasterizer::Canvas;
use log::{debug, trace};

/// One full frame: `stride * height` bytes of packed 32-bit pixels, row-major.
pub struct FrameBuffer {
    data: Box<[u8]>,
    geometry: SurfaceGeometry,
}

impl FrameBuffer {
    /// Allocates a zeroed buffer, reporting exhaustion instead of aborting.
    pub fn zeroed(geometry: SurfaceGeometry) -> Result<Self> {
        Self::allocate(geometry, 0)
    }

    fn allocate(geometry: SurfaceGeometry, index: usize) -> Result<Self> {
        let bytes = geometry.frame_len().ok_or(DisplayError::AllocFailure {
            index,
            bytes: usize::MAX,
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| DisplayError::AllocFailure { index, bytes })?;
        data.resize(bytes, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            geometry,
        })
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// The raw `stride * height` bytes, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Visible pixels of row `y` (`width * 4` bytes, padding excluded).
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.geometry.height {
            return None;
        }
        let start = y * self.geometry.stride;
        Some(&self.data[start..start + self.geometry.width * BYTES_PER_PIXEL])
    }

    /// Reads the pixel at (`x`, `y`), `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }
        let at = y * self.geometry.stride + x * BYTES_PER_PIXEL;
        let mut word = [0u8; BYTES_PER_PIXEL];
        word.copy_from_slice(&self.data[at..at + BYTES_PER_PIXEL]);
        Some(Colour::from_word_bytes(word))
    }

    /// Drawing view over this buffer.
    pub fn canvas(&mut self) -> Canvas<'_> {
        let SurfaceGeometry {
            width,
            height,
            stride,
        } = self.geometry;
        Canvas::from_parts(&mut self.data, width, height, stride)
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("geometry", &self.geometry)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

/// Allocates `count` zeroed buffers. If any allocation fails the ones already
/// made are dropped before the error is returned.
pub fn allocate_frames(geometry: SurfaceGeometry, count: usize) -> Result<Vec<FrameBuffer>> {
    let mut frames = Vec::with_capacity(count);
    for index in 0..count {
        frames.push(FrameBuffer::allocate(geometry, index)?);
    }
    Ok(frames)
}

/// Ring of frame buffers with a write cursor.
#[derive(Debug)]
pub struct FrameRing {
    frames: Vec<FrameBuffer>,
    cur_frame: usize,
    last_presented: Option<usize>,
}

impl FrameRing {
    /// Asks `backend` for `frame_count` buffers and checks they match its
    /// geometry. Nothing is kept if any step fails.
    pub fn create(backend: &mut dyn SurfaceBackend, frame_count: usize) -> Result<Self> {
        if frame_count == 0 {
            return Err(DisplayError::invalid("frame_count must be at least 1"));
        }
        let geometry = backend.geometry();
        let frames = backend.alloc_buffers(frame_count)?;
        if frames.len() != frame_count {
            return Err(DisplayError::InitFailure(format!(
                "{} backend returned {} buffers, expected {}",
                backend.name(),
                frames.len(),
                frame_count
            )));
        }
        if let Some(bad) = frames.iter().position(|f| f.geometry() != geometry) {
            return Err(DisplayError::InitFailure(format!(
                "{} backend buffer {} has geometry {:?}, surface is {:?}",
                backend.name(),
                bad,
                frames[bad].geometry(),
                geometry
            )));
        }
        debug!(
            "FrameRing: {} buffers of {} bytes ({}x{}, stride {})",
            frame_count,
            frames[0].as_bytes().len(),
            geometry.width,
            geometry.height,
            geometry.stride
        );
        Ok(Self {
            frames,
            cur_frame: 0,
            last_presented: None,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.cur_frame
    }

    /// Index of the buffer most recently handed to the backend.
    pub fn last_presented(&self) -> Option<usize> {
        self.last_presented
    }

    pub fn get(&self, index: usize) -> Option<&FrameBuffer> {
        self.frames.get(index)
    }

    pub fn writable(&self) -> &FrameBuffer {
        &self.frames[self.cur_frame]
    }

    pub fn writable_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frames[self.cur_frame]
    }

    /// Presents the writable buffer, then advances the cursor. A failed
    /// present leaves the cursor where it was.
    pub fn present(&mut self, backend: &mut dyn SurfaceBackend) -> Result<()> {
        let index = self.cur_frame;
        backend.present(index, &self.frames[index])?;
        self.last_presented = Some(index);
        self.cur_frame = (index + 1) % self.frames.len();
        trace!("FrameRing: presented {} -> writable {}", index, self.cur_frame);
        Ok(())
    }

    /// Hands the last presented buffer to the backend again (expose/redraw).
    pub fn represent(&self, backend: &mut dyn SurfaceBackend) -> Result<()> {
        match self.last_presented {
            Some(index) => backend.present(index, &self.frames[index]),
            None => Ok(()),
        }
    }
}
