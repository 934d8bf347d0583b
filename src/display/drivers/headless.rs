//! Headless surface: nothing is shown.
//!
//! Used when no native surface is available and by the test suite. A cloneable
//! [`HeadlessProbe`] shares state with the surface so a test can script native
//! events, inspect what was presented and make allocation or presentation fail
//! after the surface has been moved into a `Display`. Presents are only
//! recorded once a probe has been taken; without one they are dropped.

use crate::display::frame_ring::FrameBuffer;
use crate::display::surface::{NativeEvent, Origin, SurfaceBackend, SurfaceGeometry};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct ProbeState {
    events: VecDeque<NativeEvent>,
    presented: Vec<usize>,
    last_frame: Option<Vec<u8>>,
    alloc_budget: Option<usize>,
    fail_presents: usize,
    releases: usize,
    recording: bool,
}

/// Test handle onto a [`HeadlessSurface`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl HeadlessProbe {
    /// Queues a native event for the next poll.
    pub fn push_event(&self, event: NativeEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    /// Events queued but not yet polled.
    pub fn pending_events(&self) -> usize {
        self.state.borrow().events.len()
    }

    /// Buffer indices in the order they were presented.
    pub fn presented(&self) -> Vec<usize> {
        self.state.borrow().presented.clone()
    }

    /// Copy of the bytes of the most recent present.
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.state.borrow().last_frame.clone()
    }

    /// Limits how many buffers the next allocations may create in total.
    pub fn set_alloc_budget(&self, buffers: Option<usize>) {
        self.state.borrow_mut().alloc_budget = buffers;
    }

    /// Makes the next `count` presents fail.
    pub fn fail_presents(&self, count: usize) {
        self.state.borrow_mut().fail_presents = count;
    }

    /// Number of times the surface was released.
    pub fn releases(&self) -> usize {
        self.state.borrow().releases
    }
}

pub struct HeadlessSurface {
    geometry: SurfaceGeometry,
    origin: Origin,
    probe: HeadlessProbe,
    released: bool,
}

impl HeadlessSurface {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let geometry = SurfaceGeometry::packed(width, height)?;
        info!("HeadlessSurface: {}x{}", width, height);
        Ok(Self {
            geometry,
            origin: Origin::TopLeft,
            probe: HeadlessProbe::default(),
            released: false,
        })
    }

    /// Pads rows to a multiple of `alignment` bytes.
    pub fn with_stride_alignment(mut self, alignment: usize) -> Result<Self> {
        self.geometry =
            SurfaceGeometry::aligned(self.geometry.width, self.geometry.height, alignment)?;
        Ok(self)
    }

    /// Reports native coordinates from this corner.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Handle onto this surface's state. Presents from here on are recorded.
    pub fn probe(&self) -> HeadlessProbe {
        self.probe.state.borrow_mut().recording = true;
        self.probe.clone()
    }
}

impl SurfaceBackend for HeadlessSurface {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    fn alloc_buffers(&mut self, frame_count: usize) -> Result<Vec<FrameBuffer>> {
        let bytes = self.geometry.frame_len().unwrap_or(usize::MAX);
        let mut frames = Vec::with_capacity(frame_count);
        for index in 0..frame_count {
            if let Some(left) = self.probe.state.borrow_mut().alloc_budget.as_mut() {
                if *left == 0 {
                    debug!("HeadlessSurface: allocation budget exhausted at buffer {}", index);
                    return Err(DisplayError::AllocFailure { index, bytes });
                }
                *left -= 1;
            }
            frames.push(FrameBuffer::zeroed(self.geometry).map_err(|e| match e {
                DisplayError::AllocFailure { bytes, .. } => {
                    DisplayError::AllocFailure { index, bytes }
                }
                other => other,
            })?);
        }
        Ok(frames)
    }

    fn present(&mut self, index: usize, frame: &FrameBuffer) -> Result<()> {
        let mut state = self.probe.state.borrow_mut();
        if state.fail_presents > 0 {
            state.fail_presents -= 1;
            return Err(DisplayError::PresentFailure(format!(
                "headless present of buffer {index} rejected"
            )));
        }
        trace!("HeadlessSurface: present {}", index);
        if state.recording {
            state.presented.push(index);
            state.last_frame = Some(frame.as_bytes().to_vec());
        }
        Ok(())
    }

    fn poll_native_event(&mut self) -> Option<NativeEvent> {
        self.probe.state.borrow_mut().events.pop_front()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.probe.state.borrow_mut().releases += 1;
        info!("HeadlessSurface released");
    }
}
