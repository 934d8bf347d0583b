use super::*;
use crate::color::Colour;
use crate::error::{DisplayError, Result};
use test_log::test;

fn headless(width: usize, height: usize) -> (HeadlessSurface, HeadlessProbe) {
    let surface = HeadlessSurface::new(width, height).unwrap();
    let probe = surface.probe();
    (surface, probe)
}

fn display(width: usize, height: usize, frames: usize) -> (Display, HeadlessProbe) {
    let (surface, probe) = headless(width, height);
    (Display::with_backend(Box::new(surface), frames).unwrap(), probe)
}

/// Backend that hands back fewer buffers than asked for.
struct ShortBackend(SurfaceGeometry);

impl SurfaceBackend for ShortBackend {
    fn name(&self) -> &'static str {
        "short"
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.0
    }

    fn alloc_buffers(&mut self, frame_count: usize) -> Result<Vec<FrameBuffer>> {
        frame_ring::allocate_frames(self.0, frame_count.saturating_sub(1))
    }

    fn present(&mut self, _index: usize, _frame: &FrameBuffer) -> Result<()> {
        Ok(())
    }

    fn poll_native_event(&mut self) -> Option<NativeEvent> {
        None
    }
}

#[test]
fn it_should_create_zeroed_distinct_buffers() {
    let (mut surface, _) = headless(4, 3);
    let ring = FrameRing::create(&mut surface, 3).unwrap();
    assert_eq!(ring.len(), 3);
    assert_eq!(ring.current_index(), 0);
    for i in 0..3 {
        let frame = ring.get(i).unwrap();
        assert_eq!(frame.as_bytes().len(), 4 * 4 * 3);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }
    let a = ring.get(0).unwrap().as_bytes().as_ptr();
    let b = ring.get(1).unwrap().as_bytes().as_ptr();
    assert_ne!(a, b);
}

#[test]
fn it_should_reject_an_empty_ring() {
    let (mut surface, _) = headless(4, 3);
    assert!(matches!(
        FrameRing::create(&mut surface, 0),
        Err(DisplayError::InvalidArgument(_))
    ));
}

#[test]
fn it_should_reject_a_backend_returning_too_few_buffers() {
    let mut backend = ShortBackend(SurfaceGeometry::packed(2, 2).unwrap());
    assert!(matches!(
        FrameRing::create(&mut backend, 3),
        Err(DisplayError::InitFailure(_))
    ));
}

#[test]
fn it_should_advance_the_cursor_modulo_the_ring() {
    let (mut d, probe) = display(8, 8, 3);
    let mut seen = Vec::new();
    for _ in 0..7 {
        seen.push(d.frame_details().index);
        d.flip().unwrap();
    }
    assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(probe.presented(), vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(d.frame_details(), FrameDetails { index: 1, count: 3 });
}

#[test]
fn it_should_hand_out_a_different_buffer_after_flip() {
    let (mut d, _) = display(8, 8, 3);
    let before = d.frame().as_bytes().as_ptr();
    d.flip().unwrap();
    assert_ne!(d.frame().as_bytes().as_ptr(), before);
}

#[test]
fn it_should_not_advance_when_present_fails() {
    let (mut d, probe) = display(8, 8, 3);
    probe.fail_presents(1);
    assert!(matches!(d.flip(), Err(DisplayError::PresentFailure(_))));
    assert_eq!(d.frame_details().index, 0);
    d.flip().unwrap();
    assert_eq!(probe.presented(), vec![0]);
    assert_eq!(d.frame_details().index, 1);
}

#[test]
fn it_should_roll_back_and_release_on_allocation_failure() {
    let (surface, probe) = headless(8, 8);
    probe.set_alloc_budget(Some(2));
    let err = Display::with_backend(Box::new(surface), 3).unwrap_err();
    assert!(matches!(err, DisplayError::AllocFailure { index: 2, .. }));
    assert_eq!(probe.releases(), 1);
}

#[test]
fn it_should_present_exactly_what_was_drawn() {
    let (mut d, probe) = display(4, 4, 2);
    d.set_pixel(1, 2, Colour::RED);
    d.flip().unwrap();
    let shown = probe.last_frame().unwrap();
    let at = 2 * 16 + 4;
    assert_eq!(&shown[at..at + 4], &Colour::RED.to_word_bytes());
}

#[test]
fn it_should_report_backend_stride_in_info() {
    let surface = HeadlessSurface::new(10, 5)
        .unwrap()
        .with_stride_alignment(64)
        .unwrap();
    let d = Display::with_backend(Box::new(surface), 3).unwrap();
    assert_eq!(
        d.info(),
        DisplayInfo {
            width: 10,
            height: 5,
            bpp: 32,
            stride: 64
        }
    );
    assert_eq!(d.frame().as_bytes().len(), 64 * 5);
}

#[test]
fn it_should_re_present_the_last_frame_on_expose() {
    let (mut d, probe) = display(4, 4, 3);
    probe.push_event(NativeEvent::Expose);
    assert_eq!(d.process_event(), Some(Event::Unknown));
    assert!(probe.presented().is_empty());

    d.flip().unwrap();
    d.flip().unwrap();
    probe.push_event(NativeEvent::Expose);
    assert_eq!(d.process_event(), Some(Event::Unknown));
    assert_eq!(probe.presented(), vec![0, 1, 1]);
    assert_eq!(d.frame_details().index, 2);
}

#[test]
fn it_should_drain_every_queued_event_in_order() {
    let (mut d, probe) = display(100, 100, 3);
    probe.push_event(NativeEvent::Other(99));
    probe.push_event(NativeEvent::Motion { x: 3.0, y: 4.0 });
    probe.push_event(NativeEvent::CloseRequested);
    assert_eq!(
        d.drain_events(),
        vec![Event::Unknown, Event::MouseMove { x: 3, y: 4 }, Event::Quit]
    );
    assert_eq!(probe.pending_events(), 0);
    assert_eq!(d.process_event(), None);
}

#[test]
fn it_should_flip_bottom_left_backends_into_top_left_space() {
    let surface = HeadlessSurface::new(800, 600)
        .unwrap()
        .with_origin(Origin::BottomLeft);
    let probe = surface.probe();
    let mut d = Display::with_backend(Box::new(surface), 3).unwrap();
    probe.push_event(NativeEvent::ButtonPress {
        x: 10.0,
        y: 100.0,
        button: 1,
    });
    assert_eq!(
        d.process_event(),
        Some(Event::MouseDown {
            x: 10,
            y: 500,
            button: MouseButton::Left
        })
    );
}

#[test]
fn it_should_release_the_backend_once_on_shutdown() {
    let (d, probe) = display(4, 4, 3);
    d.shutdown();
    assert_eq!(probe.releases(), 1);

    let (d, probe) = display(4, 4, 3);
    drop(d);
    assert_eq!(probe.releases(), 1);
}

#[test]
fn it_should_reject_zero_sized_displays() {
    let mut config = crate::config::Config::default();
    config.display.backend = crate::config::SurfaceKind::Headless;
    assert!(matches!(
        Display::with_config(&config, "t", 0, 600),
        Err(DisplayError::InvalidArgument(_))
    ));
    config.display.frame_count = 0;
    assert!(matches!(
        Display::with_config(&config, "t", 800, 600),
        Err(DisplayError::InvalidArgument(_))
    ));
}
