//! macOS surface: an NSWindow with a layer-backed content view.
//!
//! Each present wraps a copy of the frame in a CGImage and hands it to the
//! view's CALayer. AppKit reports pointer positions from the bottom-left
//! corner of the content view; the normalizer flips them.

use crate::display::frame_ring::FrameBuffer;
use crate::display::surface::{NativeEvent, Origin, SurfaceBackend, SurfaceGeometry};
use crate::error::{DisplayError, Result};
use core_graphics::color_space::CGColorSpace;
use core_graphics::data_provider::CGDataProvider;
use core_graphics::image::CGImage;
use log::{debug, info, trace};
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool};
use objc2::{class, msg_send, msg_send_id};
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSBackingStoreType, NSEvent, NSEventMask,
    NSEventType, NSWindow, NSWindowStyleMask,
};
use objc2_foundation::{
    MainThreadMarker, NSDate, NSDefaultRunLoopMode, NSObject, NSPoint, NSRect, NSSize, NSString,
};
use std::sync::Arc;

const BITS_PER_COMPONENT: usize = 8;
const BITS_PER_PIXEL: usize = 32;
/// kCGBitmapByteOrder32Little | kCGImageAlphaNoneSkipFirst: a native
/// little-endian 0xAARRGGBB word with alpha ignored.
const BITMAP_INFO: u32 = (2 << 12) | 6;

pub struct CocoaSurface {
    mtm: MainThreadMarker,
    window: Option<Retained<NSWindow>>,
    view: Retained<NSObject>,
    geometry: SurfaceGeometry,
    close_reported: bool,
}

impl CocoaSurface {
    /// Creates and shows a fixed-size window. Must run on the main thread.
    pub fn open(title: &str, width: usize, height: usize) -> Result<Self> {
        let geometry = SurfaceGeometry::packed(width, height)?;
        let mtm = MainThreadMarker::new().ok_or_else(|| {
            DisplayError::InitFailure("Cocoa surface must be created on the main thread".into())
        })?;

        unsafe {
            let app = NSApplication::sharedApplication(mtm);
            app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
            let _: () = msg_send![&app, finishLaunching];

            let content_rect = NSRect::new(
                NSPoint::new(0.0, 0.0),
                NSSize::new(width as f64, height as f64),
            );
            let style_mask = NSWindowStyleMask::Titled
                | NSWindowStyleMask::Closable
                | NSWindowStyleMask::Miniaturizable;
            let window = NSWindow::initWithContentRect_styleMask_backing_defer(
                mtm.alloc(),
                content_rect,
                style_mask,
                NSBackingStoreType::Buffered,
                false,
            );
            window.setTitle(&NSString::from_str(title));
            window.center();
            // The window is owned by us, not by AppKit's close handling.
            let _: () = msg_send![&window, setReleasedWhenClosed: Bool::NO];
            let _: () = msg_send![&window, setOpaque: Bool::YES];

            let view: Retained<NSObject> = msg_send_id![class!(NSView), alloc];
            let view: Retained<NSObject> = msg_send_id![view, initWithFrame: content_rect];
            let _: () = msg_send![&view, setWantsLayer: Bool::YES];
            let _: () = msg_send![&window, setContentView: &*view];

            let _: () = msg_send![&window, makeKeyAndOrderFront: None::<&NSObject>];
            let _: () = msg_send![&app, activateIgnoringOtherApps: Bool::YES];

            info!("Cocoa: window '{}' {}x{} created", title, width, height);
            Ok(Self {
                mtm,
                window: Some(window),
                view,
                geometry,
                close_reported: false,
            })
        }
    }

    fn convert_event(&self, event: &NSEvent) -> NativeEvent {
        unsafe {
            let location = event.locationInWindow();
            let (x, y) = (location.x, location.y);
            match event.r#type() {
                NSEventType::KeyDown => NativeEvent::Key {
                    code: event.keyCode() as u32,
                },
                NSEventType::LeftMouseDown => NativeEvent::ButtonPress { x, y, button: 1 },
                NSEventType::RightMouseDown => NativeEvent::ButtonPress { x, y, button: 3 },
                NSEventType::OtherMouseDown => NativeEvent::ButtonPress { x, y, button: 2 },
                NSEventType::LeftMouseUp => NativeEvent::ButtonRelease { x, y, button: 1 },
                NSEventType::RightMouseUp => NativeEvent::ButtonRelease { x, y, button: 3 },
                NSEventType::OtherMouseUp => NativeEvent::ButtonRelease { x, y, button: 2 },
                NSEventType::MouseMoved
                | NSEventType::LeftMouseDragged
                | NSEventType::RightMouseDragged => NativeEvent::Motion { x, y },
                NSEventType::ScrollWheel => NativeEvent::Scroll {
                    x,
                    y,
                    delta_y: event.scrollingDeltaY(),
                },
                other => NativeEvent::Other(other.0 as u32),
            }
        }
    }
}

impl SurfaceBackend for CocoaSurface {
    fn name(&self) -> &'static str {
        "cocoa"
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn origin(&self) -> Origin {
        Origin::BottomLeft
    }

    fn present(&mut self, index: usize, frame: &FrameBuffer) -> Result<()> {
        if self.window.is_none() {
            return Err(DisplayError::PresentFailure("Cocoa window already closed".into()));
        }
        let data = Arc::new(frame.as_bytes().to_vec());
        let provider = CGDataProvider::from_buffer(data);
        let color_space = CGColorSpace::create_device_rgb();
        let image = CGImage::new(
            frame.width(),
            frame.height(),
            BITS_PER_COMPONENT,
            BITS_PER_PIXEL,
            frame.stride(),
            &color_space,
            BITMAP_INFO,
            &provider,
            false,
            0,
        );

        unsafe {
            let layer: *mut AnyObject = msg_send![&*self.view, layer];
            if layer.is_null() {
                return Err(DisplayError::PresentFailure(
                    "content view has no layer".into(),
                ));
            }
            let image_ref: *mut core_graphics::sys::CGImage = std::mem::transmute_copy(&image);
            let _: () = msg_send![layer, setContents: image_ref];
        }
        trace!("Cocoa: presented buffer {}", index);
        Ok(())
    }

    fn poll_native_event(&mut self) -> Option<NativeEvent> {
        let window = self.window.as_ref()?;
        unsafe {
            let app = NSApplication::sharedApplication(self.mtm);
            let event = app.nextEventMatchingMask_untilDate_inMode_dequeue(
                NSEventMask::Any,
                Some(&NSDate::distantPast()),
                NSDefaultRunLoopMode,
                true,
            );
            match event {
                Some(event) => {
                    let native = self.convert_event(&event);
                    let _: () = msg_send![&app, sendEvent: &*event];
                    Some(native)
                }
                // The close button only hides the window.
                None if !window.isVisible() && !self.close_reported => {
                    self.close_reported = true;
                    debug!("Cocoa: window closed by user");
                    Some(NativeEvent::CloseRequested)
                }
                None => None,
            }
        }
    }

    fn release(&mut self) {
        if let Some(window) = self.window.take() {
            unsafe {
                let _: () = msg_send![&window, close];
            }
            info!("Cocoa surface released");
        }
    }
}

impl Drop for CocoaSurface {
    fn drop(&mut self) {
        self.release();
    }
}
