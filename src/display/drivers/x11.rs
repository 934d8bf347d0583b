//! X11 surface over xlib.
//!
//! One fixed-size window (min and max size hints both set to the requested
//! size), a GC, and a ZPixmap `XImage` built around the frame buffer on every
//! present. The image borrows our bytes; its data pointer is cleared before
//! `XDestroyImage` so xlib never frees them.

use crate::display::frame_ring::FrameBuffer;
use crate::display::surface::{NativeEvent, SurfaceBackend, SurfaceGeometry};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace};
use std::ffi::CString;
use std::mem;
use std::os::raw::{c_char, c_uint};
use std::ptr;
use x11::xlib;

pub struct X11Surface {
    display: *mut xlib::Display,
    screen: i32,
    window: xlib::Window,
    gc: xlib::GC,
    wm_delete_window: xlib::Atom,
    geometry: SurfaceGeometry,
    released: bool,
}

impl X11Surface {
    /// Connects to `$DISPLAY` and maps a `width x height` window.
    pub fn open(title: &str, width: usize, height: usize) -> Result<Self> {
        let geometry = SurfaceGeometry::packed(width, height)?;
        info!("X11: Creating window '{}' {}x{}", title, width, height);

        unsafe {
            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(DisplayError::InitFailure(
                    "XOpenDisplay failed (is DISPLAY set?)".into(),
                ));
            }

            let screen = xlib::XDefaultScreen(display);
            let root = xlib::XRootWindow(display, screen);
            let black = xlib::XBlackPixel(display, screen);
            let white = xlib::XWhitePixel(display, screen);

            let window = xlib::XCreateSimpleWindow(
                display,
                root,
                0,
                0,
                width as c_uint,
                height as c_uint,
                0,
                white,
                black,
            );

            if let Ok(c_title) = CString::new(title) {
                xlib::XStoreName(display, window, c_title.as_ptr());
            }

            xlib::XSelectInput(
                display,
                window,
                xlib::ExposureMask
                    | xlib::KeyPressMask
                    | xlib::KeyReleaseMask
                    | xlib::ButtonPressMask
                    | xlib::ButtonReleaseMask
                    | xlib::PointerMotionMask,
            );

            // Not resizable: min == max == requested size.
            let hints = xlib::XAllocSizeHints();
            if !hints.is_null() {
                (*hints).flags = xlib::PMinSize | xlib::PMaxSize;
                (*hints).min_width = width as i32;
                (*hints).min_height = height as i32;
                (*hints).max_width = width as i32;
                (*hints).max_height = height as i32;
                xlib::XSetWMNormalHints(display, window, hints);
                xlib::XFree(hints.cast());
            }

            let wm_delete_window = xlib::XInternAtom(
                display,
                b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,
                xlib::False,
            );
            let mut protocols = [wm_delete_window];
            xlib::XSetWMProtocols(display, window, protocols.as_mut_ptr(), 1);

            let gc = xlib::XCreateGC(display, window, 0, ptr::null_mut());
            xlib::XSetForeground(display, gc, white);
            xlib::XSetBackground(display, gc, black);

            xlib::XMapWindow(display, window);
            xlib::XFlush(display);

            debug!(
                "X11: window {} mapped, depth {}",
                window,
                xlib::XDefaultDepth(display, screen)
            );

            Ok(Self {
                display,
                screen,
                window,
                gc,
                wm_delete_window,
                geometry,
                released: false,
            })
        }
    }

    fn convert_xevent(&self, event: &xlib::XEvent) -> NativeEvent {
        unsafe {
            match event.get_type() {
                xlib::KeyPress => NativeEvent::Key {
                    code: event.key.keycode,
                },
                xlib::ButtonPress => {
                    let b = event.button;
                    NativeEvent::ButtonPress {
                        x: b.x as f64,
                        y: b.y as f64,
                        button: b.button as u8,
                    }
                }
                xlib::ButtonRelease => {
                    let b = event.button;
                    NativeEvent::ButtonRelease {
                        x: b.x as f64,
                        y: b.y as f64,
                        button: b.button as u8,
                    }
                }
                xlib::MotionNotify => {
                    let m = event.motion;
                    NativeEvent::Motion {
                        x: m.x as f64,
                        y: m.y as f64,
                    }
                }
                // Only the last of a batch of exposes triggers a redraw.
                xlib::Expose if event.expose.count == 0 => NativeEvent::Expose,
                xlib::ClientMessage => {
                    let client = event.client_message;
                    if client.data.as_longs()[0] as xlib::Atom == self.wm_delete_window {
                        NativeEvent::CloseRequested
                    } else {
                        trace!("X11: Unknown ClientMessage type={}", client.message_type);
                        NativeEvent::Other(xlib::ClientMessage as u32)
                    }
                }
                other => NativeEvent::Other(other as u32),
            }
        }
    }
}

impl SurfaceBackend for X11Surface {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn present(&mut self, index: usize, frame: &FrameBuffer) -> Result<()> {
        if self.released {
            return Err(DisplayError::PresentFailure("X11 surface already released".into()));
        }
        unsafe {
            let depth = xlib::XDefaultDepth(self.display, self.screen);
            let visual = xlib::XDefaultVisual(self.display, self.screen);
            // XPutImage only reads through this pointer.
            let data_ptr = frame.as_bytes().as_ptr() as *mut c_char;

            let image = xlib::XCreateImage(
                self.display,
                visual,
                depth as c_uint,
                xlib::ZPixmap,
                0,
                data_ptr,
                frame.width() as c_uint,
                frame.height() as c_uint,
                32,
                frame.stride() as i32,
            );
            if image.is_null() {
                return Err(DisplayError::PresentFailure(format!(
                    "XCreateImage failed for buffer {index}"
                )));
            }

            xlib::XPutImage(
                self.display,
                self.window,
                self.gc,
                image,
                0,
                0,
                0,
                0,
                frame.width() as c_uint,
                frame.height() as c_uint,
            );

            (*image).data = ptr::null_mut();
            xlib::XDestroyImage(image);
            xlib::XFlush(self.display);
        }
        trace!("X11: presented buffer {}", index);
        Ok(())
    }

    fn poll_native_event(&mut self) -> Option<NativeEvent> {
        if self.released {
            return None;
        }
        unsafe {
            if xlib::XPending(self.display) == 0 {
                return None;
            }
            let mut event: xlib::XEvent = mem::zeroed();
            xlib::XNextEvent(self.display, &mut event);
            Some(self.convert_xevent(&event))
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        unsafe {
            xlib::XFreeGC(self.display, self.gc);
            xlib::XDestroyWindow(self.display, self.window);
            xlib::XCloseDisplay(self.display);
        }
        info!("X11 surface released");
    }
}

impl Drop for X11Surface {
    fn drop(&mut self) {
        self.release();
    }
}
