//! Linux framebuffer device surface (`/dev/fbN`) with evdev input.
//!
//! The device memory is mapped once. It holds `yres_virtual / yres` pages;
//! presenting buffer `i` copies it into page `i % pages` and pans the display
//! to that page, optionally waiting for vertical blank. Geometry comes from
//! the device, not from the requested window size.

use crate::config::FramebufferConfig;
use crate::display::frame_ring::FrameBuffer;
use crate::display::surface::{NativeEvent, SurfaceBackend, SurfaceGeometry, BITS_PER_PIXEL};
use crate::error::{DisplayError, Result};
use log::{debug, info, trace, warn};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::mem;
use std::os::raw::{c_char, c_ulong, c_void};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr;

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
struct FbFixScreeninfo {
    id: [c_char; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);
nix::ioctl_write_ptr_bad!(fbiopan_display, 0x4606, FbVarScreeninfo);
nix::ioctl_write_int_bad!(fbioblank, 0x4611);
nix::ioctl_write_int_bad!(kdsetmode, 0x4B3A);
nix::ioctl_write_ptr!(fbio_waitforvsync, b'F', 0x20, u32);

const FB_BLANK_UNBLANK: i32 = 0;
const KD_TEXT: i32 = 0;
const KD_GRAPHICS: i32 = 1;

// <linux/input-event-codes.h>
const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_REL: u16 = 0x02;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const REL_X: u16 = 0x00;
const REL_Y: u16 = 0x01;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const BTN_LEFT: u16 = 0x110;
const BTN_RIGHT: u16 = 0x111;
const BTN_MIDDLE: u16 = 0x112;
const BTN_TOUCH: u16 = 0x14a;

/// Shared mapping of the device memory.
struct FbMap {
    ptr: *mut u8,
    len: usize,
}

impl FbMap {
    fn new(device: &File, len: usize) -> Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                device.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(DisplayError::InitFailure(format!(
                "mmap of {} framebuffer bytes failed: {}",
                len,
                std::io::Error::last_os_error()
            )));
        }
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for FbMap {
    fn drop(&mut self) {
        if !self.ptr.is_null() && self.len > 0 {
            unsafe { libc::munmap(self.ptr as *mut c_void, self.len) };
        }
    }
}

/// Last absolute/relative pointer state seen on the input device.
#[derive(Debug, Default)]
struct PointerState {
    x: i32,
    y: i32,
    moved: bool,
}

impl PointerState {
    /// Folds one evdev record into the pointer state. Returns an event once
    /// there is something to report; pointer motion is reported on `SYN_REPORT`.
    fn translate(
        &mut self,
        ev: &libc::input_event,
        width: i32,
        height: i32,
    ) -> Option<NativeEvent> {
        match (ev.type_, ev.code) {
            (EV_ABS, ABS_X) => {
                self.x = ev.value;
                self.moved = true;
                None
            }
            (EV_ABS, ABS_Y) => {
                self.y = ev.value;
                self.moved = true;
                None
            }
            (EV_REL, REL_X) => {
                self.x = (self.x + ev.value).clamp(0, width - 1);
                self.moved = true;
                None
            }
            (EV_REL, REL_Y) => {
                self.y = (self.y + ev.value).clamp(0, height - 1);
                self.moved = true;
                None
            }
            (EV_SYN, SYN_REPORT) => {
                std::mem::take(&mut self.moved).then(|| NativeEvent::Motion {
                    x: self.x as f64,
                    y: self.y as f64,
                })
            }
            (EV_KEY, code @ (BTN_TOUCH | BTN_LEFT | BTN_RIGHT | BTN_MIDDLE)) => {
                let button = match code {
                    BTN_RIGHT => 3,
                    BTN_MIDDLE => 2,
                    _ => 1,
                };
                let (x, y) = (self.x as f64, self.y as f64);
                Some(if ev.value != 0 {
                    NativeEvent::ButtonPress { x, y, button }
                } else {
                    NativeEvent::ButtonRelease { x, y, button }
                })
            }
            (EV_KEY, code) if ev.value == 1 => Some(NativeEvent::Key { code: code as u32 }),
            // Key releases (0) and autorepeat (2).
            (EV_KEY, _) => None,
            (EV_SYN, _) => None,
            (kind, _) => Some(NativeEvent::Other(kind as u32)),
        }
    }
}

pub struct FramebufferSurface {
    device: Option<File>,
    map: Option<FbMap>,
    tty: Option<File>,
    input: Option<File>,
    geometry: SurfaceGeometry,
    pages: usize,
    wait_for_vsync: bool,
    pointer: PointerState,
}

fn open_rw(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| DisplayError::io(path, e))
}

impl FramebufferSurface {
    /// Opens the framebuffer described by `config`. `width`/`height` are only
    /// compared against the device resolution.
    pub fn open(config: &FramebufferConfig, width: usize, height: usize) -> Result<Self> {
        let device = open_rw(&config.device)
            .map_err(|e| DisplayError::InitFailure(e.to_string()))?;
        let fd = device.as_raw_fd();

        if let Err(e) = unsafe { fbioblank(fd, FB_BLANK_UNBLANK) } {
            warn!("Framebuffer: unable to unblank {}: {}", config.device.display(), e);
        }

        let mut var = FbVarScreeninfo::default();
        unsafe { fbioget_vscreeninfo(fd, &mut var) }.map_err(|e| {
            DisplayError::InitFailure(format!("FBIOGET_VSCREENINFO failed: {e}"))
        })?;
        let mut fix: FbFixScreeninfo = unsafe { mem::zeroed() };
        unsafe { fbioget_fscreeninfo(fd, &mut fix) }.map_err(|e| {
            DisplayError::InitFailure(format!("FBIOGET_FSCREENINFO failed: {e}"))
        })?;

        if var.bits_per_pixel != BITS_PER_PIXEL {
            return Err(DisplayError::Unsupported(format!(
                "framebuffer is {} bpp, only {} bpp is supported",
                var.bits_per_pixel, BITS_PER_PIXEL
            )));
        }

        let geometry = SurfaceGeometry::with_stride(
            var.xres as usize,
            var.yres as usize,
            fix.line_length as usize,
        )
        .map_err(|e| DisplayError::InitFailure(format!("device geometry: {e}")))?;
        let page_len = geometry
            .frame_len()
            .ok_or_else(|| DisplayError::InitFailure("framebuffer page overflows".into()))?;
        let pages = ((var.yres_virtual / var.yres.max(1)) as usize)
            .min(fix.smem_len as usize / page_len)
            .max(1);
        if (fix.smem_len as usize) < page_len {
            return Err(DisplayError::InitFailure(format!(
                "framebuffer memory ({} bytes) smaller than one page ({} bytes)",
                fix.smem_len, page_len
            )));
        }

        if (width, height) != (geometry.width, geometry.height) {
            info!(
                "Framebuffer: requested {}x{}, device is {}x{}",
                width, height, geometry.width, geometry.height
            );
        }

        let map = FbMap::new(&device, fix.smem_len as usize)?;

        let tty = config.tty.as_deref().and_then(|path| match open_rw(path) {
            Ok(tty) => {
                if let Err(e) = unsafe { kdsetmode(tty.as_raw_fd(), KD_GRAPHICS) } {
                    warn!("Framebuffer: unable to enter graphics mode on {}: {}", path.display(), e);
                }
                Some(tty)
            }
            Err(e) => {
                warn!("Framebuffer: {}", e);
                None
            }
        });

        let input = config.input_device.as_deref().and_then(|path| {
            match OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(path)
            {
                Ok(input) => Some(input),
                Err(e) => {
                    warn!("Framebuffer: no input from {}: {}", path.display(), e);
                    None
                }
            }
        });

        info!(
            "Framebuffer: {} {}x{} stride {}, {} page(s)",
            config.device.display(),
            geometry.width,
            geometry.height,
            geometry.stride,
            pages
        );

        Ok(Self {
            device: Some(device),
            map: Some(map),
            tty,
            input,
            geometry,
            pages,
            wait_for_vsync: config.wait_for_vsync,
            pointer: PointerState::default(),
        })
    }

    fn pan_to(&mut self, page: usize) -> Result<()> {
        let Some(device) = self.device.as_ref() else {
            return Err(DisplayError::PresentFailure("framebuffer already released".into()));
        };
        let fd = device.as_raw_fd();
        let mut var = FbVarScreeninfo::default();
        unsafe { fbioget_vscreeninfo(fd, &mut var) }
            .map_err(|e| DisplayError::PresentFailure(format!("FBIOGET_VSCREENINFO: {e}")))?;
        var.yoffset = (page * self.geometry.height) as u32;
        if let Err(e) = unsafe { fbiopan_display(fd, &var) } {
            warn!("Framebuffer: FBIOPAN_DISPLAY to page {} failed: {}", page, e);
        }
        if self.wait_for_vsync {
            let screen: u32 = 0;
            if let Err(e) = unsafe { fbio_waitforvsync(fd, &screen) } {
                warn!("Framebuffer: vsync wait failed ({}), disabling", e);
                self.wait_for_vsync = false;
            }
        }
        Ok(())
    }

    fn read_input_event(&mut self) -> Option<libc::input_event> {
        let input = self.input.as_mut()?;
        let mut raw = [0u8; mem::size_of::<libc::input_event>()];
        match input.read(&mut raw) {
            Ok(n) if n == raw.len() => {
                Some(unsafe { ptr::read_unaligned(raw.as_ptr() as *const libc::input_event) })
            }
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("Framebuffer: input read failed ({}), closing input", e);
                self.input = None;
                None
            }
        }
    }
}

impl SurfaceBackend for FramebufferSurface {
    fn name(&self) -> &'static str {
        "framebuffer"
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    fn present(&mut self, index: usize, frame: &FrameBuffer) -> Result<()> {
        let page = index % self.pages;
        let bytes = frame.as_bytes();
        let Some(map) = self.map.as_mut() else {
            return Err(DisplayError::PresentFailure("framebuffer already released".into()));
        };
        let start = page * bytes.len();
        map.as_mut_slice()[start..start + bytes.len()].copy_from_slice(bytes);
        if self.pages > 1 {
            self.pan_to(page)?;
        }
        trace!("Framebuffer: presented buffer {} on page {}", index, page);
        Ok(())
    }

    fn poll_native_event(&mut self) -> Option<NativeEvent> {
        let (width, height) = (self.geometry.width as i32, self.geometry.height as i32);
        loop {
            let ev = self.read_input_event()?;
            if let Some(event) = self.pointer.translate(&ev, width, height) {
                return Some(event);
            }
        }
    }

    fn release(&mut self) {
        if self.device.is_none() {
            return;
        }
        self.map = None;
        self.input = None;
        if let Some(tty) = self.tty.take() {
            if let Err(e) = unsafe { kdsetmode(tty.as_raw_fd(), KD_TEXT) } {
                warn!("Framebuffer: unable to restore text mode: {}", e);
            }
        }
        self.device = None;
        debug!("Framebuffer surface released");
    }
}

impl Drop for FramebufferSurface {
    fn drop(&mut self) {
        self.release();
    }
}
