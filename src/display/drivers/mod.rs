// src/display/drivers/mod.rs
//! Platform-specific surface implementations and backend selection.

pub mod headless;

#[cfg(target_os = "macos")]
pub mod cocoa;

#[cfg(target_os = "linux")]
pub mod fbdev;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod x11;

pub use headless::{HeadlessProbe, HeadlessSurface};

#[cfg(target_os = "macos")]
pub use cocoa::CocoaSurface;

#[cfg(target_os = "linux")]
pub use fbdev::FramebufferSurface;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use x11::X11Surface;

use crate::config::{Config, FramebufferConfig, SurfaceKind};
use crate::display::surface::SurfaceBackend;
use crate::error::{DisplayError, Result};
use log::{info, warn};

/// Turns `auto` into a concrete kind for this machine.
pub fn resolve(kind: SurfaceKind, framebuffer: &FramebufferConfig) -> SurfaceKind {
    if kind != SurfaceKind::Auto {
        return kind;
    }
    if cfg!(target_os = "macos") {
        return SurfaceKind::Cocoa;
    }
    if cfg!(all(target_os = "linux", feature = "x11")) && std::env::var_os("DISPLAY").is_some() {
        return SurfaceKind::X11;
    }
    if cfg!(target_os = "linux") && framebuffer.device.exists() {
        return SurfaceKind::Framebuffer;
    }
    warn!("No native display surface available, falling back to headless");
    SurfaceKind::Headless
}

/// Opens the surface selected by `config` (after resolving `auto`).
pub fn open(
    config: &Config,
    title: &str,
    width: usize,
    height: usize,
) -> Result<Box<dyn SurfaceBackend>> {
    let kind = resolve(config.display.backend, &config.framebuffer);
    info!("Opening {} surface for '{}' ({}x{})", kind, title, width, height);
    match kind {
        SurfaceKind::X11 => open_x11(title, width, height),
        SurfaceKind::Framebuffer => open_framebuffer(&config.framebuffer, width, height),
        SurfaceKind::Cocoa => open_cocoa(title, width, height),
        SurfaceKind::Headless | SurfaceKind::Auto => Ok(Box::new(
            HeadlessSurface::new(width, height)?
                .with_stride_alignment(config.display.stride_alignment)?,
        )),
    }
}

#[cfg(all(target_os = "linux", feature = "x11"))]
fn open_x11(title: &str, width: usize, height: usize) -> Result<Box<dyn SurfaceBackend>> {
    Ok(Box::new(X11Surface::open(title, width, height)?))
}

#[cfg(not(all(target_os = "linux", feature = "x11")))]
fn open_x11(_title: &str, _width: usize, _height: usize) -> Result<Box<dyn SurfaceBackend>> {
    Err(DisplayError::Unsupported(
        "x11 surface not built (Linux with the `x11` feature)".into(),
    ))
}

#[cfg(target_os = "linux")]
fn open_framebuffer(
    config: &FramebufferConfig,
    width: usize,
    height: usize,
) -> Result<Box<dyn SurfaceBackend>> {
    Ok(Box::new(FramebufferSurface::open(config, width, height)?))
}

#[cfg(not(target_os = "linux"))]
fn open_framebuffer(
    _config: &FramebufferConfig,
    _width: usize,
    _height: usize,
) -> Result<Box<dyn SurfaceBackend>> {
    Err(DisplayError::Unsupported(
        "framebuffer surface is Linux only".into(),
    ))
}

#[cfg(target_os = "macos")]
fn open_cocoa(title: &str, width: usize, height: usize) -> Result<Box<dyn SurfaceBackend>> {
    Ok(Box::new(CocoaSurface::open(title, width, height)?))
}

#[cfg(not(target_os = "macos"))]
fn open_cocoa(_title: &str, _width: usize, _height: usize) -> Result<Box<dyn SurfaceBackend>> {
    Err(DisplayError::Unsupported("cocoa surface is macOS only".into()))
}
