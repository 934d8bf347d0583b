// src/config.rs

//! Configuration for the display layer and its demo.
//!
//! Everything here deserializes from JSON with `#[serde(default)]` on every
//! section, so a config file only needs the keys it changes. The process-wide
//! [`CONFIG`] is read from the file named by `RAW_DISPLAY_CONFIG` (if set),
//! then `RAW_DISPLAY_BACKEND` overrides the backend kind.

use crate::color::Colour;
use crate::error::{DisplayError, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Names the JSON config file to load.
pub const CONFIG_PATH_ENV: &str = "RAW_DISPLAY_CONFIG";
/// Overrides `display.backend`.
pub const BACKEND_ENV: &str = "RAW_DISPLAY_BACKEND";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Which native surface to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Best available for the platform, falling back to headless.
    #[default]
    Auto,
    X11,
    Framebuffer,
    Cocoa,
    /// In-memory surface; presents are recorded, nothing is shown.
    Headless,
}

impl FromStr for SurfaceKind {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SurfaceKind::Auto),
            "x11" => Ok(SurfaceKind::X11),
            "framebuffer" | "fbdev" | "fb" => Ok(SurfaceKind::Framebuffer),
            "cocoa" => Ok(SurfaceKind::Cocoa),
            "headless" | "dummy" => Ok(SurfaceKind::Headless),
            other => Err(DisplayError::invalid(format!("unknown backend '{other}'"))),
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceKind::Auto => "auto",
            SurfaceKind::X11 => "x11",
            SurfaceKind::Framebuffer => "framebuffer",
            SurfaceKind::Cocoa => "cocoa",
            SurfaceKind::Headless => "headless",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub framebuffer: FramebufferConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: SurfaceKind,
    /// Number of buffers in the ring.
    pub frame_count: usize,
    /// Row alignment in bytes for backends that let us choose (headless).
    pub stride_alignment: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            backend: SurfaceKind::Auto,
            frame_count: 3,
            stride_alignment: 1,
        }
    }
}

/// Linux framebuffer device settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FramebufferConfig {
    pub device: PathBuf,
    /// evdev node for touch/mouse input. `None` disables input.
    pub input_device: Option<PathBuf>,
    /// Console switched to graphics mode while the display is open.
    pub tty: Option<PathBuf>,
    /// Wait for vertical blank after panning.
    pub wait_for_vsync: bool,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        FramebufferConfig {
            device: PathBuf::from("/dev/fb0"),
            input_device: Some(PathBuf::from("/dev/input/event5")),
            tty: Some(PathBuf::from("/dev/tty0")),
            wait_for_vsync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub width: usize,
    pub height: usize,
    /// Frames to draw before exiting.
    pub frames: u32,
    pub frame_delay_ms: u64,
    /// Colour behind the text banner.
    pub background: Colour,
    /// Where to write a PPM of the last frame, if anywhere.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            width: 800,
            height: 600,
            frames: 100,
            frame_delay_ms: 500,
            background: Colour::BLACK,
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| DisplayError::invalid(format!("malformed config: {e}")))
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DisplayError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Applies a backend override such as the value of `RAW_DISPLAY_BACKEND`.
    pub fn with_backend_override(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            match value.parse() {
                Ok(kind) => self.display.backend = kind,
                Err(e) => warn!("Config: ignoring {}: {}", BACKEND_ENV, e),
            }
        }
        self
    }

    /// Defaults, then the file from `RAW_DISPLAY_CONFIG`, then the backend
    /// override. A bad file is reported and the defaults are kept.
    pub fn from_env() -> Self {
        let base = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                match Self::load(&path) {
                    Ok(config) => {
                        info!("Config: loaded {}", path.display());
                        config
                    }
                    Err(e) => {
                        warn!("Config: {}; using defaults", e);
                        Config::default()
                    }
                }
            }
            None => Config::default(),
        };
        let backend = std::env::var(BACKEND_ENV).ok();
        base.with_backend_override(backend.as_deref())
    }
}
