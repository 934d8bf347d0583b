// src/color.rs

//! The single pixel format understood by the core: a packed 32-bit word read as
//! `0xAARRGGBB`.
//!
//! Drawing copies the whole word, alpha included, but nothing ever blends with
//! it, and snapshots drop it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A packed `0xAARRGGBB` colour word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Colour(pub u32);

impl Colour {
    pub const BLACK: Colour = Colour(0xff00_0000);
    pub const WHITE: Colour = Colour(0xffff_ffff);
    pub const RED: Colour = Colour(0xffff_0000);
    pub const GREEN: Colour = Colour(0xff00_ff00);
    pub const BLUE: Colour = Colour(0xff00_00ff);
    pub const YELLOW: Colour = Colour(0xffff_ff00);

    /// Opaque colour from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xff, r, g, b)
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Colour((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// `[r, g, b]` with alpha dropped, as written to a PPM.
    pub const fn to_rgb_bytes(self) -> [u8; 3] {
        [self.red(), self.green(), self.blue()]
    }

    /// Bytes as stored in a frame buffer word (native endian).
    pub const fn to_word_bytes(self) -> [u8; 4] {
        self.0.to_ne_bytes()
    }

    pub const fn from_word_bytes(bytes: [u8; 4]) -> Self {
        Colour(u32::from_ne_bytes(bytes))
    }
}

impl From<u32> for Colour {
    fn from(value: u32) -> Self {
        Colour(value)
    }
}

impl From<Colour> for u32 {
    fn from(colour: Colour) -> Self {
        colour.0
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}
