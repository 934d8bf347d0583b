// src/rasterizer/mod.rs
//! Software rasterizer over one frame buffer.
//!
//! A [`Canvas`] is a borrowed view of `(buffer, width, height, stride)`. It has
//! no state of its own: every operation writes straight into the borrowed
//! bytes, one packed 32-bit word per pixel at `y * stride + x * 4`.
//!
//! Clip policy: geometry is never an error. Coordinates that fall outside the
//! canvas are clamped (rectangles, spans) or dropped (single pixels), because
//! callers routinely pass partially or fully off-screen shapes. The only
//! operations that can fail are text placement (checked once per string) and
//! blits with a short source buffer.
//!
//! Internally all arithmetic is done in `i64` so that extreme `i32` input
//! cannot overflow while stepping.

use crate::color::Colour;
use crate::display::surface::BYTES_PER_PIXEL;
use crate::error::{DisplayError, Result};
use crate::glyph::{glyph_for, GLYPH_SIZE};

#[cfg(test)]
mod tests;

/// Mutable drawing view over a frame buffer.
pub struct Canvas<'a> {
    buf: &'a mut [u8],
    width: i64,
    height: i64,
    stride: usize,
}

impl<'a> Canvas<'a> {
    /// Wraps a caller-supplied buffer after checking that it can hold
    /// `height` rows of `stride` bytes and that a row fits in `stride`.
    pub fn new(buf: &'a mut [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        let row = width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| DisplayError::invalid(format!("width {width} overflows a row")))?;
        if stride < row {
            return Err(DisplayError::invalid(format!(
                "stride {stride} is shorter than a {width} pixel row"
            )));
        }
        let needed = stride
            .checked_mul(height)
            .ok_or_else(|| DisplayError::invalid("stride * height overflows"))?;
        if buf.len() < needed {
            return Err(DisplayError::invalid(format!(
                "buffer of {} bytes cannot hold {height} rows of {stride} bytes",
                buf.len()
            )));
        }
        Ok(Self::from_parts(buf, width, height, stride))
    }

    /// Geometry already validated by `SurfaceGeometry`.
    pub(crate) fn from_parts(buf: &'a mut [u8], width: usize, height: usize, stride: usize) -> Self {
        debug_assert!(buf.len() >= stride * height && stride >= width * BYTES_PER_PIXEL);
        Self {
            buf,
            width: width as i64,
            height: height as i64,
            stride,
        }
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn offset(&self, x: i64, y: i64) -> usize {
        y as usize * self.stride + x as usize * BYTES_PER_PIXEL
    }

    #[inline]
    fn plot(&mut self, x: i64, y: i64, colour: Colour) {
        if !self.contains(x, y) {
            return;
        }
        let at = self.offset(x, y);
        self.buf[at..at + BYTES_PER_PIXEL].copy_from_slice(&colour.to_word_bytes());
    }

    /// Writes every pixel of row `y` from `x0` to `x1` inclusive. Bounds must
    /// already be inside the canvas.
    fn fill_span(&mut self, x0: i64, x1: i64, y: i64, colour: Colour) {
        let start = self.offset(x0, y);
        let end = self.offset(x1, y) + BYTES_PER_PIXEL;
        let word = colour.to_word_bytes();
        for px in self.buf[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&word);
        }
    }

    /// Overwrites one pixel. No-op outside `[0, width) x [0, height)`.
    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Colour) {
        self.plot(x as i64, y as i64, colour);
    }

    /// Reads one pixel back, `None` outside the canvas.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Colour> {
        let (x, y) = (x as i64, y as i64);
        if !self.contains(x, y) {
            return None;
        }
        let at = self.offset(x, y);
        let mut word = [0u8; BYTES_PER_PIXEL];
        word.copy_from_slice(&self.buf[at..at + BYTES_PER_PIXEL]);
        Some(Colour::from_word_bytes(word))
    }

    /// Fills the visible area; row padding is left alone.
    pub fn clear(&mut self, colour: Colour) {
        self.fill_clamped(0, 0, self.width - 1, self.height - 1, colour);
    }

    /// Fills the closed rectangle spanned by two corners, in either order,
    /// clamped to the canvas. Fully off-screen rectangles write nothing.
    pub fn fill_rectangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, colour: Colour) {
        self.fill_clamped(x0 as i64, y0 as i64, x1 as i64, y1 as i64, colour);
    }

    fn fill_clamped(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, colour: Colour) {
        let (x0, x1) = if x0 > x1 { (x1, x0) } else { (x0, x1) };
        let (y0, y1) = if y0 > y1 { (y1, y0) } else { (y0, y1) };
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width - 1);
        let y1 = y1.min(self.height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            self.fill_span(x0, x1, y, colour);
        }
    }

    /// Rectangle outline `border_width` pixels thick, drawn inward from the
    /// corners. A negative width, or one wide enough for opposite borders to
    /// meet, fills the rectangle; zero draws nothing.
    pub fn draw_rectangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        colour: Colour,
        border_width: i32,
    ) {
        let (x0, x1) = (x0.min(x1) as i64, x0.max(x1) as i64);
        let (y0, y1) = (y0.min(y1) as i64, y0.max(y1) as i64);
        if border_width == 0 {
            return;
        }
        let b = border_width as i64;
        if b < 0 || 2 * b >= x1 - x0 + 1 || 2 * b >= y1 - y0 + 1 {
            self.fill_clamped(x0, y0, x1, y1, colour);
            return;
        }
        self.fill_clamped(x0, y0, x1, y0 + b - 1, colour);
        self.fill_clamped(x0, y1 - b + 1, x1, y1, colour);
        self.fill_clamped(x0, y0 + b, x0 + b - 1, y1 - b, colour);
        self.fill_clamped(x1 - b + 1, y0 + b, x1, y1 - b, colour);
    }

    /// Line from (`x0`, `y0`) to (`x1`, `y1`) inclusive, `width_px` thick.
    ///
    /// Integer Bresenham stepping with an extra perpendicular run at every
    /// step: pixels along the minor axis are emitted, starting at the main
    /// pixel, while the accumulated error stays below
    /// `hypot(dx, dy) * ((width_px + 1) / 2)` with integer halving. After Alois
    /// Zingl, "A Rasterizing Algorithm for Drawing Curves" (public domain).
    /// Each pixel is clipped individually.
    pub fn draw_line(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        colour: Colour,
        width_px: i32,
    ) {
        let (mut x0, mut y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = (y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        let ed = if dx + dy == 0 {
            1.0
        } else {
            (dx as f64).hypot(dy as f64)
        };
        // Half-width is truncated before scaling.
        let wd = ((width_px.max(1) as i64 + 1) / 2) as f64;
        let threshold = ed * wd;

        loop {
            self.plot(x0, y0, colour);
            let mut e2 = err;
            let mut x2 = x0;
            if 2 * e2 >= -dx {
                // x step, thicken vertically
                e2 += dy;
                let mut y2 = y0;
                while (e2 as f64) < threshold && (y1 != y2 || dx > dy) {
                    self.plot(x0, y2, colour);
                    y2 += sy;
                    e2 += dx;
                }
                if x0 == x1 {
                    break;
                }
                e2 = err;
                err -= dy;
                x0 += sx;
            }
            if 2 * e2 <= dy {
                // y step, thicken horizontally
                e2 = dx - e2;
                while (e2 as f64) < threshold && (x1 != x2 || dx < dy) {
                    self.plot(x2, y0, colour);
                    x2 += sx;
                    e2 += dy;
                }
                if y0 == y1 {
                    break;
                }
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Horizontal run on row `y` between `x0` and `x1` inclusive, clamped.
    fn x_line(&mut self, x0: i64, x1: i64, y: i64, colour: Colour) {
        let (x0, x1) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        if x1 < 0 || x0 > self.width - 1 || y < 0 || y > self.height - 1 {
            return;
        }
        self.fill_span(x0.max(0), x1.min(self.width - 1), y, colour);
    }

    /// Vertical run on column `x` between `y0` and `y1` inclusive, clamped.
    fn y_line(&mut self, x: i64, y0: i64, y1: i64, colour: Colour) {
        let (y0, y1) = if y1 < y0 { (y1, y0) } else { (y0, y1) };
        if x < 0 || x > self.width - 1 || y1 < 0 || y0 > self.height - 1 {
            return;
        }
        for y in y0.max(0)..=y1.min(self.height - 1) {
            self.plot(x, y, colour);
        }
    }

    /// Ring between radius `radius` and `radius - border_width + 1`.
    ///
    /// Two midpoint trackers walk the outer and inner edges together and the
    /// eight symmetric spans between them are filled as clamped runs.
    ///
    /// The inner radius is floored at zero, so any `border_width > radius`
    /// gives the solid disc of `radius` through the same loop. `border_width`
    /// below 1 counts as 1; a negative `radius` draws nothing.
    pub fn draw_circle(&mut self, xc: i32, yc: i32, radius: i32, colour: Colour, border_width: i32) {
        if radius < 0 {
            return;
        }
        let (xc, yc) = (xc as i64, yc as i64);
        let outer = radius as i64;
        let inner = (outer - border_width.max(1) as i64 + 1).max(0);
        let mut xo = outer;
        let mut xi = inner;
        let mut y = 0i64;
        let mut erro = 1 - xo;
        let mut erri = 1 - xi;

        while xo >= y {
            self.x_line(xc + xi, xc + xo, yc + y, colour);
            self.y_line(xc + y, yc + xi, yc + xo, colour);
            self.x_line(xc - xo, xc - xi, yc + y, colour);
            self.y_line(xc - y, yc + xi, yc + xo, colour);
            self.x_line(xc - xo, xc - xi, yc - y, colour);
            self.y_line(xc - y, yc - xo, yc - xi, colour);
            self.x_line(xc + xi, xc + xo, yc - y, colour);
            self.y_line(xc + y, yc - xo, yc - xi, colour);

            y += 1;

            if erro < 0 {
                erro += 2 * y + 1;
            } else {
                xo -= 1;
                erro += 2 * (y - xo) + 1;
            }

            if y > inner {
                xi = y;
            } else if erri < 0 {
                erri += 2 * y + 1;
            } else {
                xi -= 1;
                erri += 2 * (y - xi) + 1;
            }
        }
    }

    /// Draws `text` on one line with its top-left corner at (`x`, `y`).
    ///
    /// Each byte is one 8x8 cell; set glyph bits are written as `colour` and
    /// clear bits leave the background alone. Bytes above 127 draw nothing
    /// but still take their cell. Placement is checked once for the whole
    /// string: `y < 0`, `y >= height - 8` or `x >= width` is rejected before
    /// anything is drawn. Cells hanging off the left or right edge are clipped.
    pub fn draw_string(
        &mut self,
        x: i32,
        y: i32,
        text: impl AsRef<[u8]>,
        colour: Colour,
    ) -> Result<()> {
        let (x, y) = (x as i64, y as i64);
        let cell = GLYPH_SIZE as i64;
        if y < 0 || y >= self.height - cell || x >= self.width {
            return Err(DisplayError::invalid(format!(
                "text at ({x}, {y}) does not fit a {}x{} canvas",
                self.width, self.height
            )));
        }

        let mut cx = x;
        for &byte in text.as_ref() {
            if cx >= self.width {
                break;
            }
            if let Some(glyph) = glyph_for(byte) {
                for (gx, gy) in glyph.pixels() {
                    self.plot(cx + gx as i64, y + gy as i64, colour);
                }
            }
            cx += cell;
        }
        Ok(())
    }

    /// Copies a `data_width x data_height` image of packed RGB triplets with
    /// its top-left corner at (`x`, `y`). Pixels become opaque colours; the
    /// part outside the canvas is clipped.
    pub fn blit_rgb(
        &mut self,
        x: i32,
        y: i32,
        rgb: &[u8],
        data_width: usize,
        data_height: usize,
    ) -> Result<()> {
        let needed = data_width
            .checked_mul(data_height)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| DisplayError::invalid("image dimensions overflow"))?;
        if rgb.len() < needed {
            return Err(DisplayError::invalid(format!(
                "{} bytes of RGB data for a {data_width}x{data_height} image (need {needed})",
                rgb.len()
            )));
        }

        if data_width == 0 || data_height == 0 {
            return Ok(());
        }

        let (x, y) = (x as i64, y as i64);
        for (row, line) in rgb[..needed].chunks_exact(data_width * 3).enumerate() {
            let py = y + row as i64;
            if py < 0 {
                continue;
            }
            if py >= self.height {
                break;
            }
            for (col, px) in line.chunks_exact(3).enumerate() {
                self.plot(x + col as i64, py, Colour::rgb(px[0], px[1], px[2]));
            }
        }
        Ok(())
    }
}
