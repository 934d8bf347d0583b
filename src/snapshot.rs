// src/snapshot.rs
//! Binary PPM (`P6`) export and import of frames.
//!
//! Export writes `P6\n<w> <h>\n255\n` followed by `w * h` RGB triplets taken
//! from each pixel word (alpha dropped, row padding skipped). Import accepts
//! what we write plus anything else with maxval 255: header tokens may be
//! separated by any whitespace and `#` comments.

use crate::color::Colour;
use crate::display::frame_ring::FrameBuffer;
use crate::display::surface::BYTES_PER_PIXEL;
use crate::error::{DisplayError, Result};
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// An RGB image read from a PPM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpmImage {
    pub width: usize,
    pub height: usize,
    /// `width * height` packed RGB triplets, row-major.
    pub rgb: Vec<u8>,
}

impl PpmImage {
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y * self.width + x) * 3;
        Some(Colour::rgb(self.rgb[at], self.rgb[at + 1], self.rgb[at + 2]))
    }
}

/// Encodes `frame` as a P6 image into `out`.
pub fn write_ppm<W: Write>(frame: &FrameBuffer, mut out: W) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", frame.width(), frame.height())?;
    let mut line = Vec::with_capacity(frame.width() * 3);
    for y in 0..frame.height() {
        line.clear();
        if let Some(row) = frame.row(y) {
            for px in row.chunks_exact(BYTES_PER_PIXEL) {
                let mut word = [0u8; BYTES_PER_PIXEL];
                word.copy_from_slice(px);
                line.extend_from_slice(&Colour::from_word_bytes(word).to_rgb_bytes());
            }
        }
        out.write_all(&line)?;
    }
    out.flush()
}

/// Writes `frame` to `path` as a P6 image, replacing any existing file.
pub fn save_frame(frame: &FrameBuffer, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(DisplayError::invalid("snapshot path is empty"));
    }
    let file = File::create(path).map_err(|e| DisplayError::io(path, e))?;
    write_ppm(frame, BufWriter::new(file)).map_err(|e| DisplayError::io(path, e))?;
    debug!(
        "Snapshot: wrote {}x{} frame to {}",
        frame.width(),
        frame.height(),
        path.display()
    );
    Ok(())
}

/// Splits PPM header tokens off the front of a byte buffer.
struct HeaderReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn skip_space_and_comments(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_space_and_comments();
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.bytes[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<usize> {
        let token = self
            .token()
            .ok_or_else(|| DisplayError::invalid(format!("PPM header ends before {what}")))?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| DisplayError::invalid(format!("PPM {what} is not a number")))
    }
}

/// Decodes a P6 image held in memory.
pub fn parse_ppm(bytes: &[u8]) -> Result<PpmImage> {
    let mut header = HeaderReader { bytes, pos: 0 };
    match header.token() {
        Some(b"P6") => {}
        Some(other) => {
            return Err(DisplayError::Unsupported(format!(
                "PPM magic '{}', only P6 is read",
                String::from_utf8_lossy(other)
            )))
        }
        None => return Err(DisplayError::invalid("empty PPM data")),
    }
    let width = header.number("width")?;
    let height = header.number("height")?;
    let maxval = header.number("maxval")?;
    if maxval != 255 {
        return Err(DisplayError::Unsupported(format!(
            "PPM maxval {maxval}, only 255 is read"
        )));
    }
    // Exactly one whitespace byte separates the header from the raster.
    let start = header.pos + 1;
    let len = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| DisplayError::invalid(format!("PPM size {width}x{height} overflows")))?;
    let raster = bytes
        .get(start..)
        .and_then(|rest| rest.get(..len))
        .ok_or_else(|| {
            DisplayError::invalid(format!(
                "PPM raster truncated: expected {len} bytes for {width}x{height}"
            ))
        })?;
    Ok(PpmImage {
        width,
        height,
        rgb: raster.to_vec(),
    })
}

/// Reads a P6 image from `path`.
pub fn load_ppm(path: impl AsRef<Path>) -> Result<PpmImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| DisplayError::io(path, e))?;
    parse_ppm(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::surface::SurfaceGeometry;
    use test_log::test;

    fn frame(width: usize, height: usize, alignment: usize) -> FrameBuffer {
        FrameBuffer::zeroed(SurfaceGeometry::aligned(width, height, alignment).unwrap()).unwrap()
    }

    #[test]
    fn it_should_write_the_header_and_drop_alpha() {
        let mut f = frame(2, 1, 1);
        f.canvas().set_pixel(0, 0, Colour(0x80_11_22_33));
        f.canvas().set_pixel(1, 0, Colour(0xff_ff_00_01));
        let mut out = Vec::new();
        write_ppm(&f, &mut out).unwrap();
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[0x11, 0x22, 0x33, 0xff, 0x00, 0x01]);
        assert_eq!(out, expected);
    }

    #[test]
    fn it_should_skip_row_padding() {
        let f = frame(3, 2, 64);
        let mut out = Vec::new();
        write_ppm(&f, &mut out).unwrap();
        assert_eq!(out.len(), b"P6\n3 2\n255\n".len() + 3 * 2 * 3);
    }

    #[test]
    fn it_should_read_headers_with_comments() {
        let mut data = b"P6 # made by hand\n2\t1\n# maxval next\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let img = parse_ppm(&data).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.pixel(1, 0), Some(Colour::rgb(4, 5, 6)));
        assert_eq!(img.pixel(2, 0), None);
    }

    #[test]
    fn it_should_refuse_other_formats() {
        assert!(matches!(
            parse_ppm(b"P3\n1 1\n255\n0 0 0\n"),
            Err(DisplayError::Unsupported(_))
        ));
        assert!(matches!(
            parse_ppm(b"P6\n1 1\n65535\n\0\0\0\0\0\0"),
            Err(DisplayError::Unsupported(_))
        ));
    }

    #[test]
    fn it_should_report_truncated_data() {
        assert!(matches!(
            parse_ppm(b"P6\n2 2\n255\n\x01\x02"),
            Err(DisplayError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_ppm(b"P6\n2"),
            Err(DisplayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn it_should_reject_an_empty_path() {
        let f = frame(1, 1, 1);
        assert!(matches!(
            save_frame(&f, Path::new("")),
            Err(DisplayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn it_should_report_unwritable_destinations() {
        let f = frame(1, 1, 1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.ppm");
        assert!(matches!(
            save_frame(&f, &path),
            Err(DisplayError::IoFailure { .. })
        ));
        assert!(matches!(
            load_ppm(&path),
            Err(DisplayError::IoFailure { .. })
        ));
    }
}
