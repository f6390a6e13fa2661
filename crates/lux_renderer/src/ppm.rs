//! Images and plain-text PPM (`P3`) encoding.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// An 8-bit RGB image, row-major from the top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

/// Row-major offset of (x, y), computed in `usize`.
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

impl Image {
    /// Create a new image filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; width as usize * height as usize],
        }
    }

    /// Wrap existing pixels. Returns `None` if the count does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[pixel_index(self.width, x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.pixels[pixel_index(self.width, x, y)] = rgb;
    }

    /// Mean of all channels, 0-255.
    pub fn mean_intensity(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: u64 = self
            .pixels
            .iter()
            .flat_map(|p| p.iter())
            .map(|&c| c as u64)
            .sum();
        sum as f64 / (self.pixels.len() * 3) as f64
    }

    /// Encode as plain PPM.
    pub fn write_ppm_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;
        for [r, g, b] in &self.pixels {
            writeln!(out, "{r} {g} {b}")?;
        }
        out.flush()
    }

    /// Write the image to a PPM file, creating parent directories.
    pub fn write_ppm(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(RenderError::io(parent))?;
        }
        let file = File::create(path).map_err(RenderError::io(path))?;
        self.write_ppm_to(BufWriter::new(file))
            .map_err(RenderError::io(path))
    }

    /// Read a plain PPM file.
    pub fn read_ppm(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(RenderError::io(path))?;
        let mut text = String::new();
        BufReader::new(file)
            .read_to_string(&mut text)
            .map_err(RenderError::io(path))?;

        parse_ppm(&text).map_err(|reason| RenderError::MalformedPpm {
            path: path.to_path_buf(),
            reason,
        })
    }
}

/// Parse `P3` text. Comments (`#` to end of line) are skipped.
fn parse_ppm(text: &str) -> Result<Image, String> {
    let mut tokens = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    match tokens.next() {
        Some("P3") => {}
        Some(magic) => return Err(format!("unsupported magic number '{magic}'")),
        None => return Err("empty file".to_string()),
    }

    let mut header = |name: &str| -> Result<u32, String> {
        let token = tokens.next().ok_or_else(|| format!("missing {name}"))?;
        token
            .parse::<u32>()
            .map_err(|e| format!("bad {name} '{token}': {e}"))
    };
    let width = header("width")?;
    let height = header("height")?;
    let max_value = header("max value")?;
    if max_value != 255 {
        return Err(format!("unsupported max value {max_value}"));
    }

    let expected = width as usize * height as usize;
    let mut pixels = Vec::with_capacity(expected);
    let mut channels = tokens.map(|t| t.parse::<u8>().map_err(|e| format!("bad sample '{t}': {e}")));
    for _ in 0..expected {
        let mut rgb = [0u8; 3];
        for c in &mut rgb {
            *c = channels
                .next()
                .ok_or_else(|| format!("expected {expected} pixels"))??;
        }
        pixels.push(rgb);
    }

    Ok(Image {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> Image {
        let mut image = Image::new(3, 2);
        image.set(0, 0, [255, 0, 0]);
        image.set(2, 0, [0, 255, 0]);
        image.set(1, 1, [1, 2, 3]);
        image
    }

    #[test]
    fn test_pixel_index_does_not_wrap() {
        assert_eq!(pixel_index(4, 1, 2), 9);
        // 70000 x 70000 is past u32::MAX pixels
        let index = pixel_index(70_000, 69_999, 69_999);
        assert_eq!(index as u64, 70_000u64 * 70_000 - 1);
    }

    #[test]
    fn test_ppm_text_layout() {
        let mut out = Vec::new();
        sample_image().write_ppm_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(&lines[..4], ["P3", "3 2", "255", "255 0 0"]);
        assert_eq!(lines[5], "0 255 0");
        assert_eq!(lines[7], "1 2 3");
        assert_eq!(lines.len(), 3 + 6);
    }

    #[test]
    fn test_ppm_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/tile0-1.ppm");

        let image = sample_image();
        image.write_ppm(&path).unwrap();
        assert_eq!(Image::read_ppm(&path).unwrap(), image);
    }

    #[test]
    fn test_parse_with_comments() {
        let image = parse_ppm("P3\n# made by hand\n1 1 # one pixel\n255\n10 20 30\n").unwrap();
        assert_eq!(image.pixels, vec![[10, 20, 30]]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_ppm("").is_err());
        assert!(parse_ppm("P6\n1 1\n255\n").is_err());
        assert!(parse_ppm("P3\n2 1\n255\n1 2 3\n").is_err());
        assert!(parse_ppm("P3\n1 1\n255\n1 2 300\n").is_err());
        assert!(parse_ppm("P3\n1 1\n65535\n1 2 3\n").is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let err = Image::read_ppm("/nonexistent/image.ppm").unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn test_mean_intensity() {
        let image = Image::from_pixels(2, 1, vec![[0, 0, 0], [255, 255, 255]]).unwrap();
        assert!((image.mean_intensity() - 127.5).abs() < 1e-9);
        assert!(Image::from_pixels(2, 2, vec![]).is_none());
    }
}
