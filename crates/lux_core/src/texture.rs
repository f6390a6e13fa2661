//! Texture image loading and caching.
//!
//! Images are decoded once into linear 8-bit RGB buffers and shared between
//! every material that references the same file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Debug color returned for lookups into an image with no pixel data.
pub const MISSING_TEXEL: [u8; 3] = [255, 0, 255];

/// A decoded texture image.
///
/// Pixels are linear (gamma = 1) RGB bytes, three per pixel, row-major from
/// the top-left corner.
#[derive(Clone, Debug, Default)]
pub struct TextureImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    path: PathBuf,
}

impl TextureImage {
    const BYTES_PER_PIXEL: usize = 3;

    /// Create a texture image from raw linear RGB bytes.
    ///
    /// A buffer of the wrong length yields an empty image.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if data.len() != expected {
            log::warn!(
                "Texture {} has {} bytes, expected {}; treating it as missing",
                path.display(),
                data.len(),
                expected
            );
            return Self::missing(path);
        }
        Self {
            width,
            height,
            data,
            path,
        }
    }

    /// An image with no pixel data; every lookup returns [`MISSING_TEXEL`].
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Original file path (for debugging)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// RGB bytes of the pixel at (x, y). Coordinates are clamped to the
    /// image; an empty image returns magenta.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 3] {
        if self.is_empty() {
            return MISSING_TEXEL;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let idx = (y * self.width as usize + x) * Self::BYTES_PER_PIXEL;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Get total size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Cache for loaded texture images.
///
/// Textures are loaded on-demand and cached by resolved path.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<PathBuf, Arc<TextureImage>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Set the base directory for resolving relative paths.
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.base_dir = Some(base_dir.into());
    }

    /// Load a texture from file, using the cache if available.
    pub fn load(&mut self, path: impl AsRef<Path>) -> TextureResult<Arc<TextureImage>> {
        let full_path = self.resolve_path(path.as_ref());

        if let Some(texture) = self.textures.get(&full_path) {
            return Ok(texture.clone());
        }

        let texture = Arc::new(load_texture_file(&full_path)?);
        self.textures.insert(full_path, texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            texture.path().display(),
            texture.width(),
            texture.height(),
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Load a texture, degrading to an empty (magenta) image on failure.
    ///
    /// Failed loads are cached too, so the warning is logged once per path.
    pub fn load_or_missing(&mut self, path: impl AsRef<Path>) -> Arc<TextureImage> {
        match self.load(path.as_ref()) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("{e}; using debug color");
                let full_path = self.resolve_path(path.as_ref());
                let missing = Arc::new(TextureImage::missing(full_path.clone()));
                self.textures.insert(full_path, missing.clone());
                missing
            }
        }
    }

    /// Check if a texture is cached.
    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        self.textures.contains_key(&self.resolve_path(path.as_ref()))
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Load a texture from a file path.
fn load_texture_file(path: &Path) -> TextureResult<TextureImage> {
    let img = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    // Convert to linear bytes
    let data: Vec<u8> = rgb
        .into_raw()
        .into_iter()
        .map(|c| float_to_byte(srgb_to_linear(c)))
        .collect();

    Ok(TextureImage::from_rgb8(width, height, data, path))
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Map a [0, 1] float to a byte.
fn float_to_byte(value: f32) -> u8 {
    if value <= 0.0 {
        0
    } else if value >= 1.0 {
        255
    } else {
        (256.0 * value) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> TextureImage {
        #[rustfmt::skip]
        let data = vec![
            255, 0, 0,    0, 255, 0,
            0, 0, 255,    255, 255, 255,
        ];
        TextureImage::from_rgb8(2, 2, data, "checker")
    }

    #[test]
    fn test_pixel_lookup() {
        let tex = checker_2x2();
        assert_eq!(tex.pixel(0, 0), [255, 0, 0]);
        assert_eq!(tex.pixel(1, 0), [0, 255, 0]);
        assert_eq!(tex.pixel(0, 1), [0, 0, 255]);
        assert_eq!(tex.pixel(1, 1), [255, 255, 255]);
    }

    #[test]
    fn test_pixel_lookup_clamps() {
        let tex = checker_2x2();
        assert_eq!(tex.pixel(-5, 0), [255, 0, 0]);
        assert_eq!(tex.pixel(2, 0), [0, 255, 0]);
        assert_eq!(tex.pixel(7, 9), [255, 255, 255]);
    }

    #[test]
    fn test_missing_image_is_magenta() {
        let tex = TextureImage::missing("nowhere.png");
        assert!(tex.is_empty());
        assert_eq!(tex.pixel(0, 0), MISSING_TEXEL);

        // Wrong buffer length degrades to missing
        let bad = TextureImage::from_rgb8(4, 4, vec![0; 3], "short");
        assert!(bad.is_empty());
    }

    #[test]
    fn test_cache_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = TextureCache::with_base_dir(dir.path());

        assert!(cache.load("does_not_exist.png").is_err());

        let tex = cache.load_or_missing("does_not_exist.png");
        assert_eq!(tex.pixel(3, 3), MISSING_TEXEL);
        assert!(cache.is_cached("does_not_exist.png"));
    }

    #[test]
    fn test_cache_dedups_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();

        let mut cache = TextureCache::with_base_dir(dir.path());
        let a = cache.load("red.png").unwrap();
        let b = cache.load(&path).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!((a.width(), a.height()), (3, 2));
        assert_eq!(a.pixel(2, 1), [255, 0, 0]);
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }

    #[test]
    fn test_float_to_byte() {
        assert_eq!(float_to_byte(-1.0), 0);
        assert_eq!(float_to_byte(0.5), 128);
        assert_eq!(float_to_byte(1.0), 255);
    }
}
