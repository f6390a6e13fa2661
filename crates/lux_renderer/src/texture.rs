//! Surface textures sampled by materials.

use std::sync::Arc;

use crate::material::Color;
use lux_core::TextureImage;
use lux_math::{Interval, Vec3};

/// A color that varies over a surface.
pub trait Texture: Send + Sync {
    /// Color at surface coordinates (u, v) and hit point `p`.
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color;
}

/// A constant color.
#[derive(Clone, Copy, Debug)]
pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.albedo
    }
}

/// A 3D checker pattern alternating between two textures.
///
/// Cells are cubes of edge `scale` in world space; the parity of the sum of
/// the cell coordinates picks the texture.
pub struct CheckerTexture {
    inv_scale: f32,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl CheckerTexture {
    pub fn new(scale: f32, even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    /// Checker between two solid colors.
    pub fn from_colors(scale: f32, even: Color, odd: Color) -> Self {
        Self::new(
            scale,
            Arc::new(SolidColor::new(even)),
            Arc::new(SolidColor::new(odd)),
        )
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        let cell = (p * self.inv_scale).floor();
        let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;

        if sum.rem_euclid(2) == 0 {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// A texture looked up from a decoded image by UV.
pub struct ImageTexture {
    image: Arc<TextureImage>,
}

impl ImageTexture {
    pub fn new(image: Arc<TextureImage>) -> Self {
        Self { image }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _p: Vec3) -> Color {
        // Image rows run top to bottom, v runs bottom to top
        let unit = Interval::new(0.0, 1.0);
        let u = unit.clamp(u);
        let v = 1.0 - unit.clamp(v);

        let i = (u * self.image.width() as f32) as i64;
        let j = (v * self.image.height() as f32) as i64;
        // Empty images answer every lookup with magenta
        let [r, g, b] = self.image.pixel(i, j);

        Color::new(r as f32, g as f32, b as f32) / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color() {
        let tex = SolidColor::new(Color::new(0.1, 0.2, 0.3));
        assert_eq!(tex.value(0.7, 0.1, Vec3::splat(99.0)), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_checker_parity() {
        let white = Color::ONE;
        let tex = CheckerTexture::from_colors(50.0, white, Color::ZERO);

        assert_eq!(tex.value(0.0, 0.0, Vec3::new(10.0, 10.0, 10.0)), white);
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(60.0, 10.0, 10.0)), Color::ZERO);
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(60.0, 60.0, 10.0)), white);
        // Negative coordinates floor away from zero
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(-10.0, 10.0, 10.0)), Color::ZERO);
    }

    fn gradient_image() -> Arc<TextureImage> {
        // 2x2: top row red, green; bottom row blue, white
        #[rustfmt::skip]
        let data = vec![
            255, 0, 0,    0, 255, 0,
            0, 0, 255,    255, 255, 255,
        ];
        Arc::new(TextureImage::from_rgb8(2, 2, data, "gradient"))
    }

    #[test]
    fn test_image_texture_flips_v() {
        let tex = ImageTexture::new(gradient_image());

        // v = 1 is the top row of the image
        assert_eq!(tex.value(0.1, 0.9, Vec3::ZERO), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.value(0.9, 0.9, Vec3::ZERO), Color::new(0.0, 1.0, 0.0));
        assert_eq!(tex.value(0.1, 0.1, Vec3::ZERO), Color::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_image_texture_clamps_uv() {
        let tex = ImageTexture::new(gradient_image());
        assert_eq!(tex.value(-3.0, 7.0, Vec3::ZERO), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.value(1.0, 0.0, Vec3::ZERO), Color::ONE);
    }

    #[test]
    fn test_missing_image_is_magenta() {
        let tex = ImageTexture::new(Arc::new(TextureImage::missing("gone.png")));
        assert_eq!(tex.value(0.5, 0.5, Vec3::ZERO), Color::new(1.0, 0.0, 1.0));
    }
}
