//! Imported material descriptions.
//!
//! A `MaterialDesc` holds the raw parameters read from an asset's material
//! library. The renderer never looks at the illumination model directly;
//! it asks [`MaterialDesc::kind`] which of its four material models to build.

use std::path::PathBuf;

use lux_math::Vec3;

/// MTL illumination model (`illum` statement).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IllumModel {
    /// `illum 2`: color on, ambient on, highlights on
    BaseShading,
    /// `illum 3`: reflection on, ray traced
    ReflectionOn,
    /// `illum 6`: refraction on, ray traced
    RefractionOn,
    /// Any other model number
    Other(u8),
}

impl From<u8> for IllumModel {
    fn from(n: u8) -> Self {
        match n {
            2 => IllumModel::BaseShading,
            3 => IllumModel::ReflectionOn,
            6 => IllumModel::RefractionOn,
            n => IllumModel::Other(n),
        }
    }
}

/// The renderer material model a description maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    Lambertian,
    Metal,
    Dielectric,
    DiffuseLight,
}

/// Material parameters read from an asset file.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    /// Material name (from `newmtl`)
    pub name: String,

    pub illum: IllumModel,

    /// Diffuse/albedo color (`Kd`)
    pub diffuse: Vec3,

    /// Specular color (`Ks`), used as metal albedo
    pub specular: Vec3,

    /// Emissive color (`Ke`)
    pub emissive: Vec3,

    /// Specular exponent (`Ns`, 0-1000)
    pub shininess: f32,

    /// Index of refraction (`Ni`)
    pub ior: f32,

    /// Resolved path to the diffuse texture (`map_Kd`)
    pub diffuse_texture: Option<PathBuf>,
}

impl Default for MaterialDesc {
    /// Meshes without a material render as black diffuse surfaces.
    fn default() -> Self {
        Self {
            name: String::new(),
            illum: IllumModel::BaseShading,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            shininess: 0.0,
            ior: 1.0,
            diffuse_texture: None,
        }
    }
}

impl MaterialDesc {
    /// Classify this description into a renderer material model.
    ///
    /// Base shading with a non-zero emissive color is a light; otherwise the
    /// illumination model selects metal (reflection) or dielectric
    /// (refraction), and everything else is diffuse.
    pub fn kind(&self) -> MaterialKind {
        if self.is_diffuse_light() {
            return MaterialKind::DiffuseLight;
        }
        match self.illum {
            IllumModel::ReflectionOn => MaterialKind::Metal,
            IllumModel::RefractionOn => MaterialKind::Dielectric,
            IllumModel::BaseShading | IllumModel::Other(_) => MaterialKind::Lambertian,
        }
    }

    fn is_diffuse_light(&self) -> bool {
        self.illum == IllumModel::BaseShading && self.emissive != Vec3::ZERO
    }

    /// Metal fuzz derived from shininess: a shininess of 1000 is a perfect
    /// mirror, 0 is fully rough.
    pub fn fuzz(&self) -> f32 {
        (1.0 - self.shininess / 1000.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(illum: u8) -> MaterialDesc {
        MaterialDesc {
            illum: IllumModel::from(illum),
            ..Default::default()
        }
    }

    #[test]
    fn test_illum_model_from_number() {
        assert_eq!(IllumModel::from(2), IllumModel::BaseShading);
        assert_eq!(IllumModel::from(3), IllumModel::ReflectionOn);
        assert_eq!(IllumModel::from(6), IllumModel::RefractionOn);
        assert_eq!(IllumModel::from(7), IllumModel::Other(7));
    }

    #[test]
    fn test_kind_by_illum_model() {
        assert_eq!(desc(2).kind(), MaterialKind::Lambertian);
        assert_eq!(desc(3).kind(), MaterialKind::Metal);
        assert_eq!(desc(6).kind(), MaterialKind::Dielectric);
        assert_eq!(desc(1).kind(), MaterialKind::Lambertian);
    }

    #[test]
    fn test_emissive_base_shading_is_light() {
        let mut light = desc(2);
        light.emissive = Vec3::new(4.0, 4.0, 4.0);
        assert_eq!(light.kind(), MaterialKind::DiffuseLight);

        // Emission only counts under base shading
        let mut metal = desc(3);
        metal.emissive = Vec3::ONE;
        assert_eq!(metal.kind(), MaterialKind::Metal);
    }

    #[test]
    fn test_fuzz_from_shininess() {
        let mut m = desc(3);
        m.shininess = 1000.0;
        assert_eq!(m.fuzz(), 0.0);
        m.shininess = 250.0;
        assert!((m.fuzz() - 0.75).abs() < 1e-6);
        m.shininess = 0.0;
        assert_eq!(m.fuzz(), 1.0);
    }
}
