//! Render settings loaded from a JSON file.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "scene": "model",
//!   "model_path": "models/bunny/bunny.obj",
//!   "image_name": "bunny",
//!   "camera": { "look_from": [0, 1, 4], "samples_per_pixel": 64 },
//!   "threads": 8,
//!   "sub_images": 32
//! }
//! ```

use std::path::{Path, PathBuf};

use lux_math::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Which scene to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// External OBJ model at `model_path`, camera from `camera`
    Model,
    /// Random small spheres around three large ones
    #[default]
    OneWeekendSpheres,
    /// Cornell box with a metal and a glass sphere
    CornellBox,
    /// Mirrored room with a checkered floor and a textured sphere
    MirrorRoom,
}

/// Where rendered tiles are kept until assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStorageKind {
    /// Private pixel buffer per tile
    #[default]
    Memory,
    /// One PPM sub-image file per tile under `<output_dir>/<image_name>/`
    Disk,
}

/// Camera and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    /// Aspect ratio as `[width, height]`
    pub aspect_ratio: [f32; 2],
    pub image_width: u32,
    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: [f32; 3],
    pub look_at: [f32; 3],
    pub up: [f32; 3],
    pub samples_per_pixel: u32,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from the eye to the plane of perfect focus
    pub focus_distance: f32,
    pub max_depth: u32,
    pub background: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: [1.0, 1.0],
            image_width: 100,
            vfov: 90.0,
            look_from: [0.0, 0.0, 0.0],
            look_at: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            samples_per_pixel: 10,
            defocus_angle: 0.0,
            focus_distance: 1.0,
            max_depth: 5,
            background: [0.0, 0.0, 0.0],
        }
    }
}

impl CameraSettings {
    pub fn aspect(&self) -> f32 {
        self.aspect_ratio[0] / self.aspect_ratio[1]
    }

    pub fn look_from(&self) -> Vec3 {
        Vec3::from_array(self.look_from)
    }

    pub fn look_at(&self) -> Vec3 {
        Vec3::from_array(self.look_at)
    }

    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.up)
    }

    pub fn background(&self) -> Vec3 {
        Vec3::from_array(self.background)
    }
}

/// Values that replace the scene's camera settings, including the presets
/// of built-in scenes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraOverrides {
    pub image_width: Option<u32>,
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
}

/// Top-level render settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub scene: SceneKind,
    /// OBJ file for `SceneKind::Model`
    pub model_path: Option<PathBuf>,
    /// Output file stem; the image is written to `<output_dir>/<image_name>.ppm`
    pub image_name: String,
    pub output_dir: PathBuf,
    /// Camera for `SceneKind::Model`; built-in scenes use their own presets
    pub camera: CameraSettings,
    pub overrides: CameraOverrides,
    /// Worker thread count
    pub threads: usize,
    /// Number of row-band tiles the image is split into
    pub sub_images: usize,
    /// Seed for scene generation, tile shuffling and per-tile sampling
    pub seed: u64,
    pub tile_storage: TileStorageKind,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scene: SceneKind::default(),
            model_path: None,
            image_name: "render".to_string(),
            output_dir: PathBuf::from("images"),
            camera: CameraSettings::default(),
            overrides: CameraOverrides::default(),
            threads: default_threads(),
            sub_images: 16,
            seed: 42,
            tile_storage: TileStorageKind::default(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl RenderSettings {
    /// Parse settings from a JSON string and validate them.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: RenderSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.threads == 0 {
            return invalid("threads must be at least 1");
        }
        if self.sub_images == 0 {
            return invalid("sub_images must be at least 1");
        }
        if self.image_name.is_empty() {
            return invalid("image_name must not be empty");
        }
        if self.scene == SceneKind::Model && self.model_path.is_none() {
            return invalid("scene 'model' requires model_path");
        }

        let cam = &self.camera;
        if !(cam.aspect_ratio[0] > 0.0 && cam.aspect_ratio[1] > 0.0) {
            return invalid("camera.aspect_ratio components must be positive");
        }
        if cam.image_width == 0 || self.overrides.image_width == Some(0) {
            return invalid("image_width must be at least 1");
        }
        if cam.samples_per_pixel == 0 || self.overrides.samples_per_pixel == Some(0) {
            return invalid("samples_per_pixel must be at least 1");
        }
        if !(cam.vfov > 0.0 && cam.vfov < 180.0) {
            return invalid("camera.vfov must be in (0, 180) degrees");
        }
        if cam.look_from == cam.look_at {
            return invalid("camera.look_from and camera.look_at must differ");
        }
        // The camera basis is built from up x view; a parallel (or zero) up
        // leaves it undefined
        let view = cam.look_from() - cam.look_at();
        let up = cam.up();
        if up.cross(view).length_squared() <= 1e-6 * view.length_squared() * up.length_squared() {
            return invalid("camera.up must not be parallel to the view direction");
        }
        Ok(())
    }

    /// Path of the final image.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.ppm", self.image_name))
    }

    /// Directory holding sub-image files while rendering to disk.
    pub fn sub_images_dir(&self) -> PathBuf {
        self.output_dir.join(&self.image_name)
    }
}

/// Load settings from a JSON file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<RenderSettings, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    RenderSettings::from_json(&content)
}
