//! Lux Core - plain scene data for the Lux path tracer.
//!
//! This crate provides:
//!
//! - **Mesh data**: `Vertex`, `MeshData`, `ModelData`
//! - **Material descriptions**: imported material parameters and the
//!   illumination-model classification used to pick a renderer material
//! - **Textures**: decoded RGB texture images and a path-keyed cache
//! - **OBJ ingestion**: Wavefront OBJ/MTL loading via `tobj`
//! - **Configuration**: JSON render settings
//!
//! Nothing here knows about rays; the renderer turns this data into
//! hittables and materials.
//!
//! # Example
//!
//! ```ignore
//! use lux_core::load_model;
//!
//! let model = load_model("models/bunny/bunny.obj")?;
//! println!("Loaded {} meshes, {} triangles",
//!     model.meshes.len(),
//!     model.triangle_count());
//! ```

pub mod config;
pub mod material;
pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use config::{
    load_settings, CameraOverrides, CameraSettings, ConfigError, RenderSettings, SceneKind,
    TileStorageKind,
};
pub use material::{IllumModel, MaterialDesc, MaterialKind};
pub use mesh::{MeshData, ModelData, Vertex};
pub use obj::{load_model, AssetError};
pub use texture::{TextureCache, TextureError, TextureImage};
