//! Lux Renderer - CPU path tracing.
//!
//! A Monte Carlo path tracer for physically-based rendering:
//! spheres and triangles behind a BVH, diffuse/metal/glass/emissive
//! materials, a thin-lens camera, and a tile-based worker pool that renders
//! row bands concurrently and stitches them back in order.
//!
//! # Example
//!
//! ```ignore
//! use lux_core::load_settings;
//! use lux_renderer::{build_scene, render_tiles, RenderOptions};
//!
//! let settings = load_settings("scenes/bunny.json")?;
//! let scene = build_scene(&settings)?;
//! let image = render_tiles(&scene.camera, scene.world.as_ref(), &RenderOptions::from_settings(&settings))?;
//! image.write_ppm(settings.output_path())?;
//! ```

mod bvh;
mod camera;
mod error;
mod hittable;
mod material;
mod ppm;
mod renderer;
mod scene;
mod sphere;
mod texture;
mod tile;
mod triangle;

pub use bvh::{BvhChild, BvhNode};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    random_in_unit_disk, random_unit_vector, reflect, refract, Color, Dielectric, DiffuseLight,
    Lambertian, Material, Metal, Scatter,
};
pub use ppm::Image;
pub use renderer::{color_to_rgb8, linear_to_gamma, ray_color, render_pixel};
pub use scene::{
    build_scene, cornell_box, cornell_box_camera, external_model, material_from_desc, mesh_bvh,
    mirror_room, mirror_room_camera, model_bvh, one_weekend_camera, one_weekend_spheres, Scene,
    MIRROR_ROOM_TEXTURE,
};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, ImageTexture, SolidColor, Texture};
pub use tile::{
    assemble, partition_rows, render_tile, render_tiles, RenderOptions, RenderedTile, Tile,
    TileData, TileStorage,
};
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from lux_math
pub use lux_math::{Aabb, Interval, Ray, Vec3};
