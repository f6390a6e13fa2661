//! End-to-end renders through the tile pool.

use std::sync::Arc;

use lux_core::CameraOverrides;
use lux_renderer::{
    color_to_rgb8, one_weekend_spheres, render_tiles, Camera, Color, HitRecord, Hittable, Image,
    Lambertian, Material, Ray, RenderError, RenderOptions, Scatter, Sphere, TileStorage, Vec3,
};
use rand::RngCore;

/// Absorbs every ray and emits nothing.
struct Absorber;

impl Material for Absorber {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord, _rng: &mut dyn RngCore) -> Option<Scatter> {
        None
    }
}

/// The one-weekend scene at thumbnail size.
fn small_spheres(seed: u64) -> (Arc<dyn Hittable>, Camera) {
    let scene = one_weekend_spheres(seed);
    let mut camera = scene.camera.with_overrides(&CameraOverrides {
        image_width: Some(48),
        samples_per_pixel: Some(2),
        max_depth: Some(6),
    });
    camera.initialize();
    (scene.world, camera)
}

fn memory_options(threads: usize, sub_images: usize) -> RenderOptions {
    RenderOptions {
        threads,
        sub_images,
        seed: 42,
        storage: TileStorage::Memory,
    }
}

#[test]
fn absorbing_scene_on_black_is_black() {
    let world = Sphere::new(
        Vec3::new(0.0, 0.0, -1.0),
        0.5,
        Arc::new(Lambertian::new(Color::ONE)),
    );
    let mut camera = Camera::new()
        .with_resolution(16, 12)
        .with_quality(1, 1)
        .with_background(Color::ZERO);
    camera.initialize();

    let image = render_tiles(&camera, &world, &memory_options(3, 4)).unwrap();

    assert_eq!((image.width, image.height), (16, 12));
    assert!(image.pixels.iter().all(|&p| p == [0, 0, 0]));
}

#[test]
fn absorbing_object_is_black_against_background() {
    let background = Color::new(0.2, 0.4, 0.6);
    let world = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, Arc::new(Absorber));
    let mut camera = Camera::new()
        .with_resolution(16, 12)
        .with_quality(1, 1)
        .with_background(background);
    camera.initialize();

    let image = render_tiles(&camera, &world, &memory_options(3, 4)).unwrap();
    let sky = color_to_rgb8(background);
    assert_ne!(sky, [0, 0, 0]);

    // Looking straight at the sphere
    assert_eq!(image.get(8, 6), [0, 0, 0]);
    assert_eq!(image.get(7, 5), [0, 0, 0]);
    // The corners see past it (the sphere spans 30 degrees off-axis)
    for (x, y) in [(0, 0), (15, 0), (0, 11), (15, 11)] {
        assert_eq!(image.get(x, y), sky, "pixel ({x}, {y})");
    }
    // One sample per pixel: every pixel is either the object or the sky
    assert!(image.pixels.iter().all(|&p| p == [0, 0, 0] || p == sky));
}

#[test]
fn render_is_independent_of_thread_count() {
    let (world, camera) = small_spheres(5);

    let single = render_tiles(&camera, world.as_ref(), &memory_options(1, 5)).unwrap();
    let pooled = render_tiles(&camera, world.as_ref(), &memory_options(4, 5)).unwrap();

    assert_eq!((single.width, single.height), (48, 27));
    assert_eq!(single, pooled);
}

#[test]
fn one_weekend_luminance_is_deterministic() {
    let (world, camera) = small_spheres(5);
    let first = render_tiles(&camera, world.as_ref(), &memory_options(2, 3)).unwrap();

    let (world, camera) = small_spheres(5);
    let second = render_tiles(&camera, world.as_ref(), &memory_options(3, 3)).unwrap();

    assert_eq!(first.mean_intensity(), second.mean_intensity());
    // Mostly sky and lit ground: neither black nor blown out
    assert!(first.mean_intensity() > 60.0);
    assert!(first.mean_intensity() < 250.0);
}

#[test]
fn disk_storage_matches_memory_storage() {
    let (world, camera) = small_spheres(9);
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("spheres");

    let in_memory = render_tiles(&camera, world.as_ref(), &memory_options(3, 6)).unwrap();
    let on_disk = render_tiles(
        &camera,
        world.as_ref(),
        &RenderOptions {
            storage: TileStorage::Disk {
                dir: dir.clone(),
                name: "spheres".to_string(),
            },
            ..memory_options(3, 6)
        },
    )
    .unwrap();

    assert_eq!(in_memory, on_disk);
    // Sub-images and their directory are cleaned up
    assert!(!dir.exists());
}

#[test]
fn more_sub_images_than_rows() {
    let (world, camera) = small_spheres(3);
    let image = render_tiles(&camera, world.as_ref(), &memory_options(2, 1000)).unwrap();
    let reference = render_tiles(&camera, world.as_ref(), &memory_options(2, 27)).unwrap();

    assert_eq!(image, reference);
}

#[test]
fn unwritable_sub_image_dir_is_an_error() {
    let (world, camera) = small_spheres(3);
    let out = tempfile::tempdir().unwrap();
    let blocker = out.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let result = render_tiles(
        &camera,
        world.as_ref(),
        &RenderOptions {
            storage: TileStorage::Disk {
                dir: blocker.join("tiles"),
                name: "x".to_string(),
            },
            ..memory_options(2, 4)
        },
    );

    assert!(matches!(result, Err(RenderError::Io { .. })));
}

#[test]
fn final_image_round_trips_through_ppm() {
    let (world, camera) = small_spheres(11);
    let image = render_tiles(&camera, world.as_ref(), &memory_options(2, 2)).unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("render.ppm");
    image.write_ppm(&path).unwrap();

    assert_eq!(Image::read_ppm(&path).unwrap(), image);
}
