//! Hand-built scene rendered through the tile pool.
//!
//! Three spheres on a checkered floor under a small area light, saved as
//! `simple_render.ppm` in the working directory.

use std::sync::Arc;

use lux_renderer::{
    render_tiles, BvhNode, Camera, CheckerTexture, Color, Dielectric, DiffuseLight, Hittable,
    Lambertian, Metal, RenderOptions, RenderResult, Sphere, TileStorage, Vec3,
};

fn main() -> RenderResult<()> {
    println!("Lux Path Tracer - Simple Example");
    println!("================================");

    let start = std::time::Instant::now();
    let world = build_scene();
    println!("Scene built in {:?}", start.elapsed());

    let mut camera = Camera::new()
        .with_aspect(16.0 / 9.0, 640)
        .with_quality(32, 12)
        .with_position(
            Vec3::new(13.0, 2.0, 3.0), // look_from
            Vec3::new(0.0, 0.0, 0.0),  // look_at
            Vec3::new(0.0, 1.0, 0.0),  // vup
        )
        .with_lens(20.0, 0.6, 10.0)
        .with_background(Color::new(0.05, 0.05, 0.08));
    camera.initialize();

    let options = RenderOptions {
        threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
        sub_images: 24,
        seed: 1,
        storage: TileStorage::Memory,
    };

    println!(
        "Rendering {}x{} @ {} spp on {} threads...",
        camera.image_width, camera.image_height, camera.samples_per_pixel, options.threads
    );

    let start = std::time::Instant::now();
    let image = render_tiles(&camera, &world, &options)?;
    println!("Rendered in {:?}", start.elapsed());

    let filename = "simple_render.ppm";
    image.write_ppm(filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> BvhNode {
    let floor = CheckerTexture::from_colors(1.0, Color::splat(0.8), Color::new(0.2, 0.3, 0.1));
    let objects: Vec<Arc<dyn Hittable>> = vec![
        Arc::new(Sphere::new(
            Vec3::new(0.0, -1000.0, 0.0),
            1000.0,
            Arc::new(Lambertian::from_texture(Arc::new(floor))),
        )),
        Arc::new(Sphere::new(
            Vec3::new(0.0, 1.0, 0.0),
            1.0,
            Arc::new(Dielectric::new(1.5)),
        )),
        Arc::new(Sphere::new(
            Vec3::new(-4.0, 1.0, 0.0),
            1.0,
            Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1))),
        )),
        Arc::new(Sphere::new(
            Vec3::new(4.0, 1.0, 0.0),
            1.0,
            Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.05)),
        )),
        // Light
        Arc::new(Sphere::new(
            Vec3::new(0.0, 7.0, 2.0),
            2.0,
            Arc::new(DiffuseLight::new(Color::splat(6.0))),
        )),
    ];

    // Non-empty input always yields a tree
    BvhNode::new(objects).unwrap_or_else(|| unreachable!())
}
