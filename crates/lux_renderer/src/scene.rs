//! Scene construction: built-in scenes and imported models.
//!
//! Every scene comes with a camera preset. Only the external model scene
//! takes its camera from the settings file; the overrides in the settings
//! apply to all of them.

use std::path::Path;
use std::sync::Arc;

use lux_core::{
    load_model, CameraSettings, MaterialDesc, MaterialKind, MeshData, ModelData, RenderSettings,
    SceneKind, TextureCache, Vertex,
};
use lux_math::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bvh::BvhNode;
use crate::error::RenderResult;
use crate::hittable::{Hittable, HittableList};
use crate::material::{
    gen_f32, gen_range_f32, random_vec3, Color, Dielectric, DiffuseLight, Lambertian, Material,
    Metal,
};
use crate::sphere::Sphere;
use crate::texture::{CheckerTexture, ImageTexture};
use crate::triangle::Triangle;
use crate::Camera;

/// Texture wrapped around the sphere of the mirror room.
pub const MIRROR_ROOM_TEXTURE: &str = "images/textures/pexels.jpg";

/// Geometry plus the camera that looks at it.
pub struct Scene {
    pub world: Arc<dyn Hittable>,
    pub camera: Camera,
}

impl Scene {
    pub fn new(world: Arc<dyn Hittable>, camera: Camera) -> Self {
        Self { world, camera }
    }
}

/// Build the scene selected by `settings`, with an initialized camera.
pub fn build_scene(settings: &RenderSettings) -> RenderResult<Scene> {
    let mut scene = match settings.scene {
        SceneKind::Model => {
            // validate() guarantees a path for model scenes
            let path = settings.model_path.as_deref().unwrap_or(Path::new(""));
            external_model(path, &settings.camera)?
        }
        SceneKind::OneWeekendSpheres => one_weekend_spheres(settings.seed),
        SceneKind::CornellBox => cornell_box(),
        SceneKind::MirrorRoom => mirror_room(&mut TextureCache::new()),
    };

    scene.camera = scene.camera.with_overrides(&settings.overrides);
    scene.camera.initialize();
    Ok(scene)
}

/// BVH over the objects, or an empty list when there are none.
fn into_world(objects: Vec<Arc<dyn Hittable>>) -> Arc<dyn Hittable> {
    match BvhNode::new(objects) {
        Some(bvh) => Arc::new(bvh),
        None => Arc::new(HittableList::new()),
    }
}

// =============================================================================
// Imported models
// =============================================================================

/// Renderer material for an imported description.
pub fn material_from_desc(desc: &MaterialDesc, textures: &mut TextureCache) -> Arc<dyn Material> {
    match desc.kind() {
        MaterialKind::Lambertian => match &desc.diffuse_texture {
            Some(path) => Arc::new(Lambertian::from_texture(Arc::new(ImageTexture::new(
                textures.load_or_missing(path),
            )))),
            None => Arc::new(Lambertian::new(desc.diffuse)),
        },
        MaterialKind::Metal => Arc::new(Metal::new(desc.specular, desc.fuzz())),
        MaterialKind::Dielectric => Arc::new(Dielectric::new(desc.ior)),
        MaterialKind::DiffuseLight => Arc::new(DiffuseLight::new(desc.emissive)),
    }
}

/// BVH over the triangles of one mesh, all sharing the mesh material.
pub fn mesh_bvh(mesh: &MeshData, textures: &mut TextureCache) -> Option<BvhNode> {
    let material = material_from_desc(&mesh.material, textures);
    let triangles = mesh
        .triangles()
        .map(|[v0, v1, v2]| {
            Arc::new(Triangle::new(v0, v1, v2, material.clone())) as Arc<dyn Hittable>
        })
        .collect();
    BvhNode::new(triangles)
}

/// Two-level hierarchy: one BVH per mesh, then a BVH over the mesh roots.
pub fn model_bvh(model: &ModelData, textures: &mut TextureCache) -> Option<BvhNode> {
    let roots = model
        .meshes
        .iter()
        .filter_map(|mesh| mesh_bvh(mesh, textures))
        .map(|bvh| Arc::new(bvh) as Arc<dyn Hittable>)
        .collect();
    BvhNode::new(roots)
}

/// Load an OBJ model and view it with the configured camera.
pub fn external_model(path: &Path, camera: &CameraSettings) -> RenderResult<Scene> {
    let model = load_model(path)?;

    log::info!("Number of meshes in scene: {}", model.meshes.len());
    for (i, mesh) in model.meshes.iter().enumerate() {
        log::info!("Mesh #{} - Triangles: {}", i + 1, mesh.triangle_count());
    }
    log::info!("Total number of triangles in scene: {}", model.triangle_count());

    let mut textures = TextureCache::new();
    let world: Arc<dyn Hittable> = match model_bvh(&model, &mut textures) {
        Some(bvh) => Arc::new(bvh),
        None => {
            log::warn!("Model {} has no triangles", path.display());
            Arc::new(HittableList::new())
        }
    };
    log::debug!("{} texture images loaded", textures.len());

    Ok(Scene::new(world, Camera::from_settings(camera)))
}

// =============================================================================
// Built-in scenes
// =============================================================================

/// Camera preset for [`one_weekend_spheres`].
pub fn one_weekend_camera() -> CameraSettings {
    CameraSettings {
        aspect_ratio: [16.0, 9.0],
        image_width: 1920,
        vfov: 20.0,
        look_from: [13.0, 2.0, 3.0],
        look_at: [0.0, 0.0, 0.0],
        samples_per_pixel: 10,
        max_depth: 50,
        defocus_angle: 0.6,
        focus_distance: 10.0,
        background: [0.70, 0.80, 1.00],
        ..CameraSettings::default()
    }
}

/// The cover scene of "Ray Tracing in One Weekend": a grid of small random
/// spheres around three large ones. The layout is reproducible from `seed`.
pub fn one_weekend_spheres(seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();

    let ground = Arc::new(Lambertian::new(Color::splat(0.5)));
    objects.push(Arc::new(Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground)));

    let clearing = Vec3::new(4.0, 0.2, 0.0);
    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(&mut rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(&mut rng),
                0.2,
                b as f32 + 0.9 * gen_f32(&mut rng),
            );
            if (center - clearing).length() <= 0.9 {
                continue;
            }

            let material: Arc<dyn Material> = if choose_mat < 0.8 {
                let albedo = random_vec3(&mut rng, 0.0, 1.0) * random_vec3(&mut rng, 0.0, 1.0);
                Arc::new(Lambertian::new(albedo))
            } else if choose_mat < 0.95 {
                let albedo = random_vec3(&mut rng, 0.5, 1.0);
                let fuzz = gen_range_f32(&mut rng, 0.0, 0.5);
                Arc::new(Metal::new(albedo, fuzz))
            } else {
                Arc::new(Dielectric::new(1.5))
            };
            objects.push(Arc::new(Sphere::new(center, 0.2, material)));
        }
    }

    objects.push(Arc::new(Sphere::new(
        Vec3::new(0.0, 1.0, 0.0),
        1.0,
        Arc::new(Dielectric::new(1.5)),
    )));
    objects.push(Arc::new(Sphere::new(
        Vec3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1))),
    )));
    objects.push(Arc::new(Sphere::new(
        Vec3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)),
    )));

    log::debug!("One weekend scene: {} spheres", objects.len());
    Scene::new(
        into_world(objects),
        Camera::from_settings(&one_weekend_camera()),
    )
}

/// Corners of the 555-unit room shared by the box scenes.
const ROOM: [Vec3; 8] = [
    Vec3::new(555.0, 0.0, 0.0),
    Vec3::new(555.0, 555.0, 0.0),
    Vec3::new(555.0, 0.0, 555.0),
    Vec3::new(555.0, 555.0, 555.0),
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(0.0, 555.0, 0.0),
    Vec3::new(0.0, 0.0, 555.0),
    Vec3::new(0.0, 555.0, 555.0),
];

/// Two triangles `(a, b, c)` and `(d, e, f)` over room corners, with a
/// shared vertex normal.
fn room_quad(
    objects: &mut Vec<Arc<dyn Hittable>>,
    corners: [[usize; 3]; 2],
    normal: Vec3,
    material: &Arc<dyn Material>,
) {
    for [a, b, c] in corners {
        let vertex = |i: usize| Vertex::at(ROOM[i]).with_normal(normal);
        objects.push(Arc::new(Triangle::new(
            vertex(a),
            vertex(b),
            vertex(c),
            material.clone(),
        )));
    }
}

/// Ceiling light of the box scenes, 130 x 105 units just below y = 555.
fn ceiling_light(objects: &mut Vec<Arc<dyn Hittable>>, material: Arc<dyn Material>) {
    let corners = [
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(213.0, 554.0, 332.0),
        Vec3::new(343.0, 554.0, 227.0),
        Vec3::new(213.0, 554.0, 227.0),
    ];
    for [a, b, c] in [[0, 1, 2], [1, 2, 3]] {
        objects.push(Arc::new(Triangle::new(
            Vertex::at(corners[a]).with_normal(Vec3::NEG_Y),
            Vertex::at(corners[b]).with_normal(Vec3::NEG_Y),
            Vertex::at(corners[c]).with_normal(Vec3::NEG_Y),
            material.clone(),
        )));
    }
}

/// Camera preset for [`cornell_box`].
pub fn cornell_box_camera() -> CameraSettings {
    CameraSettings {
        aspect_ratio: [1.0, 1.0],
        image_width: 800,
        vfov: 40.0,
        look_from: [278.0, 278.0, -800.0],
        look_at: [278.0, 278.0, 0.0],
        samples_per_pixel: 10000,
        max_depth: 7,
        ..CameraSettings::default()
    }
}

/// Cornell box with a mirror sphere and a glass sphere.
pub fn cornell_box() -> Scene {
    let red: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.73)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let light = Arc::new(DiffuseLight::new(Color::splat(15.0)));

    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
    room_quad(&mut objects, [[0, 1, 2], [1, 2, 3]], Vec3::NEG_X, &green);
    room_quad(&mut objects, [[4, 5, 6], [5, 6, 7]], Vec3::X, &red);
    room_quad(&mut objects, [[4, 0, 6], [0, 6, 2]], Vec3::Y, &white);
    room_quad(&mut objects, [[3, 7, 1], [7, 1, 5]], Vec3::NEG_Y, &white);
    room_quad(&mut objects, [[6, 2, 7], [2, 7, 3]], Vec3::NEG_Z, &white);
    ceiling_light(&mut objects, light);

    objects.push(Arc::new(Sphere::new(
        Vec3::new(400.0, 82.5, 335.0),
        82.5,
        Arc::new(Metal::new(Color::ONE, 0.0)),
    )));
    objects.push(Arc::new(Sphere::new(
        Vec3::new(150.0, 82.5, 150.0),
        82.5,
        Arc::new(Dielectric::new(1.5)),
    )));

    Scene::new(
        into_world(objects),
        Camera::from_settings(&cornell_box_camera()),
    )
}

/// Camera preset for [`mirror_room`].
pub fn mirror_room_camera() -> CameraSettings {
    CameraSettings {
        aspect_ratio: [1.0, 1.0],
        image_width: 1000,
        vfov: 45.0,
        look_from: [100.0, 300.0, 550.0],
        look_at: [305.0, 300.0, 75.0],
        samples_per_pixel: 1000,
        max_depth: 40,
        ..CameraSettings::default()
    }
}

/// Closed room with facing mirrors, a checkered floor and a textured
/// sphere in the middle.
///
/// The sphere texture is read from [`MIRROR_ROOM_TEXTURE`]; if it cannot be
/// loaded the sphere renders magenta.
pub fn mirror_room(textures: &mut TextureCache) -> Scene {
    let mirror: Arc<dyn Material> = Arc::new(Metal::new(Color::splat(0.93), 0.0));
    let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.88)));
    let floor: Arc<dyn Material> = Arc::new(Lambertian::from_texture(Arc::new(
        CheckerTexture::from_colors(50.0, Color::splat(0.88), Color::ZERO),
    )));
    let light = Arc::new(DiffuseLight::new(Color::splat(25.0)));

    let mut objects: Vec<Arc<dyn Hittable>> = Vec::new();
    room_quad(&mut objects, [[0, 2, 4], [2, 6, 4]], Vec3::Y, &floor);
    room_quad(&mut objects, [[0, 1, 2], [1, 2, 3]], Vec3::NEG_X, &white);
    room_quad(&mut objects, [[4, 5, 6], [5, 6, 7]], Vec3::X, &white);
    room_quad(&mut objects, [[3, 7, 1], [7, 1, 5]], Vec3::NEG_Y, &white);
    room_quad(&mut objects, [[6, 2, 7], [2, 7, 3]], Vec3::NEG_Z, &mirror);
    room_quad(&mut objects, [[4, 0, 1], [4, 1, 5]], Vec3::Z, &mirror);
    ceiling_light(&mut objects, light);

    let globe = Arc::new(ImageTexture::new(textures.load_or_missing(MIRROR_ROOM_TEXTURE)));
    objects.push(Arc::new(Sphere::new(
        Vec3::splat(278.0),
        40.0,
        Arc::new(Lambertian::from_texture(globe)),
    )));

    Scene::new(
        into_world(objects),
        Camera::from_settings(&mirror_room_camera()),
    )
}
