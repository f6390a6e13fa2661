//! Wavefront OBJ/MTL model loading.
//!
//! Models are triangulated on load. Each OBJ object becomes one mesh with a
//! single material; material parameters come from the sibling MTL library.

use std::path::{Path, PathBuf};

use lux_math::{Vec2, Vec3};
use thiserror::Error;

use crate::material::{IllumModel, MaterialDesc};
use crate::mesh::{MeshData, MeshError, Vertex};

/// Errors that can occur while loading a model.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load model {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Failed to load material library for {path}: {source}")]
    Materials {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Malformed mesh '{mesh}' in {path}: {source}")]
    Mesh {
        path: PathBuf,
        mesh: String,
        #[source]
        source: MeshError,
    },

    #[error("Mesh '{mesh}' references unknown material #{material_id}")]
    UnknownMaterial { mesh: String, material_id: usize },
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Load an OBJ file and its material library.
///
/// Texture paths in the material library are resolved relative to the OBJ
/// file's directory; the images themselves are not decoded here.
pub fn load_model(path: impl AsRef<Path>) -> AssetResult<crate::ModelData> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.map_err(|source| AssetError::Materials {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let descs: Vec<MaterialDesc> = materials
        .iter()
        .map(|m| material_desc(m, base_dir))
        .collect();

    let mut meshes = Vec::with_capacity(models.len());
    for model in &models {
        let material = match model.mesh.material_id {
            Some(id) => descs
                .get(id)
                .cloned()
                .ok_or_else(|| AssetError::UnknownMaterial {
                    mesh: model.name.clone(),
                    material_id: id,
                })?,
            None => MaterialDesc::default(),
        };

        let mesh = convert_mesh(&model.name, &model.mesh, material).map_err(|source| {
            AssetError::Mesh {
                path: path.to_path_buf(),
                mesh: model.name.clone(),
                source,
            }
        })?;

        log::debug!(
            "Mesh '{}': {} triangles, material '{}' ({:?})",
            mesh.name,
            mesh.triangle_count(),
            mesh.material.name,
            mesh.material.kind()
        );
        meshes.push(mesh);
    }

    Ok(crate::ModelData { meshes })
}

/// Build a validated mesh from tobj buffers.
fn convert_mesh(name: &str, mesh: &tobj::Mesh, material: MaterialDesc) -> Result<MeshData, MeshError> {
    // Triangulation leaves face_arities empty; anything else is a polygon
    if let Some(&arity) = mesh.face_arities.iter().find(|&&a| a != 3) {
        return Err(MeshError::NotTriangulated(arity as usize));
    }

    let vertex_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_uvs = mesh.texcoords.len() / 2 == vertex_count;

    let vertices = (0..vertex_count)
        .map(|i| {
            let position = Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]);
            let normal = if has_normals {
                Vec3::from_slice(&mesh.normals[i * 3..i * 3 + 3])
            } else {
                Vec3::Y
            };
            let uv = if has_uvs {
                Vec2::from_slice(&mesh.texcoords[i * 2..i * 2 + 2])
            } else {
                Vec2::ZERO
            };
            Vertex::new(position, normal, uv)
        })
        .collect();

    let mut data = MeshData::new(name, vertices, mesh.indices.clone(), material)?;
    if !has_normals {
        log::debug!("Mesh '{}' has no normals, computing smooth normals", name);
        data.compute_normals();
    }
    Ok(data)
}

/// Translate a tobj material into a description.
fn material_desc(m: &tobj::Material, base_dir: &Path) -> MaterialDesc {
    let defaults = MaterialDesc::default();
    // "Ke" left unparsed by the reader still counts
    let emissive = m
        .emissive
        .map(Vec3::from_array)
        .or_else(|| m.unknown_param.get("Ke").and_then(|s| parse_vec3(s)))
        .unwrap_or(defaults.emissive);

    MaterialDesc {
        name: m.name.clone(),
        illum: m
            .illumination_model
            .map(IllumModel::from)
            .unwrap_or(defaults.illum),
        diffuse: m.diffuse.map(Vec3::from_array).unwrap_or(defaults.diffuse),
        specular: m.specular.map(Vec3::from_array).unwrap_or(defaults.specular),
        emissive,
        shininess: m.shininess.unwrap_or(defaults.shininess),
        ior: m.optical_density.unwrap_or(defaults.ior),
        diffuse_texture: m
            .diffuse_texture
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| base_dir.join(t)),
    }
}

/// Parse "r g b" into a vector.
fn parse_vec3(s: &str) -> Option<Vec3> {
    let mut it = s.split_whitespace().map(|t| t.parse::<f32>());
    match (it.next(), it.next(), it.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialKind;
    use std::fs;

    const QUAD_OBJ: &str = "\
mtllib scene.mtl
o Panel
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl lamp
f 1/1/1 2/2/1 3/3/1 4/4/1
o Shard
v 0 0 1
v 1 0 1
v 0 1 1
usemtl mirror
f 5 6 7
";

    const QUAD_MTL: &str = "\
newmtl lamp
Kd 0 0 0
Ke 4 4 4
illum 2

newmtl mirror
Ks 0.9 0.8 0.7
Ns 900
illum 3
map_Kd textures/scratches.png
";

    fn write_scene(dir: &Path) -> PathBuf {
        let obj = dir.join("scene.obj");
        fs::write(&obj, QUAD_OBJ).unwrap();
        fs::write(dir.join("scene.mtl"), QUAD_MTL).unwrap();
        obj
    }

    #[test]
    fn test_load_model_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model(write_scene(dir.path())).unwrap();

        assert_eq!(model.meshes.len(), 2);
        // The quad is triangulated
        assert_eq!(model.meshes[0].triangle_count(), 2);
        assert_eq!(model.meshes[1].triangle_count(), 1);
        assert_eq!(model.triangle_count(), 3);
    }

    #[test]
    fn test_load_model_materials() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model(write_scene(dir.path())).unwrap();

        let lamp = &model.meshes[0].material;
        assert_eq!(lamp.kind(), MaterialKind::DiffuseLight);
        assert_eq!(lamp.emissive, Vec3::splat(4.0));

        let mirror = &model.meshes[1].material;
        assert_eq!(mirror.kind(), MaterialKind::Metal);
        assert!((mirror.fuzz() - 0.1).abs() < 1e-5);
        assert_eq!(
            mirror.diffuse_texture.as_deref(),
            Some(dir.path().join("textures/scratches.png").as_path())
        );
    }

    #[test]
    fn test_load_model_vertex_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model(write_scene(dir.path())).unwrap();

        let panel = &model.meshes[0];
        for v in panel.vertices() {
            assert_eq!(v.normal, Vec3::Z);
        }
        assert!(panel.vertices().iter().any(|v| v.uv == Vec2::new(1.0, 1.0)));

        // The shard has no normals in the file; they are computed (+Z)
        for v in model.meshes[1].vertices() {
            assert!((v.normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_load_model_missing_file() {
        let err = load_model("/nonexistent/model.obj").unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }

    #[test]
    fn test_material_desc_emission() {
        let parsed = tobj::Material {
            name: "lamp".to_string(),
            emissive: Some([2.0, 3.0, 4.0]),
            illumination_model: Some(2),
            ..Default::default()
        };
        let desc = material_desc(&parsed, Path::new(""));
        assert_eq!(desc.emissive, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(desc.kind(), MaterialKind::DiffuseLight);

        let mut unparsed = tobj::Material {
            illumination_model: Some(2),
            ..Default::default()
        };
        unparsed
            .unknown_param
            .insert("Ke".to_string(), "1 1 1".to_string());
        assert_eq!(material_desc(&unparsed, Path::new("")).emissive, Vec3::ONE);

        let plain = tobj::Material::default();
        assert_eq!(material_desc(&plain, Path::new("")).kind(), MaterialKind::Lambertian);
    }

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1 2.5 3"), Some(Vec3::new(1.0, 2.5, 3.0)));
        assert_eq!(parse_vec3("1 2"), None);
        assert_eq!(parse_vec3("a b c"), None);
    }
}
