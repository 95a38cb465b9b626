//! Model loading
//!
//! A loaded model is its path plus one model-space triangle mesh gathered
//! from every triangle primitive of its default scene, with node transforms
//! baked in. The same mesh is drawn and used for ground contact.
//!
//! In the browser, bytes come from `fetch()`. Parsing is shared with native
//! builds so it can be tested without a browser.

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3};
use thiserror::Error;

use crate::sim::collision::Aabb;
use crate::sim::mesh::{DEFAULT_COLOR, ModelMesh, smooth_normals};

/// Why a model could not be turned into a mesh
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },

    #[error("fetching {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: gltf::Error,
    },

    #[error("{path} has no readable triangle geometry")]
    EmptyModel { path: String },
}

/// A model ready to be placed in a level
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub path: String,
    pub mesh: Arc<ModelMesh>,
}

impl LoadedModel {
    pub fn new(path: &str, mesh: ModelMesh) -> Self {
        Self {
            path: path.to_string(),
            mesh: Arc::new(mesh),
        }
    }

    /// A plain box standing in for a real model
    pub fn cuboid(path: &str, bounds: Aabb) -> Self {
        Self::new(path, ModelMesh::cuboid(&bounds, DEFAULT_COLOR))
    }
}

/// Triangles gathered across primitives before they become a [`ModelMesh`]
#[derive(Default)]
struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<[f32; 4]>,
    triangles: Vec<[u32; 3]>,
}

/// Parse a `.glb` (or a `.gltf` with its buffers embedded as a binary
/// chunk) and flatten its default scene.
pub fn parse_model(path: &str, bytes: &[u8]) -> Result<LoadedModel, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::Parse {
        path: path.to_string(),
        source,
    })?;
    let blob = gltf.blob.as_deref();

    let mut builder = MeshBuilder::default();
    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, blob, &mut builder);
        }
    }

    let triangle_count = builder.triangles.len();
    let mesh = ModelMesh::new(
        builder.positions,
        builder.normals,
        builder.colors,
        builder.triangles,
    )
    .ok_or_else(|| AssetError::EmptyModel {
        path: path.to_string(),
    })?;

    log::debug!(
        "{}: {} triangles, bounds {:?} .. {:?}",
        path,
        triangle_count,
        mesh.bounds.min,
        mesh.bounds.max
    );
    Ok(LoadedModel::new(path, mesh))
}

/// Walk a node subtree, appending every triangle primitive in model space
fn collect_node(node: &gltf::Node, parent: Mat4, blob: Option<&[u8]>, out: &mut MeshBuilder) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
        // A mirroring transform turns counter-clockwise triangles around
        let flip = transform.determinant() < 0.0;

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping {:?} primitive", primitive.mode());
                continue;
            }

            let reader = primitive.reader(|buffer| match buffer.source() {
                gltf::buffer::Source::Bin => blob,
                gltf::buffer::Source::Uri(_) => None,
            });

            let Some(positions) = reader.read_positions() else {
                log::warn!("Primitive without readable positions, skipping");
                continue;
            };
            let positions: Vec<Vec3> = positions
                .map(|p| transform.transform_point3(Vec3::from_array(p)))
                .collect();
            let count = positions.len() as u32;

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..count).collect());
            let triangles: Vec<[u32; 3]> = indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < count))
                .map(|tri| match flip {
                    true => [tri[0], tri[2], tri[1]],
                    false => [tri[0], tri[1], tri[2]],
                })
                .collect();

            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(iter) => iter
                    .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or(Vec3::Y))
                    .collect(),
                None => Vec::new(),
            };
            let normals = if normals.len() == positions.len() {
                normals
            } else {
                smooth_normals(&positions, &triangles)
            };

            let color = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();

            let base = out.positions.len() as u32;
            out.triangles.extend(triangles.iter().map(|tri| tri.map(|i| i + base)));
            out.colors.extend(std::iter::repeat_n(color, positions.len()));
            out.positions.extend(positions);
            out.normals.extend(normals);
        }
    }

    for child in node.children() {
        collect_node(&child, transform, blob, out);
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    fn fetch_error(path: &str, err: wasm_bindgen::JsValue) -> AssetError {
        AssetError::Fetch {
            path: path.to_string(),
            message: format!("{:?}", err),
        }
    }

    /// Download a file relative to the page
    pub async fn fetch_bytes(path: &str) -> Result<Vec<u8>, AssetError> {
        let window = web_sys::window().ok_or_else(|| AssetError::Fetch {
            path: path.to_string(),
            message: "no window".to_string(),
        })?;

        let response = JsFuture::from(window.fetch_with_str(path))
            .await
            .map_err(|e| fetch_error(path, e))?;
        let response: web_sys::Response = response.dyn_into().map_err(|e| fetch_error(path, e))?;

        if !response.ok() {
            return Err(AssetError::Status {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let buffer = response.array_buffer().map_err(|e| fetch_error(path, e))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| fetch_error(path, e))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    /// Download and parse a model
    pub async fn fetch_model(path: &str) -> Result<LoadedModel, AssetError> {
        let bytes = fetch_bytes(path).await?;
        parse_model(path, &bytes)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{fetch_bytes, fetch_model};

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a binary glTF container from a JSON chunk and a BIN chunk
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// One upward-facing, unindexed triangle under a translated, scaled node
    const SCALED_TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{
            "mesh": 0,
            "translation": [0.0, 1.0, 0.0],
            "scale": [2.0, 2.0, 2.0]
        }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [-1.0, 0.0, -1.0],
            "max": [1.0, 0.0, 1.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36 }]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        floats(&[-1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 1.0, 0.0, -1.0])
    }

    #[test]
    fn test_triangles_include_node_transform() {
        let bytes = glb(SCALED_TRIANGLE, &triangle_bin());
        let model = parse_model("triangle.glb", &bytes).unwrap();
        assert_eq!(model.path, "triangle.glb");

        let mesh = &model.mesh;
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert!((mesh.bounds.min - Vec3::new(-2.0, 1.0, -2.0)).length() < 1e-5);
        assert!((mesh.bounds.max - Vec3::new(2.0, 1.0, 2.0)).length() < 1e-5);
        // No normals shipped: derived from the winding
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-5);
        }
        assert!(mesh.colors.iter().all(|c| *c == DEFAULT_COLOR));
    }

    #[test]
    fn test_indexed_quad_with_material() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "materials": [{
                "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] }
            }],
            "meshes": [{ "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "material": 0
            }] }],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 4,
                    "type": "VEC3",
                    "min": [0.0, 0.0, 0.0],
                    "max": [1.0, 0.0, 1.0]
                },
                {
                    "bufferView": 1,
                    "componentType": 5123,
                    "count": 6,
                    "type": "SCALAR"
                }
            ],
            "bufferViews": [
                { "buffer": 0, "byteLength": 48 },
                { "buffer": 0, "byteOffset": 48, "byteLength": 12 }
            ],
            "buffers": [{ "byteLength": 60 }]
        }"#;
        let mut bin = floats(&[
            0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            1.0, 0.0, 1.0, //
            1.0, 0.0, 0.0,
        ]);
        for i in [0u16, 1, 2, 0, 2, 3] {
            bin.extend_from_slice(&i.to_le_bytes());
        }

        let model = parse_model("quad.glb", &glb(json, &bin)).unwrap();
        assert_eq!(model.mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert!(model.mesh.colors.iter().all(|c| *c == [0.5, 0.25, 1.0, 1.0]));
    }

    #[test]
    fn test_external_buffers_are_not_fetched() {
        // Same document, but the buffer lives in a separate file
        let json = SCALED_TRIANGLE.replace(
            r#""buffers": [{ "byteLength": 36 }]"#,
            r#""buffers": [{ "byteLength": 36, "uri": "triangle.bin" }]"#,
        );
        let err = parse_model("triangle.gltf", json.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetError::EmptyModel { .. }));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = parse_model("broken.glb", b"definitely not gltf").unwrap_err();
        assert!(matches!(err, AssetError::Parse { .. }));
        assert!(err.to_string().contains("broken.glb"));
    }

    #[test]
    fn test_scene_without_meshes_is_empty() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "translation": [1.0, 2.0, 3.0] }]
        }"#;
        let err = parse_model("empty.gltf", json.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetError::EmptyModel { .. }));
    }

    #[test]
    fn test_status_error_message() {
        let err = AssetError::Status {
            path: "./assets/models/sand.glb".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "fetching ./assets/models/sand.glb returned HTTP 404"
        );
    }
}
