//! OBJ model loading via `tobj`. All models in a file are merged into a
//! single [`GeometryData`]; missing normals are recomputed from faces.

use std::path::Path;

use super::GeometryData;
use crate::error::EngineError;

/// Loads an OBJ file into a single geometry, triangulated and re-indexed
/// so positions, normals and UVs share one index stream.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<GeometryData, EngineError> {
    let (models, _materials) = tobj::load_obj(
        path.as_ref(),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut data = GeometryData::new();
    for model in &models {
        let mesh = &model.mesh;
        let base = data.positions.len() as u32;

        for position in mesh.positions.chunks_exact(3) {
            data.positions.push([position[0], position[1], position[2]]);
        }
        for normal in mesh.normals.chunks_exact(3) {
            data.normals.push([normal[0], normal[1], normal[2]]);
        }
        for uv in mesh.texcoords.chunks_exact(2) {
            // OBJ UVs are bottom-left origin.
            data.uvs.push([uv[0], 1.0 - uv[1]]);
        }
        data.indices.extend(mesh.indices.iter().map(|i| base + i));
    }

    if data.positions.is_empty() {
        return Err(EngineError::EmptyModel);
    }
    if data.normals.len() != data.positions.len() {
        data.compute_normals();
    }
    if data.uvs.len() != data.positions.len() {
        data.uvs.resize(data.positions.len(), [0.0, 0.0]);
    }
    data.compute_tangents();

    Ok(data)
}
