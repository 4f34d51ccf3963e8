//! Vertex de-duplication
//!
//! Collapses face corners that resolve to the same (position, normal,
//! texture coordinate) triple into one vertex. Vertices are emitted in order
//! of first occurrence, so the output depends only on the input order and
//! repeated runs produce byte-identical buffers.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::assets::{FaceCorner, GeometryData, ModelError};
use crate::render::Vertex;

/// Normal used for corners without one
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 0.0];
/// Texture coordinate used for corners without one
pub const DEFAULT_TEX_COORD: [f32; 2] = [0.0, 0.0];

/// Indexed vertex data ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Unique vertices, in first-occurrence order
    pub vertices: Vec<Vertex>,
    /// One entry per input face corner
    pub indices: Vec<u32>,
}

fn lookup<T: Copy>(
    values: &[T],
    index: u32,
    corner: usize,
    attribute: &'static str,
) -> Result<T, ModelError> {
    values
        .get(index as usize)
        .copied()
        .ok_or(ModelError::IndexOutOfRange {
            corner,
            attribute,
            index,
            len: values.len(),
        })
}

fn resolve(data: &GeometryData, corner_index: usize, corner: &FaceCorner) -> Result<Vertex, ModelError> {
    let position = lookup(&data.positions, corner.position, corner_index, "position")?;
    let normal = match corner.normal {
        Some(n) => lookup(&data.normals, n, corner_index, "normal")?,
        None => DEFAULT_NORMAL,
    };
    let tex_coord = match corner.tex_coord {
        Some(t) => lookup(&data.tex_coords, t, corner_index, "texture coordinate")?,
        None => DEFAULT_TEX_COORD,
    };
    Ok(Vertex::new(position, normal, tex_coord))
}

/// Build a vertex/index buffer pair from loosely indexed geometry
///
/// Two corners share a vertex exactly when their resolved attributes are
/// bit-for-bit equal. The index buffer has one entry per corner and every
/// entry is below `vertices.len()`.
pub fn remove_duplicates(data: &GeometryData) -> Result<MeshData, ModelError> {
    let mut mesh = MeshData {
        vertices: Vec::new(),
        indices: Vec::with_capacity(data.corners.len()),
    };
    let mut seen: HashMap<Vertex, u32> = HashMap::with_capacity(data.corners.len());

    for (corner_index, corner) in data.corners.iter().enumerate() {
        let vertex = resolve(data, corner_index, corner)?;
        let index = match seen.entry(vertex) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let index = u32::try_from(mesh.vertices.len()).map_err(|_| ModelError::TooManyVertices)?;
                mesh.vertices.push(vertex);
                *entry.insert(index)
            }
        };
        mesh.indices.push(index);
    }

    log::debug!(
        "De-duplicated {} corners into {} vertices",
        data.corners.len(),
        mesh.vertices.len()
    );
    Ok(mesh)
}
