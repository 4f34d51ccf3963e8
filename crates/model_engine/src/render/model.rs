//! Loaded model metadata and the CPU-side asset behind it
//!
//! [`ModelAsset::load`] does every fallible CPU step of a model load (parse,
//! de-duplicate, decode textures) before a backend touches the GPU, so a bad
//! file is rejected while the previous resource set is still intact.

use std::path::{Path, PathBuf};

use log::info;

use crate::assets::{remove_duplicates, GeometryData, ImageData, MeshData, ModelError, ObjLoader};
use crate::foundation::math::Bounds;

/// Index sub-range drawn with one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    /// Index into the model's texture list, `None` for the default texture
    pub texture: Option<usize>,
    /// First index buffer entry
    pub first_index: u32,
    /// Number of indices
    pub index_count: u32,
}

/// Metadata of the currently loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// File the model was loaded from
    pub path: PathBuf,
    /// Unique vertices after de-duplication
    pub vertex_count: usize,
    /// Index buffer length
    pub index_count: usize,
    /// Material draw ranges
    pub draws: Vec<DrawRange>,
    /// Bounds of the vertex positions
    pub bounds: Bounds,
    /// Distinct textures referenced by materials
    pub texture_count: usize,
}

/// Everything needed to upload one model
#[derive(Debug, Clone)]
pub struct ModelAsset {
    /// Metadata exposed once the model is live
    pub model: Model,
    /// De-duplicated vertex and index data
    pub mesh: MeshData,
    /// Decoded textures, indexed by [`DrawRange::texture`]
    pub textures: Vec<ImageData>,
}

impl ModelAsset {
    /// Parse an OBJ file and decode its textures
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let geometry = ObjLoader::load(path)?;
        Self::from_geometry(path, &geometry, |p: &Path| ImageData::from_file(p))
    }

    /// Build an asset from parsed geometry
    ///
    /// `load_image` is called once per distinct texture path; any failure
    /// fails the whole asset.
    pub fn from_geometry<F>(path: &Path, geometry: &GeometryData, mut load_image: F) -> Result<Self, ModelError>
    where
        F: FnMut(&Path) -> Result<ImageData, ModelError>,
    {
        let bounds = match geometry.bounds() {
            Some(bounds) if !geometry.corners.is_empty() => bounds,
            _ => return Err(ModelError::Empty(path.to_path_buf())),
        };
        let mesh = remove_duplicates(geometry)?;

        let mut texture_paths: Vec<&Path> = Vec::new();
        let mut material_textures = Vec::with_capacity(geometry.materials.len());
        for material in &geometry.materials {
            let slot = material.diffuse_texture.as_deref().map(|texture| {
                match texture_paths.iter().position(|known| *known == texture) {
                    Some(existing) => existing,
                    None => {
                        texture_paths.push(texture);
                        texture_paths.len() - 1
                    }
                }
            });
            material_textures.push(slot);
        }

        let textures = texture_paths
            .iter()
            .map(|&texture| load_image(texture))
            .collect::<Result<Vec<_>, _>>()?;

        let mut draws: Vec<DrawRange> = geometry
            .material_ranges
            .iter()
            .map(|range| DrawRange {
                texture: range.material.and_then(|m| material_textures.get(m).copied().flatten()),
                first_index: range.first_index,
                index_count: range.index_count,
            })
            .collect();
        if draws.is_empty() {
            draws.push(DrawRange {
                texture: None,
                first_index: 0,
                index_count: mesh.indices.len() as u32,
            });
        }

        let model = Model {
            path: path.to_path_buf(),
            vertex_count: mesh.vertices.len(),
            index_count: mesh.indices.len(),
            draws,
            bounds,
            texture_count: textures.len(),
        };
        info!(
            "Prepared {:?}: {} vertices, {} indices, {} draw ranges, {} textures",
            model.path,
            model.vertex_count,
            model.index_count,
            model.draws.len(),
            model.texture_count
        );
        Ok(Self { model, mesh, textures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FaceCorner, MaterialInfo, MaterialRange};

    fn textured_quad() -> GeometryData {
        GeometryData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            corners: [0, 1, 2, 0, 2, 3].iter().map(|&i| FaceCorner::new(i, 0, i)).collect(),
            material_ranges: vec![
                MaterialRange { material: Some(0), first_index: 0, index_count: 3 },
                MaterialRange { material: Some(2), first_index: 3, index_count: 3 },
            ],
            materials: vec![
                MaterialInfo { name: "a".into(), diffuse_texture: Some("brick.png".into()) },
                MaterialInfo { name: "b".into(), diffuse_texture: None },
                MaterialInfo { name: "c".into(), diffuse_texture: Some("brick.png".into()) },
            ],
        }
    }

    #[test]
    fn test_textures_shared_by_path() {
        let mut loads = Vec::new();
        let asset = ModelAsset::from_geometry(Path::new("quad.obj"), &textured_quad(), |p| {
            loads.push(p.to_path_buf());
            Ok(ImageData::solid_color(1, 1, [255; 4]))
        })
        .unwrap();

        assert_eq!(loads, vec![PathBuf::from("brick.png")]);
        assert_eq!(asset.textures.len(), 1);
        assert_eq!(asset.model.draws[0].texture, Some(0));
        assert_eq!(asset.model.draws[1].texture, Some(0));
        assert_eq!(asset.model.vertex_count, 4);
        assert_eq!(asset.model.index_count, 6);
    }

    #[test]
    fn test_missing_texture_fails_load() {
        let result = ModelAsset::from_geometry(Path::new("quad.obj"), &textured_quad(), |p| {
            Err(ModelError::Image {
                path: p.to_path_buf(),
                reason: "not found".into(),
            })
        });
        assert!(matches!(result, Err(ModelError::Image { .. })));
    }

    #[test]
    fn test_untextured_model_gets_one_draw() {
        let mut geometry = textured_quad();
        geometry.material_ranges.clear();
        geometry.materials.clear();
        let asset = ModelAsset::from_geometry(Path::new("quad.obj"), &geometry, |_| unreachable!()).unwrap();
        assert_eq!(
            asset.model.draws,
            vec![DrawRange { texture: None, first_index: 0, index_count: 6 }]
        );
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let result = ModelAsset::from_geometry(Path::new("empty.obj"), &GeometryData::default(), |_| unreachable!());
        assert!(matches!(result, Err(ModelError::Empty(_))));
    }
}
