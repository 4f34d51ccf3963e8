//! OBJ geometry loading
//!
//! Parsing is delegated to `tobj`. Its output keeps separate index streams
//! for positions, normals and texture coordinates, which is exactly the
//! loosely indexed form [`remove_duplicates`](super::remove_duplicates)
//! expects. Meshes from different groups are concatenated into one
//! [`GeometryData`] with their attribute indices rebased.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::assets::ModelError;
use crate::foundation::math::Bounds;

/// One corner of a triangle, indexing into the attribute arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    /// Index into `positions`
    pub position: u32,
    /// Index into `normals`, if the face has normals
    pub normal: Option<u32>,
    /// Index into `tex_coords`, if the face has texture coordinates
    pub tex_coord: Option<u32>,
}

impl FaceCorner {
    /// Corner referencing all three attributes
    pub const fn new(position: u32, normal: u32, tex_coord: u32) -> Self {
        Self {
            position,
            normal: Some(normal),
            tex_coord: Some(tex_coord),
        }
    }
}

/// A run of consecutive corners drawn with one material (`usemtl`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialRange {
    /// Index into [`GeometryData::materials`], `None` for the default material
    pub material: Option<usize>,
    /// First corner (and index buffer entry) of the run
    pub first_index: u32,
    /// Number of corners in the run
    pub index_count: u32,
}

/// Material data the renderer cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialInfo {
    /// Material name from the MTL file
    pub name: String,
    /// Diffuse texture, resolved relative to the OBJ file
    pub diffuse_texture: Option<PathBuf>,
}

/// Raw geometry as produced by the loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle corners, three per triangle
    pub corners: Vec<FaceCorner>,
    /// Material runs covering `corners`
    pub material_ranges: Vec<MaterialRange>,
    /// Materials referenced by `material_ranges`
    pub materials: Vec<MaterialInfo>,
}

impl GeometryData {
    /// Bounds of all positions
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.positions.iter())
    }
}

/// OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        }
    }

    /// Load an OBJ file and its MTL library
    ///
    /// A missing or broken MTL file is logged and the model is drawn with the
    /// default material; a missing OBJ file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<GeometryData, ModelError> {
        let path = path.as_ref();
        debug!("Loading OBJ from: {:?}", path);

        let (models, materials) =
            tobj::load_obj(path, &Self::load_options()).map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!("Ignoring material library for {:?}: {}", path, e);
            Vec::new()
        });
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let geometry = Self::assemble(&models, &materials, base_dir);
        info!(
            "Loaded {:?}: {} corners, {} positions, {} materials",
            path,
            geometry.corners.len(),
            geometry.positions.len(),
            geometry.materials.len()
        );
        Ok(geometry)
    }

    /// Load OBJ text from a reader, without materials
    pub fn load_from_reader<R: BufRead>(reader: &mut R) -> Result<GeometryData, ModelError> {
        let (models, _) = tobj::load_obj_buf(reader, &Self::load_options(), |_| {
            Ok((Vec::new(), Default::default()))
        })
        .map_err(|e| ModelError::Parse {
            path: "<memory>".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::assemble(&models, &[], Path::new("")))
    }

    fn assemble(models: &[tobj::Model], materials: &[tobj::Material], base_dir: &Path) -> GeometryData {
        let mut geometry = GeometryData {
            materials: materials
                .iter()
                .map(|m| MaterialInfo {
                    name: m.name.clone(),
                    diffuse_texture: m
                        .diffuse_texture
                        .as_ref()
                        .filter(|t| !t.is_empty())
                        .map(|t| base_dir.join(t)),
                })
                .collect(),
            ..Default::default()
        };

        for model in models {
            let mesh = &model.mesh;
            if mesh.indices.is_empty() {
                continue;
            }

            let position_base = geometry.positions.len() as u32;
            let normal_base = geometry.normals.len() as u32;
            let tex_coord_base = geometry.tex_coords.len() as u32;

            geometry
                .positions
                .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
            geometry
                .normals
                .extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
            geometry
                .tex_coords
                .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));

            // Partial attribute streams cannot be matched to corners
            let has_normals = mesh.normal_indices.len() == mesh.indices.len();
            let has_tex_coords = mesh.texcoord_indices.len() == mesh.indices.len();
            if !has_normals && !mesh.normal_indices.is_empty() {
                warn!("Mesh '{}' has normals on only some faces, ignoring them", model.name);
            }
            if !has_tex_coords && !mesh.texcoord_indices.is_empty() {
                warn!("Mesh '{}' has texture coordinates on only some faces, ignoring them", model.name);
            }

            let first_index = geometry.corners.len() as u32;
            geometry
                .corners
                .extend(mesh.indices.iter().enumerate().map(|(i, &position)| FaceCorner {
                    position: position_base + position,
                    normal: has_normals.then(|| normal_base + mesh.normal_indices[i]),
                    tex_coord: has_tex_coords.then(|| tex_coord_base + mesh.texcoord_indices[i]),
                }));

            let material = mesh.material_id.filter(|&id| id < geometry.materials.len());
            let index_count = mesh.indices.len() as u32;
            match geometry.material_ranges.last_mut() {
                Some(last) if last.material == material => last.index_count += index_count,
                _ => geometry.material_ranges.push(MaterialRange {
                    material,
                    first_index,
                    index_count,
                }),
            }
        }

        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
vt 0 0
vt 1 0
vt 0 1
f 1/1/1 2/2/1 3/3/1
";

    fn load(text: &str) -> GeometryData {
        ObjLoader::load_from_reader(&mut Cursor::new(text)).unwrap()
    }

    #[test]
    fn test_triangle() {
        let geometry = load(TRIANGLE);
        assert_eq!(geometry.positions.len(), 3);
        assert_eq!(geometry.normals, vec![[0.0, 0.0, 1.0]]);
        assert_eq!(geometry.corners.len(), 3);
        assert!(geometry.corners.iter().all(|c| c.normal == Some(0)));
        assert_eq!(
            geometry.material_ranges,
            vec![MaterialRange { material: None, first_index: 0, index_count: 3 }]
        );
    }

    #[test]
    fn test_quad_is_triangulated() {
        let geometry = load("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        assert_eq!(geometry.corners.len(), 6);
        assert!(geometry.corners.iter().all(|c| c.normal.is_none() && c.tex_coord.is_none()));
    }

    #[test]
    fn test_groups_are_rebased() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
o first
f 1 2 3
o second
v 5 5 5
f 2 3 4
";
        let geometry = load(text);
        assert_eq!(geometry.corners.len(), 6);
        for corner in &geometry.corners {
            assert!((corner.position as usize) < geometry.positions.len());
        }
        let last = geometry.corners[5];
        assert_eq!(geometry.positions[last.position as usize], [5.0, 5.0, 5.0]);
        assert_eq!(geometry.material_ranges.len(), 1);
        assert_eq!(geometry.material_ranges[0].index_count, 6);
    }

    #[test]
    fn test_bounds() {
        let bounds = load(TRIANGLE).bounds().unwrap();
        assert_eq!(bounds.max.x, 1.0);
        assert_eq!(bounds.max.y, 1.0);
        assert_eq!(bounds.min.z, 0.0);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let result = ObjLoader::load("no/such/model.obj");
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }
}
