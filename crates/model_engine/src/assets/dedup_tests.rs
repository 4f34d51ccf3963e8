//! Tests for vertex de-duplication over hand-built and parsed geometry

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::render::Vertex;
    use std::collections::HashSet;
    use std::io::Cursor;

    const CUBE_POSITIONS: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];

    /// Quad faces as position indices, counter-clockwise seen from outside
    const CUBE_FACES: [[u32; 4]; 6] = [
        [4, 5, 6, 7],
        [1, 0, 3, 2],
        [5, 1, 2, 6],
        [0, 4, 7, 3],
        [7, 6, 2, 3],
        [0, 1, 5, 4],
    ];

    const FACE_NORMALS: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    /// Box unwrap: every face has its own normal and its own UV square
    fn unwrapped_cube() -> GeometryData {
        let corners = CUBE_FACES
            .iter()
            .enumerate()
            .flat_map(|(face, quad)| {
                quad.iter()
                    .enumerate()
                    .map(move |(i, &p)| FaceCorner::new(p, face as u32, i as u32))
            })
            .collect();
        GeometryData {
            positions: CUBE_POSITIONS.to_vec(),
            normals: FACE_NORMALS.to_vec(),
            tex_coords: QUAD_UVS.to_vec(),
            corners,
            ..Default::default()
        }
    }

    /// Smooth cube: normal and UV are per position, so corners of different
    /// faces meeting at a position resolve to the same vertex
    fn shared_cube() -> GeometryData {
        let normals = CUBE_POSITIONS
            .iter()
            .map(|p| {
                let s = 1.0 / 3.0_f32.sqrt();
                [p[0] * s, p[1] * s, p[2] * s]
            })
            .collect();
        let tex_coords = CUBE_POSITIONS
            .iter()
            .map(|p| [(p[0] + 1.0) * 0.5, (p[1] + 1.0) * 0.5])
            .collect();
        let corners = CUBE_FACES
            .iter()
            .flat_map(|quad| quad.iter().map(|&p| FaceCorner::new(p, p, p)))
            .collect();
        GeometryData {
            positions: CUBE_POSITIONS.to_vec(),
            normals,
            tex_coords,
            corners,
            ..Default::default()
        }
    }

    fn assert_well_formed(data: &GeometryData, mesh: &MeshData) {
        assert_eq!(mesh.indices.len(), data.corners.len());
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        let unique: HashSet<Vertex> = mesh.vertices.iter().copied().collect();
        assert_eq!(unique.len(), mesh.vertices.len(), "output vertices must be unique");
    }

    /// 24 face corners with per-face UVs stay 24 distinct vertices
    #[test]
    fn test_unwrapped_cube_keeps_24_vertices() {
        let data = unwrapped_cube();
        assert_eq!(data.corners.len(), 24);

        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_well_formed(&data, &mesh);
    }

    /// 24 face corners sharing per-position attributes collapse to 8
    #[test]
    fn test_shared_cube_collapses_to_8_vertices() {
        let data = shared_cube();
        assert_eq!(data.corners.len(), 24);

        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_well_formed(&data, &mesh);
        for (corner, &index) in data.corners.iter().zip(&mesh.indices) {
            assert_eq!(mesh.vertices[index as usize].position, CUBE_POSITIONS[corner.position as usize]);
        }
    }

    /// Two independent runs give byte-identical buffers
    #[test]
    fn test_deterministic_output() {
        for data in [unwrapped_cube(), shared_cube()] {
            let first = remove_duplicates(&data).unwrap();
            let second = remove_duplicates(&data).unwrap();
            assert_eq!(
                bytemuck::cast_slice::<Vertex, u8>(&first.vertices),
                bytemuck::cast_slice::<Vertex, u8>(&second.vertices)
            );
            assert_eq!(first.indices, second.indices);
        }
    }

    /// C1 and C3 identical, C2 distinct: C1 comes first and C3 reuses it
    #[test]
    fn test_first_occurrence_order() {
        let data = GeometryData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0]],
            corners: vec![
                FaceCorner::new(1, 0, 1),
                FaceCorner::new(0, 0, 0),
                FaceCorner::new(1, 0, 1),
            ],
            ..Default::default()
        };
        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 0]);
        assert_eq!(mesh.vertices[0].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[1].position, [0.0, 0.0, 0.0]);
    }

    /// Different attribute indices that hold equal values still merge
    #[test]
    fn test_equal_values_under_different_indices_merge() {
        let data = GeometryData {
            positions: vec![[0.5, 0.5, 0.5], [0.5, 0.5, 0.5]],
            normals: vec![[0.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            tex_coords: vec![[0.25, 0.75], [0.25, 0.75]],
            corners: vec![FaceCorner::new(0, 0, 0), FaceCorner::new(1, 1, 1)],
            ..Default::default()
        };
        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 1);
        assert_eq!(mesh.indices, vec![0, 0]);
    }

    /// Equality is exact, nearly equal values stay apart
    #[test]
    fn test_no_epsilon_merging() {
        let data = GeometryData {
            positions: vec![[0.1, 0.0, 0.0], [0.1 + 1e-7, 0.0, 0.0]],
            corners: vec![
                FaceCorner { position: 0, normal: None, tex_coord: None },
                FaceCorner { position: 1, normal: None, tex_coord: None },
            ],
            ..Default::default()
        };
        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 2);
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let data = GeometryData {
            positions: vec![[1.0, 2.0, 3.0]],
            corners: vec![FaceCorner { position: 0, normal: None, tex_coord: None }],
            ..Default::default()
        };
        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices[0].normal, dedup::DEFAULT_NORMAL);
        assert_eq!(mesh.vertices[0].tex_coord, dedup::DEFAULT_TEX_COORD);
    }

    #[test]
    fn test_out_of_range_reference_is_error() {
        let data = GeometryData {
            positions: vec![[0.0; 3]],
            normals: vec![[0.0, 0.0, 1.0]],
            corners: vec![
                FaceCorner { position: 0, normal: Some(0), tex_coord: None },
                FaceCorner { position: 0, normal: Some(3), tex_coord: None },
            ],
            ..Default::default()
        };
        match remove_duplicates(&data) {
            Err(ModelError::IndexOutOfRange { corner, attribute, index, len }) => {
                assert_eq!((corner, attribute, index, len), (1, "normal", 3, 1));
            }
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let mesh = remove_duplicates(&GeometryData::default()).unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.indices.is_empty());
    }

    const CUBE_OBJ_UNWRAPPED: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
vn 0 0 -1
vn 1 0 0
vn -1 0 0
vn 0 1 0
vn 0 -1 0
f 5/1/1 6/2/1 7/3/1 8/4/1
f 2/1/2 1/2/2 4/3/2 3/4/2
f 6/1/3 2/2/3 3/3/3 7/4/3
f 1/1/4 5/2/4 8/3/4 4/4/4
f 8/1/5 7/2/5 3/3/5 4/4/5
f 1/1/6 2/2/6 6/3/6 5/4/6
";

    const CUBE_OBJ_SHARED: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vt 0 0.5
vt 1 0.5
vt 0.5 1
vt 0.5 0
vn -0.577 -0.577 -0.577
vn 0.577 -0.577 -0.577
vn 0.577 0.577 -0.577
vn -0.577 0.577 -0.577
vn -0.577 -0.577 0.577
vn 0.577 -0.577 0.577
vn 0.577 0.577 0.577
vn -0.577 0.577 0.577
f 5/5/5 6/6/6 7/7/7 8/8/8
f 2/2/2 1/1/1 4/4/4 3/3/3
f 6/6/6 2/2/2 3/3/3 7/7/7
f 1/1/1 5/5/5 8/8/8 4/4/4
f 8/8/8 7/7/7 3/3/3 4/4/4
f 1/1/1 2/2/2 6/6/6 5/5/5
";

    /// Parsed and triangulated: 6 faces x 2 triangles x 3 corners
    #[test]
    fn test_parsed_unwrapped_cube() {
        let data = ObjLoader::load_from_reader(&mut Cursor::new(CUBE_OBJ_UNWRAPPED)).unwrap();
        assert_eq!(data.corners.len(), 36);

        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_well_formed(&data, &mesh);
    }

    #[test]
    fn test_parsed_shared_cube() {
        let data = ObjLoader::load_from_reader(&mut Cursor::new(CUBE_OBJ_SHARED)).unwrap();
        assert_eq!(data.corners.len(), 36);

        let mesh = remove_duplicates(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_well_formed(&data, &mesh);
    }
}
