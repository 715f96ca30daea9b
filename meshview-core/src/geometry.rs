/// Geometry primitives: object-space vertices, indexed faces and meshes
use std::path::Path;

use log::info;
use nalgebra::Point3;
use serde::Deserialize;

use crate::error::{RenderError, Result};
use crate::obj;

/// A vertex in object space, conventionally within [-1, 1] on every axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
        }
    }
}

/// A triangle as three indices into the mesh's vertex list.
/// The order of the indices is the winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub indices: [usize; 3],
}

impl Face {
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self { indices: [i, j, k] }
    }
}

/// An indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

/// Shape of the mesh payload returned by the model generation backend.
/// Unknown keys (normals, stats, the encoded OBJ) are ignored.
#[derive(Deserialize)]
struct MeshPayload {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Build a mesh from a `{"vertices": [[x, y, z]], "faces": [[i, j, k]]}` document
    pub fn from_json(input: &str) -> Result<Self> {
        let payload: MeshPayload = serde_json::from_str(input)?;
        Ok(Self {
            vertices: payload
                .vertices
                .into_iter()
                .map(|[x, y, z]| Vertex::new(x, y, z))
                .collect(),
            faces: payload
                .faces
                .into_iter()
                .map(|[i, j, k]| Face::new(i, j, k))
                .collect(),
        })
    }

    /// Build a mesh from flat `xyz` position and `ijk` index arrays
    pub fn from_buffers(positions: &[f32], indices: &[u32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(RenderError::MeshBuffer {
                kind: "vertex",
                len: positions.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(RenderError::MeshBuffer {
                kind: "face",
                len: indices.len(),
            });
        }

        Ok(Self {
            vertices: positions
                .chunks_exact(3)
                .map(|p| Vertex::new(p[0], p[1], p[2]))
                .collect(),
            faces: indices
                .chunks_exact(3)
                .map(|f| Face::new(f[0] as usize, f[1] as usize, f[2] as usize))
                .collect(),
        })
    }

    /// Load a mesh from an `.obj` file or a `.json` backend response
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let mesh = match extension.as_deref() {
            Some("obj") => obj::parse_obj(&std::fs::read_to_string(path)?)?,
            Some("json") => Self::from_json(&std::fs::read_to_string(path)?)?,
            _ => return Err(RenderError::UnsupportedMeshFormat(path.display().to_string())),
        };

        info!(
            "Loaded {} ({} vertices, {} faces)",
            path.display(),
            mesh.vertices.len(),
            mesh.faces.len()
        );
        Ok(mesh)
    }

    /// Create an axis-aligned cube centred on the origin.
    /// Every face is wound counter-clockwise when seen from outside.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(8, 12);

        for &(x, y, z) in &[
            (-h, -h, -h),
            (h, -h, -h),
            (h, h, -h),
            (-h, h, -h),
            (-h, -h, h),
            (h, -h, h),
            (h, h, h),
            (-h, h, h),
        ] {
            mesh.add_vertex(Vertex::new(x, y, z));
        }

        let quads = [
            [4, 5, 6, 7], // front  (+z)
            [1, 0, 3, 2], // back   (-z)
            [3, 7, 6, 2], // top    (+y)
            [0, 1, 5, 4], // bottom (-y)
            [5, 1, 2, 6], // right  (+x)
            [0, 4, 7, 3], // left   (-x)
        ];
        for [a, b, c, d] in quads {
            mesh.add_face(Face::new(a, b, c));
            mesh.add_face(Face::new(a, c, d));
        }

        mesh
    }

    /// The placeholder relief produced by the model generation backend: a
    /// raised front grid over [-1, 1]² and a flat back plate behind it.
    /// The front grid is wound to face +z (towards the viewer) and the back
    /// plate to face -z.
    pub fn relief_grid(grid_size: usize) -> Self {
        let side = grid_size + 1;
        let mut mesh = Self::with_capacity(2 * side * side, 4 * grid_size * grid_size);

        let coord = |n: usize| (n as f32 / grid_size.max(1) as f32 - 0.5) * 2.0;

        for i in 0..side {
            for j in 0..side {
                let (x, y) = (coord(j), -coord(i));
                let z = (0.3 - (x * x + y * y).sqrt() * 0.15).max(0.0);
                mesh.add_vertex(Vertex::new(x, y, z));
            }
        }
        for i in 0..grid_size {
            for j in 0..grid_size {
                let v1 = i * side + j;
                let (v2, v3, v4) = (v1 + 1, v1 + side, v1 + side + 1);
                mesh.add_face(Face::new(v1, v3, v2));
                mesh.add_face(Face::new(v2, v3, v4));
            }
        }

        let back = mesh.vertices.len();
        for i in 0..side {
            for j in 0..side {
                mesh.add_vertex(Vertex::new(coord(j), -coord(i), -0.1));
            }
        }
        for i in 0..grid_size {
            for j in 0..grid_size {
                let v1 = back + i * side + j;
                let (v2, v3, v4) = (v1 + 1, v1 + side, v1 + side + 1);
                mesh.add_face(Face::new(v1, v2, v3));
                mesh.add_face(Face::new(v2, v4, v3));
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outward_normal_dot(mesh: &Mesh, face: &Face) -> f32 {
        let [a, b, c] = face.indices.map(|i| mesh.vertices[i].position);
        let normal = (b - a).cross(&(c - a));
        let centroid = (a.coords + b.coords + c.coords) / 3.0;
        normal.dot(&centroid)
    }

    #[test]
    fn test_cube_winding_is_outward() {
        let mesh = Mesh::cube(2.0);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 12);
        for face in &mesh.faces {
            assert!(outward_normal_dot(&mesh, face) > 0.0, "{:?} is wound inward", face);
        }
    }

    #[test]
    fn test_relief_grid_counts_and_indices() {
        let mesh = Mesh::relief_grid(20);
        assert_eq!(mesh.vertices.len(), 2 * 21 * 21);
        assert_eq!(mesh.faces.len(), 4 * 20 * 20);
        assert!(mesh
            .faces
            .iter()
            .all(|f| f.indices.iter().all(|&i| i < mesh.vertices.len())));

        // Centre of the front grid is the peak of the relief
        let centre = mesh.vertices[10 * 21 + 10].position;
        assert!((centre.z - 0.3).abs() < 1e-6);
        assert!((mesh.vertices[0].position.x + 1.0).abs() < 1e-6);
        assert!((mesh.vertices[0].position.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_relief_grid_front_faces_viewer() {
        let mesh = Mesh::relief_grid(4);
        let (front, back) = mesh.faces.split_at(mesh.faces.len() / 2);
        let normal_z = |face: &Face| {
            let [a, b, c] = face.indices.map(|i| mesh.vertices[i].position);
            (b - a).cross(&(c - a)).z
        };
        assert!(front.iter().all(|f| normal_z(f) > 0.0));
        assert!(back.iter().all(|f| normal_z(f) < 0.0));
    }

    #[test]
    fn test_from_json_ignores_extra_keys() {
        let json = r#"{
            "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0.5]],
            "faces": [[0, 1, 2]],
            "normals": [[0, 0, 1]],
            "stats": {"vertex_count": 3, "face_count": 1, "format": "OBJ"}
        }"#;
        let mesh = Mesh::from_json(json).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![Face::new(0, 1, 2)]);
        assert_eq!(mesh.vertices[2], Vertex::new(0.0, 1.0, 0.5));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        assert!(matches!(
            Mesh::load("model.fbx"),
            Err(RenderError::UnsupportedMeshFormat(_))
        ));
    }

    #[test]
    fn test_from_buffers() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = Mesh::from_buffers(&positions, &[0, 1, 2]).unwrap();
        assert_eq!(mesh.vertices[1], Vertex::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.faces, vec![Face::new(0, 1, 2)]);

        assert!(matches!(
            Mesh::from_buffers(&[0.0, 1.0], &[]),
            Err(RenderError::MeshBuffer { kind: "vertex", len: 2 })
        ));
        assert!(matches!(
            Mesh::from_buffers(&[], &[0, 1, 2, 3]),
            Err(RenderError::MeshBuffer { kind: "face", len: 4 })
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed_faces() {
        let json = r#"{"vertices": [[0, 0, 0]], "faces": [[0, 1]]}"#;
        assert!(Mesh::from_json(json).is_err());
    }
}
