/// Backface culling and painter's-algorithm ordering
use log::warn;

use crate::error::{RenderError, Result};
use crate::geometry::Face;
use crate::transform::TransformedVertex;

/// A face that survived culling, with its resolved vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleFace {
    /// Position of the face in the mesh's face list
    pub index: usize,
    pub vertices: [TransformedVertex; 3],
    /// Mean of the three retained depths
    pub avg_z: f32,
}

/// Result of the visibility stage
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    /// Faces to draw, farthest first
    pub faces: Vec<VisibleFace>,
    pub culled: usize,
}

/// Check that every face index addresses an existing vertex
pub fn check_indices(faces: &[Face], vertex_count: usize) -> Result<()> {
    for (face_index, face) in faces.iter().enumerate() {
        if let Some(&bad) = face.indices.iter().find(|&&i| i >= vertex_count) {
            warn!(
                "Face {} references vertex {} of {}",
                face_index, bad, vertex_count
            );
            return Err(RenderError::InvalidMesh {
                face: face_index,
                index: bad,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Z component of `(v2 - v1) x (v3 - v1)` in screen space.
/// Positive when the face points towards the viewer.
pub fn facing(v1: &TransformedVertex, v2: &TransformedVertex, v3: &TransformedVertex) -> f32 {
    (v2.x - v1.x) * (v3.y - v1.y) - (v2.y - v1.y) * (v3.x - v1.x)
}

/// Cull back faces and sort the rest back to front.
///
/// A face is discarded when its screen-space normal has a negative z.
/// This is only exact for closed meshes with consistent winding and no
/// self-intersections; mixed orientation will drop faces that should show.
/// The sort is stable and ascending in average depth, so faces with equal
/// depth are drawn in mesh order and nearer faces overdraw farther ones.
/// Interpenetrating triangles cannot be resolved by this ordering.
pub fn visible_faces(faces: &[Face], vertices: &[TransformedVertex]) -> Result<Visibility> {
    check_indices(faces, vertices.len())?;

    let mut visible = Vec::with_capacity(faces.len());
    let mut culled = 0;

    for (index, face) in faces.iter().enumerate() {
        let [v1, v2, v3] = face.indices.map(|i| vertices[i]);

        if facing(&v1, &v2, &v3) < 0.0 {
            culled += 1;
            continue;
        }

        visible.push(VisibleFace {
            index,
            vertices: [v1, v2, v3],
            avg_z: (v1.z + v2.z + v3.z) / 3.0,
        });
    }

    visible.sort_by(|a, b| a.avg_z.total_cmp(&b.avg_z));

    Ok(Visibility {
        faces: visible,
        culled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn screen(x: f32, y: f32, z: f32) -> TransformedVertex {
        TransformedVertex {
            x,
            y,
            z,
            object: Point3::origin(),
        }
    }

    #[test]
    fn test_empty_faces() {
        let visibility = visible_faces(&[], &[]).unwrap();
        assert!(visibility.faces.is_empty());
        assert_eq!(visibility.culled, 0);
    }

    #[test]
    fn test_reversed_winding_is_culled() {
        let vertices = vec![
            screen(0.0, 0.0, 0.0),
            screen(10.0, 0.0, 0.0),
            screen(0.0, 10.0, 0.0),
        ];
        let faces = [Face::new(0, 1, 2), Face::new(0, 2, 1)];
        let visibility = visible_faces(&faces, &vertices).unwrap();
        assert_eq!(visibility.culled, 1);
        assert_eq!(visibility.faces.len(), 1);
        assert_eq!(visibility.faces[0].index, 0);
    }

    #[test]
    fn test_edge_on_face_is_kept() {
        let vertices = vec![
            screen(0.0, 0.0, 0.0),
            screen(5.0, 5.0, 0.0),
            screen(10.0, 10.0, 0.0),
        ];
        let visibility = visible_faces(&[Face::new(0, 1, 2)], &vertices).unwrap();
        assert_eq!(visibility.faces.len(), 1);
    }

    #[test]
    fn test_sorted_far_to_near_and_stable() {
        let vertices = vec![
            screen(0.0, 0.0, 0.9),
            screen(10.0, 0.0, 0.9),
            screen(0.0, 10.0, 0.9),
            screen(0.0, 0.0, -0.5),
            screen(10.0, 0.0, -0.5),
            screen(0.0, 10.0, -0.5),
        ];
        let faces = [
            Face::new(0, 1, 2),
            Face::new(3, 4, 5),
            Face::new(0, 1, 2),
        ];
        let visibility = visible_faces(&faces, &vertices).unwrap();
        let order: Vec<usize> = visibility.faces.iter().map(|f| f.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert!((visibility.faces[0].avg_z + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_index() {
        let vertices = vec![screen(0.0, 0.0, 0.0); 3];
        let faces = [Face::new(0, 1, 2), Face::new(0, 3, 1)];
        match visible_faces(&faces, &vertices) {
            Err(RenderError::InvalidMesh {
                face,
                index,
                vertex_count,
            }) => {
                assert_eq!((face, index, vertex_count), (1, 3, 3));
            }
            other => panic!("expected InvalidMesh, got {:?}", other),
        }
    }
}
