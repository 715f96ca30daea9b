/// View rotation state and the vertex transform stage
use nalgebra::{Point3, Rotation3, Vector3};

use crate::geometry::Mesh;
use crate::projection::ScreenProjection;

/// Rotation about the X and Y axes, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Accumulate a drag delta (in degrees)
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Snapshot of the viewing parameters for one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub rotation: RotationState,
    /// Zoom in percent; 100 is the unscaled layout
    pub zoom: f32,
}

impl ViewState {
    pub fn new(rotation: RotationState, zoom: f32) -> Self {
        Self { rotation, zoom }
    }

    /// Step the zoom and keep it inside `[min, max]`
    pub fn zoom_by(&mut self, delta: f32, min: f32, max: f32) {
        self.zoom = (self.zoom + delta).clamp(min, max);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(RotationState::zero(), 100.0)
    }
}

/// A vertex after rotation and screen mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedVertex {
    /// Screen-space x in surface pixels
    pub x: f32,
    /// Screen-space y in surface pixels
    pub y: f32,
    /// Rotated z, unscaled; larger is nearer the viewer
    pub z: f32,
    /// Untransformed object-space position
    pub object: Point3<f32>,
}

/// Transform builder for the view rotation
pub struct Transform;

impl Transform {
    /// Rotation for a view: first about X, then about Y.
    /// The two rotations do not commute, so the order is fixed.
    pub fn rotation_matrix(rotation: &RotationState) -> Rotation3<f32> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), rotation.x.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), rotation.y.to_radians());

        ry * rx
    }

    /// Rotate every vertex of `mesh` and map it onto the surface
    pub fn apply(
        mesh: &Mesh,
        view: &ViewState,
        projection: &ScreenProjection,
    ) -> Vec<TransformedVertex> {
        let rotation = Self::rotation_matrix(&view.rotation);
        let scale = projection.scale(view.zoom);
        let (center_x, center_y) = projection.center();

        mesh.vertices
            .iter()
            .map(|vertex| {
                let rotated = rotation * vertex.position;
                TransformedVertex {
                    x: rotated.x * scale + center_x,
                    y: rotated.y * scale + center_y,
                    z: rotated.z,
                    object: vertex.position,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);

        state.rotate(20.0, 45.0);
        state.rotate(-5.0, 0.0);
        assert!((state.x - 15.0).abs() < 1e-6);
        assert!((state.y - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        assert!((matrix.matrix() - nalgebra::Matrix3::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_x_is_applied_before_y() {
        // (0, 1, 0) -> X by 90 -> (0, 0, 1) -> Y by 90 -> (1, 0, 0)
        let rotation = Transform::rotation_matrix(&RotationState::new(90.0, 90.0));
        let p = rotation * Point3::new(0.0, 1.0, 0.0);
        assert!((p - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-5);

        // Applying Y first would leave the point on the Z axis
        let swapped = Rotation3::from_axis_angle(&Vector3::x_axis(), 90f32.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), 90f32.to_radians());
        let q = swapped * Point3::new(0.0, 1.0, 0.0);
        assert!((q - p).norm() > 0.5);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = ViewState::default();
        view.zoom_by(150.0, 50.0, 200.0);
        assert_eq!(view.zoom, 200.0);
        view.zoom_by(-500.0, 50.0, 200.0);
        assert_eq!(view.zoom, 50.0);
    }

    #[test]
    fn test_apply_keeps_object_coordinates() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vertex::new(0.5, -0.25, 0.75));
        let projection = ScreenProjection::new(800, 800, 4.0);
        let view = ViewState::new(RotationState::new(33.0, -71.0), 140.0);

        let out = Transform::apply(&mesh, &view, &projection);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].object, Point3::new(0.5, -0.25, 0.75));
    }
}
