/// Closed-form affine warp between two triangles
use nalgebra::{Matrix3, Point2};

/// The 2x3 affine map taking a source triangle onto a destination triangle,
/// stored as a homogeneous 3x3 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineWarp {
    matrix: Matrix3<f32>,
}

impl AffineWarp {
    /// Determinant of the source triangle's edge pairs.
    /// Near zero when the three source points are collinear or coincident.
    pub fn determinant(source: &[Point2<f32>; 3]) -> f32 {
        let e1 = source[1] - source[0];
        let e2 = source[2] - source[0];
        e1.x * e2.y - e2.x * e1.y
    }

    /// Solve for the map with `warp(source[i]) == dest[i]`.
    /// Returns `None` when `|det| <= epsilon`.
    pub fn solve(source: &[Point2<f32>; 3], dest: &[Point2<f32>; 3], epsilon: f32) -> Option<Self> {
        let det = Self::determinant(source);
        if det.abs() <= epsilon {
            return None;
        }

        let [s0, s1, s2] = source;
        let (du1, dv1) = (s1.x - s0.x, s1.y - s0.y);
        let (du2, dv2) = (s2.x - s0.x, s2.y - s0.y);

        let [d0, d1, d2] = dest;
        let (dx1, dy1) = (d1.x - d0.x, d1.y - d0.y);
        let (dx2, dy2) = (d2.x - d0.x, d2.y - d0.y);

        let a = (dx1 * dv2 - dx2 * dv1) / det;
        let b = (dy1 * dv2 - dy2 * dv1) / det;
        let c = (dx2 * du1 - dx1 * du2) / det;
        let d = (dy2 * du1 - dy1 * du2) / det;
        let e = d0.x - a * s0.x - c * s0.y;
        let f = d0.y - b * s0.x - d * s0.y;

        Some(Self {
            matrix: Matrix3::new(
                a, c, e, //
                b, d, f, //
                0.0, 0.0, 1.0,
            ),
        })
    }

    pub fn apply(&self, point: &Point2<f32>) -> Point2<f32> {
        self.matrix.transform_point(point)
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.matrix
    }
}
