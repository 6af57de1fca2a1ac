//! 2D affine transforms

use crate::primitives::Point;

/// 2D affine transform
///
/// Stored as the top two rows of a 3x3 matrix, the bottom row is always
/// `0 0 1`:
///
/// ```text
/// | a  c  e |
/// | b  d  f |
/// | 0  0  1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Transform2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D::identity();

    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub fn scale_uniform(s: f32) -> Self {
        Self::scale(s, s)
    }

    /// Counter-clockwise rotation by `angle` radians around the origin
    pub fn rotate(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Compose two transforms: the result applies `self` first, then `next`.
    pub fn then(&self, next: &Transform2D) -> Transform2D {
        let Transform2D {
            a: a1,
            b: b1,
            c: c1,
            d: d1,
            e: e1,
            f: f1,
        } = *self;
        let Transform2D {
            a: a2,
            b: b2,
            c: c2,
            d: d2,
            e: e2,
            f: f2,
        } = *next;

        // next * self
        Transform2D {
            a: a2 * a1 + c2 * b1,
            b: b2 * a1 + d2 * b1,
            c: a2 * c1 + c2 * d1,
            d: b2 * c1 + d2 * d1,
            e: a2 * e1 + c2 * f1 + e2,
            f: b2 * e1 + d2 * f1 + f2,
        }
    }

    /// Map a point through the transform.
    ///
    /// The point is lifted to homogeneous `(x, y, 1)`, multiplied, then
    /// divided by the resulting `w`. For an affine matrix `w` is 1.
    pub fn project(&self, point: Point) -> Point {
        let x = self.a * point.x + self.c * point.y + self.e;
        let y = self.b * point.x + self.d * point.y + self.f;
        let w = 1.0;
        Point::new(x / w, y / w)
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Transform2D> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform2D {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, point: Point) -> Option<Point> {
        self.inverse().map(|inv| inv.project(point))
    }
}
