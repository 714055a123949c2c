#![warn(missing_docs)]

//! Math types for the tether crates.
//!
//! Aliases over nalgebra, an affine [`Transform`] that splits into its
//! linear and translation parts, an axis-aligned box and two angle helpers.

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit direction in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D space (UV or plane-local coordinates).
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// An object transform as a homogeneous 4x4 matrix.
///
/// Patches arrive with one of these; the pipeline bakes the linear part
/// into the vertices and keeps the translation as the curve origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Homogeneous matrix acting on column vectors.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz)),
        }
    }

    /// Right-handed rotation by `angle` radians about `axis` through the
    /// origin.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(axis, angle).to_homogeneous(),
        }
    }

    /// Rotation about the X axis.
    pub fn rotation_x(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::x_axis(), angle)
    }

    /// Rotation about the Y axis.
    pub fn rotation_y(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::y_axis(), angle)
    }

    /// Rotation about the Z axis.
    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::z_axis(), angle)
    }

    /// `self * other`: `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Map a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// Rotation and scale block.
    pub fn linear_matrix(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The transform without its translation.
    pub fn linear_part(&self) -> Self {
        Self {
            matrix: self.linear_matrix().to_homogeneous(),
        }
    }

    /// The translation column.
    pub fn translation_part(&self) -> Vec3 {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// `true` if the linear part has a negative determinant.
    pub fn is_mirroring(&self) -> bool {
        self.linear_matrix().determinant() < 0.0
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Lower corner.
    pub min: Point3,
    /// Upper corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Inverted box that any included point replaces.
    pub fn empty() -> Self {
        Self {
            min: Point3::from(Vec3::repeat(f64::INFINITY)),
            max: Point3::from(Vec3::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Box around `points`, `None` for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut points = points.into_iter().peekable();
        points.peek()?;
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        Some(aabb)
    }

    /// `true` while no point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Diagonal length, zero for an empty box.
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    /// `true` if the boxes share any point, touching included.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }
}

/// Unsigned angle between two vectors in radians, `None` if either is zero.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Option<f64> {
    let denom = a.norm() * b.norm();
    if denom < f64::MIN_POSITIVE {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos())
}

/// Two unit vectors spanning the plane perpendicular to `normal`.
///
/// `(u, v, normal)` is right-handed.
pub fn plane_basis(normal: &Dir3) -> (Vec3, Vec3) {
    let n = normal.as_ref();
    let helper = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let u = helper.cross(n).normalize();
    let v = n.cross(&u);
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(result, Point3::new(11.0, 22.0, 33.0), epsilon = 1e-12);
        assert_abs_diff_eq!(t.translation_part(), Vec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_axis_rotations() {
        let x = Point3::new(1.0, 0.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        assert_abs_diff_eq!(Transform::rotation_z(PI / 2.0).apply_point(&x), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(Transform::rotation_y(PI / 2.0).apply_point(&z), Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(Transform::rotation_x(PI / 2.0).apply_point(&z), Point3::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_diagonal_axis() {
        let axis = Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0));
        let r = Transform::rotation_about_axis(&axis, PI).apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(r, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let translate = Transform::translation(1.0, 0.0, 0.0);
        let scale = Transform::scale(2.0, 2.0, 2.0);
        let result = scale.then(&translate).apply_point(&Point3::origin());
        assert_abs_diff_eq!(result.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_split_linear_and_translation() {
        let t = Transform::translation(0.0, 0.0, 5.0).then(&Transform::scale(2.0, 2.0, 2.0));
        assert_abs_diff_eq!(t.translation_part(), Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-12);
        let p = t.linear_part().apply_point(&Point3::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(p, Point3::new(2.0, 2.0, 2.0), epsilon = 1e-12);
        assert!(!t.is_mirroring());
        assert!(Transform::scale(-1.0, 1.0, 1.0).is_mirroring());
    }

    #[test]
    fn test_inverse() {
        let t = Transform::translation(1.0, 2.0, 3.0).then(&Transform::rotation_z(0.3));
        let inv = t.inverse().unwrap();
        let p = Point3::new(5.0, 6.0, 7.0);
        assert_abs_diff_eq!(t.then(&inv).apply_point(&p), p, epsilon = 1e-12);
        assert!(Transform::scale(1.0, 0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_aabb_center_and_overlap() {
        let pts = [Point3::new(-1.0, 0.0, 2.0), Point3::new(3.0, 4.0, 2.0)];
        let aabb = Aabb3::from_points(pts.iter()).unwrap();
        assert_abs_diff_eq!(aabb.center(), Point3::new(1.0, 2.0, 2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(aabb.diagonal(), 32f64.sqrt(), epsilon = 1e-12);
        let touching = Aabb3::from_points([Point3::new(3.0, 4.0, 2.0)].iter()).unwrap();
        assert!(aabb.overlaps(&touching));
        let apart = Aabb3::from_points([Point3::new(3.1, 0.0, 2.0)].iter()).unwrap();
        assert!(!aabb.overlaps(&apart));
        assert!(Aabb3::from_points(std::iter::empty()).is_none());
        assert_eq!(Aabb3::empty().diagonal(), 0.0);
    }

    #[test]
    fn test_angle_between() {
        assert_abs_diff_eq!(angle_between(&Vec3::z(), &-Vec3::z()).unwrap(), PI);
        assert_eq!(angle_between(&Vec3::z(), &Vec3::z()), Some(0.0));
        assert!(angle_between(&Vec3::zeros(), &Vec3::z()).is_none());
    }

    #[test]
    fn test_plane_basis_is_orthonormal() {
        let n = Dir3::new_normalize(Vec3::new(0.3, -0.2, 0.9));
        let (u, v) = plane_basis(&n);
        assert_abs_diff_eq!(u.dot(n.as_ref()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.dot(n.as_ref()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.cross(&v), n.into_inner(), epsilon = 1e-12);
    }
}
