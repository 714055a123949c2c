//! Curve data model.

use serde::{Deserialize, Serialize};
use tether_math::{Aabb3, Point3, Vec3};

use crate::error::{CurveError, Result};

/// Default NURBS order (cubic).
pub const DEFAULT_ORDER: usize = 4;

/// One control point of a spline.
///
/// Positions and handles are relative to the owning curve's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Position.
    pub position: Point3,
    /// Rotation of the swept cross-section about the tangent, in radians.
    #[serde(default)]
    pub tilt: f64,
    /// Incoming Bezier handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_left: Option<Point3>,
    /// Outgoing Bezier handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_right: Option<Point3>,
}

impl ControlPoint {
    /// A point without handles and with zero tilt.
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            tilt: 0.0,
            handle_left: None,
            handle_right: None,
        }
    }

    /// A Bezier point with both handles.
    pub fn with_handles(position: Point3, left: Point3, right: Point3) -> Self {
        Self {
            position,
            tilt: 0.0,
            handle_left: Some(left),
            handle_right: Some(right),
        }
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        for h in [&mut self.handle_left, &mut self.handle_right].into_iter().flatten() {
            *h += delta;
        }
    }
}

/// How a spline interpolates its control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineKind {
    /// Straight segments through the points.
    Poly,
    /// Cubic Bezier segments using the point handles.
    Bezier,
    /// Uniform B-spline of the given order (degree + 1).
    Nurbs {
        /// Spline order.
        order: usize,
    },
}

impl SplineKind {
    /// NURBS with [`DEFAULT_ORDER`].
    pub fn nurbs() -> Self {
        Self::Nurbs {
            order: DEFAULT_ORDER,
        }
    }
}

/// An ordered run of control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    /// Interpolation type.
    pub kind: SplineKind,
    /// Control points in order.
    pub points: Vec<ControlPoint>,
    /// Closed (the last point connects back to the first).
    #[serde(default)]
    pub cyclic: bool,
}

impl Spline {
    /// Poly spline through `positions`.
    pub fn poly(positions: impl IntoIterator<Item = Point3>, cyclic: bool) -> Self {
        Self {
            kind: SplineKind::Poly,
            points: positions.into_iter().map(ControlPoint::new).collect(),
            cyclic,
        }
    }

    /// Change the interpolation type. Handles are created on the point when
    /// switching to Bezier and dropped for the other kinds.
    pub fn set_kind(&mut self, kind: SplineKind) {
        self.kind = kind;
        for p in &mut self.points {
            if kind == SplineKind::Bezier {
                p.handle_left.get_or_insert(p.position);
                p.handle_right.get_or_insert(p.position);
            } else {
                p.handle_left = None;
                p.handle_right = None;
            }
        }
    }
}

/// Whether evaluated points keep their z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dimensions {
    /// Flattened onto the local XY plane.
    #[serde(rename = "2d")]
    Two,
    /// Full 3D.
    #[default]
    #[serde(rename = "3d")]
    Three,
}

/// A curve object: splines plus the render parameters of the swept tube.
///
/// Control points are stored relative to `origin`. A curve handed to the
/// pipeline must have at least one spline and every spline at least one
/// point; see [`Curve::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Curve {
    /// Splines in order.
    pub splines: Vec<Spline>,
    /// Object location in world space.
    pub origin: Point3,
    /// 2D or 3D evaluation.
    pub dimensions: Dimensions,
    /// Evaluated samples per segment.
    pub resolution: usize,
    /// Radius of the round part of the swept cross-section.
    pub bevel_depth: f64,
    /// Samples per quarter circle of the cross-section.
    pub bevel_resolution: usize,
    /// Half-width of the flat part of the cross-section.
    pub extrude: f64,
    /// Shift of the cross-section along the frame normal.
    pub offset: f64,
}

impl Default for Curve {
    fn default() -> Self {
        Self {
            splines: Vec::new(),
            origin: Point3::origin(),
            dimensions: Dimensions::Three,
            resolution: 12,
            bevel_depth: 0.0,
            bevel_resolution: 4,
            extrude: 0.0,
            offset: 0.0,
        }
    }
}

impl Curve {
    /// Curve with the given splines at the world origin.
    pub fn new(splines: Vec<Spline>) -> Self {
        Self {
            splines,
            ..Self::default()
        }
    }

    /// Check the structural invariants and that every value is finite.
    pub fn validate(&self) -> Result<()> {
        if self.splines.is_empty() {
            return Err(CurveError::NoSplines);
        }
        for (si, spline) in self.splines.iter().enumerate() {
            if spline.points.is_empty() {
                return Err(CurveError::EmptySpline(si));
            }
            if let SplineKind::Nurbs { order } = spline.kind {
                if order < 2 {
                    return Err(CurveError::InvalidOrder { spline: si, order });
                }
            }
            for (pi, p) in spline.points.iter().enumerate() {
                let finite = finite_point(&p.position)
                    && p.tilt.is_finite()
                    && p.handle_left.as_ref().map_or(true, finite_point)
                    && p.handle_right.as_ref().map_or(true, finite_point);
                if !finite {
                    return Err(CurveError::NonFinite {
                        spline: si,
                        point: pi,
                    });
                }
            }
        }
        if !finite_point(&self.origin) {
            return Err(CurveError::InvalidParameter("origin is not finite".into()));
        }
        for (name, value) in [
            ("bevel_depth", self.bevel_depth),
            ("extrude", self.extrude),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CurveError::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.offset.is_finite() {
            return Err(CurveError::InvalidParameter("offset is not finite".into()));
        }
        if self.resolution == 0 {
            return Err(CurveError::InvalidParameter("resolution must be at least 1".into()));
        }
        Ok(())
    }

    /// `true` if the curve has splines and all of them are closed.
    pub fn is_cyclic(&self) -> bool {
        !self.splines.is_empty() && self.splines.iter().all(|s| s.cyclic)
    }

    /// Total number of control points.
    pub fn point_count(&self) -> usize {
        self.splines.iter().map(|s| s.points.len()).sum()
    }

    /// Set the tilt of every control point, in radians.
    pub fn set_tilt(&mut self, radians: f64) {
        for p in self.points_mut() {
            p.tilt = radians;
        }
    }

    /// Change the interpolation type of every spline.
    pub fn set_spline_kind(&mut self, kind: SplineKind) {
        for spline in &mut self.splines {
            spline.set_kind(kind);
        }
    }

    /// All control points, spline by spline.
    pub fn points(&self) -> impl Iterator<Item = &ControlPoint> {
        self.splines.iter().flat_map(|s| s.points.iter())
    }

    /// Mutable access to all control points, spline by spline.
    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut ControlPoint> {
        self.splines.iter_mut().flat_map(|s| s.points.iter_mut())
    }

    /// Control point positions in world space.
    pub fn world_points(&self) -> Vec<Point3> {
        self.points().map(|p| p.position + self.origin.coords).collect()
    }

    /// World-space bounding box of the control points.
    pub fn bounds(&self) -> Option<Aabb3> {
        Aabb3::from_points(self.world_points().iter())
    }

    /// Move the origin to the centre of the control point bounding box
    /// without moving the curve in world space.
    pub fn recenter_origin(&mut self) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let center = bounds.center();
        let delta = self.origin - center;
        for p in self.points_mut() {
            p.translate(delta);
        }
        self.origin = center;
    }

    /// Express the control points relative to a new origin without moving
    /// the curve in world space.
    pub fn set_origin(&mut self, origin: Point3) {
        let delta = self.origin - origin;
        for p in self.points_mut() {
            p.translate(delta);
        }
        self.origin = origin;
    }
}

fn finite_point(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn square_curve() -> Curve {
        Curve::new(vec![Spline::poly(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 1.0),
            ],
            true,
        )])
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(Curve::default().validate(), Err(CurveError::NoSplines));
        let c = Curve::new(vec![Spline::poly([], false)]);
        assert_eq!(c.validate(), Err(CurveError::EmptySpline(0)));
        assert!(square_curve().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan_tilt() {
        let mut c = square_curve();
        c.splines[0].points[2].tilt = f64::NAN;
        assert_eq!(
            c.validate(),
            Err(CurveError::NonFinite { spline: 0, point: 2 })
        );
    }

    #[test]
    fn test_tilt_reaches_every_spline() {
        let mut c = square_curve();
        c.splines.push(c.splines[0].clone());
        c.set_tilt(PI);
        assert!(c.points().all(|p| (p.tilt - PI).abs() < 1e-15));
        assert_eq!(c.point_count(), 8);
    }

    #[test]
    fn test_recenter_origin_keeps_world_positions() {
        let mut c = square_curve();
        c.origin = Point3::new(10.0, 0.0, 0.0);
        let before = c.world_points();
        c.recenter_origin();
        assert_relative_eq!(c.origin, Point3::new(11.0, 1.0, 0.5));
        for (a, b) in before.iter().zip(c.world_points()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_set_kind_manages_handles() {
        let mut c = square_curve();
        c.set_spline_kind(SplineKind::Bezier);
        assert!(c.points().all(|p| p.handle_left == Some(p.position)));
        c.set_spline_kind(SplineKind::nurbs());
        assert!(c.points().all(|p| p.handle_left.is_none() && p.handle_right.is_none()));
        assert_eq!(c.splines[0].kind, SplineKind::Nurbs { order: 4 });
    }

    #[test]
    fn test_is_cyclic() {
        let mut c = square_curve();
        assert!(c.is_cyclic());
        c.splines.push(Spline::poly([Point3::origin()], false));
        assert!(!c.is_cyclic());
        assert!(!Curve::default().is_cyclic());
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{"splines":[{"kind":"poly","points":[{"position":[1,2,3]}]}]}"#;
        let c: Curve = serde_json::from_str(json).unwrap();
        assert_eq!(c.resolution, 12);
        assert!(!c.splines[0].cyclic);
        assert_eq!(c.splines[0].points[0].tilt, 0.0);
        let nurbs: SplineKind = serde_json::from_str(r#"{"nurbs":{"order":3}}"#).unwrap();
        assert_eq!(nurbs, SplineKind::Nurbs { order: 3 });
    }
}
