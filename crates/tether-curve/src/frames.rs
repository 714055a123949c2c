//! Orthonormal frames along evaluated polylines, used to place the
//! cross-section of a swept curve.

use tether_math::{Dir3, Point2, Point3, Vec3};

/// A moving frame at one point of a polyline.
///
/// Profile coordinates map `x` to `normal` and `y` to `binormal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position on the polyline.
    pub position: Point3,
    /// Unit tangent.
    pub tangent: Dir3,
    /// Unit normal, perpendicular to the tangent.
    pub normal: Dir3,
    /// `tangent × normal`.
    pub binormal: Dir3,
}

impl Frame {
    /// Frame with an arbitrary but deterministic normal.
    pub fn with_arbitrary_normal(position: Point3, tangent: Dir3) -> Self {
        let helper = if tangent.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let normal = Dir3::new_normalize(helper.cross(tangent.as_ref()));
        let binormal = Dir3::new_normalize(tangent.cross(normal.as_ref()));
        Self {
            position,
            tangent,
            normal,
            binormal,
        }
    }

    /// Rotate normal and binormal about the tangent by `angle` radians.
    pub fn with_twist(&self, angle: f64) -> Self {
        if angle == 0.0 {
            return self.clone();
        }
        let (s, c) = angle.sin_cos();
        let n = self.normal.as_ref() * c + self.binormal.as_ref() * s;
        let b = self.binormal.as_ref() * c - self.normal.as_ref() * s;
        Self {
            position: self.position,
            tangent: self.tangent,
            normal: Dir3::new_normalize(n),
            binormal: Dir3::new_normalize(b),
        }
    }

    /// Map profile coordinates into world space.
    pub fn transform_point(&self, p: &Point2) -> Point3 {
        self.position + self.normal.as_ref() * p.x + self.binormal.as_ref() * p.y
    }
}

/// Rotation-minimizing frames along a polyline (double reflection).
///
/// Tangents are central differences of the neighbouring points. For closed
/// polylines the twist left over after going once around is spread evenly
/// so the last frame meets the first one. Coincident points reuse the
/// previous frame.
pub fn rotation_minimizing_frames(points: &[Point3], closed: bool) -> Vec<Frame> {
    let n = points.len();
    if n < 2 {
        return points
            .iter()
            .map(|&p| Frame::with_arbitrary_normal(p, Dir3::new_normalize(Vec3::z())))
            .collect();
    }
    let tangents = polyline_tangents(points, closed);

    let mut frames: Vec<Frame> = Vec::with_capacity(n);
    frames.push(initial_frame(points, closed, tangents[0]));

    for i in 1..n {
        let next = propagate(&frames[i - 1], points[i], tangents[i]);
        frames.push(next);
    }

    if closed {
        // carry the frame across the closing segment, measure how far it
        // drifted from the first frame and unwind that drift gradually
        let wrapped = propagate(&frames[n - 1], points[0], tangents[0]);
        let first = &frames[0];
        let drift = wrapped
            .normal
            .dot(first.binormal.as_ref())
            .atan2(wrapped.normal.dot(first.normal.as_ref()));
        if drift.abs() > 1e-12 {
            for (i, frame) in frames.iter_mut().enumerate() {
                *frame = frame.with_twist(-drift * i as f64 / n as f64);
            }
        }
    }
    frames
}

fn propagate(prev: &Frame, position: Point3, tangent: Dir3) -> Frame {
    let v1 = position - prev.position;
    let c1 = v1.dot(&v1);
    if c1 < 1e-24 {
        return Frame {
            position,
            ..prev.clone()
        };
    }
    let r_l = prev.normal.as_ref() - v1 * (2.0 / c1 * v1.dot(prev.normal.as_ref()));
    let t_l = prev.tangent.as_ref() - v1 * (2.0 / c1 * v1.dot(prev.tangent.as_ref()));
    let v2 = tangent.as_ref() - t_l;
    let c2 = v2.dot(&v2);
    let r = if c2 < 1e-24 {
        r_l
    } else {
        r_l - v2 * (2.0 / c2 * v2.dot(&r_l))
    };
    // re-orthogonalize against drift
    let r = r - tangent.as_ref() * r.dot(tangent.as_ref());
    if r.norm() < 1e-12 {
        return Frame::with_arbitrary_normal(position, tangent);
    }
    let normal = Dir3::new_normalize(r);
    let binormal = Dir3::new_normalize(tangent.cross(normal.as_ref()));
    Frame {
        position,
        tangent,
        normal,
        binormal,
    }
}

/// First frame: for planar-ish curves the normal points away from the
/// centroid so the cross-section offset acts radially; otherwise arbitrary.
fn initial_frame(points: &[Point3], closed: bool, tangent: Dir3) -> Frame {
    if closed {
        let centroid = Point3::from(
            points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / points.len() as f64,
        );
        let out = points[0] - centroid;
        let out = out - tangent.as_ref() * out.dot(tangent.as_ref());
        if out.norm() > 1e-12 {
            let normal = Dir3::new_normalize(out);
            let binormal = Dir3::new_normalize(tangent.cross(normal.as_ref()));
            return Frame {
                position: points[0],
                tangent,
                normal,
                binormal,
            };
        }
    }
    Frame::with_arbitrary_normal(points[0], tangent)
}

fn polyline_tangents(points: &[Point3], closed: bool) -> Vec<Dir3> {
    let n = points.len();
    let mut out: Vec<Dir3> = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b) = if closed {
            (points[(i + n - 1) % n], points[(i + 1) % n])
        } else {
            (points[i.saturating_sub(1)], points[(i + 1).min(n - 1)])
        };
        let d = b - a;
        let t = if d.norm() > 1e-12 {
            Dir3::new_normalize(d)
        } else {
            out.last().copied().unwrap_or_else(|| Dir3::new_normalize(Vec3::z()))
        };
        out.push(t);
    }
    out
}
