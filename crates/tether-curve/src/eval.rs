//! Spline evaluation: polylines, cubic Bezier segments and uniform
//! B-splines (De Boor), each carrying an interpolated tilt.

use tether_math::Point3;

use crate::curve::{ControlPoint, Curve, Dimensions, Spline, SplineKind};

/// One evaluated point of a spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Position (local to the curve unless stated otherwise).
    pub position: Point3,
    /// Interpolated tilt in radians.
    pub tilt: f64,
}

/// A spline evaluated into a polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedSpline {
    /// Samples in order. Closed splines do not repeat the first sample.
    pub samples: Vec<Sample>,
    /// Whether the polyline closes on itself.
    pub closed: bool,
}

impl Spline {
    /// Evaluate into a polyline with `resolution` samples per segment.
    ///
    /// Poly splines ignore `resolution` and return their points. NURBS
    /// splines use a clamped uniform knot vector when open and a periodic
    /// one when cyclic; an order larger than the point count is reduced to
    /// it.
    pub fn evaluate(&self, resolution: usize) -> EvaluatedSpline {
        let resolution = resolution.max(1);
        let closed = self.cyclic && self.points.len() > 2;
        let samples = match (self.points.len(), self.kind) {
            (0, _) => Vec::new(),
            (1, _) | (_, SplineKind::Poly) => self
                .points
                .iter()
                .map(|p| Sample {
                    position: p.position,
                    tilt: p.tilt,
                })
                .collect(),
            (_, SplineKind::Bezier) => bezier_samples(&self.points, closed, resolution),
            (_, SplineKind::Nurbs { order }) => {
                let degree = order.saturating_sub(1).clamp(1, self.points.len() - 1);
                if closed {
                    periodic_samples(&self.points, degree, resolution)
                } else {
                    clamped_samples(&self.points, degree, resolution)
                }
            }
        };
        EvaluatedSpline { samples, closed }
    }
}

impl Curve {
    /// Evaluate every spline into world-space polylines.
    ///
    /// 2D curves are flattened onto the local XY plane first.
    pub fn evaluate(&self) -> Vec<EvaluatedSpline> {
        self.splines
            .iter()
            .map(|s| {
                let mut ev = s.evaluate(self.resolution);
                for sample in &mut ev.samples {
                    if self.dimensions == Dimensions::Two {
                        sample.position.z = 0.0;
                    }
                    sample.position += self.origin.coords;
                }
                ev
            })
            .collect()
    }
}

fn bezier_samples(points: &[ControlPoint], closed: bool, resolution: usize) -> Vec<Sample> {
    let n = points.len();
    let segments = if closed { n } else { n - 1 };
    let mut out = Vec::with_capacity(segments * resolution + 1);
    for seg in 0..segments {
        let a = &points[seg];
        let b = &points[(seg + 1) % n];
        let p0 = a.position.coords;
        let p1 = a.handle_right.unwrap_or(a.position).coords;
        let p2 = b.handle_left.unwrap_or(b.position).coords;
        let p3 = b.position.coords;
        for i in 0..resolution {
            let t = i as f64 / resolution as f64;
            let s = 1.0 - t;
            let pos = p0 * (s * s * s) + p1 * (3.0 * s * s * t) + p2 * (3.0 * s * t * t) + p3 * (t * t * t);
            out.push(Sample {
                position: Point3::from(pos),
                tilt: a.tilt + (b.tilt - a.tilt) * t,
            });
        }
    }
    if !closed {
        let last = &points[n - 1];
        out.push(Sample {
            position: last.position,
            tilt: last.tilt,
        });
    }
    out
}

/// Open B-spline with clamped uniform knots: passes through both end points.
fn clamped_samples(points: &[ControlPoint], degree: usize, resolution: usize) -> Vec<Sample> {
    let knots = clamped_uniform_knots(points.len(), degree);
    let segments = points.len() - degree;
    let count = segments * resolution;
    (0..=count)
        .map(|i| de_boor(points, &knots, degree, i as f64 / count as f64))
        .collect()
}

/// Closed B-spline: the first `degree` points are appended again and the
/// knots are uniform, giving one segment per control point.
fn periodic_samples(points: &[ControlPoint], degree: usize, resolution: usize) -> Vec<Sample> {
    let n = points.len();
    let wrapped: Vec<ControlPoint> = points.iter().chain(&points[..degree]).cloned().collect();
    let knots: Vec<f64> = (0..wrapped.len() + degree + 1).map(|k| k as f64).collect();
    (0..n * resolution)
        .map(|i| de_boor(&wrapped, &knots, degree, degree as f64 + i as f64 / resolution as f64))
        .collect()
}

fn clamped_uniform_knots(n: usize, degree: usize) -> Vec<f64> {
    let m = n + degree + 1;
    let interior = m - 2 * (degree + 1);
    let mut knots = vec![0.0; m];
    for k in knots.iter_mut().skip(m - degree - 1) {
        *k = 1.0;
    }
    for i in 1..=interior {
        knots[degree + i] = i as f64 / (interior + 1) as f64;
    }
    knots
}

/// Knot span containing `t`: `knots[span] <= t < knots[span + 1]`, with the
/// end of the domain mapped to the last span.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }
    let (mut low, mut high) = (degree, n + 1);
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// The `degree + 1` non-zero basis functions at `t`.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

fn de_boor(points: &[ControlPoint], knots: &[f64], degree: usize, t: f64) -> Sample {
    let last = points.len() - 1;
    let t = t.clamp(knots[degree], knots[last + 1]);
    let span = find_span(knots, last, degree, t);
    let basis = basis_functions(knots, span, degree, t);
    let mut position = Point3::origin();
    let mut tilt = 0.0;
    for (i, b) in basis.iter().enumerate() {
        let cp = &points[span - degree + i];
        position.coords += cp.position.coords * *b;
        tilt += cp.tilt * b;
    }
    Sample { position, tilt }
}
