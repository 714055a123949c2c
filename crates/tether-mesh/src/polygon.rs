//! Planar polygon helpers: projection to 2D, winding, ear clipping and
//! convex clipping.

use tether_math::{plane_basis, Dir3, Point2, Point3, Vec3};

/// A simple polygon in 2D (closed, no repeated closing point).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area, positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Ensure counter-clockwise winding.
    pub fn ensure_ccw(&mut self) {
        if !self.is_ccw() {
            self.points.reverse();
        }
    }

    /// `true` if every interior angle turns the same way.
    pub fn is_convex(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut sign = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            let cross = cross2(&(b - a), &(c - b));
            if cross.abs() < 1e-15 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }

    /// Ear-clipping triangulation. Returns triangles as indices into
    /// `points`, wound the same way as the polygon.
    pub fn triangulate(&self) -> Vec<[usize; 3]> {
        let n = self.points.len();
        if n < 3 {
            return Vec::new();
        }
        let ccw = self.signed_area() >= 0.0;
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut out = Vec::with_capacity(n - 2);

        while remaining.len() > 3 {
            let m = remaining.len();
            let mut clipped = false;
            for i in 0..m {
                let prev = remaining[(i + m - 1) % m];
                let cur = remaining[i];
                let next = remaining[(i + 1) % m];
                let (a, b, c) = (self.points[prev], self.points[cur], self.points[next]);

                let cross = cross2(&(b - a), &(c - a));
                let convex = if ccw { cross > 0.0 } else { cross < 0.0 };
                if !convex {
                    continue;
                }
                let blocked = remaining.iter().any(|&j| {
                    j != prev && j != cur && j != next && point_in_triangle(&self.points[j], &a, &b, &c)
                });
                if blocked {
                    continue;
                }
                out.push([prev, cur, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }
            if !clipped {
                // collinear or self-touching leftovers: fan the rest
                for k in 1..remaining.len() - 1 {
                    out.push([remaining[0], remaining[k], remaining[k + 1]]);
                }
                return out;
            }
        }
        out.push([remaining[0], remaining[1], remaining[2]]);
        out
    }

    /// Clip this polygon against a convex counter-clockwise `clip` polygon
    /// (Sutherland–Hodgman). The result may be empty.
    pub fn clip_convex(&self, clip: &Polygon) -> Polygon {
        let mut output = self.points.clone();
        let n = clip.points.len();
        for i in 0..n {
            if output.is_empty() {
                break;
            }
            let a = clip.points[i];
            let b = clip.points[(i + 1) % n];
            let edge = b - a;
            let inside = |p: &Point2| cross2(&edge, &(p - a)) >= -1e-12;

            let input = std::mem::take(&mut output);
            let m = input.len();
            for j in 0..m {
                let cur = input[j];
                let prev = input[(j + m - 1) % m];
                match (inside(&prev), inside(&cur)) {
                    (true, true) => output.push(cur),
                    (true, false) => output.push(line_intersection(&prev, &cur, &a, &b)),
                    (false, true) => {
                        output.push(line_intersection(&prev, &cur, &a, &b));
                        output.push(cur);
                    }
                    (false, false) => {}
                }
            }
        }
        let mut result = Polygon::new(output);
        result.dedup(1e-9);
        result
    }

    /// Remove consecutive vertices closer than `eps`, including the
    /// wrap-around pair.
    pub fn dedup(&mut self, eps: f64) {
        self.points.dedup_by(|a, b| (*a - *b).norm() < eps);
        while self.points.len() > 1 {
            let first = self.points[0];
            let last = self.points[self.points.len() - 1];
            if (first - last).norm() < eps {
                self.points.pop();
            } else {
                break;
            }
        }
    }
}

/// An orthonormal frame on a plane, used to flatten coplanar 3D points.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFrame {
    /// A point on the plane.
    pub origin: Point3,
    /// In-plane x axis.
    pub u: Vec3,
    /// In-plane y axis.
    pub v: Vec3,
    /// Plane normal; `(u, v, normal)` is right-handed.
    pub normal: Dir3,
}

impl PlaneFrame {
    /// Frame through `origin` with the given normal.
    pub fn new(origin: Point3, normal: Dir3) -> Self {
        let (u, v) = plane_basis(&normal);
        Self {
            origin,
            u,
            v,
            normal,
        }
    }

    /// Plane-local 2D coordinates of `p` (its normal component is dropped).
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Signed height of `p` above the plane.
    pub fn height(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal.as_ref())
    }

    /// Lift plane-local coordinates back into 3D.
    pub fn lift(&self, q: &Point2) -> Point3 {
        self.origin + self.u * q.x + self.v * q.y
    }
}

/// 2D cross product (z component of the 3D cross product).
pub fn cross2(a: &tether_math::Vec2, b: &tether_math::Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

fn line_intersection(p: &Point2, q: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let r = q - p;
    let s = b - a;
    let denom = cross2(&r, &s);
    if denom.abs() < 1e-300 {
        return *q;
    }
    let t = cross2(&(a - p), &s) / denom;
    p + r * t
}

fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let d1 = cross2(&(b - a), &(p - a));
    let d2 = cross2(&(c - b), &(p - b));
    let d3 = cross2(&(a - c), &(p - c));
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
