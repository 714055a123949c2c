//! Simple closed and open meshes, centred on the origin.

use std::f64::consts::PI;

use tether_math::Point3;

use crate::mesh::{FaceLoop, Mesh};

/// Axis-aligned cube with edge length `size`, centred on the origin.
///
/// Vertex layout:
/// ```text
///     v7----v6
///    /|    /|
///   v4----v5|    z
///   | v3--|-v2   | y
///   |/    |/     |/
///   v0----v1     +---x
/// ```
pub fn cube(size: f64) -> Mesh {
    let h = size / 2.0;
    let positions = vec![
        Point3::new(-h, -h, -h),
        Point3::new(h, -h, -h),
        Point3::new(h, h, -h),
        Point3::new(-h, h, -h),
        Point3::new(-h, -h, h),
        Point3::new(h, -h, h),
        Point3::new(h, h, h),
        Point3::new(-h, h, h),
    ];
    // CCW seen from outside
    let faces = vec![
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![2, 3, 7, 6],
        vec![1, 2, 6, 5],
        vec![3, 0, 4, 7],
    ];
    from_valid(positions, faces)
}

/// Square of edge length `size` in the XY plane, normal +Z.
pub fn plane(size: f64) -> Mesh {
    let h = size / 2.0;
    let positions = vec![
        Point3::new(-h, -h, 0.0),
        Point3::new(h, -h, 0.0),
        Point3::new(h, h, 0.0),
        Point3::new(-h, h, 0.0),
    ];
    from_valid(positions, vec![vec![0, 1, 2, 3]])
}

/// UV sphere: `segments` around the Z axis, `rings` from pole to pole.
/// Quads between rings, triangle fans at the poles, outward normals.
pub fn uv_sphere(radius: f64, segments: usize, rings: usize) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = vec![Point3::new(0.0, 0.0, radius)];
    for r in 1..rings {
        let theta = PI * r as f64 / rings as f64;
        let (st, ct) = theta.sin_cos();
        for s in 0..segments {
            let phi = 2.0 * PI * s as f64 / segments as f64;
            let (sp, cp) = phi.sin_cos();
            positions.push(Point3::new(radius * st * cp, radius * st * sp, radius * ct));
        }
    }
    let south = positions.len();
    positions.push(Point3::new(0.0, 0.0, -radius));

    let ring_start = |r: usize| 1 + (r - 1) * segments;
    let mut faces = Vec::new();
    for s in 0..segments {
        let next = (s + 1) % segments;
        faces.push(vec![0, ring_start(1) + s, ring_start(1) + next]);
    }
    for r in 1..rings - 1 {
        let (a, b) = (ring_start(r), ring_start(r + 1));
        for s in 0..segments {
            let next = (s + 1) % segments;
            faces.push(vec![a + s, b + s, b + next, a + next]);
        }
    }
    let last = ring_start(rings - 1);
    for s in 0..segments {
        let next = (s + 1) % segments;
        faces.push(vec![last + next, last + s, south]);
    }
    from_valid(positions, faces)
}

fn from_valid(positions: Vec<Point3>, faces: Vec<Vec<usize>>) -> Mesh {
    let loops: Vec<FaceLoop> = faces.into_iter().map(|f| (f, None)).collect();
    Mesh::rebuild(positions, loops)
}
