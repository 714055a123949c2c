//! Balanced 3D k-d tree stored as an implicit array.

use std::cmp::Ordering;

use tether_math::{Aabb3, Point3};

use crate::error::{Result, SpatialError};

#[derive(Debug, Clone)]
struct Node {
    point: Point3,
    id: usize,
    axis: usize,
}

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Position of the closest indexed point.
    pub point: Point3,
    /// Index of that point in the slice the tree was built from.
    pub id: usize,
    /// Euclidean distance from the query to `point`.
    pub distance: f64,
}

/// A k-d tree over a fixed point set.
///
/// The tree is built once and never updated; rebuild it when the point set
/// changes. Each subrange `lo..hi` of the node array is a subtree whose root
/// sits at the midpoint and splits along the axis of widest extent.
///
/// ```
/// use tether_math::Point3;
/// use tether_spatial::KdTree;
///
/// let tree = KdTree::build(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(5.0, 0.0, 0.0),
/// ]).unwrap();
/// let hit = tree.nearest(&Point3::new(4.0, 0.5, 0.0));
/// assert_eq!(hit.id, 1);
/// ```
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<Node>,
}

impl KdTree {
    /// Build a tree over `points`. Ids in query results are indices into
    /// this slice.
    pub fn build(points: &[Point3]) -> Result<Self> {
        if points.is_empty() {
            return Err(SpatialError::EmptyIndex);
        }
        if let Some(bad) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(SpatialError::NonFinitePoint(bad));
        }

        let mut nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(id, &point)| Node { point, id, axis: 0 })
            .collect();
        Self::build_range(&mut nodes);
        Ok(Self { nodes })
    }

    fn build_range(nodes: &mut [Node]) {
        if nodes.len() <= 1 {
            return;
        }
        let axis = widest_axis(nodes);
        let mid = nodes.len() / 2;
        nodes.select_nth_unstable_by(mid, |a, b| {
            a.point[axis]
                .partial_cmp(&b.point[axis])
                .unwrap_or(Ordering::Equal)
        });
        nodes[mid].axis = axis;
        let (left, rest) = nodes.split_at_mut(mid);
        Self::build_range(left);
        Self::build_range(&mut rest[1..]);
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: an empty tree cannot be built.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the indexed point closest to `query`.
    ///
    /// Of several points at the same distance the one with the lowest id
    /// wins.
    pub fn nearest(&self, query: &Point3) -> Nearest {
        let mut best = (usize::MAX, f64::INFINITY);
        self.nearest_in(0, self.nodes.len(), query, &mut best);
        // build() guarantees at least one node, so `best` is always set
        let node = &self.nodes[best.0.min(self.nodes.len() - 1)];
        Nearest {
            point: node.point,
            id: node.id,
            distance: best.1.sqrt(),
        }
    }

    fn nearest_in(&self, lo: usize, hi: usize, query: &Point3, best: &mut (usize, f64)) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let node = &self.nodes[mid];
        let d2 = (node.point - query).norm_squared();
        if d2 < best.1 || (d2 == best.1 && node.id < self.nodes[best.0].id) {
            *best = (mid, d2);
        }
        if hi - lo == 1 {
            return;
        }

        let delta = query[node.axis] - node.point[node.axis];
        let (near, far) = if delta < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };
        self.nearest_in(near.0, near.1, query, best);
        // `<=` so an equally distant point with a lower id is still reached
        if delta * delta <= best.1 {
            self.nearest_in(far.0, far.1, query, best);
        }
    }

    /// Ids of every indexed point within `radius` of `query` (inclusive),
    /// in ascending id order.
    pub fn within_radius(&self, query: &Point3, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if radius >= 0.0 {
            self.radius_in(0, self.nodes.len(), query, radius * radius, &mut out);
        }
        out.sort_unstable();
        out
    }

    fn radius_in(&self, lo: usize, hi: usize, query: &Point3, r2: f64, out: &mut Vec<usize>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let node = &self.nodes[mid];
        if (node.point - query).norm_squared() <= r2 {
            out.push(node.id);
        }
        let delta = query[node.axis] - node.point[node.axis];
        if delta <= 0.0 || delta * delta <= r2 {
            self.radius_in(lo, mid, query, r2, out);
        }
        if delta >= 0.0 || delta * delta <= r2 {
            self.radius_in(mid + 1, hi, query, r2, out);
        }
    }
}

fn widest_axis(nodes: &[Node]) -> usize {
    let aabb = Aabb3::from_points(nodes.iter().map(|n| &n.point)).unwrap_or_else(Aabb3::empty);
    let extent = aabb.max - aabb.min;
    if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn arb_point() -> impl Strategy<Value = Point3> {
        (-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
    }

    fn arb_cloud(max: usize) -> impl Strategy<Value = Vec<Point3>> {
        prop::collection::vec(arb_point(), 1..max)
    }

    /// Lowest id at the smallest distance.
    fn brute_force(points: &[Point3], q: &Point3) -> (usize, f64) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p - q).norm_squared()))
            .fold((usize::MAX, f64::INFINITY), |best, (i, d2)| {
                if d2 < best.1 {
                    (i, d2)
                } else {
                    best
                }
            })
    }

    proptest! {
        #[test]
        fn test_nearest_matches_brute_force(
            points in arb_cloud(200),
            queries in prop::collection::vec(arb_point(), 1..20),
        ) {
            let tree = KdTree::build(&points).unwrap();
            for q in &queries {
                let hit = tree.nearest(q);
                let (id, d2) = brute_force(&points, q);
                prop_assert_eq!(hit.id, id);
                prop_assert!((hit.distance - d2.sqrt()).abs() <= 1e-12);
                prop_assert_eq!(hit.point, points[hit.id]);
            }
        }

        #[test]
        fn test_indexed_point_finds_itself_or_lower_twin(points in arb_cloud(100)) {
            let tree = KdTree::build(&points).unwrap();
            for (i, p) in points.iter().enumerate() {
                let hit = tree.nearest(p);
                prop_assert_eq!(hit.distance, 0.0);
                prop_assert_eq!(hit.id, points.iter().position(|q| q == p).unwrap_or(i));
            }
        }

        #[test]
        fn test_within_radius_matches_brute_force(
            points in arb_cloud(200),
            q in arb_point(),
            radius in 0.0f64..4.0,
        ) {
            let tree = KdTree::build(&points).unwrap();
            let expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| (*p - q).norm_squared() <= radius * radius)
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(tree.within_radius(&q, radius), expected);
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(KdTree::build(&[]).unwrap_err(), SpatialError::EmptyIndex);
    }

    #[test]
    fn test_non_finite_point_is_rejected() {
        let pts = [Point3::origin(), Point3::new(f64::NAN, 0.0, 0.0)];
        assert_eq!(
            KdTree::build(&pts).unwrap_err(),
            SpatialError::NonFinitePoint(1)
        );
    }

    #[test]
    fn test_single_point() {
        let tree = KdTree::build(&[Point3::new(1.0, 2.0, 3.0)]).unwrap();
        let hit = tree.nearest(&Point3::new(-4.0, 0.0, 9.0));
        assert_eq!(hit.id, 0);
        assert_relative_eq!(hit.point, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_duplicate_points_resolve_to_lowest_id() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let tree = KdTree::build(&[Point3::origin(), p, p, p]).unwrap();
        assert_eq!(tree.nearest(&Point3::new(1.1, 1.0, 1.0)).id, 1);
        assert_eq!(tree.within_radius(&p, 0.0), vec![1, 2, 3]);
        assert!(tree.within_radius(&p, -1.0).is_empty());
    }

    #[test]
    fn test_equidistant_points_resolve_to_lowest_id() {
        let points: Vec<Point3> = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0]]
            .iter()
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        for rotated in 0..points.len() {
            let mut shuffled = points.clone();
            shuffled.rotate_left(rotated);
            let tree = KdTree::build(&shuffled).unwrap();
            assert_eq!(tree.nearest(&Point3::origin()).id, 0);
        }
    }
}
