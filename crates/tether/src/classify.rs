//! Selection of faces by orientation.

use std::collections::BTreeSet;

use log::trace;
use tether_math::{angle_between, Vec3};
use tether_mesh::Mesh;

/// Faces whose normal is within `angle_tolerance` radians of the *negated*
/// `reference_normal`.
///
/// The comparison is strict (`angle < angle_tolerance`), except that an
/// exactly anti-parallel face is always selected, so a zero tolerance picks
/// exact matches only. Every face within tolerance is returned; choosing or
/// merging among them is up to the caller. A zero reference selects nothing.
pub fn classify(mesh: &Mesh, reference_normal: &Vec3, angle_tolerance: f64) -> BTreeSet<usize> {
    let target = -reference_normal;
    let selected: BTreeSet<usize> = mesh
        .faces()
        .iter()
        .enumerate()
        .filter(|(_, face)| {
            angle_between(face.normal().as_ref(), &target)
                .is_some_and(|angle| angle < angle_tolerance || angle == 0.0)
        })
        .map(|(i, _)| i)
        .collect();
    trace!(
        "classify: {} of {} faces within {angle_tolerance} rad",
        selected.len(),
        mesh.face_count()
    );
    selected
}
