//! End-to-end runs of the rope tools on a sphere.

use approx::assert_relative_eq;
use tether::{
    bake, classify, relax, synthesize, BakeParams, NativeKernel, ReferencePatch, RelaxParams,
    Stage, SynthesisParams, TetherError,
};
use tether_math::{Transform, Vec3};
use tether_mesh::primitives::{cube, plane, uv_sphere};

fn sphere_and_patch() -> (tether_mesh::Mesh, ReferencePatch) {
    let target = uv_sphere(1.0, 32, 16);
    let patch = ReferencePatch::new(plane(0.2), Transform::translation(0.0, 0.0, 0.95));
    (target, patch)
}

#[test]
fn test_synthesize_then_bake_on_sphere() {
    let (target, patch) = sphere_and_patch();
    let params = SynthesisParams {
        curve_tilt_degrees: 90.0,
        ..Default::default()
    };
    let curve = synthesize(&NativeKernel, &target, &patch, &params).unwrap();
    assert!(curve.point_count() > 0);
    assert!(curve.is_cyclic());

    let band = params.curve_depth + params.bevel_offset;
    for p in curve.world_points() {
        let to_surface = (p.coords.norm() - 1.0).abs();
        assert!(to_surface <= band, "point {p} is {to_surface} from the sphere");
    }
    for p in curve.points() {
        assert_relative_eq!(p.tilt, std::f64::consts::FRAC_PI_2, epsilon = 1e-15);
    }
    assert_eq!(curve.offset, -1.1 * params.curve_depth + params.curve_offset);

    let before = curve.clone();
    let mesh = bake(&NativeKernel, &curve, &BakeParams::default()).unwrap();
    assert!(mesh.face_count() > 0);
    assert!(mesh.faces().iter().all(|f| f.uvs().is_some()));
    assert_eq!(curve, before);
}

#[test]
fn test_synthesize_leaves_inputs_alone() {
    let (target, patch) = sphere_and_patch();
    let (target_before, patch_before) = (target.clone(), patch.clone());
    synthesize(&NativeKernel, &target, &patch, &SynthesisParams::default()).unwrap();
    assert_eq!(target, target_before);
    assert_eq!(patch, patch_before);
}

#[test]
fn test_patch_away_from_target() {
    let target = uv_sphere(1.0, 32, 16);
    let patch = ReferencePatch::new(plane(0.2), Transform::translation(5.0, 0.0, 0.0));
    let err = synthesize(&NativeKernel, &target, &patch, &SynthesisParams::default()).unwrap_err();
    assert!(matches!(err, TetherError::NoIntersection));
    assert_eq!(err.stage(), Some(Stage::Intersect));
    assert!(err.to_string().contains("does not intersect"));
}

#[test]
fn test_tangent_patch_has_no_area_to_trace() {
    // a patch touching the pole only meets the sphere in a point
    let target = uv_sphere(1.0, 32, 16);
    let patch = ReferencePatch::new(plane(0.2), Transform::translation(0.0, 0.0, 1.0));
    let params = SynthesisParams {
        curve_tilt_degrees: 90.0,
        ..Default::default()
    };
    let err = synthesize(&NativeKernel, &target, &patch, &params).unwrap_err();
    assert!(matches!(err, TetherError::NoIntersection));
    assert_eq!(err.stage(), Some(Stage::Intersect));
}

#[test]
fn test_relaxed_rope_stays_put() {
    let (target, patch) = sphere_and_patch();
    let curve = synthesize(&NativeKernel, &target, &patch, &SynthesisParams::default()).unwrap();
    let once = relax(&curve, &target, &RelaxParams::default()).unwrap();
    let twice = relax(&once, &target, &RelaxParams::default()).unwrap();
    for (a, b) in once.world_points().iter().zip(twice.world_points()) {
        assert_relative_eq!(*a, b, epsilon = 1e-12);
    }
    for p in once.world_points() {
        assert!(target.positions().iter().any(|v| (v - p).norm() < 1e-12));
    }
}

#[test]
fn test_classify_cube_faces() {
    let mesh = cube(2.0);
    let down = classify(&mesh, &Vec3::z(), 0.1);
    assert_eq!(down.into_iter().collect::<Vec<_>>(), vec![0]);
    assert!(classify(&mesh, &Vec3::new(1.0, 1.0, 0.0), 0.1).is_empty());
}

#[test]
fn test_params_from_toml() {
    let params = SynthesisParams::from_toml_str(
        r#"
        bevel_offset = 0.05
        curve_depth = 0.02
        curve_tilt_degrees = 180.0
        "#,
    )
    .unwrap();
    let (target, patch) = sphere_and_patch();
    let curve = synthesize(&NativeKernel, &target, &patch, &params).unwrap();
    for p in curve.points() {
        assert_relative_eq!(p.tilt, std::f64::consts::PI, epsilon = 1e-15);
    }
    assert_eq!(curve.bevel_depth, 0.02);
}
