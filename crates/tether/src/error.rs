//! Error taxonomy of the rope tools.

use std::fmt;

use tether_kernel::KernelError;
use tether_spatial::SpatialError;
use thiserror::Error;

/// A step of one of the rope operations, attached to failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Baking rotation and scale into the patch.
    NormalizeTransform,
    /// Reading the reference normal off the patch.
    CaptureNormal,
    /// Boolean intersection with the target.
    Intersect,
    /// Extrude, convex hull and cap classification.
    CapExtraction,
    /// Merging the cap and deleting the rest of the hull.
    RimRemoval,
    /// Flip, weld and bevel of the cap outline.
    WeldAndBevel,
    /// Outline to curve conversion.
    CurveConversion,
    /// Setting the rope parameters on the curve.
    Parametrize,
    /// Snapping a curve onto a surface.
    Relax,
    /// Curve to mesh conversion with UVs.
    Bake,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NormalizeTransform => "normalize transform",
            Stage::CaptureNormal => "capture normal",
            Stage::Intersect => "intersect",
            Stage::CapExtraction => "cap extraction",
            Stage::RimRemoval => "rim removal",
            Stage::WeldAndBevel => "weld and bevel",
            Stage::CurveConversion => "curve conversion",
            Stage::Parametrize => "parametrize",
            Stage::Relax => "relax",
            Stage::Bake => "bake",
        };
        f.write_str(name)
    }
}

/// Errors returned by the rope operations. Every error ends the call; no
/// partial result is produced.
#[derive(Error, Debug)]
pub enum TetherError {
    /// A spatial index was built over zero points.
    #[error("spatial index is empty")]
    EmptyIndex,

    /// The target surface has no vertices to snap to.
    #[error("target surface has {vertices} vertices")]
    InsufficientTargetGeometry {
        /// Vertex count of the target.
        vertices: usize,
    },

    /// The reference patch does not overlap the target solid.
    #[error("reference patch does not intersect the target solid")]
    NoIntersection,

    /// The extruded patch spans no volume.
    #[error("degenerate convex hull: {0}")]
    DegenerateHull(String),

    /// No hull face faces away from the reference normal.
    #[error("no cap face within {tolerance} rad of the reversed reference normal")]
    NoCapFaceFound {
        /// Angular tolerance used, in radians.
        tolerance: f64,
    },

    /// The curve has no splines, an empty spline or non-finite data.
    #[error("invalid curve input: {0}")]
    InvalidCurveInput(String),

    /// The reference patch has no faces or a singular transform.
    #[error("invalid reference patch: {0}")]
    InvalidPatch(String),

    /// A parameter is out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Any other kernel failure, tagged with the stage it happened in.
    #[error("{stage} failed: {source}")]
    Kernel {
        /// Stage that called the kernel.
        stage: Stage,
        /// Kernel error.
        #[source]
        source: KernelError,
    },

    /// Parameters could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl TetherError {
    /// Stage the error belongs to, `None` for input and configuration errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TetherError::Kernel { stage, .. } => Some(*stage),
            TetherError::EmptyIndex | TetherError::InsufficientTargetGeometry { .. } => {
                Some(Stage::Relax)
            }
            TetherError::NoIntersection => Some(Stage::Intersect),
            TetherError::DegenerateHull(_) | TetherError::NoCapFaceFound { .. } => {
                Some(Stage::CapExtraction)
            }
            TetherError::InvalidPatch(_) => Some(Stage::NormalizeTransform),
            TetherError::InvalidCurveInput(_)
            | TetherError::InvalidParams(_)
            | TetherError::Config(_) => None,
        }
    }

    /// Wrap a kernel error for `stage`, keeping hull degeneracy as its own
    /// variant.
    pub(crate) fn kernel(stage: Stage) -> impl FnOnce(KernelError) -> TetherError {
        move |source| match source {
            KernelError::DegenerateHull(msg) => TetherError::DegenerateHull(msg),
            source => TetherError::Kernel { stage, source },
        }
    }
}

impl From<SpatialError> for TetherError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::EmptyIndex => TetherError::EmptyIndex,
            SpatialError::NonFinitePoint(i) => {
                TetherError::InvalidParams(format!("target vertex {i} is not finite after offset"))
            }
        }
    }
}

/// Result type for the rope operations.
pub type Result<T> = std::result::Result<T, TetherError>;
