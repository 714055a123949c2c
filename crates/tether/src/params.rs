//! Parameter sets of the rope operations, with the tool defaults and TOML
//! loading.
//!
//! ```
//! use tether::SynthesisParams;
//!
//! let params = SynthesisParams::from_toml_str("curve_depth = 0.05").unwrap();
//! assert_eq!(params.curve_depth, 0.05);
//! assert_eq!(params.bevel_offset, 0.1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetherError};

/// Thickness of the extrusion that separates the two hull caps.
pub const CAP_EXTRUDE_THICKNESS: f64 = 0.01;
/// Segments of the corner bevel on the cap outline.
pub const BEVEL_SEGMENTS: usize = 2;
/// Bevel profile: the middle profile point sits on the original corner.
pub const BEVEL_PROFILE: f64 = 1.0;
/// Samples per segment of the synthesized curve.
pub const CURVE_RESOLUTION: usize = 4;
/// Factor on the curve depth that pushes the rope just outside the outline.
pub const ROPE_OFFSET_BIAS: f64 = 1.1;

/// Parameters of [`synthesize`](crate::synthesize).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    /// Corner bevel distance on the cap outline.
    pub bevel_offset: f64,
    /// Weld distance for the cap outline.
    pub merge_threshold: f64,
    /// Rope radius (curve bevel depth).
    pub curve_depth: f64,
    /// Flat extension of the rope profile.
    pub curve_extrude: f64,
    /// Extra radial offset of the rope profile.
    pub curve_offset: f64,
    /// Tilt of every control point, in degrees.
    pub curve_tilt_degrees: f64,
    /// Tolerance for selecting the cap face, in radians.
    pub cap_angle_tolerance: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            bevel_offset: 0.1,
            merge_threshold: 0.01,
            curve_depth: 0.1,
            curve_extrude: 0.1,
            curve_offset: 0.1,
            curve_tilt_degrees: 0.0,
            cap_angle_tolerance: 0.1,
        }
    }
}

impl SynthesisParams {
    /// Parse from TOML; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject non-finite values and negative distances or tolerances.
    pub fn validate(&self) -> Result<()> {
        finite(&[
            ("curve_offset", self.curve_offset),
            ("curve_tilt_degrees", self.curve_tilt_degrees),
        ])?;
        non_negative(&[
            ("bevel_offset", self.bevel_offset),
            ("merge_threshold", self.merge_threshold),
            ("curve_depth", self.curve_depth),
            ("curve_extrude", self.curve_extrude),
            ("cap_angle_tolerance", self.cap_angle_tolerance),
        ])
    }

    /// Offset stored on the synthesized curve: `-1.1 * depth + offset`.
    pub fn rope_offset(&self) -> f64 {
        -ROPE_OFFSET_BIAS * self.curve_depth + self.curve_offset
    }

    /// Control point tilt in radians.
    pub fn tilt_radians(&self) -> f64 {
        self.curve_tilt_degrees.to_radians()
    }
}

/// Parameters of [`relax`](crate::relax).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxParams {
    /// Factor applied to the handle vectors after snapping.
    pub handle_scale: f64,
    /// Distance the target vertices are pushed along their normals before
    /// snapping.
    pub surface_offset: f64,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            handle_scale: 1.0,
            surface_offset: 0.0,
        }
    }
}

impl RelaxParams {
    /// Parse from TOML; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject non-finite values.
    pub fn validate(&self) -> Result<()> {
        finite(&[
            ("handle_scale", self.handle_scale),
            ("surface_offset", self.surface_offset),
        ])
    }
}

/// Parameters of [`bake`](crate::bake).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeParams {
    /// Chart angle limit of the automatic unwrap, in degrees.
    pub uv_angle_limit_degrees: f64,
    /// Angle limit of the limited dissolve, in degrees.
    pub decimate_angle_degrees: f64,
    /// Face whose UVs are propagated over the quads.
    pub active_face: usize,
}

impl Default for BakeParams {
    fn default() -> Self {
        Self {
            uv_angle_limit_degrees: 60.0,
            decimate_angle_degrees: 5.0,
            active_face: 0,
        }
    }
}

impl BakeParams {
    /// Parse from TOML; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject non-finite angles, a non-positive unwrap limit and a negative
    /// dissolve limit.
    pub fn validate(&self) -> Result<()> {
        non_negative(&[("decimate_angle_degrees", self.decimate_angle_degrees)])?;
        if !(self.uv_angle_limit_degrees.is_finite() && self.uv_angle_limit_degrees > 0.0) {
            return Err(TetherError::InvalidParams(format!(
                "uv_angle_limit_degrees must be positive, got {}",
                self.uv_angle_limit_degrees
            )));
        }
        Ok(())
    }
}

fn finite(values: &[(&str, f64)]) -> Result<()> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(TetherError::InvalidParams(format!("{name} is not finite: {v}"))),
        None => Ok(()),
    }
}

fn non_negative(values: &[(&str, f64)]) -> Result<()> {
    finite(values)?;
    match values.iter().find(|(_, v)| *v < 0.0) {
        Some((name, v)) => Err(TetherError::InvalidParams(format!("{name} is negative: {v}"))),
        None => Ok(()),
    }
}
