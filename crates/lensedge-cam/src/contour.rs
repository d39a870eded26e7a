//! Lens contours, pass parameters, and the kinematics solver boundary.

use serde::{Deserialize, Serialize};

use crate::error::{CamError, CamResult};
use crate::tool::GrindingWheel;

/// A target lens contour in polar form.
///
/// `radii` holds one radius per angular sample, evenly spaced over a full
/// revolution. `heights` optionally carries a per-sample axial height for
/// curved bevels; `None` means a flat contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensContour {
    /// Polar radii (mm), one per angular sample.
    pub radii: Vec<f64>,
    /// Optional axial height map (mm), same length as `radii`.
    pub heights: Option<Vec<f64>>,
}

impl LensContour {
    /// Create a flat contour from polar radii.
    pub fn new(radii: Vec<f64>) -> Self {
        Self {
            radii,
            heights: None,
        }
    }

    /// Create a contour with a per-sample axial height map.
    pub fn with_heights(radii: Vec<f64>, heights: Vec<f64>) -> CamResult<Self> {
        if radii.len() != heights.len() {
            return Err(CamError::MismatchedStep(format!(
                "{} radii vs {} heights",
                radii.len(),
                heights.len()
            )));
        }
        Ok(Self {
            radii,
            heights: Some(heights),
        })
    }

    /// Create a circular contour of constant radius with `samples` points.
    pub fn circular(radius: f64, samples: usize) -> Self {
        Self::new(vec![radius; samples])
    }

    /// Number of angular samples.
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// True if the contour has no samples.
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Height map with flat contours expanded to zeros.
    pub fn heights_or_flat(&self) -> Vec<f64> {
        match &self.heights {
            Some(h) => h.clone(),
            None => vec![0.0; self.radii.len()],
        }
    }
}

/// One cutting pass: a target contour plus its feed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPass {
    /// The contour to cut.
    pub contour: LensContour,
    /// Spindle feed for this pass (seconds per revolution).
    pub spindle_period: f64,
    /// Optional ceiling on volume removal rate (mm³/s), consumed by the
    /// removal-rate analyzer.
    pub max_removal_rate: Option<f64>,
}

impl ContourPass {
    /// Create a pass with the given contour and spindle period.
    pub fn new(contour: LensContour, spindle_period: f64) -> Self {
        Self {
            contour,
            spindle_period,
            max_removal_rate: None,
        }
    }

    /// Set the maximum volume removal rate (mm³/s).
    pub fn with_max_removal_rate(mut self, rate: f64) -> Self {
        self.max_removal_rate = Some(rate);
        self
    }
}

/// Machine coordinates that keep a wheel in contact with a contour.
///
/// All arrays have equal length and span one or more full revolutions.
/// Offsets are machine-local; the path builder converts them to the global
/// frame via the wheel mounting position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicsSolution {
    /// Machine radial offsets (mm).
    pub machine_radial: Vec<f64>,
    /// Machine axial offsets (mm).
    pub machine_axial: Vec<f64>,
    /// Spindle angles (degrees), non-decreasing over the traversal.
    pub spindle_deg: Vec<f64>,
}

impl KinematicsSolution {
    /// Create a solution, validating that all arrays share one length.
    pub fn new(
        machine_radial: Vec<f64>,
        machine_axial: Vec<f64>,
        spindle_deg: Vec<f64>,
    ) -> CamResult<Self> {
        if machine_radial.len() != machine_axial.len()
            || machine_radial.len() != spindle_deg.len()
        {
            return Err(CamError::MismatchedSolution(format!(
                "radial {}, axial {}, spindle {}",
                machine_radial.len(),
                machine_axial.len(),
                spindle_deg.len()
            )));
        }
        Ok(Self {
            machine_radial,
            machine_axial,
            spindle_deg,
        })
    }

    /// Number of samples in the solution.
    pub fn len(&self) -> usize {
        self.machine_radial.len()
    }

    /// True if the solution has no samples.
    pub fn is_empty(&self) -> bool {
        self.machine_radial.is_empty()
    }
}

/// The external kinematics solver boundary.
///
/// Implementations map one contour to machine coordinates for one wheel.
/// A solver may fail for a contour it cannot realize; the path builder
/// then skips that pass and reports it instead of aborting the build.
pub trait ContourSolver {
    /// Solve machine coordinates for one traversal of `contour`.
    fn solve(
        &self,
        contour: &LensContour,
        wheel: &GrindingWheel,
        tilt_angle_deg: f64,
    ) -> CamResult<KinematicsSolution>;
}
