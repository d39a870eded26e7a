#![warn(missing_docs)]

//! Machine path generation for lens edging operations.
//!
//! This crate turns a sequence of target contours (roughing passes plus a
//! final bevel contour) into a single, time-stamped machine-motion path:
//! per-pass cutting motion from an external kinematics solver, stitched
//! together with approach/retract transitions onto one continuous
//! timeline, plus pass-segment metadata for the stock simulator.
//!
//! # Example
//!
//! ```
//! use lensedge_cam::{
//!     complete_path, CamResult, ContourPass, ContourSolver, EdgingSettings,
//!     GrindingWheel, KinematicsSolution, LensContour, ToolStack,
//! };
//!
//! /// Toy solver that keeps the wheel at a fixed offset from the contour.
//! /// Real machines plug an external kinematics package in here.
//! struct FixedOffsetSolver;
//!
//! impl ContourSolver for FixedOffsetSolver {
//!     fn solve(
//!         &self,
//!         contour: &LensContour,
//!         wheel: &GrindingWheel,
//!         _tilt_angle_deg: f64,
//!     ) -> CamResult<KinematicsSolution> {
//!         let n = contour.len();
//!         let radial = contour.radii.iter().map(|r| r + wheel.cutting_radius).collect();
//!         let axial = vec![0.0; n];
//!         let spindle = (0..n).map(|i| 360.0 * i as f64 / (n - 1) as f64).collect();
//!         KinematicsSolution::new(radial, axial, spindle)
//!     }
//! }
//!
//! let stack = ToolStack::default_machine();
//! let settings = EdgingSettings::default();
//! let passes = vec![ContourPass::new(LensContour::circular(40.0, 361), 15.0)];
//! let bevel = ContourPass::new(LensContour::circular(38.0, 361), 8.0);
//!
//! let built = complete_path(&passes, &bevel, &FixedOffsetSolver, &stack, &settings).unwrap();
//! assert!(built.complete.total_duration() > 0.0);
//! ```

mod builder;
mod contour;
mod error;
mod path;
mod tool;

pub use builder::{
    beveling_path, complete_path, cutting_step, linear_transition, roughing_path, CompletePath,
    SkippedPass,
};
pub use contour::{ContourPass, ContourSolver, KinematicsSolution, LensContour};
pub use error::{CamError, CamResult};
pub use path::{FeedRate, MovementPath, OperationKind, OperationStep, PassSegment, PathExport};
pub use tool::{GrindingWheel, ToolStack, WheelProfile};

use serde::{Deserialize, Serialize};

/// Settings for path generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgingSettings {
    /// Feed rate for transition moves (mm/s).
    pub feed_rate: f64,
    /// Default spindle feed for cutting (seconds per revolution).
    pub spindle_period: f64,
    /// Home position, radial axis (mm).
    pub home_radial: f64,
    /// Home position, axial axis (mm).
    pub home_axial: f64,
    /// Target playback rate for transition frames (Hz).
    pub frame_rate: f64,
    /// Minimum frame count for a transition step.
    pub min_transition_frames: usize,
    /// Minimum time between consecutive frames (s).
    pub min_frame_dt: f64,
}

impl Default for EdgingSettings {
    fn default() -> Self {
        Self {
            feed_rate: 50.0,
            spindle_period: 10.0,
            home_radial: -50.0,
            home_axial: 0.0,
            frame_rate: 30.0,
            min_transition_frames: 2,
            min_frame_dt: 1e-3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = EdgingSettings::default();
        assert!(settings.feed_rate > 0.0);
        assert!(settings.spindle_period > 0.0);
        assert!(settings.frame_rate > 0.0);
        assert!(settings.min_transition_frames >= 2);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = EdgingSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: EdgingSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}
