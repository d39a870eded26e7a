#![warn(missing_docs)]

//! Voxel stock simulation for lens edging.
//!
//! This crate models the uncut lens blank as a dense scalar grid built
//! from signed distance fields, replays a complete machine path against
//! it to record per-cell death times, and derives removal statistics
//! from the result:
//!
//! - [`generate_blank`] - SDF composition of cylinder and front/back
//!   spheres into a [`VolumeGrid`]
//! - [`simulate`] - tool-voxel collision detection producing a
//!   [`DeathTimeGrid`]
//! - [`volume_history`] / [`removal_rates`] /
//!   [`rate_constrained_retime`] - volume-over-time analysis and the
//!   rate-limited time axis fed back into the path
//!
//! Grids are single-writer-then-read-only: one simulation pass fully
//! writes the death grid before any consumer reads it.

mod analysis;
mod blank;
mod collision;
mod grid;

pub use analysis::{
    rate_constrained_retime, removal_rates, volume_history, RemovalRates, VolumeHistory,
    DEFAULT_RATE_CEILING,
};
pub use blank::{generate_blank, BlankParams};
pub use collision::{simulate, simulate_with_cancel};
pub use grid::{DeathTimeGrid, VolumeGrid, AIR, MATERIAL};

use lensedge_cam::{PassSegment, PathExport, ToolStack};
use thiserror::Error;

/// Errors from stock simulation operations.
#[derive(Debug, Clone, Error)]
pub enum StockSimError {
    /// Blank parameters describe an impossible lens.
    #[error("invalid blank parameters: {0}")]
    InvalidBlank(String),

    /// Resolution is zero or negative.
    #[error("resolution too small: {0}")]
    ResolutionTooSmall(f64),

    /// Scalar buffer length does not match the grid dimensions.
    #[error("scalar buffer holds {got} values, grid needs {expected}")]
    GridMismatch {
        /// Product of the grid dimensions.
        expected: usize,
        /// Length of the supplied buffer.
        got: usize,
    },

    /// Input arrays disagree in length.
    #[error("mismatched array lengths: {0}")]
    MismatchedArrays(String),

    /// The simulation was cancelled between frames.
    #[error("simulation cancelled")]
    Cancelled,
}

/// Result type for stock simulation operations.
pub type StockSimResult<T> = std::result::Result<T, StockSimError>;

/// Generate a blank and machine it in one call.
///
/// Convenience wrapper for consumers that only want the final death-time
/// grid: builds the blank from `params`, then replays `path` against it.
pub fn machined_blank(
    params: &BlankParams,
    path: &PathExport,
    segments: &[PassSegment],
    stack: &ToolStack,
    frame_stride: usize,
) -> StockSimResult<DeathTimeGrid> {
    let blank = generate_blank(params)?;
    simulate(&blank, path, segments, stack, frame_stride)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lensedge_cam::{
        complete_path, CamError, CamResult, ContourPass, ContourSolver, EdgingSettings,
        GrindingWheel, KinematicsSolution, LensContour, WheelProfile,
    };

    /// Solver that keeps the wheel center at contour radius plus cutting
    /// radius, which is exact for circular contours.
    struct CircularSolver;

    impl ContourSolver for CircularSolver {
        fn solve(
            &self,
            contour: &LensContour,
            wheel: &GrindingWheel,
            _tilt_angle_deg: f64,
        ) -> CamResult<KinematicsSolution> {
            let n = contour.len();
            if n < 2 {
                return Err(CamError::EmptyContour);
            }
            let radial = contour
                .radii
                .iter()
                .map(|r| r + wheel.cutting_radius)
                .collect();
            let axial = vec![0.0; n];
            let spindle = (0..n).map(|i| 360.0 * i as f64 / (n - 1) as f64).collect();
            KinematicsSolution::new(radial, axial, spindle)
        }
    }

    fn pipeline_stack() -> ToolStack {
        let wheel = |id: &str| GrindingWheel {
            id: id.to_string(),
            name: id.to_string(),
            stack_offset: 0.0,
            cutting_radius: 4.0,
            cutting_height: 0.0,
            profile: WheelProfile::new(vec![(0.0, -20.0), (0.0, 20.0)]),
        };
        ToolStack {
            tilt_angle_deg: 0.0,
            base_position: [0.0, 0.0, 0.0],
            wheels: vec![wheel("rough"), wheel("bevel")],
        }
    }

    /// End to end: build a path with the CAM crate, machine a small
    /// blank, and check the removal statistics line up.
    #[test]
    fn test_pipeline_roughing_to_history() {
        let params = BlankParams {
            diameter: 10.0,
            front_radius: 50.0,
            back_radius: 30.0,
            center_thickness: 2.0,
            resolution: 0.5,
            smoothing_half_width: 0.0,
        };
        let stack = pipeline_stack();
        let settings = EdgingSettings {
            feed_rate: 10.0,
            home_radial: -20.0,
            home_axial: 0.0,
            ..EdgingSettings::default()
        };

        // Rough down to 4.5 mm, bevel at 4.0 mm.
        let passes = vec![ContourPass::new(LensContour::circular(4.5, 73), 15.0)
            .with_max_removal_rate(50.0)];
        let bevel = ContourPass::new(LensContour::circular(4.0, 73), 8.0);
        let built =
            complete_path(&passes, &bevel, &CircularSolver, &stack, &settings).unwrap();
        assert!(built.skipped.is_empty());

        let export = built.complete.export();
        let death = machined_blank(&params, &export, &built.segments, &stack, 1).unwrap();

        // Some material was removed, some survived.
        let cut_cells = death
            .scalars()
            .iter()
            .filter(|&&v| v > AIR && v < MATERIAL)
            .count();
        assert!(cut_cells > 0);
        assert!(death.scalars().iter().any(|&v| v == MATERIAL));

        let history = volume_history(
            &death,
            &export.time,
            &[0.0, export.total_duration()],
            death.cell_volume(),
        );
        let initial = death.material_cell_count() as f64 * death.cell_volume();
        assert!(history.removed[1] > 0.0);
        assert!((history.remaining[1] + history.removed[1] - initial).abs() < 1e-6);

        // Retiming the export against the configured ceilings keeps or
        // stretches every frame.
        let rates = removal_rates(
            &death,
            export.frame_count(),
            death.cell_volume(),
            &built.segments,
        );
        let adjusted =
            rate_constrained_retime(&export.time, &rates.volume_per_frame, &rates.max_rate)
                .unwrap();
        let retimed = export.retimed(adjusted).unwrap();
        assert!(retimed.total_duration() >= export.total_duration() - 1e-9);
    }

    #[test]
    fn test_machined_blank_propagates_blank_errors() {
        let params = BlankParams {
            diameter: -5.0,
            ..BlankParams::default()
        };
        let path = PathExport {
            radial: vec![],
            axial: vec![],
            spindle_deg: vec![],
            time: vec![],
        };
        let result = machined_blank(&params, &path, &[], &pipeline_stack(), 1);
        assert!(matches!(result, Err(StockSimError::InvalidBlank(_))));
    }
}
