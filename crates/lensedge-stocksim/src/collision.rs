//! Tool-voxel collision simulation producing per-cell death times.
//!
//! The complete path is replayed frame by frame against the blank grid.
//! For each processed frame the active wheel's profile surface is tested
//! against every cell in the lens's rotating frame, and cells inside the
//! surface record the frame as their death time. The per-cell update is
//! an elementwise minimum, so frames may be processed in any order, or
//! split into batches and merged, without changing the result.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use lensedge_cam::{GrindingWheel, OperationKind, PassSegment, PathExport, ToolStack};
use lensedge_math::{rotate_xy, sqrt_clamped, Vec3};

use crate::grid::{DeathTimeGrid, VolumeGrid, AIR, MATERIAL};
use crate::{StockSimError, StockSimResult};

/// Half-width of the graded band around the tool surface (mm).
///
/// The band only refines the recorded death value near the surface; it
/// does not widen the cut region.
const SOFT_BAND: f64 = 0.1;

/// Debug logging macro - only prints when the debug-sim feature is enabled
#[allow(unused_macros)]
#[cfg(feature = "debug-sim")]
macro_rules! debug_sim {
    ($($arg:tt)*) => {
        eprintln!($($arg)*)
    };
}

/// No-op version when debug-sim is disabled
#[allow(unused_macros)]
#[cfg(not(feature = "debug-sim"))]
macro_rules! debug_sim {
    ($($arg:tt)*) => {};
}

/// One wheel's collision geometry, fixed for the whole simulation.
struct ActiveWheel<'a> {
    edge_offset: f64,
    cutting_radius: f64,
    wheel: &'a GrindingWheel,
}

impl<'a> ActiveWheel<'a> {
    fn new(wheel: &'a GrindingWheel) -> Self {
        Self {
            edge_offset: wheel.edge_offset(),
            cutting_radius: wheel.cutting_radius,
            wheel,
        }
    }
}

/// Replay a complete path against the blank and record death times.
///
/// `frame_stride` processes every k-th frame; skipped frames trade
/// accuracy for speed (a cell crossed only mid-stride is not recorded).
pub fn simulate(
    blank: &VolumeGrid,
    path: &PathExport,
    segments: &[PassSegment],
    stack: &ToolStack,
    frame_stride: usize,
) -> StockSimResult<DeathTimeGrid> {
    let cancel = AtomicBool::new(false);
    simulate_with_cancel(blank, path, segments, stack, frame_stride, &cancel)
}

/// [`simulate`] with a cooperative cancellation flag.
///
/// The flag is checked between frames; a cancelled simulation returns
/// [`StockSimError::Cancelled`] and no partial grid is published.
pub fn simulate_with_cancel(
    blank: &VolumeGrid,
    path: &PathExport,
    segments: &[PassSegment],
    stack: &ToolStack,
    frame_stride: usize,
    cancel: &AtomicBool,
) -> StockSimResult<DeathTimeGrid> {
    let n_frames = path.frame_count();
    if path.axial.len() != n_frames
        || path.spindle_deg.len() != n_frames
        || path.time.len() != n_frames
    {
        return Err(StockSimError::MismatchedArrays(format!(
            "radial {}, axial {}, spindle {}, time {}",
            n_frames,
            path.axial.len(),
            path.spindle_deg.len(),
            path.time.len()
        )));
    }
    let stride = frame_stride.max(1);

    // The death grid starts as a binary copy of the blank. Any smoothing
    // shell in the blank scalars is rendering-only and must not leak into
    // collision semantics, so membership is thresholded at the d = 0
    // surface value.
    let mut death: Vec<f32> = blank
        .scalars()
        .iter()
        .map(|&v| if v >= MATERIAL / 2.0 { MATERIAL } else { AIR })
        .collect();

    if n_frames == 0 {
        return DeathTimeGrid::with_scalars(
            blank.dimensions(),
            blank.spacing(),
            blank.origin(),
            death,
        );
    }

    // Fixed per-simulation lookup state: one entry per wheel role.
    let roughing = stack.roughing_wheel().map(ActiveWheel::new);
    let beveling = stack.bevel_wheel().map(ActiveWheel::new);

    let tilt = stack.tilt_angle_deg.to_radians();
    let axis_rest = Vec3::new(-tilt.sin(), 0.0, tilt.cos());

    let [nx, ny, _] = blank.dimensions();
    let origin = blank.origin();
    let spacing = blank.spacing();

    for i in (0..n_frames).step_by(stride) {
        if cancel.load(Ordering::Relaxed) {
            return Err(StockSimError::Cancelled);
        }

        // Collisions only happen while a wheel is engaged; transition
        // frames carry no active wheel.
        let Some(segment) = segments.iter().find(|s| s.contains(i) && s.kind.is_cutting())
        else {
            continue;
        };
        let active = match segment.kind {
            OperationKind::Roughing { .. } => roughing.as_ref(),
            OperationKind::Beveling => beveling.as_ref(),
            _ => None,
        };
        let Some(active) = active else {
            continue;
        };

        // Machine offsets recovered from the stored global positions,
        // then rotated into the lens frame by the negated spindle angle.
        let machine_radial = stack.base_position[0] - path.radial[i];
        let machine_axial = stack.base_position[2] - path.axial[i];
        let angle = -path.spindle_deg[i].to_radians();
        let (origin_x, origin_y) = rotate_xy(machine_radial, 0.0, angle);
        let tool_origin = Vec3::new(origin_x, origin_y, machine_axial);
        let (axis_x, axis_y) = rotate_xy(axis_rest.x, axis_rest.y, angle);
        let tool_axis = Vec3::new(axis_x, axis_y, axis_rest.z);

        debug_sim!(
            "frame {i}/{n_frames}: wheel {} at ({:.2}, {:.2})",
            active.wheel.id,
            machine_radial,
            machine_axial
        );

        let frame_weight = (n_frames - i) as f64 + 0.5;
        death.par_iter_mut().enumerate().for_each(|(idx, cell)| {
            // Air can never get an earlier death time than 0.
            if *cell <= AIR {
                return;
            }
            let ix = idx % nx;
            let iy = (idx / nx) % ny;
            let iz = idx / (nx * ny);
            let v = Vec3::new(
                origin[0] + ix as f64 * spacing - tool_origin.x,
                origin[1] + iy as f64 * spacing - tool_origin.y,
                origin[2] + iz as f64 * spacing - tool_origin.z,
            );
            let h = v.dot(&tool_axis);
            let d = sqrt_clamped(v.norm_squared() - h * h);

            // Height in the wheel's profile frame; outside the sampled
            // range the wheel has no surface, so no cut is possible.
            let local_h = h - active.edge_offset;
            let Some(profile_offset) = active.wheel.profile.radial_offset_at(local_h) else {
                return;
            };
            let surface_radius = active.cutting_radius + profile_offset;

            let band = (d - surface_radius).clamp(-SOFT_BAND, SOFT_BAND);
            if band >= SOFT_BAND {
                return;
            }
            let weight = (1.0 - band / SOFT_BAND) * 0.5;
            let value = (MATERIAL as f64 * (1.0 - weight * frame_weight / n_frames as f64))
                .max(AIR as f64) as f32;
            if value < *cell {
                *cell = value;
            }
        });
    }

    DeathTimeGrid::with_scalars(blank.dimensions(), blank.spacing(), blank.origin(), death)
}
