//! Lens blank generation via signed-distance-field composition.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{VolumeGrid, AIR, MATERIAL};
use crate::{StockSimError, StockSimResult};

/// Extra space around the blank in every direction (mm).
const BOUNDS_MARGIN: f64 = 1.0;

/// Parameters describing an uncut lens blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlankParams {
    /// Front surface sphere radius (mm), convex.
    pub front_radius: f64,
    /// Back surface sphere radius (mm), concave (meniscus).
    pub back_radius: f64,
    /// Center thickness (mm).
    pub center_thickness: f64,
    /// Blank diameter (mm).
    pub diameter: f64,
    /// Voxel size (mm); smaller is finer and slower.
    pub resolution: f64,
    /// Half-width of the boundary smoothing ramp (mm). Zero disables it.
    /// Rendering only; collision always uses the binary material test.
    pub smoothing_half_width: f64,
}

impl Default for BlankParams {
    fn default() -> Self {
        Self {
            front_radius: 500.0,
            back_radius: 100.0,
            center_thickness: 2.0,
            diameter: 70.0,
            resolution: 0.5,
            smoothing_half_width: 0.0,
        }
    }
}

impl BlankParams {
    fn validate(&self) -> StockSimResult<()> {
        if self.resolution <= 0.0 {
            return Err(StockSimError::ResolutionTooSmall(self.resolution));
        }
        if self.front_radius <= 0.0
            || self.back_radius <= 0.0
            || self.center_thickness <= 0.0
            || self.diameter <= 0.0
        {
            return Err(StockSimError::InvalidBlank(format!(
                "all dimensions must be positive: front {}, back {}, thickness {}, diameter {}",
                self.front_radius, self.back_radius, self.center_thickness, self.diameter
            )));
        }
        if self.back_radius < self.diameter / 2.0 {
            return Err(StockSimError::InvalidBlank(format!(
                "back radius {} is smaller than half the diameter {}",
                self.back_radius,
                self.diameter / 2.0
            )));
        }
        Ok(())
    }
}

/// Generate the volumetric model of an uncut lens blank.
///
/// The blank is the SDF intersection of three surfaces:
/// - a cylinder of the blank diameter about the lens axis,
/// - the convex front sphere, apex at z = 0,
/// - the concave back sphere, inverted so the meniscus cavity reads as
///   outside.
///
/// A cell is material iff the combined distance is non-positive. With a
/// positive `smoothing_half_width` the scalar ramps linearly across the
/// boundary shell for anti-aliased rendering; the collision simulator
/// ignores the ramp and tests material membership at the d = 0 surface.
pub fn generate_blank(params: &BlankParams) -> StockSimResult<VolumeGrid> {
    params.validate()?;

    let res = params.resolution;
    let half_diameter = params.diameter / 2.0;
    let back_sag = params.back_radius
        - (params.back_radius * params.back_radius - half_diameter * half_diameter).sqrt();

    let xy_size = params.diameter + BOUNDS_MARGIN;
    let z_size = back_sag + params.center_thickness + BOUNDS_MARGIN;
    let xy_dim = (xy_size / res).ceil() as usize;
    let z_dim = (z_size / res).ceil() as usize;

    let origin = [
        -(xy_dim as f64 * res) / 2.0,
        -(xy_dim as f64 * res) / 2.0,
        0.0,
    ];

    // Sphere centers on the lens axis: front apex at z = 0, back surface
    // offset by the center thickness.
    let front_center_z = params.front_radius;
    let back_center_z = params.center_thickness + params.back_radius;
    let smoothing = params.smoothing_half_width;

    let len = xy_dim * xy_dim * z_dim;
    let scalars: Vec<f32> = (0..len)
        .into_par_iter()
        .map(|idx| {
            let ix = idx % xy_dim;
            let iy = (idx / xy_dim) % xy_dim;
            let iz = idx / (xy_dim * xy_dim);
            let px = origin[0] + ix as f64 * res;
            let py = origin[1] + iy as f64 * res;
            let pz = origin[2] + iz as f64 * res;

            let radial_sq = px * px + py * py;
            let d_cylinder = radial_sq.sqrt() - half_diameter;
            let dz_front = pz - front_center_z;
            let d_front = (radial_sq + dz_front * dz_front).sqrt() - params.front_radius;
            let dz_back = pz - back_center_z;
            let d_back = params.back_radius - (radial_sq + dz_back * dz_back).sqrt();

            // SDF intersection: inside all three iff the max is inside.
            let d = d_cylinder.max(d_front).max(d_back);

            if smoothing > 0.0 {
                if d < -smoothing {
                    MATERIAL
                } else if d > smoothing {
                    AIR
                } else {
                    (MATERIAL as f64 * (1.0 - (d + smoothing) / (2.0 * smoothing))) as f32
                }
            } else if d <= 0.0 {
                MATERIAL
            } else {
                AIR
            }
        })
        .collect();

    VolumeGrid::with_scalars([xy_dim, xy_dim, z_dim], res, origin, scalars)
}
