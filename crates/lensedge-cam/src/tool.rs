//! Grinding wheel and spindle stack definitions.

use serde::{Deserialize, Serialize};

/// A wheel cross-section relative to its nominal cutting radius.
///
/// Samples are (radial offset, axial height) pairs, stored sorted by
/// height. Querying a height outside the sampled range returns `None`,
/// meaning the wheel cannot cut there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelProfile {
    samples: Vec<(f64, f64)>,
}

impl WheelProfile {
    /// Create a profile from (radial offset, axial height) samples.
    ///
    /// Samples are sorted by height on construction.
    pub fn new(mut samples: Vec<(f64, f64)>) -> Self {
        samples.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        Self { samples }
    }

    /// The sorted (radial offset, axial height) samples.
    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    /// Radial offset at axial height `h` by linear interpolation.
    ///
    /// Returns `None` outside the sampled height range: the wheel has no
    /// surface there, so no cut is possible.
    pub fn radial_offset_at(&self, h: f64) -> Option<f64> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if h < first.1 || h > last.1 {
            return None;
        }
        if self.samples.len() == 1 {
            return Some(first.0);
        }
        // Index of the first sample with height >= h.
        let hi = self
            .samples
            .partition_point(|&(_, height)| height < h)
            .min(self.samples.len() - 1)
            .max(1);
        let lo = hi - 1;
        let (off_lo, h_lo) = self.samples[lo];
        let (off_hi, h_hi) = self.samples[hi];
        if h_hi <= h_lo {
            return Some(off_lo);
        }
        let t = (h - h_lo) / (h_hi - h_lo);
        Some(lensedge_math::lerp(off_lo, off_hi, t))
    }

    /// The standard V-bevel cross-section.
    pub fn standard_bevel() -> Self {
        Self::new(vec![
            (-1.797, 9.045),
            (0.678, 1.427),
            (0.0, -0.371),
            (1.604, -1.427),
            (4.097, -9.045),
        ])
    }

    /// The flat roughing-wheel cross-section.
    pub fn roughing_flat() -> Self {
        Self::new(vec![(-3.09, 9.51), (3.09, -9.51)])
    }
}

/// A single grinding wheel on the spindle stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrindingWheel {
    /// Stable identifier for the wheel.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Distance from the spindle base to the wheel base (mm).
    pub stack_offset: f64,
    /// Nominal cutting radius used for path generation (mm).
    pub cutting_radius: f64,
    /// Height of the cutting edge relative to the wheel base (mm).
    pub cutting_height: f64,
    /// Cross-section relative to the cutting radius.
    pub profile: WheelProfile,
}

impl GrindingWheel {
    /// Axial offset of the cutting edge from the spindle base (mm).
    pub fn edge_offset(&self) -> f64 {
        self.stack_offset + self.cutting_height
    }
}

/// The complete spindle assembly: tilt, base position, and wheels in
/// stack order (roughing first, then beveling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStack {
    /// Global tilt of the spindle (degrees).
    pub tilt_angle_deg: f64,
    /// Position of the spindle pivot in the global frame (mm).
    pub base_position: [f64; 3],
    /// Wheels in stack order.
    pub wheels: Vec<GrindingWheel>,
}

impl ToolStack {
    /// The roughing wheel (first in the stack), if any.
    pub fn roughing_wheel(&self) -> Option<&GrindingWheel> {
        self.wheels.first()
    }

    /// The beveling wheel (second in the stack), falling back to the
    /// first wheel on single-wheel machines.
    pub fn bevel_wheel(&self) -> Option<&GrindingWheel> {
        self.wheels.get(1).or_else(|| self.wheels.first())
    }

    /// Global (radial, axial) mounting position of a wheel's cutting edge.
    ///
    /// The stack tilts about the machine Y axis, so the edge offset
    /// projects onto both global axes.
    pub fn wheel_position(&self, wheel: &GrindingWheel) -> (f64, f64) {
        let tilt = self.tilt_angle_deg.to_radians();
        let offset = wheel.edge_offset();
        (
            self.base_position[0] - offset * tilt.sin(),
            self.base_position[2] + offset * tilt.cos(),
        )
    }

    /// The default two-wheel edging machine configuration.
    pub fn default_machine() -> Self {
        Self {
            tilt_angle_deg: 18.0,
            base_position: [100.0, 0.0, -150.0],
            wheels: vec![
                GrindingWheel {
                    id: "rough_glass".to_string(),
                    name: "Roughing (Glass)".to_string(),
                    stack_offset: 10.0,
                    cutting_radius: 63.3,
                    cutting_height: 8.4,
                    profile: WheelProfile::roughing_flat(),
                },
                GrindingWheel {
                    id: "bevel_std".to_string(),
                    name: "Standard V-Bevel".to_string(),
                    stack_offset: 26.8,
                    cutting_radius: 45.0,
                    cutting_height: 7.5,
                    profile: WheelProfile::standard_bevel(),
                },
            ],
        }
    }
}
