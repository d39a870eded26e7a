//! Timed machine-motion steps and paths.
//!
//! An [`OperationStep`] is one phase of motion (home, approach, cutting,
//! retract) with per-frame positions and step-local cumulative time. A
//! [`MovementPath`] strings steps onto one continuous timeline and
//! flattens them into the arrays the renderer and simulator consume.

use serde::{Deserialize, Serialize};

use crate::error::{CamError, CamResult};

/// The phase of motion an operation step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OperationKind {
    /// Resting position, spindle retracted.
    Home,
    /// Linear move into cutting position.
    Approach,
    /// Material removal along one roughing contour.
    Roughing {
        /// Zero-based index into the roughing pass list.
        pass: usize,
    },
    /// Final-contour cutting with the bevel wheel.
    Beveling,
    /// Linear move back to the home position.
    Retract,
}

impl OperationKind {
    /// True for phases where a wheel is engaged with the lens.
    pub fn is_cutting(&self) -> bool {
        matches!(self, OperationKind::Roughing { .. } | OperationKind::Beveling)
    }
}

/// Feed parameter attached to a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeedRate {
    /// Linear feed for transition phases (mm/s).
    Linear {
        /// Feed rate in mm/s.
        mm_per_sec: f64,
    },
    /// Spindle feed for cutting phases (seconds per revolution).
    Spindle {
        /// Spindle period in s/rev.
        sec_per_rev: f64,
    },
}

/// One phase of motion with per-frame positions and timing.
///
/// Immutable once constructed; the constructor enforces equal-length
/// arrays and a non-decreasing time axis starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStep {
    kind: OperationKind,
    radial: Vec<f64>,
    axial: Vec<f64>,
    spindle_deg: Vec<f64>,
    time: Vec<f64>,
    feed: FeedRate,
}

impl OperationStep {
    /// Create a step, validating the frame-array invariants.
    pub fn new(
        kind: OperationKind,
        radial: Vec<f64>,
        axial: Vec<f64>,
        spindle_deg: Vec<f64>,
        time: Vec<f64>,
        feed: FeedRate,
    ) -> CamResult<Self> {
        let n = radial.len();
        if n == 0 {
            return Err(CamError::EmptyContour);
        }
        if axial.len() != n || spindle_deg.len() != n || time.len() != n {
            return Err(CamError::MismatchedStep(format!(
                "radial {}, axial {}, spindle {}, time {}",
                n,
                axial.len(),
                spindle_deg.len(),
                time.len()
            )));
        }
        if time[0] != 0.0 || time.windows(2).any(|w| w[1] < w[0]) {
            return Err(CamError::NonMonotonicTime);
        }
        Ok(Self {
            kind,
            radial,
            axial,
            spindle_deg,
            time,
            feed,
        })
    }

    /// The phase of motion.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Radial positions (mm), one per frame.
    pub fn radial(&self) -> &[f64] {
        &self.radial
    }

    /// Axial positions (mm), one per frame.
    pub fn axial(&self) -> &[f64] {
        &self.axial
    }

    /// Spindle angles (degrees), one per frame.
    pub fn spindle_deg(&self) -> &[f64] {
        &self.spindle_deg
    }

    /// Step-local cumulative time (s), starting at 0.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// The feed parameter for this step.
    pub fn feed(&self) -> FeedRate {
        self.feed
    }

    /// Number of frames in the step.
    pub fn frame_count(&self) -> usize {
        self.radial.len()
    }

    /// Total duration of the step (s).
    pub fn duration(&self) -> f64 {
        *self.time.last().expect("step has at least one frame")
    }

    /// First (radial, axial) position.
    pub fn start_position(&self) -> (f64, f64) {
        (self.radial[0], self.axial[0])
    }

    /// Last (radial, axial) position.
    pub fn end_position(&self) -> (f64, f64) {
        (
            *self.radial.last().expect("step has at least one frame"),
            *self.axial.last().expect("step has at least one frame"),
        )
    }

    /// Spindle angle at the first frame (degrees).
    pub fn start_spindle_deg(&self) -> f64 {
        self.spindle_deg[0]
    }

    /// Spindle angle at the last frame (degrees).
    pub fn end_spindle_deg(&self) -> f64 {
        *self.spindle_deg.last().expect("step has at least one frame")
    }
}

/// Frame-index range over a complete path, tagging which operation and
/// rate ceiling apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassSegment {
    /// First frame of the segment (inclusive).
    pub start: usize,
    /// Last frame of the segment (inclusive).
    pub end: usize,
    /// The operation occupying this range.
    pub kind: OperationKind,
    /// Ceiling on volume removal rate (mm³/s), if configured.
    pub max_removal_rate: Option<f64>,
}

impl PassSegment {
    /// True if `frame` lies inside this segment.
    pub fn contains(&self, frame: usize) -> bool {
        self.start <= frame && frame <= self.end
    }
}

/// An ordered sequence of steps sharing one continuous timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementPath {
    steps: Vec<OperationStep>,
}

impl MovementPath {
    /// Create a path from steps in execution order.
    pub fn new(steps: Vec<OperationStep>) -> Self {
        Self { steps }
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[OperationStep] {
        &self.steps
    }

    /// True if the path has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Total frame count across all steps.
    pub fn frame_count(&self) -> usize {
        self.steps.iter().map(|s| s.frame_count()).sum()
    }

    /// Total duration across all steps (s).
    pub fn total_duration(&self) -> f64 {
        self.steps.iter().map(|s| s.duration()).sum()
    }

    /// Last (radial, axial) position, if the path has any frames.
    pub fn end_position(&self) -> Option<(f64, f64)> {
        self.steps.last().map(|s| s.end_position())
    }

    /// Flatten the steps onto one continuous timeline.
    ///
    /// Each step's local time is offset by the cumulative duration of the
    /// steps before it, so the first frame of a step lands exactly where
    /// the previous step ended.
    pub fn export(&self) -> PathExport {
        let n = self.frame_count();
        let mut radial = Vec::with_capacity(n);
        let mut axial = Vec::with_capacity(n);
        let mut spindle_deg = Vec::with_capacity(n);
        let mut time = Vec::with_capacity(n);
        let mut cumulative = 0.0;
        for step in &self.steps {
            radial.extend_from_slice(step.radial());
            axial.extend_from_slice(step.axial());
            spindle_deg.extend_from_slice(step.spindle_deg());
            time.extend(step.time().iter().map(|t| t + cumulative));
            cumulative += step.duration();
        }
        PathExport {
            radial,
            axial,
            spindle_deg,
            time,
        }
    }
}

/// Flattened path arrays consumed by the renderer and simulator.
///
/// All four arrays have equal length; `time` is non-decreasing and its
/// first element is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathExport {
    /// Radial positions (mm).
    pub radial: Vec<f64>,
    /// Axial positions (mm).
    pub axial: Vec<f64>,
    /// Spindle angles (degrees).
    pub spindle_deg: Vec<f64>,
    /// Cumulative time (s).
    pub time: Vec<f64>,
}

impl PathExport {
    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.radial.len()
    }

    /// True if the export has no frames.
    pub fn is_empty(&self) -> bool {
        self.radial.is_empty()
    }

    /// Total duration (s), 0 for an empty export.
    pub fn total_duration(&self) -> f64 {
        self.time.last().copied().unwrap_or(0.0)
    }

    /// Index of the frame closest after the query time, clamped to the
    /// valid range.
    pub fn frame_at(&self, time_sec: f64) -> usize {
        let idx = self.time.partition_point(|&t| t < time_sec);
        idx.min(self.frame_count().saturating_sub(1))
    }

    /// (radial, axial, spindle) position at the query time, using the
    /// nearest following frame. Returns `None` for an empty export.
    pub fn position_at(&self, time_sec: f64) -> Option<(f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let idx = self.frame_at(time_sec);
        Some((self.radial[idx], self.axial[idx], self.spindle_deg[idx]))
    }

    /// Replace the time axis with a corrected one of equal length.
    ///
    /// Used to feed a rate-constrained retiming back into the path
    /// without touching positions.
    pub fn retimed(&self, time: Vec<f64>) -> CamResult<PathExport> {
        if time.len() != self.frame_count() {
            return Err(CamError::MismatchedStep(format!(
                "{} frames vs {} time samples",
                self.frame_count(),
                time.len()
            )));
        }
        if time.first().is_some_and(|&t| t != 0.0) || time.windows(2).any(|w| w[1] < w[0]) {
            return Err(CamError::NonMonotonicTime);
        }
        Ok(PathExport {
            radial: self.radial.clone(),
            axial: self.axial.clone(),
            spindle_deg: self.spindle_deg.clone(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(kind: OperationKind, positions: &[(f64, f64)], duration: f64) -> OperationStep {
        let n = positions.len();
        let time = (0..n)
            .map(|i| {
                if n == 1 {
                    0.0
                } else {
                    duration * i as f64 / (n - 1) as f64
                }
            })
            .collect();
        OperationStep::new(
            kind,
            positions.iter().map(|p| p.0).collect(),
            positions.iter().map(|p| p.1).collect(),
            vec![0.0; n],
            time,
            FeedRate::Linear { mm_per_sec: 50.0 },
        )
        .unwrap()
    }

    #[test]
    fn test_step_rejects_mismatched_arrays() {
        let result = OperationStep::new(
            OperationKind::Home,
            vec![0.0, 1.0],
            vec![0.0],
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            FeedRate::Linear { mm_per_sec: 50.0 },
        );
        assert!(matches!(result, Err(CamError::MismatchedStep(_))));
    }

    #[test]
    fn test_step_rejects_decreasing_time() {
        let result = OperationStep::new(
            OperationKind::Approach,
            vec![0.0, 1.0, 2.0],
            vec![0.0; 3],
            vec![0.0; 3],
            vec![0.0, 2.0, 1.0],
            FeedRate::Linear { mm_per_sec: 50.0 },
        );
        assert!(matches!(result, Err(CamError::NonMonotonicTime)));
    }

    #[test]
    fn test_step_rejects_nonzero_time_origin() {
        let result = OperationStep::new(
            OperationKind::Approach,
            vec![0.0, 1.0],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![0.5, 1.0],
            FeedRate::Linear { mm_per_sec: 50.0 },
        );
        assert!(matches!(result, Err(CamError::NonMonotonicTime)));
    }

    #[test]
    fn test_export_time_is_continuous() {
        let path = MovementPath::new(vec![
            step(OperationKind::Home, &[(0.0, 0.0)], 0.0),
            step(OperationKind::Approach, &[(0.0, 0.0), (5.0, 0.0)], 2.0),
            step(OperationKind::Retract, &[(5.0, 0.0), (0.0, 0.0)], 3.0),
        ]);
        let export = path.export();
        assert_eq!(export.frame_count(), 5);
        assert_eq!(export.frame_count(), path.frame_count());
        assert!((export.total_duration() - 5.0).abs() < 1e-12);
        assert!(export.time.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(export.time[0], 0.0);
        // Step boundary picks up exactly where the previous step ended.
        assert!((export.time[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_position_lookup_clamps() {
        let path = MovementPath::new(vec![step(
            OperationKind::Approach,
            &[(0.0, 0.0), (10.0, 0.0)],
            2.0,
        )]);
        let export = path.export();
        let (r, _, _) = export.position_at(100.0).unwrap();
        assert!((r - 10.0).abs() < 1e-12);
        let (r, _, _) = export.position_at(-1.0).unwrap();
        assert!(r.abs() < 1e-12);
    }

    #[test]
    fn test_retimed_validates() {
        let path = MovementPath::new(vec![step(
            OperationKind::Approach,
            &[(0.0, 0.0), (10.0, 0.0)],
            2.0,
        )]);
        let export = path.export();
        assert!(export.retimed(vec![0.0]).is_err());
        assert!(export.retimed(vec![0.0, -1.0]).is_err());
        let slowed = export.retimed(vec![0.0, 4.0]).unwrap();
        assert!((slowed.total_duration() - 4.0).abs() < 1e-12);
        assert_eq!(slowed.radial, export.radial);
    }

    #[test]
    fn test_segment_contains() {
        let seg = PassSegment {
            start: 10,
            end: 20,
            kind: OperationKind::Roughing { pass: 0 },
            max_removal_rate: None,
        };
        assert!(seg.contains(10));
        assert!(seg.contains(20));
        assert!(!seg.contains(21));
        assert!(seg.kind.is_cutting());
    }
}
