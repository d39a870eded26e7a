//! Volume and removal-rate analysis over a death-time grid.

use serde::{Deserialize, Serialize};

use lensedge_cam::PassSegment;

use crate::grid::{DeathTimeGrid, AIR, MATERIAL};
use crate::{StockSimError, StockSimResult};

/// Rate ceiling applied to frames without a configured maximum (mm³/s).
pub const DEFAULT_RATE_CEILING: f64 = 100.0;

/// Remaining and removed volume over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeHistory {
    /// Query times (s).
    pub time: Vec<f64>,
    /// Material volume still present at each query time (mm³).
    pub remaining: Vec<f64>,
    /// Material volume removed by each query time (mm³).
    pub removed: Vec<f64>,
    /// Removal progress at each query time (percent of initial volume).
    pub percent_complete: Vec<f64>,
}

/// Per-frame removed volume paired with the applicable rate ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRates {
    /// Volume removed in each frame (mm³).
    pub volume_per_frame: Vec<f64>,
    /// Rate ceiling for each frame (mm³/s).
    pub max_rate: Vec<f64>,
}

/// Remaining/removed volume at each query time.
///
/// `frame_times` is the path's cumulative time axis; query times convert
/// to the grid's normalized death encoding through it. Air cells never
/// count as material, so remaining plus removed equals the initial
/// material volume at every query time.
pub fn volume_history(
    death: &DeathTimeGrid,
    frame_times: &[f64],
    query_times: &[f64],
    cell_volume: f64,
) -> VolumeHistory {
    let n_frames = frame_times.len();
    let initial_cells = death.scalars().iter().filter(|&&v| v > AIR).count();
    let initial_volume = initial_cells as f64 * cell_volume;

    let mut remaining = Vec::with_capacity(query_times.len());
    let mut removed = Vec::with_capacity(query_times.len());
    let mut percent_complete = Vec::with_capacity(query_times.len());

    for &t in query_times {
        let frames_elapsed = frame_times.partition_point(|&ft| ft <= t);
        let threshold = if n_frames == 0 {
            0.0
        } else {
            MATERIAL as f64 * frames_elapsed as f64 / n_frames as f64
        };
        // Never-cut cells hold exactly MATERIAL and survive every
        // threshold; air never counts as material.
        let alive = death
            .scalars()
            .iter()
            .filter(|&&v| v > AIR && f64::from(v) >= threshold)
            .count();
        let vol_remaining = alive as f64 * cell_volume;
        let vol_removed = initial_volume - vol_remaining;
        remaining.push(vol_remaining);
        removed.push(vol_removed);
        percent_complete.push(if initial_volume > 0.0 {
            vol_removed / initial_volume * 100.0
        } else {
            0.0
        });
    }

    VolumeHistory {
        time: query_times.to_vec(),
        remaining,
        removed,
        percent_complete,
    }
}

/// Bucket removed volume by death frame, paired with per-frame ceilings.
///
/// Cells that were never material (air) or never cut are excluded. Each
/// frame's ceiling comes from the pass segment covering it; frames
/// outside every segment inherit the previous covered value, and frames
/// in a segment without a configured maximum use [`DEFAULT_RATE_CEILING`].
pub fn removal_rates(
    death: &DeathTimeGrid,
    n_frames: usize,
    cell_volume: f64,
    segments: &[PassSegment],
) -> RemovalRates {
    let mut volume_per_frame = vec![0.0; n_frames];
    if n_frames > 0 {
        for &v in death.scalars() {
            if v <= AIR || v >= MATERIAL {
                continue;
            }
            let frame = (f64::from(v) / f64::from(MATERIAL) * n_frames as f64).floor() as usize;
            volume_per_frame[frame.min(n_frames - 1)] += cell_volume;
        }
    }

    let mut max_rate = vec![DEFAULT_RATE_CEILING; n_frames];
    for segment in segments {
        let Some(rate) = segment.max_removal_rate else {
            continue;
        };
        if rate <= 0.0 || segment.start >= n_frames {
            continue;
        }
        for slot in &mut max_rate[segment.start..=segment.end.min(n_frames - 1)] {
            *slot = rate;
        }
    }
    // Frames not covered by any segment carry the previous covered value.
    let mut last = DEFAULT_RATE_CEILING;
    for (i, slot) in max_rate.iter_mut().enumerate() {
        if segments.iter().any(|s| s.contains(i)) {
            last = *slot;
        } else {
            *slot = last;
        }
    }

    RemovalRates {
        volume_per_frame,
        max_rate,
    }
}

/// Stretch frame durations so no frame exceeds its rate ceiling.
///
/// Walking frames in order from adjusted time 0: a frame whose actual
/// removal rate exceeds a positive ceiling gets its duration stretched
/// to volume over ceiling; all other frames keep their original
/// duration. The result is non-decreasing and never shorter than the
/// original at any frame.
pub fn rate_constrained_retime(
    time: &[f64],
    volume_per_frame: &[f64],
    max_rate: &[f64],
) -> StockSimResult<Vec<f64>> {
    let n = time.len();
    if volume_per_frame.len() != n || max_rate.len() != n {
        return Err(StockSimError::MismatchedArrays(format!(
            "time {}, volume {}, ceilings {}",
            n,
            volume_per_frame.len(),
            max_rate.len()
        )));
    }

    let mut adjusted = vec![0.0; n];
    for i in 1..n {
        let original_dt = time[i] - time[i - 1];
        let actual_rate = if original_dt > 0.0 {
            volume_per_frame[i] / original_dt
        } else {
            0.0
        };
        let dt = if actual_rate > max_rate[i] && max_rate[i] > 0.0 {
            volume_per_frame[i] / max_rate[i]
        } else {
            original_dt
        };
        adjusted[i] = adjusted[i - 1] + dt;
    }
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::VolumeGrid;
    use lensedge_cam::OperationKind;

    /// 2x2x2 grid: one air cell, five cut cells, two never-cut cells.
    fn test_death_grid() -> DeathTimeGrid {
        VolumeGrid::with_scalars(
            [2, 2, 2],
            1.0,
            [0.0; 3],
            vec![AIR, 250.0, 500.0, 750.0, MATERIAL, MATERIAL, 125.0, 375.0],
        )
        .unwrap()
    }

    #[test]
    fn test_volume_conservation() {
        let death = test_death_grid();
        let frame_times = vec![0.0, 1.0, 2.0, 3.0];
        let queries = vec![0.0, 0.5, 1.0, 2.0, 3.0, 10.0];
        let history = volume_history(&death, &frame_times, &queries, 1.0);

        let initial = 7.0;
        for i in 0..queries.len() {
            assert!(
                (history.remaining[i] + history.removed[i] - initial).abs() < 1e-9,
                "conservation violated at t={}",
                queries[i]
            );
        }
        // Removed volume never decreases.
        assert!(history
            .removed
            .windows(2)
            .all(|w| w[1] >= w[0] - 1e-12));
        // Everything cuttable is gone by the end; the two sentinel cells
        // survive.
        assert!((history.remaining.last().unwrap() - 2.0).abs() < 1e-9);
        assert!((history.percent_complete.last().unwrap() - 5.0 / 7.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_history_counts_future_deaths() {
        let death = test_death_grid();
        let frame_times = vec![0.0, 1.0, 2.0, 3.0];
        // After one frame (threshold 250): only the cell at 125 is gone;
        // the cell dying exactly at the threshold still counts as alive.
        let history = volume_history(&death, &frame_times, &[0.0], 1.0);
        assert!((history.remaining[0] - 6.0).abs() < 1e-9);
        assert!((history.removed[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_removal_rate_histogram() {
        let death = test_death_grid();
        let rates = removal_rates(&death, 4, 1.0, &[]);
        // Death values 125/375 land in frames 0/1, 250 in frame 1,
        // 500 in frame 2, 750 in frame 3; sentinels and air excluded.
        assert_eq!(rates.volume_per_frame, vec![1.0, 2.0, 1.0, 1.0]);
        assert_eq!(rates.max_rate, vec![DEFAULT_RATE_CEILING; 4]);
    }

    #[test]
    fn test_segment_ceilings_and_forward_fill() {
        let death = test_death_grid();
        let segments = vec![PassSegment {
            start: 0,
            end: 1,
            kind: OperationKind::Roughing { pass: 0 },
            max_removal_rate: Some(5.0),
        }];
        let rates = removal_rates(&death, 4, 1.0, &segments);
        // Frames 2 and 3 fall outside every segment and inherit the
        // previous covered ceiling.
        assert_eq!(rates.max_rate, vec![5.0, 5.0, 5.0, 5.0]);

        // A segment without a configured maximum keeps the default.
        let segments = vec![PassSegment {
            start: 0,
            end: 3,
            kind: OperationKind::Beveling,
            max_removal_rate: None,
        }];
        let rates = removal_rates(&death, 4, 1.0, &segments);
        assert_eq!(rates.max_rate, vec![DEFAULT_RATE_CEILING; 4]);
    }

    #[test]
    fn test_retime_stretches_hot_frames() {
        let time = vec![0.0, 1.0, 2.0, 3.0];
        let volume = vec![0.0, 10.0, 1.0, 0.0];
        let ceilings = vec![5.0; 4];
        let adjusted = rate_constrained_retime(&time, &volume, &ceilings).unwrap();

        // Frame 1 removes 10 mm³ in 1 s against a 5 mm³/s ceiling, so it
        // stretches to 2 s; the rest keep their original durations.
        assert_eq!(adjusted, vec![0.0, 2.0, 3.0, 4.0]);

        for i in 1..4 {
            let dt = adjusted[i] - adjusted[i - 1];
            let original_dt = time[i] - time[i - 1];
            assert!(dt >= original_dt - 1e-12);
            if dt > 0.0 {
                assert!(volume[i] / dt <= ceilings[i] + 1e-9);
            }
        }
    }

    #[test]
    fn test_retime_keeps_compliant_frames() {
        let time = vec![0.0, 2.0, 4.0];
        let volume = vec![0.0, 4.0, 4.0];
        let ceilings = vec![10.0; 3];
        let adjusted = rate_constrained_retime(&time, &volume, &ceilings).unwrap();
        assert_eq!(adjusted, time);
    }

    #[test]
    fn test_retime_zero_dt_frames() {
        // Coincident time samples produce a zero rate and keep zero dt.
        let time = vec![0.0, 0.0, 1.0];
        let volume = vec![0.0, 5.0, 0.0];
        let ceilings = vec![1.0; 3];
        let adjusted = rate_constrained_retime(&time, &volume, &ceilings).unwrap();
        assert_eq!(adjusted, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_retime_rejects_mismatched_lengths() {
        let result = rate_constrained_retime(&[0.0, 1.0], &[0.0], &[1.0, 1.0]);
        assert!(matches!(result, Err(StockSimError::MismatchedArrays(_))));
    }
}
