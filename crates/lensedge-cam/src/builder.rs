//! Assembly of timed machine paths from pass configurations.
//!
//! Roughing passes and the final bevel pass are each solved by the
//! external kinematics solver, converted to the global frame via the
//! wheel mounting position, and stitched together with approach and
//! retract transitions onto one continuous timeline.

use lensedge_math::lerp;

use crate::contour::{ContourPass, ContourSolver, KinematicsSolution};
use crate::error::{CamError, CamResult};
use crate::path::{FeedRate, MovementPath, OperationKind, OperationStep, PassSegment};
use crate::tool::ToolStack;
use crate::EdgingSettings;

/// Dwell duration for a transition whose endpoints coincide (s).
const ZERO_DISTANCE_DWELL: f64 = 0.1;

/// A pass the builder had to skip, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedPass {
    /// The operation that was skipped.
    pub kind: OperationKind,
    /// Why the pass could not be built.
    pub error: CamError,
}

/// Result of assembling the full edging operation.
#[derive(Debug, Clone)]
pub struct CompletePath {
    /// Home plus approach/cut pairs for every solvable roughing pass.
    pub roughing: MovementPath,
    /// Standalone beveling path (home, approach, cut, retract).
    pub beveling: MovementPath,
    /// Roughing and beveling stitched onto one timeline with a single
    /// closing retract.
    pub complete: MovementPath,
    /// Frame-index metadata over `complete`, one segment per step.
    pub segments: Vec<PassSegment>,
    /// Passes skipped because of configuration errors.
    pub skipped: Vec<SkippedPass>,
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![start];
    }
    (0..n)
        .map(|i| lerp(start, end, i as f64 / (n - 1) as f64))
        .collect()
}

/// Build a linear transition between two (radial, axial) positions.
///
/// Duration is distance over feed rate; the spindle angle is held at
/// `spindle_hold_deg` (the following step's starting angle) for the whole
/// move. Frame count targets the animation rate, clamped to the settings'
/// minimum frame count and minimum per-frame dt. Coincident endpoints
/// produce a short dwell so the step still carries a valid time axis.
pub fn linear_transition(
    kind: OperationKind,
    start: (f64, f64),
    end: (f64, f64),
    spindle_hold_deg: f64,
    feed_rate: f64,
    settings: &EdgingSettings,
) -> CamResult<OperationStep> {
    if feed_rate <= 0.0 {
        return Err(CamError::NonPositiveFeedRate(feed_rate));
    }
    let distance = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
    let min_frames = settings.min_transition_frames.max(2);
    let (duration, frames) = if distance > 0.0 {
        let duration = distance / feed_rate;
        let target = (duration * settings.frame_rate).ceil() as usize;
        let cap = ((duration / settings.min_frame_dt).floor() as usize + 1).max(min_frames);
        (duration, target.clamp(min_frames, cap))
    } else {
        (ZERO_DISTANCE_DWELL, min_frames)
    };
    OperationStep::new(
        kind,
        linspace(start.0, end.0, frames),
        linspace(start.1, end.1, frames),
        vec![spindle_hold_deg; frames],
        linspace(0.0, duration, frames),
        FeedRate::Linear {
            mm_per_sec: feed_rate,
        },
    )
}

/// Build a cutting step from a kinematics solution.
///
/// Machine offsets convert to the global frame via the wheel mounting
/// position: global radial = wheel radial - machine radial, global axial
/// = wheel axial + machine axial. Duration is the total spindle angle
/// traversed over 360 times the spindle period, and per-sample time is
/// proportional to the cumulative angle, so non-uniform angular spacing
/// is timed correctly and sample count does not affect duration.
pub fn cutting_step(
    kind: OperationKind,
    solution: &KinematicsSolution,
    wheel_position: (f64, f64),
    spindle_period: f64,
) -> CamResult<OperationStep> {
    if spindle_period <= 0.0 {
        return Err(CamError::NonPositiveSpindlePeriod(spindle_period));
    }
    if solution.is_empty() {
        return Err(CamError::EmptyContour);
    }
    let n = solution.len();
    let radial: Vec<f64> = solution
        .machine_radial
        .iter()
        .map(|x| wheel_position.0 - x)
        .collect();
    let axial: Vec<f64> = solution
        .machine_axial
        .iter()
        .map(|z| wheel_position.1 + z)
        .collect();
    let spindle_deg = solution.spindle_deg.clone();

    let start_angle = spindle_deg[0];
    let max_angle = spindle_deg.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let traversed = max_angle - start_angle;
    let time: Vec<f64> = if traversed > 0.0 {
        spindle_deg
            .iter()
            .map(|&a| (a - start_angle) / 360.0 * spindle_period)
            .collect()
    } else {
        // Degenerate solution with no rotation: fall back to
        // sample-count-proportional timing.
        linspace(0.0, n as f64 * spindle_period / 360.0, n)
    };

    OperationStep::new(
        kind,
        radial,
        axial,
        spindle_deg,
        time,
        FeedRate::Spindle {
            sec_per_rev: spindle_period,
        },
    )
}

fn home_step(settings: &EdgingSettings) -> CamResult<OperationStep> {
    OperationStep::new(
        OperationKind::Home,
        vec![settings.home_radial],
        vec![settings.home_axial],
        vec![0.0],
        vec![0.0],
        FeedRate::Linear {
            mm_per_sec: settings.feed_rate,
        },
    )
}

/// Build the roughing portion: home, then an approach/cut pair per pass.
///
/// Unsolvable or misconfigured passes are skipped and reported once; the
/// remaining passes still build. No retract is emitted after the last
/// pass; the complete-path assembler appends the single closing retract.
pub fn roughing_path(
    passes: &[ContourPass],
    solver: &dyn ContourSolver,
    stack: &ToolStack,
    settings: &EdgingSettings,
) -> CamResult<(MovementPath, Vec<SkippedPass>)> {
    let wheel = stack
        .roughing_wheel()
        .ok_or(CamError::MissingWheel("roughing"))?;
    let wheel_pos = stack.wheel_position(wheel);

    let mut steps = vec![home_step(settings)?];
    let mut skipped = Vec::new();
    let mut current = (settings.home_radial, settings.home_axial);

    for (i, pass) in passes.iter().enumerate() {
        let kind = OperationKind::Roughing { pass: i };
        let cut = match solver
            .solve(&pass.contour, wheel, stack.tilt_angle_deg)
            .and_then(|sol| cutting_step(kind, &sol, wheel_pos, pass.spindle_period))
        {
            Ok(cut) => cut,
            Err(error) => {
                skipped.push(SkippedPass { kind, error });
                continue;
            }
        };
        let approach = linear_transition(
            OperationKind::Approach,
            current,
            cut.start_position(),
            cut.start_spindle_deg(),
            settings.feed_rate,
            settings,
        )?;
        current = cut.end_position();
        steps.push(approach);
        steps.push(cut);
    }

    Ok((MovementPath::new(steps), skipped))
}

/// Build the standalone beveling path: home, approach, cut, retract.
pub fn beveling_path(
    bevel: &ContourPass,
    solver: &dyn ContourSolver,
    stack: &ToolStack,
    settings: &EdgingSettings,
) -> CamResult<(MovementPath, Vec<SkippedPass>)> {
    let home = (settings.home_radial, settings.home_axial);
    let mut steps = vec![home_step(settings)?];
    let mut skipped = Vec::new();
    match bevel_cut(bevel, solver, stack) {
        Ok(cut) => {
            steps.extend(bevel_tail(&cut, home, home, settings)?);
        }
        Err(error) => skipped.push(SkippedPass {
            kind: OperationKind::Beveling,
            error,
        }),
    }
    Ok((MovementPath::new(steps), skipped))
}

fn bevel_cut(
    bevel: &ContourPass,
    solver: &dyn ContourSolver,
    stack: &ToolStack,
) -> CamResult<OperationStep> {
    let wheel = stack.bevel_wheel().ok_or(CamError::MissingWheel("bevel"))?;
    let wheel_pos = stack.wheel_position(wheel);
    let solution = solver.solve(&bevel.contour, wheel, stack.tilt_angle_deg)?;
    cutting_step(OperationKind::Beveling, &solution, wheel_pos, bevel.spindle_period)
}

/// Approach from `from`, the cut itself, and the retract back home.
fn bevel_tail(
    cut: &OperationStep,
    from: (f64, f64),
    home: (f64, f64),
    settings: &EdgingSettings,
) -> CamResult<Vec<OperationStep>> {
    let approach = linear_transition(
        OperationKind::Approach,
        from,
        cut.start_position(),
        cut.start_spindle_deg(),
        settings.feed_rate,
        settings,
    )?;
    let retract = linear_transition(
        OperationKind::Retract,
        cut.end_position(),
        home,
        0.0,
        settings.feed_rate,
        settings,
    )?;
    Ok(vec![approach, cut.clone(), retract])
}

/// Build the full edging operation: roughing passes plus the bevel pass.
///
/// The complete path stitches the bevel approach directly from the last
/// roughing position (no intermediate retract) and ends with one retract
/// back home. The bevel contour is solved exactly once and reused for
/// the standalone beveling path. An empty pass list degrades to the
/// standalone beveling path.
pub fn complete_path(
    passes: &[ContourPass],
    bevel: &ContourPass,
    solver: &dyn ContourSolver,
    stack: &ToolStack,
    settings: &EdgingSettings,
) -> CamResult<CompletePath> {
    let home = (settings.home_radial, settings.home_axial);
    let (roughing, mut skipped) = roughing_path(passes, solver, stack, settings)?;

    let mut complete_steps = roughing.steps().to_vec();
    let from = roughing.end_position().unwrap_or(home);

    let beveling = match bevel_cut(bevel, solver, stack) {
        Ok(cut) => {
            complete_steps.extend(bevel_tail(&cut, from, home, settings)?);
            let mut standalone = vec![home_step(settings)?];
            standalone.extend(bevel_tail(&cut, home, home, settings)?);
            MovementPath::new(standalone)
        }
        Err(error) => {
            skipped.push(SkippedPass {
                kind: OperationKind::Beveling,
                error,
            });
            // Close the path anyway so the machine ends at home.
            if from != home {
                complete_steps.push(linear_transition(
                    OperationKind::Retract,
                    from,
                    home,
                    0.0,
                    settings.feed_rate,
                    settings,
                )?);
            }
            MovementPath::new(vec![home_step(settings)?])
        }
    };

    let complete = MovementPath::new(complete_steps);
    let segments = segments_for(&complete, passes, bevel);

    Ok(CompletePath {
        roughing,
        beveling,
        complete,
        segments,
        skipped,
    })
}

/// One segment per step, tiling the complete path's frame index space.
fn segments_for(
    complete: &MovementPath,
    passes: &[ContourPass],
    bevel: &ContourPass,
) -> Vec<PassSegment> {
    let mut segments = Vec::with_capacity(complete.steps().len());
    let mut start = 0;
    for step in complete.steps() {
        let end = start + step.frame_count() - 1;
        let max_removal_rate = match step.kind() {
            OperationKind::Roughing { pass } => {
                passes.get(pass).and_then(|p| p.max_removal_rate)
            }
            OperationKind::Beveling => bevel.max_removal_rate,
            _ => None,
        };
        segments.push(PassSegment {
            start,
            end,
            kind: step.kind(),
            max_removal_rate,
        });
        start = end + 1;
    }
    segments
}
