//! "Is this a 7" classification
//!
//! A 7 is read permissively: a mostly horizontal top stroke, one dominant
//! horizontal reversal, then a stroke that falls toward the opposite side and
//! ends near the bottom of the bounding box. Screen coordinates, y grows down.

use glam::Vec2;

use super::sampler::PointerSample;
use crate::settings::GestureTolerances;

/// Why a path was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooFewSamples,
    TooSmall,
    /// Needs exactly one dominant horizontal reversal
    WrongReversalCount(usize),
    TopStrokeTooShort,
    TopStrokeNotFlat,
    CornerTooLow,
    DiagonalTooShallow,
    DiagonalTooShort,
    NoDrift,
    EndsTooHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched)
    }
}

/// A maximal stretch of samples moving the same horizontal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end: usize,
    /// -1 left, 1 right, 0 no horizontal movement at all
    pub dir: i8,
}

/// Split points into horizontal runs.
///
/// A reversal registers once the path retreats `jitter` from the furthest
/// point reached in the current direction, so wobble doesn't fragment runs.
pub fn horizontal_runs(points: &[Vec2], jitter: f32) -> Vec<Run> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut start = 0;
    let mut pivot = 0;
    let mut dir: i8 = 0;

    for i in 1..points.len() {
        let dx = points[i].x - points[pivot].x;
        if dx.abs() < jitter {
            continue;
        }
        let sign: i8 = if dx > 0.0 { 1 } else { -1 };
        if dir == 0 || sign == dir {
            dir = sign;
            pivot = i;
        } else {
            runs.push(Run {
                start,
                end: pivot,
                dir,
            });
            start = pivot;
            dir = sign;
            pivot = i;
        }
    }

    runs.push(Run {
        start,
        end: points.len() - 1,
        dir,
    });
    runs
}

/// Drop runs too narrow to be a deliberate stroke, merging what remains
fn dominant_runs(points: &[Vec2], runs: &[Run], min_extent: f32) -> Vec<Run> {
    let mut kept: Vec<Run> = Vec::new();
    for run in runs {
        let extent = (points[run.end].x - points[run.start].x).abs();
        if run.dir == 0 || extent < min_extent {
            continue;
        }
        match kept.last_mut() {
            Some(last) if last.dir == run.dir => last.end = run.end,
            _ => kept.push(*run),
        }
    }
    kept
}

/// Classify a finished path against the "7" template
pub fn classify(samples: &[PointerSample], surface: Vec2, tol: &GestureTolerances) -> Verdict {
    use RejectReason::*;

    if samples.len() < tol.min_samples.max(2) {
        return Verdict::Rejected(TooFewSamples);
    }

    let raw: Vec<Vec2> = samples.iter().map(PointerSample::pos).collect();
    let (min, max) = raw.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    let size = max - min;
    let surface = surface.max(Vec2::ONE);
    let span = (size.x / surface.x).max(size.y / surface.y);
    if span < tol.min_surface_fraction {
        return Verdict::Rejected(TooSmall);
    }

    // Unit square; a degenerate axis collapses to 0
    let extent = size.max(Vec2::splat(f32::EPSILON));
    let norm: Vec<Vec2> = raw.iter().map(|p| (*p - min) / extent).collect();

    let runs = dominant_runs(&norm, &horizontal_runs(&norm, tol.jitter), tol.min_run_extent);
    if runs.len() != 2 || runs[0].dir != -runs[1].dir {
        return Verdict::Rejected(WrongReversalCount(runs.len().saturating_sub(1)));
    }

    let s = runs[0].dir as f32;
    let first = runs[0].start;
    let last = norm.len() - 1;

    // Corner: furthest along the top stroke while still high up
    let corner = (first..=runs[1].start)
        .max_by(|&a, &b| {
            let ka = s * norm[a].x - norm[a].y;
            let kb = s * norm[b].x - norm[b].y;
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(runs[1].start);

    // Top stroke
    if s * (norm[corner].x - norm[first].x) < tol.min_horizontal_coverage {
        return Verdict::Rejected(TopStrokeTooShort);
    }
    let top = raw[corner] - raw[first];
    if top.y.abs() > tol.max_top_slope * top.x.abs() {
        return Verdict::Rejected(TopStrokeNotFlat);
    }
    if norm[corner].y > tol.top_tolerance {
        return Verdict::Rejected(CornerTooLow);
    }

    // Diagonal
    let diag = raw[last] - raw[corner];
    if diag.y <= 0.0 || diag.y < tol.min_diagonal_slope * diag.x.abs() {
        return Verdict::Rejected(DiagonalTooShallow);
    }
    if norm[last].y - norm[corner].y < tol.min_diagonal_drop {
        return Verdict::Rejected(DiagonalTooShort);
    }
    if -s * (norm[last].x - norm[corner].x) < tol.min_diagonal_drift {
        return Verdict::Rejected(NoDrift);
    }
    if norm[last].y < 1.0 - tol.bottom_tolerance {
        return Verdict::Rejected(EndsTooHigh);
    }

    Verdict::Matched
}

/// Build an evenly sampled polyline through `corners`, `steps` samples per leg.
///
/// Handy for synthesizing strokes in demos and tests.
pub fn polyline(corners: &[Vec2], steps: usize, t0: f64, dt: f64) -> Vec<PointerSample> {
    let mut out = Vec::new();
    let steps = steps.max(1);
    let mut t = t0;
    if let Some(first) = corners.first() {
        out.push(PointerSample::new(first.x, first.y, t));
    }
    for leg in corners.windows(2) {
        for i in 1..=steps {
            t += dt;
            let p = leg[0].lerp(leg[1], i as f32 / steps as f32);
            out.push(PointerSample::new(p.x, p.y, t));
        }
    }
    out
}
