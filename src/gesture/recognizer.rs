//! Gesture recognizer state machine
//!
//! `Idle -> Drawing -> {Matched, Rejected} -> Idle`. Out-of-order calls are
//! absorbed silently; pointer event ordering across devices is not reliable.

use glam::Vec2;

use super::sampler::PointerSample;
use super::shape::{Verdict, classify};
use crate::settings::GestureTolerances;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Drawing,
    Matched,
    Rejected,
}

/// Result of a finished gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Matched,
    Rejected,
}

/// One stroke from contact to release. Never reused after finalizing.
#[derive(Debug, Clone)]
pub struct GesturePath {
    samples: Vec<PointerSample>,
    state: GestureState,
}

impl GesturePath {
    /// Start a path at the first contact
    pub fn begin(first: PointerSample) -> Self {
        Self {
            samples: vec![first],
            state: GestureState::Drawing,
        }
    }

    pub fn samples(&self) -> &[PointerSample] {
        &self.samples
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Append while drawing. Out-of-order timestamps and repeats are dropped.
    pub fn push(&mut self, sample: PointerSample) -> bool {
        if self.state != GestureState::Drawing {
            return false;
        }
        if let Some(last) = self.samples.last() {
            if sample.t < last.t || (sample.x == last.x && sample.y == last.y) {
                return false;
            }
        }
        self.samples.push(sample);
        true
    }

    /// Drawing -> Matched/Rejected. Later calls keep the first result.
    pub fn finalize(&mut self, outcome: GestureOutcome) -> GestureState {
        if self.state == GestureState::Drawing {
            self.state = match outcome {
                GestureOutcome::Matched => GestureState::Matched,
                GestureOutcome::Rejected => GestureState::Rejected,
            };
        }
        self.state
    }
}

/// Freehand "7" recognizer for one surface
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    tolerances: GestureTolerances,
    surface: Vec2,
    path: Option<GesturePath>,
}

impl GestureRecognizer {
    pub fn new(tolerances: GestureTolerances, surface: Vec2) -> Self {
        Self {
            tolerances,
            surface,
            path: None,
        }
    }

    /// Surface size used for the minimum-span check
    pub fn set_surface_size(&mut self, surface: Vec2) {
        self.surface = surface;
    }

    pub fn tolerances(&self) -> &GestureTolerances {
        &self.tolerances
    }

    pub fn state(&self) -> GestureState {
        self.path
            .as_ref()
            .map_or(GestureState::Idle, GesturePath::state)
    }

    /// Samples of the stroke in progress (for trail rendering)
    pub fn current_samples(&self) -> &[PointerSample] {
        self.path.as_ref().map_or(&[], |p| p.samples())
    }

    /// Begin a stroke. Ignored unless idle.
    pub fn start(&mut self, x: f32, y: f32, t: f64) -> bool {
        if self.path.is_some() {
            return false;
        }
        self.path = Some(GesturePath::begin(PointerSample::new(x, y, t)));
        true
    }

    /// Extend the stroke. No-op unless drawing.
    pub fn add_point(&mut self, x: f32, y: f32, t: f64) {
        if let Some(path) = self.path.as_mut() {
            path.push(PointerSample::new(x, y, t));
        }
    }

    /// Classify and finish the stroke, returning to idle.
    /// `None` if nothing was being drawn.
    pub fn end(&mut self) -> Option<GestureOutcome> {
        let mut path = self.path.take()?;
        let verdict = classify(path.samples(), self.surface, &self.tolerances);
        let outcome = match verdict {
            Verdict::Matched => {
                log::info!("Gesture matched ({} samples)", path.samples().len());
                GestureOutcome::Matched
            }
            Verdict::Rejected(reason) => {
                log::debug!(
                    "Gesture rejected: {:?} ({} samples)",
                    reason,
                    path.samples().len()
                );
                GestureOutcome::Rejected
            }
        };
        path.finalize(outcome);
        Some(outcome)
    }

    /// Abandon the stroke without classifying it
    pub fn cancel(&mut self) {
        if let Some(mut path) = self.path.take() {
            path.finalize(GestureOutcome::Rejected);
            log::debug!("Gesture cancelled ({} samples)", path.samples().len());
        }
    }
}
