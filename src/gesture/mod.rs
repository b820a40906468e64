//! Secret gesture input
//!
//! The host forwards raw pointer/touch events; `GestureSurface` turns them
//! into samples, feeds the recognizer and reports a finished stroke. The host
//! owns all visual feedback. A rejection produces no user-facing signal.

pub mod recognizer;
pub mod sampler;
pub mod shape;

pub use recognizer::{GestureOutcome, GesturePath, GestureRecognizer, GestureState};
pub use sampler::{
    EndReason, NoStyle, OriginElement, PointerSample, PointerSampler, RawPointer, SurfaceRect,
    SurfaceStyle,
};
pub use shape::{RejectReason, Verdict, classify};

use crate::settings::GestureTolerances;

/// Sampler + recognizer for one tracking surface
pub struct GestureSurface<S> {
    sampler: PointerSampler<S>,
    recognizer: GestureRecognizer,
}

impl<S: SurfaceStyle> GestureSurface<S> {
    pub fn new(rect: SurfaceRect, style: S, tolerances: GestureTolerances) -> Self {
        Self {
            sampler: PointerSampler::new(rect, style).with_close_margin(tolerances.close_margin),
            recognizer: GestureRecognizer::new(tolerances, rect.size()),
        }
    }

    /// Surface moved or resized
    pub fn set_rect(&mut self, rect: SurfaceRect) {
        self.sampler.set_rect(rect);
        self.recognizer.set_surface_size(rect.size());
    }

    pub fn sampler(&self) -> &PointerSampler<S> {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut PointerSampler<S> {
        &mut self.sampler
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn is_drawing(&self) -> bool {
        self.recognizer.state() == GestureState::Drawing
    }

    pub fn pointer_down(&mut self, raw: &RawPointer, chain: &[OriginElement], t: f64) -> bool {
        match self.sampler.pointer_down(raw, chain, t) {
            Some(s) => self.recognizer.start(s.x, s.y, s.t),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, raw: &RawPointer, t: f64) {
        if let Some(s) = self.sampler.pointer_move(raw, t) {
            self.recognizer.add_point(s.x, s.y, s.t);
        }
    }

    /// Release: classify what was drawn
    pub fn pointer_up(&mut self) -> Option<GestureOutcome> {
        self.sampler.finish(EndReason::Release);
        self.recognizer.end()
    }

    /// Pointer left the surface mid-stroke: classify what was drawn so far
    pub fn pointer_leave(&mut self) -> Option<GestureOutcome> {
        self.sampler.finish(EndReason::LeftSurface);
        self.recognizer.end()
    }

    /// Window lost focus or the platform cancelled the touch
    pub fn abort(&mut self, reason: EndReason) {
        self.sampler.finish(reason);
        self.recognizer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn surface() -> GestureSurface<NoStyle> {
        GestureSurface::new(
            SurfaceRect::new(20.0, 100.0, 400.0, 400.0),
            NoStyle,
            GestureTolerances::default(),
        )
    }

    fn seven_viewport() -> Vec<RawPointer> {
        shape::polyline(
            &[
                Vec2::new(180.0, 140.0),
                Vec2::new(380.0, 140.0),
                Vec2::new(94.0, 440.0),
            ],
            20,
            0.0,
            16.0,
        )
        .into_iter()
        .map(|s| RawPointer::Touch {
            points: vec![(s.x, s.y)],
        })
        .collect()
    }

    #[test]
    fn test_touch_seven_unlocks() {
        let mut g = surface();
        let raws = seven_viewport();
        assert!(g.pointer_down(&raws[0], &[], 0.0));
        for (i, raw) in raws.iter().enumerate().skip(1) {
            g.pointer_move(raw, i as f64 * 16.0);
        }
        assert_eq!(g.pointer_up(), Some(GestureOutcome::Matched));
        assert!(!g.is_drawing());
    }

    #[test]
    fn test_blur_discards_stroke() {
        let mut g = surface();
        let raws = seven_viewport();
        g.pointer_down(&raws[0], &[], 0.0);
        for (i, raw) in raws.iter().enumerate().skip(1) {
            g.pointer_move(raw, i as f64 * 16.0);
        }
        g.abort(EndReason::WindowBlur);
        assert_eq!(g.pointer_up(), None);
    }

    #[test]
    fn test_moves_without_contact_are_ignored() {
        let mut g = surface();
        for (i, raw) in seven_viewport().iter().enumerate() {
            g.pointer_move(raw, i as f64);
        }
        assert_eq!(g.pointer_up(), None);
        assert!(g.recognizer().current_samples().is_empty());
    }

    #[test]
    fn test_button_press_never_draws() {
        let mut g = surface();
        let raws = seven_viewport();
        assert!(!g.pointer_down(&raws[0], &[OriginElement::tag("a")], 0.0));
        assert!(!g.is_drawing());
    }

    #[test]
    fn test_close_margin_from_tolerances() {
        let zone = SurfaceRect::new(360.0, 0.0, 40.0, 40.0);
        // 16px left of the close control, in viewport coordinates
        let near = RawPointer::Mouse { x: 364.0, y: 120.0 };

        let mut g = surface();
        g.sampler_mut().set_close_zones(vec![zone]);
        assert!(!g.pointer_down(&near, &[], 0.0));

        let tolerances = GestureTolerances {
            close_margin: 8.0,
            ..Default::default()
        };
        let mut g = GestureSurface::new(SurfaceRect::new(20.0, 100.0, 400.0, 400.0), NoStyle, tolerances);
        g.sampler_mut().set_close_zones(vec![zone]);
        assert!(g.pointer_down(&near, &[], 0.0));
    }
}
