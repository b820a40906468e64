//! Pointer sampling
//!
//! Turns mouse and touch events into one ordered stream of samples in the
//! tracking surface's local coordinates. Events that start on an interactive
//! control are left alone so ordinary UI keeps working.

use glam::Vec2;

/// A single timestamped point, relative to the surface origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    /// Milliseconds (host clock)
    pub t: f64,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, t: f64) -> Self {
        Self { x, y, t }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Raw platform input in viewport coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum RawPointer {
    Mouse { x: f32, y: f32 },
    /// Active touch points in event order; only the first is tracked
    Touch { points: Vec<(f32, f32)> },
}

impl RawPointer {
    /// The point that drives the gesture, if any
    pub fn primary(&self) -> Option<Vec2> {
        match self {
            RawPointer::Mouse { x, y } => Some(Vec2::new(*x, *y)),
            RawPointer::Touch { points } => points.first().map(|&(x, y)| Vec2::new(x, y)),
        }
    }
}

/// Axis-aligned rectangle (viewport or surface coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }

    /// Grow on every side by `margin`
    pub fn inflate(&self, margin: f32) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }
}

/// One element on the path from the event target up to the surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginElement {
    /// Lowercase tag name
    pub tag: String,
    /// ARIA role attribute
    pub role: Option<String>,
    /// Marked as the modal/section close control
    pub close_control: bool,
}

impl OriginElement {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }
}

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "label", "summary", "option",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "menuitem", "tab", "switch", "textbox", "slider",
];

/// True if any element in the chain is a control the gesture must not swallow
pub fn is_interactive(chain: &[OriginElement]) -> bool {
    chain.iter().any(|el| {
        el.close_control
            || INTERACTIVE_TAGS.contains(&el.tag.as_str())
            || el
                .role
                .as_deref()
                .is_some_and(|role| INTERACTIVE_ROLES.contains(&role))
    })
}

/// Why a drawing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Release,
    LeftSurface,
    WindowBlur,
    Cancelled,
}

/// Host hook for turning off text selection and touch scrolling while drawing
pub trait SurfaceStyle {
    fn suppress_defaults(&mut self, on: bool);
}

/// Style hook for hosts with nothing to suppress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStyle;

impl SurfaceStyle for NoStyle {
    fn suppress_defaults(&mut self, _on: bool) {}
}

/// Mouse/touch normalizer for one tracking surface
pub struct PointerSampler<S> {
    rect: SurfaceRect,
    /// Close controls in surface-local coordinates
    close_zones: Vec<SurfaceRect>,
    close_margin: f32,
    style: S,
    tracking: bool,
}

impl<S: SurfaceStyle> PointerSampler<S> {
    pub fn new(rect: SurfaceRect, style: S) -> Self {
        Self {
            rect,
            close_zones: Vec::new(),
            close_margin: 0.0,
            style,
            tracking: false,
        }
    }

    /// Clearance kept around every close zone
    pub fn with_close_margin(mut self, margin: f32) -> Self {
        self.close_margin = margin.max(0.0);
        self
    }

    pub fn rect(&self) -> SurfaceRect {
        self.rect
    }

    /// Surface moved or resized (scroll, layout)
    pub fn set_rect(&mut self, rect: SurfaceRect) {
        self.rect = rect;
    }

    pub fn set_close_zones(&mut self, zones: Vec<SurfaceRect>) {
        self.close_zones = zones;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn style(&self) -> &S {
        &self.style
    }

    /// Project raw input into surface-local coordinates
    pub fn project(&self, raw: &RawPointer, t: f64) -> Option<PointerSample> {
        let local = raw.primary()? - self.rect.origin();
        Some(PointerSample::new(local.x, local.y, t))
    }

    /// Whether a surface-local point falls near a close control
    pub fn in_close_zone(&self, x: f32, y: f32) -> bool {
        let p = Vec2::new(x, y);
        self.close_zones
            .iter()
            .any(|zone| zone.inflate(self.close_margin).contains(p))
    }

    /// Contact began. Returns the first sample if a drawing should start.
    pub fn pointer_down(
        &mut self,
        raw: &RawPointer,
        chain: &[OriginElement],
        t: f64,
    ) -> Option<PointerSample> {
        // A second finger landing mid-stroke doesn't restart anything
        if self.tracking || is_interactive(chain) {
            return None;
        }
        let sample = self.project(raw, t)?;
        if self.in_close_zone(sample.x, sample.y) {
            return None;
        }
        self.tracking = true;
        self.style.suppress_defaults(true);
        Some(sample)
    }

    /// Pointer moved. Only produces samples while a drawing is active.
    pub fn pointer_move(&mut self, raw: &RawPointer, t: f64) -> Option<PointerSample> {
        if !self.tracking {
            return None;
        }
        self.project(raw, t)
    }

    /// Drawing stopped for any reason. Suppressions are always reverted.
    /// Returns whether a drawing was in progress.
    pub fn finish(&mut self, reason: EndReason) -> bool {
        let was_tracking = self.tracking;
        self.tracking = false;
        self.style.suppress_defaults(false);
        if was_tracking && reason != EndReason::Release {
            log::debug!("Drawing ended abnormally: {:?}", reason);
        }
        was_tracking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every suppression toggle
    #[derive(Default)]
    struct Recorder {
        calls: Vec<bool>,
    }

    impl SurfaceStyle for Recorder {
        fn suppress_defaults(&mut self, on: bool) {
            self.calls.push(on);
        }
    }

    fn sampler() -> PointerSampler<Recorder> {
        PointerSampler::new(SurfaceRect::new(100.0, 50.0, 400.0, 300.0), Recorder::default())
            .with_close_margin(24.0)
    }

    #[test]
    fn test_projects_into_surface_space() {
        let s = sampler();
        let sample = s.project(&RawPointer::Mouse { x: 150.0, y: 80.0 }, 5.0).unwrap();
        assert_eq!(sample, PointerSample::new(50.0, 30.0, 5.0));
    }

    #[test]
    fn test_touch_uses_first_point() {
        let s = sampler();
        let raw = RawPointer::Touch {
            points: vec![(110.0, 60.0), (400.0, 300.0)],
        };
        let sample = s.project(&raw, 0.0).unwrap();
        assert_eq!(sample.pos(), Vec2::new(10.0, 10.0));
        assert!(s.project(&RawPointer::Touch { points: vec![] }, 0.0).is_none());
    }

    #[test]
    fn test_interactive_targets_are_ignored() {
        let mut s = sampler();
        let raw = RawPointer::Mouse { x: 200.0, y: 100.0 };
        let chain = vec![OriginElement::tag("span"), OriginElement::tag("BUTTON")];
        assert!(s.pointer_down(&raw, &chain, 0.0).is_none());

        let chain = vec![OriginElement {
            tag: "div".into(),
            role: Some("link".into()),
            close_control: false,
        }];
        assert!(s.pointer_down(&raw, &chain, 0.0).is_none());
        assert!(!s.is_tracking());
        assert!(s.style().calls.is_empty());

        let chain = vec![OriginElement::tag("div"), OriginElement::tag("section")];
        assert!(s.pointer_down(&raw, &chain, 0.0).is_some());
    }

    #[test]
    fn test_close_zone_blocks_start() {
        let mut s = sampler();
        s.set_close_zones(vec![SurfaceRect::new(360.0, 0.0, 40.0, 40.0)]);
        // 20px left of the button, inside the margin
        assert!(s.in_close_zone(345.0, 20.0));
        let raw = RawPointer::Mouse { x: 445.0, y: 70.0 };
        assert!(s.pointer_down(&raw, &[], 0.0).is_none());
        assert!(!s.in_close_zone(200.0, 200.0));
    }

    #[test]
    fn test_close_margin_sets_clearance() {
        let zone = SurfaceRect::new(360.0, 0.0, 40.0, 40.0);
        let mut tight = PointerSampler::new(SurfaceRect::new(0.0, 0.0, 400.0, 300.0), NoStyle)
            .with_close_margin(4.0);
        tight.set_close_zones(vec![zone]);
        assert!(tight.in_close_zone(358.0, 20.0));
        assert!(!tight.in_close_zone(345.0, 20.0));
        assert!(tight.pointer_down(&RawPointer::Mouse { x: 345.0, y: 20.0 }, &[], 0.0).is_some());

        // Negative margins clamp to the bare control
        let mut bare = PointerSampler::new(SurfaceRect::new(0.0, 0.0, 400.0, 300.0), NoStyle)
            .with_close_margin(-10.0);
        bare.set_close_zones(vec![zone]);
        assert!(bare.in_close_zone(360.0, 0.0));
        assert!(!bare.in_close_zone(359.0, 20.0));
    }

    #[test]
    fn test_suppression_reverted_on_abnormal_end() {
        let mut s = sampler();
        let raw = RawPointer::Mouse { x: 200.0, y: 100.0 };
        assert!(s.pointer_down(&raw, &[], 0.0).is_some());
        assert!(s.pointer_move(&raw, 1.0).is_some());
        assert!(s.finish(EndReason::WindowBlur));
        assert_eq!(s.style().calls, vec![true, false]);
        assert!(s.pointer_move(&raw, 2.0).is_none());

        // Revert is unconditional even with nothing in progress
        assert!(!s.finish(EndReason::LeftSurface));
        assert_eq!(s.style().calls, vec![true, false, false]);
    }

    #[test]
    fn test_second_contact_does_not_restart() {
        let mut s = sampler();
        let raw = RawPointer::Mouse { x: 200.0, y: 100.0 };
        assert!(s.pointer_down(&raw, &[], 0.0).is_some());
        assert!(s.pointer_down(&raw, &[], 1.0).is_none());
        assert_eq!(s.style().calls, vec![true]);
    }
}
