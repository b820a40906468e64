//! Platform layer
//!
//! Browser bindings live in `web` (wasm32 only). Helpers here are plain
//! functions of browser-provided values so they work natively too.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::audio::DeviceKind;

const MOBILE_MARKERS: &[&str] = &["Android", "iPhone", "iPad", "iPod", "Mobile"];

/// Classify the device from its user agent and touch support.
///
/// iPadOS reports a desktop Safari agent, so a touch-capable "Macintosh"
/// also counts as mobile.
pub fn device_kind_for(user_agent: &str, max_touch_points: i32) -> DeviceKind {
    let mobile_agent = MOBILE_MARKERS.iter().any(|m| user_agent.contains(m));
    let touch_mac = user_agent.contains("Macintosh") && max_touch_points > 1;
    if mobile_agent || touch_mac {
        DeviceKind::Mobile
    } else {
        DeviceKind::Desktop
    }
}
