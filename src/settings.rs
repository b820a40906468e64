//! Tunable configuration
//!
//! Gesture tolerances and speed progression are data, not code, so they can
//! be calibrated against captured gestures without touching the algorithms.
//! Persisted in LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::consts::LEADERBOARD_SIZE;

/// Tolerances for the "7" shape test.
///
/// Fractions are relative to the gesture's own bounding box unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTolerances {
    /// Fewer samples than this is a tap or a stray click
    pub min_samples: usize,
    /// Bounding box must span at least this fraction of the surface (either axis)
    pub min_surface_fraction: f32,
    /// Top stroke must cover at least this fraction of the bounding width
    pub min_horizontal_coverage: f32,
    /// Top stroke |dy|/|dx| ceiling
    pub max_top_slope: f32,
    /// Corner must sit within this distance of the top edge
    pub top_tolerance: f32,
    /// Diagonal dy/|dx| floor (downward)
    pub min_diagonal_slope: f32,
    /// Diagonal must drop at least this fraction of the bounding height
    pub min_diagonal_drop: f32,
    /// Diagonal must drift back toward the start side by this fraction of width
    pub min_diagonal_drift: f32,
    /// Path must end within this distance of the bottom edge
    pub bottom_tolerance: f32,
    /// Horizontal movement below this is treated as jitter
    pub jitter: f32,
    /// Horizontal runs narrower than this don't count as a reversal
    pub min_run_extent: f32,
    /// Clearance around close controls where no drawing may start (px)
    pub close_margin: f32,
}

impl Default for GestureTolerances {
    fn default() -> Self {
        Self {
            min_samples: 8,
            min_surface_fraction: 0.15,
            min_horizontal_coverage: 0.5,
            max_top_slope: 0.45,
            top_tolerance: 0.3,
            min_diagonal_slope: 0.5,
            min_diagonal_drop: 0.6,
            min_diagonal_drift: 0.15,
            bottom_tolerance: 0.2,
            jitter: 0.04,
            min_run_extent: 0.12,
            close_margin: 24.0,
        }
    }
}

/// Ball speed progression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTuning {
    /// Points per speed level
    pub step: u32,
    /// Velocity multiplier applied on each level increase
    pub factor: f32,
}

impl Default for SpeedTuning {
    fn default() -> Self {
        Self {
            step: 5,
            factor: 1.1,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shape recognition tolerances
    pub gesture: GestureTolerances,
    /// Speed progression
    pub speed: SpeedTuning,
    /// Matches within this window count as one unlock (ms)
    pub unlock_cooldown_ms: f64,
    /// Snap the paddle to the pointer instead of easing toward it
    pub paddle_snap: bool,

    // === Audio ===
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    /// Entries in the public leaderboard
    pub leaderboard_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gesture: GestureTolerances::default(),
            speed: SpeedTuning::default(),
            unlock_cooldown_ms: 1500.0,
            paddle_snap: false,

            muted: false,
            master_volume: 0.8,
            music_volume: 0.6,
            sfx_volume: 1.0,

            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "secret_pong_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
