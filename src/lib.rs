//! Secret Pong - a hidden "draw a 7" gesture that unlocks an arcade game
//!
//! Core modules:
//! - `gesture`: Pointer sampling and freehand shape recognition
//! - `unlock`: One-session-at-a-time unlock orchestration
//! - `sim`: Deterministic Pong simulation (physics, scoring, speed levels)
//! - `audio`: Procedural music and sound effects
//! - `score`: Leaderboard submission (authenticated and anonymous paths)
//! - `highscores`: Top-N table and the LocalStorage-backed store
//! - `session`: Per-game bundle of simulation, audio and score state
//! - `renderer`: Scene building and Canvas2D painting
//! - `platform`: Device detection and browser bindings

pub mod audio;
pub mod gesture;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod score;
pub mod session;
pub mod settings;
pub mod sim;
pub mod unlock;

pub use gesture::{GestureOutcome, GestureRecognizer, GestureSurface, PointerSample};
pub use highscores::{HighScoreEntry, Leaderboard};
pub use session::GameSession;
pub use settings::Settings;
pub use unlock::UnlockOrchestrator;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions (logical units, canvas is scaled to fit)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 500.0;

    /// Paddle geometry
    pub const PADDLE_WIDTH: f32 = 12.0;
    pub const PADDLE_HEIGHT: f32 = 90.0;
    /// Gap between a paddle's outer edge and its side of the field
    pub const PADDLE_MARGIN: f32 = 24.0;
    /// Human paddle max speed when not snapping (units/s)
    pub const PADDLE_MAX_SPEED: f32 = 2400.0;
    /// Opponent paddle max speed (units/s)
    pub const AI_PADDLE_MAX_SPEED: f32 = 380.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_START_SPEED: f32 = 340.0;
    pub const BALL_MAX_SPEED: f32 = 1500.0;
    /// Speed boost when ball hits a paddle (multiplicative)
    pub const PADDLE_NUDGE: f32 = 1.02;
    /// Vertical deflection added per unit of offset from paddle center
    pub const PADDLE_DEFLECTION: f32 = 0.75;
    /// Largest serve angle away from horizontal (radians, ~30 degrees)
    pub const SERVE_MAX_ANGLE: f32 = 0.52;

    /// Leaderboard size shown on the site
    pub const LEADERBOARD_SIZE: usize = 10;
    /// Longest anonymous display name accepted
    pub const MAX_NAME_LEN: usize = 30;
}
