//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (serve angle is the only random input)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{ball_rect_overlap, reflect_velocity};
pub use state::{Ball, GameEvent, GamePhase, Paddle, Side, SimulationState, speed_level};
pub use tick::{TickInput, resolve_miss, tick};
