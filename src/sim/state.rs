//! Game state and core simulation types
//!
//! Owned by one game session and mutated only by `tick`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::SpeedTuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Opened, waiting for the first tap
    Idle,
    /// Active gameplay
    Running,
    /// Frozen, resumes exactly where it stopped
    Paused,
    /// Human paddle missed
    GameOver,
}

/// Which paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Human player
    Left,
    /// Computer opponent
    Right,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Something the audio/score layers react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PaddleHit(Side),
    WallHit,
    /// Human returned the ball; carries the new score
    Scored(u32),
    /// Speed level increased; carries the new level
    SpeedUp(u32),
    /// Terminal event, emitted once per round with the final score
    GameOver(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0),
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::new()
    }
}

/// A paddle, positioned by its vertical center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    /// Center y
    pub y: f32,
    /// Where the paddle is heading (latest pointer position for the human)
    pub target_y: f32,
    pub height: f32,
    pub width: f32,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            y: FIELD_HEIGHT / 2.0,
            target_y: FIELD_HEIGHT / 2.0,
            height: PADDLE_HEIGHT,
            width: PADDLE_WIDTH,
        }
    }

    /// Left edge x
    pub fn x(&self) -> f32 {
        match self.side {
            Side::Left => PADDLE_MARGIN,
            Side::Right => FIELD_WIDTH - PADDLE_MARGIN - self.width,
        }
    }

    /// Face the ball bounces off
    pub fn face_x(&self) -> f32 {
        match self.side {
            Side::Left => self.x() + self.width,
            Side::Right => self.x(),
        }
    }

    /// Keep the whole paddle on the field
    pub fn clamp_center(&self, y: f32) -> f32 {
        let half = self.height / 2.0;
        y.clamp(half, FIELD_HEIGHT - half)
    }

    pub fn set_target(&mut self, y: f32) {
        self.target_y = self.clamp_center(y);
    }

    /// Move toward the target, limited to `max_speed`
    pub fn move_toward_target(&mut self, dt: f32, max_speed: f32) {
        let max_delta = max_speed * dt;
        let delta = (self.target_y - self.y).clamp(-max_delta, max_delta);
        self.y = self.clamp_center(self.y + delta);
    }

    pub fn snap_to_target(&mut self) {
        self.y = self.target_y;
    }

    /// Offset of `y` from center in [-1, 1]
    pub fn relative_offset(&self, y: f32) -> f32 {
        ((y - self.y) / (self.height / 2.0)).clamp(-1.0, 1.0)
    }
}

/// Speed level for a score: `1 + floor(score / step)`
pub fn speed_level(score: u32, step: u32) -> u32 {
    1 + score / step.max(1)
}

/// Complete simulation state for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub ball: Ball,
    /// [human, opponent]
    pub paddles: [Paddle; 2],
    pub score: u32,
    pub speed_level: u32,
    pub phase: GamePhase,
    pub tuning: SpeedTuning,
    /// Snap the human paddle instead of easing
    pub paddle_snap: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Set on the first miss of a round, never cleared until replay
    pub game_over_latched: bool,
    /// Events since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    #[serde(skip, default = "default_rng")]
    rng: Pcg32,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl SimulationState {
    pub fn new(seed: u64, tuning: SpeedTuning) -> Self {
        Self {
            seed,
            ball: Ball::new(),
            paddles: [Paddle::new(Side::Left), Paddle::new(Side::Right)],
            score: 0,
            speed_level: speed_level(0, tuning.step),
            phase: GamePhase::Idle,
            tuning,
            paddle_snap: false,
            time_ticks: 0,
            game_over_latched: false,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn human(&self) -> &Paddle {
        &self.paddles[Side::Left.index()]
    }

    pub fn human_mut(&mut self) -> &mut Paddle {
        &mut self.paddles[Side::Left.index()]
    }

    pub fn opponent(&self) -> &Paddle {
        &self.paddles[Side::Right.index()]
    }

    /// Idle -> Running. Serves toward the opponent.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.serve();
        self.phase = GamePhase::Running;
        log::info!("Game started (seed {})", self.seed);
        true
    }

    /// GameOver -> Running with a fresh round. Paddles stay where they are.
    pub fn replay(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            return false;
        }
        self.score = 0;
        self.speed_level = speed_level(0, self.tuning.step);
        self.game_over_latched = false;
        self.events.clear();
        self.serve();
        self.phase = GamePhase::Running;
        log::info!("Replay started");
        true
    }

    /// Running <-> Paused. Other phases are unaffected.
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => other,
        };
    }

    /// Center the ball and launch it at a random angle toward the opponent
    pub fn serve(&mut self) {
        let angle = self.rng.random_range(-SERVE_MAX_ANGLE..=SERVE_MAX_ANGLE);
        self.ball = Ball::new();
        self.ball.vel = Vec2::new(angle.cos(), angle.sin()) * BALL_START_SPEED;
    }

    /// Take all events since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
