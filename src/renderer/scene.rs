//! Scene description for one frame
//!
//! Built from the simulation with no platform calls, so layout can be
//! tested natively. Coordinates are field units.

use glam::Vec2;

use crate::consts::*;
use crate::sim::{GamePhase, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{:.2})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

const BACKGROUND: Color = Color::rgba(0.04, 0.05, 0.09, 1.0);
const FOREGROUND: Color = Color::rgba(0.92, 0.94, 1.0, 1.0);
const DIM: Color = Color::rgba(0.92, 0.94, 1.0, 0.35);
const SHADE: Color = Color::rgba(0.0, 0.0, 0.0, 0.55);
const OPPONENT: Color = Color::rgba(1.0, 0.45, 0.35, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Color),
    Rect {
        min: Vec2,
        size: Vec2,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    DashedLine {
        from: Vec2,
        to: Vec2,
        dash: f32,
        color: Color,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        align: TextAlign,
        color: Color,
    },
}

/// Things drawn over the field that aren't simulation state
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlay<'a> {
    pub notice: Option<&'a str>,
    /// Mobile audio still waiting for an enable tap
    pub audio_locked: bool,
    pub muted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub commands: Vec<DrawCmd>,
}

impl Scene {
    /// All text in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, size: f32, align: TextAlign, color: Color) {
        self.commands.push(DrawCmd::Text {
            pos: Vec2::new(x, y),
            text: text.into(),
            size,
            align,
            color,
        });
    }
}

/// Interpolate color based on velocity (slow=blue, medium=green, fast=red/orange)
pub fn velocity_color(speed: f32) -> Color {
    let t = ((speed - BALL_START_SPEED) / (BALL_MAX_SPEED - BALL_START_SPEED)).clamp(0.0, 1.0);

    let (r, g, b) = if t < 0.25 {
        // Blue to cyan
        let u = t / 0.25;
        (0.2, 0.4 + 0.4 * u, 1.0)
    } else if t < 0.5 {
        // Cyan to green
        let u = (t - 0.25) / 0.25;
        (0.2, 0.8, 1.0 - 0.6 * u)
    } else if t < 0.75 {
        // Green to yellow
        let u = (t - 0.5) / 0.25;
        (0.2 + 0.8 * u, 0.8, 0.4 - 0.2 * u)
    } else {
        // Yellow to red/orange
        let u = (t - 0.75) / 0.25;
        (1.0, 0.8 - 0.5 * u, 0.2)
    };

    Color::rgba(r, g, b, 1.0)
}

pub fn build_scene(sim: &SimulationState, overlay: &Overlay) -> Scene {
    let mut scene = Scene::default();
    let cx = FIELD_WIDTH / 2.0;
    let cy = FIELD_HEIGHT / 2.0;

    scene.commands.push(DrawCmd::Clear(BACKGROUND));
    scene.commands.push(DrawCmd::DashedLine {
        from: Vec2::new(cx, 0.0),
        to: Vec2::new(cx, FIELD_HEIGHT),
        dash: 12.0,
        color: DIM,
    });

    for paddle in &sim.paddles {
        let color = if paddle.side == sim.human().side {
            FOREGROUND
        } else {
            OPPONENT
        };
        scene.commands.push(DrawCmd::Rect {
            min: Vec2::new(paddle.x(), paddle.y - paddle.height / 2.0),
            size: Vec2::new(paddle.width, paddle.height),
            color,
        });
    }

    if sim.phase != GamePhase::Idle {
        scene.commands.push(DrawCmd::Circle {
            center: sim.ball.pos,
            radius: sim.ball.radius,
            color: velocity_color(sim.ball.speed()),
        });
    }

    // HUD
    scene.text(cx, 48.0, sim.score.to_string(), 40.0, TextAlign::Center, FOREGROUND);
    scene.text(
        FIELD_WIDTH - 16.0,
        28.0,
        format!("LVL {}", sim.speed_level),
        16.0,
        TextAlign::Right,
        DIM,
    );
    if overlay.muted {
        scene.text(16.0, 28.0, "MUTED", 16.0, TextAlign::Left, DIM);
    }

    let banner = match sim.phase {
        GamePhase::Idle => Some("TAP TO PLAY"),
        GamePhase::Paused => Some("PAUSED"),
        GamePhase::GameOver => Some("GAME OVER"),
        GamePhase::Running => None,
    };
    if let Some(banner) = banner {
        scene.commands.push(DrawCmd::Rect {
            min: Vec2::ZERO,
            size: Vec2::new(FIELD_WIDTH, FIELD_HEIGHT),
            color: SHADE,
        });
        scene.text(cx, cy, banner, 48.0, TextAlign::Center, FOREGROUND);
    }
    if sim.phase == GamePhase::GameOver {
        scene.text(
            cx,
            cy + 40.0,
            format!("Final score {}", sim.score),
            20.0,
            TextAlign::Center,
            FOREGROUND,
        );
    }
    if let Some(notice) = overlay.notice {
        scene.text(cx, cy + 76.0, notice, 16.0, TextAlign::Center, DIM);
    }
    if overlay.audio_locked {
        scene.text(
            cx,
            FIELD_HEIGHT - 16.0,
            "Tap to enable sound",
            14.0,
            TextAlign::Center,
            DIM,
        );
    }

    scene
}
