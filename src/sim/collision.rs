//! Collision detection and response
//!
//! Ball vs. field walls and ball vs. paddle rectangles.

use glam::Vec2;

use super::state::{Ball, Paddle, Side};
use crate::consts::{BALL_MAX_SPEED, FIELD_HEIGHT, FIELD_WIDTH, PADDLE_DEFLECTION};

/// Circle vs. axis-aligned rectangle (`min` top-left, `max` bottom-right)
pub fn ball_rect_overlap(pos: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let closest = pos.clamp(min, max);
    (pos - closest).length_squared() <= radius * radius
}

/// Reflect velocity off a surface with the given normal
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce off the top/bottom walls. Returns true on contact.
pub fn resolve_walls(ball: &mut Ball) -> bool {
    if ball.pos.y - ball.radius < 0.0 && ball.vel.y < 0.0 {
        ball.pos.y = ball.radius;
        ball.vel = reflect_velocity(ball.vel, Vec2::Y);
        true
    } else if ball.pos.y + ball.radius > FIELD_HEIGHT && ball.vel.y > 0.0 {
        ball.pos.y = FIELD_HEIGHT - ball.radius;
        ball.vel = reflect_velocity(ball.vel, Vec2::NEG_Y);
        true
    } else {
        false
    }
}

/// Bounce off the wall behind the opponent. Returns true on contact.
pub fn resolve_back_wall(ball: &mut Ball) -> bool {
    if ball.pos.x + ball.radius > FIELD_WIDTH && ball.vel.x > 0.0 {
        ball.pos.x = FIELD_WIDTH - ball.radius;
        ball.vel = reflect_velocity(ball.vel, Vec2::NEG_X);
        true
    } else {
        false
    }
}

/// Bounce off a paddle face.
///
/// Only counts when the ball is travelling toward the paddle, so a ball
/// already reflected this tick can't be hit twice. Horizontal velocity flips,
/// vertical velocity picks up a deflection proportional to the offset from
/// the paddle center, and speed is nudged by `nudge`.
pub fn resolve_paddle(ball: &mut Ball, paddle: &Paddle, nudge: f32) -> bool {
    // Must be approaching, and not already behind the paddle
    let in_play = match paddle.side {
        Side::Left => ball.vel.x < 0.0 && ball.pos.x >= paddle.x(),
        Side::Right => ball.vel.x > 0.0 && ball.pos.x <= paddle.x() + paddle.width,
    };
    if !in_play {
        return false;
    }

    let min = Vec2::new(paddle.x(), paddle.y - paddle.height / 2.0);
    let max = min + Vec2::new(paddle.width, paddle.height);
    if !ball_rect_overlap(ball.pos, ball.radius, min, max) {
        return false;
    }

    let speed = (ball.speed() * nudge).min(BALL_MAX_SPEED);
    let offset = paddle.relative_offset(ball.pos.y);
    let dir_x = -ball.vel.x.signum();
    let dir = Vec2::new(dir_x, offset * PADDLE_DEFLECTION).normalize_or_zero();
    ball.vel = dir * speed;

    // Put the ball back in front of the face
    ball.pos.x = paddle.face_x() + dir_x * ball.radius;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_rect_overlap_edge() {
        let (min, max) = (Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(ball_rect_overlap(Vec2::new(15.0, 5.0), 8.0, min, max));
        assert!(!ball_rect_overlap(Vec2::new(30.0, 5.0), 8.0, min, max));
        // Near a corner the distance is diagonal
        assert!(!ball_rect_overlap(Vec2::new(16.0, 16.0), 8.0, min, max));
    }

    #[test]
    fn test_ball_rect_overlap_inside() {
        assert!(ball_rect_overlap(
            Vec2::new(9.0, 5.0),
            2.0,
            Vec2::ZERO,
            Vec2::new(10.0, 10.0)
        ));
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 1e-3);
        assert!(reflected.y.abs() < 1e-3);
    }

    #[test]
    fn test_wall_bounce_flips_vertical() {
        let mut ball = Ball::new();
        ball.pos.y = 2.0;
        ball.vel = Vec2::new(100.0, -50.0);
        assert!(resolve_walls(&mut ball));
        assert_eq!(ball.vel, Vec2::new(100.0, 50.0));
        assert_eq!(ball.pos.y, ball.radius);
        // Moving away: no second bounce
        assert!(!resolve_walls(&mut ball));
    }

    #[test]
    fn test_paddle_center_hit_returns_straight() {
        let paddle = Paddle::new(Side::Left);
        let mut ball = Ball::new();
        ball.pos = Vec2::new(paddle.face_x() + 4.0, paddle.y);
        ball.vel = Vec2::new(-300.0, 0.0);
        assert!(resolve_paddle(&mut ball, &paddle, 1.0));
        assert!(ball.vel.x > 0.0);
        assert!(ball.vel.y.abs() < 1e-3);
        assert!((ball.speed() - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_paddle_edge_hit_deflects() {
        let paddle = Paddle::new(Side::Left);
        let mut ball = Ball::new();
        ball.pos = Vec2::new(paddle.face_x() + 4.0, paddle.y + paddle.height / 2.0 - 2.0);
        ball.vel = Vec2::new(-300.0, 0.0);
        assert!(resolve_paddle(&mut ball, &paddle, 1.1));
        assert!(ball.vel.y > 0.0);
        assert!((ball.speed() - 330.0).abs() < 1e-2);
    }

    #[test]
    fn test_paddle_ignores_ball_moving_away() {
        let paddle = Paddle::new(Side::Left);
        let mut ball = Ball::new();
        ball.pos = Vec2::new(paddle.face_x() + 4.0, paddle.y);
        ball.vel = Vec2::new(300.0, 0.0);
        assert!(!resolve_paddle(&mut ball, &paddle, 1.0));
    }
}
