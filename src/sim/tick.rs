//! Fixed timestep simulation tick
//!
//! Per tick, in order: move paddles, integrate the ball, resolve collisions,
//! then check for a miss on the human side.

use super::collision::{resolve_back_wall, resolve_paddle, resolve_walls};
use super::state::{GameEvent, GamePhase, Side, SimulationState, speed_level};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer y in field coordinates. Only the most recent matters.
    pub paddle_target: Option<f32>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut SimulationState, input: &TickInput, dt: f32) {
    if input.pause {
        state.toggle_pause();
    }

    // Frozen phases ignore pointer input entirely
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;

    // Paddles
    if let Some(y) = input.paddle_target {
        state.human_mut().set_target(y);
    }
    let snap = state.paddle_snap;
    let human = state.human_mut();
    if snap {
        human.snap_to_target();
    } else {
        human.move_toward_target(dt, PADDLE_MAX_SPEED);
    }
    steer_opponent(state, dt);

    // (1) Integrate
    state.ball.pos += state.ball.vel * dt;

    // (2) Collisions
    if resolve_walls(&mut state.ball) {
        state.events.push(GameEvent::WallHit);
    }
    if resolve_paddle(&mut state.ball, &state.paddles[Side::Left.index()], PADDLE_NUDGE) {
        state.events.push(GameEvent::PaddleHit(Side::Left));
        award_point(state);
    } else if resolve_paddle(&mut state.ball, &state.paddles[Side::Right.index()], PADDLE_NUDGE) {
        state.events.push(GameEvent::PaddleHit(Side::Right));
    }
    // Anything the opponent misses comes back off the back wall
    if resolve_back_wall(&mut state.ball) {
        state.events.push(GameEvent::WallHit);
    }

    // (3) Miss
    resolve_miss(state);
}

/// Opponent follows the ball while it's incoming, otherwise recenters
fn steer_opponent(state: &mut SimulationState, dt: f32) {
    let incoming = state.ball.vel.x > 0.0;
    let target = if incoming {
        state.ball.pos.y
    } else {
        FIELD_HEIGHT / 2.0
    };
    let opponent = &mut state.paddles[Side::Right.index()];
    opponent.set_target(target);
    opponent.move_toward_target(dt, AI_PADDLE_MAX_SPEED);
}

/// Human returned the ball: +1 and maybe a speed level
fn award_point(state: &mut SimulationState) {
    state.score += 1;
    state.events.push(GameEvent::Scored(state.score));

    let level = speed_level(state.score, state.tuning.step);
    if level > state.speed_level {
        let steps = (level - state.speed_level) as i32;
        let scale = state.tuning.factor.powi(steps);
        let speed = (state.ball.speed() * scale).min(BALL_MAX_SPEED);
        state.ball.vel = state.ball.vel.normalize_or_zero() * speed;
        state.speed_level = level;
        state.events.push(GameEvent::SpeedUp(level));
        log::info!("Speed level {} at score {}", level, state.score);
    }
}

/// Ball past the human side ends the round.
///
/// Latched: only the first call for a round transitions and emits
/// `GameOver`, however many times it is invoked.
pub fn resolve_miss(state: &mut SimulationState) -> bool {
    if state.ball.pos.x + state.ball.radius >= 0.0 || state.game_over_latched {
        return false;
    }
    state.game_over_latched = true;
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver(state.score));
    log::info!("Game over, final score {}", state.score);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SpeedTuning;
    use proptest::prelude::*;

    fn running(seed: u64) -> SimulationState {
        let mut state = SimulationState::new(seed, SpeedTuning::default());
        state.start();
        state
    }

    /// Paddle glued to the ball: never misses
    fn autoplay(state: &mut SimulationState) {
        state.paddle_snap = true;
        let input = TickInput {
            paddle_target: Some(state.ball.pos.y),
            ..Default::default()
        };
        tick(state, &input, SIM_DT);
    }

    #[test]
    fn test_idle_does_not_move() {
        let mut state = SimulationState::new(1, SpeedTuning::default());
        let before = state.ball.pos;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.ball.pos, before);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = running(12345);
        tick(&mut state, &TickInput::default(), SIM_DT);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);

        let frozen_ball = state.ball.pos;
        let frozen_target = state.human().target_y;
        let ticks = state.time_ticks;
        // Pointer moves while paused are dropped
        let nudge = TickInput {
            paddle_target: Some(10.0),
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &nudge, SIM_DT);
        }
        assert_eq!(state.ball.pos, frozen_ball);
        assert_eq!(state.human().target_y, frozen_target);
        assert_eq!(state.time_ticks, ticks);

        // Resume continues from the frozen state
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.time_ticks, ticks + 1);
        assert!((state.ball.pos - (frozen_ball + state.ball.vel * SIM_DT)).length() < 1.0);
    }

    #[test]
    fn test_miss_ends_game_exactly_once() {
        let mut state = running(3);
        state.ball.pos = glam::Vec2::new(-20.0, 100.0);
        state.ball.vel = glam::Vec2::new(-300.0, 0.0);

        assert!(resolve_miss(&mut state));
        assert!(!resolve_miss(&mut state));
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!resolve_miss(&mut state));

        let over: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver(_)))
            .collect();
        assert_eq!(over, vec![GameEvent::GameOver(0)]);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_unattended_paddle_misses() {
        let mut state = running(9);
        state.human_mut().y = 50.0;
        state.ball.pos = glam::Vec2::new(200.0, 400.0);
        state.ball.vel = glam::Vec2::new(-400.0, 0.0);
        let input = TickInput {
            paddle_target: Some(0.0),
            ..Default::default()
        };
        for _ in 0..240 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_returns_score_and_speed_up() {
        let mut state = running(42);
        let mut speed_ups = 0;
        while state.score < 5 {
            autoplay(&mut state);
            speed_ups += state
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::SpeedUp(_)))
                .count();
            assert_eq!(state.phase, GamePhase::Running);
        }
        assert_eq!(state.speed_level, 2);
        assert_eq!(speed_ups, 1);
        assert!(state.ball.speed() > BALL_START_SPEED * 1.1);
    }

    #[test]
    fn test_replay_resets_round() {
        let mut state = running(5);
        state.score = 12;
        state.ball.pos.x = -50.0;
        resolve_miss(&mut state);
        assert!(state.replay());
        assert_eq!(state.score, 0);
        assert_eq!(state.speed_level, 1);
        assert!(!state.game_over_latched);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut a = running(99999);
        let mut b = running(99999);
        let inputs = [
            TickInput {
                paddle_target: Some(100.0),
                ..Default::default()
            },
            TickInput::default(),
            TickInput {
                paddle_target: Some(300.0),
                ..Default::default()
            },
        ];
        for _ in 0..200 {
            for input in &inputs {
                tick(&mut a, input, SIM_DT);
                tick(&mut b, input, SIM_DT);
            }
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.ball.pos, b.ball.pos);
        assert_eq!(a.score, b.score);
        assert_eq!(a.phase, b.phase);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn score_never_decreases_without_a_miss(seed in any::<u64>(), pauses in prop::collection::vec(0u32..600, 0..4)) {
            let mut state = running(seed);
            let mut last = 0;
            for n in 0..3000u32 {
                if pauses.contains(&n) {
                    tick(&mut state, &TickInput { pause: true, ..Default::default() }, SIM_DT);
                    tick(&mut state, &TickInput { pause: true, ..Default::default() }, SIM_DT);
                }
                autoplay(&mut state);
                prop_assert!(state.score >= last);
                prop_assert!(matches!(state.phase, GamePhase::Running | GamePhase::Paused));
                prop_assert_eq!(state.speed_level, speed_level(state.score, state.tuning.step));
                last = state.score;
            }
        }
    }
}
