//! One unlocked game
//!
//! Bundles the simulation, its audio engine and the per-round score guard.
//! Created when the gesture unlocks the game, dropped when it is dismissed.

use crate::audio::{AudioBackend, AudioEngine, SoundEffect};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::highscores::HighScoreEntry;
use crate::score::{AuthContext, LeaderboardStore, NameError, ScoreFlow, ScoreService};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, Side, SimulationState, TickInput, tick};

pub struct GameSession<B> {
    sim: SimulationState,
    audio: AudioEngine<B>,
    score: ScoreService,
    auth: Box<dyn AuthContext>,
    store: Box<dyn LeaderboardStore>,
    leaderboard_size: usize,
    accumulator: f32,
    input: TickInput,
    /// Shown over the game-over screen (submission result, errors)
    notice: Option<String>,
    closed: bool,
}

impl<B: AudioBackend> GameSession<B> {
    pub fn new(
        seed: u64,
        settings: &Settings,
        audio: AudioEngine<B>,
        auth: Box<dyn AuthContext>,
        store: Box<dyn LeaderboardStore>,
    ) -> Self {
        let mut sim = SimulationState::new(seed, settings.speed);
        sim.paddle_snap = settings.paddle_snap;
        Self {
            sim,
            audio,
            score: ScoreService::new(settings.leaderboard_size),
            auth,
            store,
            leaderboard_size: settings.leaderboard_size,
            accumulator: 0.0,
            input: TickInput::default(),
            notice: None,
            closed: false,
        }
    }

    pub fn sim(&self) -> &SimulationState {
        &self.sim
    }

    pub fn audio(&self) -> &AudioEngine<B> {
        &self.audio
    }

    pub fn phase(&self) -> GamePhase {
        self.sim.phase
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_awaiting_name(&self) -> bool {
        self.score.is_awaiting_name()
    }

    /// Tap or click on the game. Call from inside the input handler.
    ///
    /// Audio is initialized before anything else happens. Mobile audio stays
    /// locked until `enable_audio`.
    pub fn user_gesture(&mut self) {
        if self.closed {
            return;
        }
        self.audio.initialize();
        if self.sim.phase == GamePhase::Idle {
            self.start();
        }
    }

    /// Explicit "enable sound" tap on mobile
    pub fn enable_audio(&mut self) {
        if !self.closed {
            self.audio.enable();
            self.audio.sync(self.sim.phase, self.sim.score);
        }
    }

    pub fn start(&mut self) -> bool {
        if self.closed || !self.sim.start() {
            return false;
        }
        self.accumulator = 0.0;
        self.audio.sync(self.sim.phase, self.sim.score);
        true
    }

    /// Pointer position in field coordinates. Ignored unless running.
    pub fn pointer_y(&mut self, y: f32) {
        if self.sim.phase == GamePhase::Running {
            self.input.paddle_target = Some(y);
        }
    }

    /// Toggle on the next tick. Two requests before a tick cancel out.
    pub fn toggle_pause(&mut self) {
        if matches!(self.sim.phase, GamePhase::Running | GamePhase::Paused) {
            self.input.pause = !self.input.pause;
        }
    }

    /// Window lost focus: pause a running game, leave anything else alone
    pub fn pause_for_blur(&mut self) {
        if self.sim.phase == GamePhase::Running && !self.input.pause {
            self.input.pause = true;
            log::info!("Auto-paused (window blur)");
        }
    }

    /// Advance by one display frame.
    ///
    /// Returns the score flow on the frame the round ends.
    pub fn frame(&mut self, dt: f32) -> Option<ScoreFlow> {
        if self.closed {
            return None;
        }

        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.sim, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // One-shot
            self.input.pause = false;
        }
        if self.sim.phase != GamePhase::Running {
            self.input.paddle_target = None;
        }

        let mut flow = None;
        for event in self.sim.drain_events() {
            match event {
                GameEvent::PaddleHit(Side::Left) => self.audio.play(SoundEffect::PaddleHit),
                GameEvent::PaddleHit(Side::Right) => self.audio.play(SoundEffect::OpponentHit),
                GameEvent::WallHit => self.audio.play(SoundEffect::WallHit),
                GameEvent::SpeedUp(_) => self.audio.play(SoundEffect::SpeedUp),
                GameEvent::Scored(_) => {}
                GameEvent::GameOver(score) => flow = Some(self.finish_round(score)),
            }
        }

        self.audio.sync(self.sim.phase, self.sim.score);
        self.audio.pump();
        flow
    }

    /// Name typed at the prompt
    pub fn submit_name(&mut self, raw: &str) -> Result<ScoreFlow, NameError> {
        let flow = self.score.provide_name(raw, self.store.as_mut())?;
        self.apply_flow(&flow);
        Ok(flow)
    }

    pub fn skip_name(&mut self) -> ScoreFlow {
        let flow = self.score.skip_name();
        self.apply_flow(&flow);
        flow
    }

    /// New round after game over. An open name prompt is abandoned.
    ///
    /// Each round gets its own score guard, so a session that replays can
    /// submit once per round played.
    pub fn replay(&mut self) -> bool {
        if self.closed || self.sim.phase != GamePhase::GameOver {
            return false;
        }
        if self.score.is_awaiting_name() {
            self.score.skip_name();
        }
        self.score = ScoreService::new(self.leaderboard_size);
        self.notice = None;
        self.accumulator = 0.0;
        self.input = TickInput::default();
        self.sim.replay();
        self.audio.sync(self.sim.phase, self.sim.score);
        true
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    /// Current public leaderboard; empty if it can't be read
    pub fn leaderboard(&self) -> Vec<HighScoreEntry> {
        self.store.list(self.leaderboard_size).unwrap_or_else(|e| {
            log::warn!("Leaderboard unavailable: {}", e);
            Vec::new()
        })
    }

    /// Dismiss the game. Audio is released and no further ticks run.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.score.is_awaiting_name() {
            self.score.skip_name();
        }
        self.audio.teardown();
        log::info!("Game closed at score {}", self.sim.score);
    }

    fn finish_round(&mut self, score: u32) -> ScoreFlow {
        let flow = self
            .score
            .on_game_over(score, self.auth.as_ref(), self.store.as_mut());
        self.apply_flow(&flow);
        flow
    }

    fn apply_flow(&mut self, flow: &ScoreFlow) {
        match flow {
            ScoreFlow::Submitted { score } => {
                self.notice = Some(format!("Score {} saved", score));
            }
            ScoreFlow::NamePrompt { .. } => self.audio.play(SoundEffect::HighScore),
            ScoreFlow::Failed(e) => {
                self.notice = Some(format!("Couldn't save your score ({})", e));
            }
            ScoreFlow::NotQualified | ScoreFlow::Skipped | ScoreFlow::AlreadyHandled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DeviceKind, NullBackend};
    use crate::highscores::LocalLeaderboard;
    use crate::score::{Anonymous, NewScore, PlayerIdentity, ScoreError, SignedIn};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recording {
        scores: Rc<RefCell<Vec<u32>>>,
    }

    impl LeaderboardStore for Recording {
        fn submit(&mut self, entry: &NewScore) -> Result<(), ScoreError> {
            self.scores.borrow_mut().push(entry.score);
            Ok(())
        }

        fn list(&self, _top_n: usize) -> Result<Vec<HighScoreEntry>, ScoreError> {
            Ok(Vec::new())
        }
    }

    fn session() -> GameSession<NullBackend> {
        session_on(DeviceKind::Desktop)
    }

    fn session_on(device: DeviceKind) -> GameSession<NullBackend> {
        let settings = Settings::default();
        let audio = AudioEngine::new(NullBackend::default(), device, &settings);
        GameSession::new(
            3,
            &settings,
            audio,
            Box::new(Anonymous),
            Box::new(LocalLeaderboard::new(settings.leaderboard_size)),
        )
    }

    /// Run frames until the ball passes the human paddle
    fn play_until_over(s: &mut GameSession<NullBackend>) -> ScoreFlow {
        for _ in 0..10_000 {
            s.pointer_y(0.0);
            if let Some(flow) = s.frame(1.0 / 60.0) {
                return flow;
            }
        }
        panic!("round never ended");
    }

    #[test]
    fn test_gesture_starts_and_enables_audio() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::Idle);
        s.user_gesture();
        assert_eq!(s.phase(), GamePhase::Running);
        assert!(s.audio().is_audible());
    }

    #[test]
    fn test_mobile_plays_silently_until_enabled() {
        let mut s = session_on(DeviceKind::Mobile);
        assert!(s.audio().is_locked());
        s.user_gesture();
        assert_eq!(s.phase(), GamePhase::Running);
        s.frame(0.05);
        assert!(s.audio().is_locked());
        assert!(!s.audio().is_audible());

        s.enable_audio();
        assert!(!s.audio().is_locked());
        assert!(s.audio().is_audible());
        assert_eq!(s.phase(), GamePhase::Running);
    }

    #[test]
    fn test_idle_frames_do_nothing() {
        let mut s = session();
        assert!(s.frame(0.05).is_none());
        assert_eq!(s.sim().time_ticks, 0);
    }

    #[test]
    fn test_pause_freezes_and_resumes() {
        let mut s = session();
        s.user_gesture();
        s.frame(0.05);
        s.toggle_pause();
        s.frame(0.05);
        assert_eq!(s.phase(), GamePhase::Paused);
        let ball = s.sim().ball.pos;
        let ticks = s.sim().time_ticks;
        s.pointer_y(10.0);
        s.frame(0.05);
        assert_eq!(s.sim().ball.pos, ball);
        assert_eq!(s.sim().time_ticks, ticks);

        s.toggle_pause();
        s.frame(0.05);
        assert_eq!(s.phase(), GamePhase::Running);
        assert!(s.sim().time_ticks > ticks);
    }

    #[test]
    fn test_blur_only_pauses_running() {
        let mut s = session();
        s.pause_for_blur();
        s.frame(0.05);
        assert_eq!(s.phase(), GamePhase::Idle);
        s.user_gesture();
        s.pause_for_blur();
        s.pause_for_blur();
        s.frame(0.05);
        assert_eq!(s.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut s = session();
        s.user_gesture();
        let flow = play_until_over(&mut s);
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert!(matches!(flow, ScoreFlow::NotQualified | ScoreFlow::NamePrompt { .. }));
        for _ in 0..100 {
            assert!(s.frame(1.0 / 60.0).is_none());
        }
    }

    #[test]
    fn test_replay_resets_round() {
        let mut s = session();
        assert!(!s.replay());
        s.user_gesture();
        play_until_over(&mut s);
        assert!(s.replay());
        assert_eq!(s.phase(), GamePhase::Running);
        assert_eq!(s.sim().score, 0);
        assert!(!s.is_awaiting_name());
    }

    #[test]
    fn test_each_round_submits_once() {
        let settings = Settings::default();
        let audio = AudioEngine::new(NullBackend::default(), DeviceKind::Desktop, &settings);
        let store = Recording::default();
        let auth = SignedIn(PlayerIdentity {
            user_id: "u1".into(),
            display_name: "Sam".into(),
        });
        let mut s = GameSession::new(3, &settings, audio, Box::new(auth), Box::new(store.clone()));

        s.user_gesture();
        assert!(matches!(play_until_over(&mut s), ScoreFlow::Submitted { .. }));
        for _ in 0..60 {
            s.frame(1.0 / 60.0);
        }
        assert_eq!(store.scores.borrow().len(), 1);

        assert!(s.replay());
        assert_eq!(s.notice(), None);
        assert!(matches!(play_until_over(&mut s), ScoreFlow::Submitted { .. }));
        for _ in 0..60 {
            s.frame(1.0 / 60.0);
        }
        assert_eq!(store.scores.borrow().len(), 2);
    }

    #[test]
    fn test_close_stops_everything() {
        let mut s = session();
        s.user_gesture();
        s.frame(0.05);
        s.close();
        let ticks = s.sim().time_ticks;
        assert!(s.frame(0.05).is_none());
        s.user_gesture();
        assert_eq!(s.sim().time_ticks, ticks);
        assert!(!s.audio().is_audible());
        assert!(s.is_closed());
    }
}
