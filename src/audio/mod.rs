//! Audio engine
//!
//! One shared context per game session. Browsers only let a context start
//! from inside a user-initiated input handler, so `enable`/`initialize` do
//! context creation and an immediate resume synchronously and nothing else.
//! On mobile the engine starts locked; the game runs silently until enabled.

pub mod synth;
#[cfg(target_arch = "wasm32")]
pub mod web;

use thiserror::Error;

use crate::settings::Settings;
use crate::sim::GamePhase;
use synth::{Phrase, effect_phrase, track_phrase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits the player's paddle
    PaddleHit,
    /// Ball hits the computer's paddle
    OpponentHit,
    /// Ball hits a wall
    WallHit,
    /// Speed level increased
    SpeedUp,
    /// Score made the leaderboard
    HighScore,
}

/// Background music
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Intro,
    Main,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Desktop,
    /// Starts locked until an explicit enable tap
    Mobile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioState {
    pub context: ContextState,
    pub current_track: Option<Track>,
    pub muted: bool,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio context unavailable: {0}")]
    Unavailable(String),
    #[error("audio context refused to resume: {0}")]
    Resume(String),
    #[error("audio graph error: {0}")]
    Graph(String),
}

/// Music for a simulation phase
pub fn track_for(phase: GamePhase, score: u32) -> Option<Track> {
    match phase {
        GamePhase::Idle => Some(Track::Intro),
        GamePhase::Running if score == 0 => Some(Track::Intro),
        GamePhase::Running => Some(Track::Main),
        GamePhase::Paused => None,
        GamePhase::GameOver => Some(Track::GameOver),
    }
}

/// Platform audio output
pub trait AudioBackend {
    /// Create the shared context. Called synchronously from a user-input handler.
    fn create_context(&mut self) -> Result<(), AudioError>;
    /// Ask a suspended context to run. Called right after creation.
    fn resume(&mut self) -> Result<(), AudioError>;
    fn is_running(&self) -> bool;
    fn set_gains(&mut self, music: f32, sfx: f32);
    /// Replace the music with `phrase` (looped phrases keep going)
    fn start_music(&mut self, phrase: Phrase) -> Result<(), AudioError>;
    fn stop_music(&mut self);
    fn play_effect(&mut self, phrase: &Phrase) -> Result<(), AudioError>;
    /// Per-frame housekeeping (loop scheduling)
    fn pump(&mut self) {}
    /// Release the context and every node
    fn close(&mut self);
}

/// Backend that accepts everything and outputs nothing (native builds)
#[derive(Debug, Default)]
pub struct NullBackend {
    running: bool,
}

impl AudioBackend for NullBackend {
    fn create_context(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.running = true;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_gains(&mut self, _music: f32, _sfx: f32) {}

    fn start_music(&mut self, _phrase: Phrase) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_music(&mut self) {}

    fn play_effect(&mut self, _phrase: &Phrase) -> Result<(), AudioError> {
        Ok(())
    }

    fn close(&mut self) {
        self.running = false;
    }
}

/// Audio manager for one game session
pub struct AudioEngine<B> {
    backend: B,
    state: AudioState,
    device: DeviceKind,
    unlocked: bool,
    initialized: bool,
    closed: bool,
    music_volume: f32,
    sfx_volume: f32,
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn new(backend: B, device: DeviceKind, settings: &Settings) -> Self {
        Self {
            backend,
            state: AudioState {
                context: ContextState::Suspended,
                current_track: None,
                muted: settings.muted,
            },
            device,
            unlocked: device == DeviceKind::Desktop,
            initialized: false,
            closed: false,
            music_volume: (settings.master_volume * settings.music_volume).clamp(0.0, 1.0),
            sfx_volume: (settings.master_volume * settings.sfx_volume).clamp(0.0, 1.0),
        }
    }

    pub fn state(&self) -> &AudioState {
        &self.state
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mobile engines wait for `enable`
    pub fn is_locked(&self) -> bool {
        !self.unlocked
    }

    pub fn is_audible(&self) -> bool {
        self.state.context == ContextState::Running && !self.state.muted
    }

    /// Create and resume the context. Must run inside a user-input handler.
    ///
    /// Idempotent: once initialized this only retries a resume that hasn't
    /// taken effect yet. Failures are logged and leave the game silent.
    pub fn initialize(&mut self) {
        if self.closed || !self.unlocked {
            return;
        }
        if !self.initialized {
            if let Err(e) = self.backend.create_context() {
                log::warn!("Audio disabled: {}", e);
                return;
            }
            self.initialized = true;
            self.apply_gains();
            log::info!("Audio context created ({:?})", self.device);
        }
        if !self.backend.is_running() {
            if let Err(e) = self.backend.resume() {
                log::warn!("Audio resume failed, continuing muted: {}", e);
            }
        }
        self.refresh_context();
    }

    /// Explicit unlock tap (the mobile path)
    pub fn enable(&mut self) {
        if self.closed {
            return;
        }
        if !self.unlocked {
            log::info!("Audio unlocked by user");
            self.unlocked = true;
        }
        self.initialize();
    }

    /// Switch music to match the simulation
    pub fn sync(&mut self, phase: GamePhase, score: u32) {
        self.refresh_context();
        if self.state.context != ContextState::Running {
            return;
        }
        let desired = track_for(phase, score);
        if desired == self.state.current_track {
            return;
        }
        self.backend.stop_music();
        if let Some(track) = desired {
            if let Err(e) = self.backend.start_music(track_phrase(track)) {
                log::warn!("Could not start {:?} track: {}", track, e);
            }
        }
        log::debug!("Music: {:?} -> {:?}", self.state.current_track, desired);
        self.state.current_track = desired;
    }

    pub fn play(&mut self, effect: SoundEffect) {
        if !self.is_audible() {
            return;
        }
        if let Err(e) = self.backend.play_effect(&effect_phrase(effect)) {
            log::debug!("Effect {:?} dropped: {}", effect, e);
        }
    }

    /// Silence output without tearing down the context
    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
        if self.initialized {
            self.apply_gains();
        }
    }

    /// Per-frame housekeeping
    pub fn pump(&mut self) {
        if self.initialized && !self.closed {
            self.backend.pump();
        }
    }

    /// Release the context. Nothing plays after this.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.initialized {
            self.backend.stop_music();
            self.backend.close();
            log::info!("Audio context released");
        }
        self.initialized = false;
        self.state.context = ContextState::Suspended;
        self.state.current_track = None;
    }

    fn refresh_context(&mut self) {
        self.state.context = if self.initialized && self.backend.is_running() {
            ContextState::Running
        } else {
            ContextState::Suspended
        };
    }

    fn apply_gains(&mut self) {
        if self.state.muted {
            self.backend.set_gains(0.0, 0.0);
        } else {
            self.backend.set_gains(self.music_volume, self.sfx_volume);
        }
    }
}
