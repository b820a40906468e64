//! Unlock orchestration
//!
//! Turns gesture matches into at most one open session. The success action
//! is an opaque callback, so the same recognizer can open the game on one
//! page and navigate somewhere else on another.

/// What happened to a completion signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockDecision {
    /// Callback ran, session is now open
    Opened,
    /// A session is already open
    AlreadyOpen,
    /// Same physical gesture retriggered inside the cooldown window
    Cooldown,
}

pub struct UnlockOrchestrator<F> {
    on_unlock: F,
    cooldown_ms: f64,
    last_unlock: Option<f64>,
    session_open: bool,
}

impl<F: FnMut()> UnlockOrchestrator<F> {
    pub fn new(on_unlock: F, cooldown_ms: f64) -> Self {
        Self {
            on_unlock,
            cooldown_ms: cooldown_ms.max(0.0),
            last_unlock: None,
            session_open: false,
        }
    }

    pub fn is_session_open(&self) -> bool {
        self.session_open
    }

    /// A gesture matched at `now_ms`
    pub fn signal(&mut self, now_ms: f64) -> UnlockDecision {
        if self.session_open {
            log::debug!("Unlock ignored: session already open");
            return UnlockDecision::AlreadyOpen;
        }
        if let Some(last) = self.last_unlock {
            if now_ms - last < self.cooldown_ms {
                log::debug!("Unlock ignored: within cooldown");
                return UnlockDecision::Cooldown;
            }
        }

        // Flag is set before the callback runs
        self.session_open = true;
        self.last_unlock = Some(now_ms);
        log::info!("Secret unlocked");
        (self.on_unlock)();
        UnlockDecision::Opened
    }

    /// The opened session was dismissed
    pub fn session_closed(&mut self) {
        if self.session_open {
            log::info!("Unlocked session closed");
        }
        self.session_open = false;
    }
}
