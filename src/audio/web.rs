//! Web Audio backend
//!
//! Oscillator + gain envelope per note, routed through a music bus and an
//! effects bus that share one `AudioContext`.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use super::synth::{Note, Phrase, Waveform};
use super::{AudioBackend, AudioError};

/// How far ahead of the audio clock loops are scheduled (seconds)
const LOOKAHEAD: f64 = 0.5;
/// Envelope floor (exponential ramps can't reach zero)
const SILENCE: f32 = 0.001;

fn js_err(e: wasm_bindgen::JsValue) -> String {
    format!("{:?}", e)
}

fn osc_type(wave: Waveform) -> OscillatorType {
    match wave {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
    }
}

struct Buses {
    music: GainNode,
    sfx: GainNode,
}

/// Music currently scheduled
struct Music {
    phrase: Phrase,
    /// Context time of the next loop iteration
    next_start: f64,
    /// Scheduled oscillators and when they end
    nodes: Vec<(OscillatorNode, f64)>,
}

#[derive(Default)]
pub struct WebAudioBackend {
    ctx: Option<AudioContext>,
    buses: Option<Buses>,
    music: Option<Music>,
    gains: (f32, f32),
}

impl WebAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule one note on a bus, returning the oscillator and its end time
    fn schedule(
        ctx: &AudioContext,
        bus: &GainNode,
        note: &Note,
        at: f64,
    ) -> Result<(OscillatorNode, f64), AudioError> {
        let osc = ctx.create_oscillator().map_err(|e| AudioError::Graph(js_err(e)))?;
        let env = ctx.create_gain().map_err(|e| AudioError::Graph(js_err(e)))?;

        osc.set_type(osc_type(note.wave));
        osc.connect_with_audio_node(&env)
            .map_err(|e| AudioError::Graph(js_err(e)))?;
        env.connect_with_audio_node(bus)
            .map_err(|e| AudioError::Graph(js_err(e)))?;

        let t = at + note.start;
        let end = t + note.duration;
        env.gain().set_value_at_time(note.gain, t).ok();
        env.gain().exponential_ramp_to_value_at_time(SILENCE, end).ok();
        osc.frequency().set_value_at_time(note.freq, t).ok();
        if let Some(to) = note.end_freq {
            osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
        }

        osc.start_with_when(t).map_err(|e| AudioError::Graph(js_err(e)))?;
        osc.stop_with_when(end + 0.05).ok();
        Ok((osc, end + 0.05))
    }

    /// Keep looped music scheduled ahead of the clock
    fn schedule_music(&mut self) -> Result<(), AudioError> {
        let (Some(ctx), Some(buses), Some(music)) = (&self.ctx, &self.buses, &mut self.music)
        else {
            return Ok(());
        };
        let now = ctx.current_time();
        music.nodes.retain(|(_, end)| *end > now);

        if music.next_start < now {
            music.next_start = now;
        }
        while music.next_start < now + LOOKAHEAD {
            for note in &music.phrase.notes {
                music
                    .nodes
                    .push(Self::schedule(ctx, &buses.music, note, music.next_start)?);
            }
            if !music.phrase.looped {
                music.next_start = f64::INFINITY;
                break;
            }
            music.next_start += music.phrase.length.max(0.05);
        }
        Ok(())
    }
}

impl AudioBackend for WebAudioBackend {
    fn create_context(&mut self) -> Result<(), AudioError> {
        if self.ctx.is_some() {
            return Ok(());
        }
        let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(js_err(e)))?;
        let music = ctx.create_gain().map_err(|e| AudioError::Graph(js_err(e)))?;
        let sfx = ctx.create_gain().map_err(|e| AudioError::Graph(js_err(e)))?;
        music
            .connect_with_audio_node(&ctx.destination())
            .map_err(|e| AudioError::Graph(js_err(e)))?;
        sfx.connect_with_audio_node(&ctx.destination())
            .map_err(|e| AudioError::Graph(js_err(e)))?;
        music.gain().set_value(self.gains.0);
        sfx.gain().set_value(self.gains.1);

        self.buses = Some(Buses { music, sfx });
        self.ctx = Some(ctx);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let Some(ctx) = &self.ctx else {
            return Err(AudioError::Unavailable("no context".into()));
        };
        // The returned promise settles later; state is polled via is_running
        ctx.resume().map(|_| ()).map_err(|e| AudioError::Resume(js_err(e)))
    }

    fn is_running(&self) -> bool {
        self.ctx
            .as_ref()
            .is_some_and(|ctx| ctx.state() == AudioContextState::Running)
    }

    fn set_gains(&mut self, music: f32, sfx: f32) {
        self.gains = (music, sfx);
        if let Some(buses) = &self.buses {
            buses.music.gain().set_value(music);
            buses.sfx.gain().set_value(sfx);
        }
    }

    fn start_music(&mut self, phrase: Phrase) -> Result<(), AudioError> {
        self.stop_music();
        let now = self.ctx.as_ref().map_or(0.0, |ctx| ctx.current_time());
        self.music = Some(Music {
            phrase,
            next_start: now,
            nodes: Vec::new(),
        });
        self.schedule_music()
    }

    fn stop_music(&mut self) {
        if let Some(music) = self.music.take() {
            for (osc, _) in music.nodes {
                // Already-finished nodes throw; nothing to do about it
                let _ = osc.stop();
            }
        }
    }

    fn play_effect(&mut self, phrase: &Phrase) -> Result<(), AudioError> {
        let (Some(ctx), Some(buses)) = (&self.ctx, &self.buses) else {
            return Err(AudioError::Unavailable("no context".into()));
        };
        let now = ctx.current_time();
        for note in &phrase.notes {
            Self::schedule(ctx, &buses.sfx, note, now)?;
        }
        Ok(())
    }

    fn pump(&mut self) {
        if let Err(e) = self.schedule_music() {
            log::warn!("Music scheduling failed, stopping track: {}", e);
            self.stop_music();
        }
    }

    fn close(&mut self) {
        self.stop_music();
        self.buses = None;
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
        }
    }
}
