//! Procedural music and effects - no external files needed!
//!
//! Everything is described as oscillator notes relative to a start time;
//! the backend turns them into nodes.

use super::{SoundEffect, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq: f32,
    /// Exponential sweep target, if any
    pub end_freq: Option<f32>,
    /// Offset from phrase start (seconds)
    pub start: f64,
    pub duration: f64,
    /// Peak gain before bus volume
    pub gain: f32,
    pub wave: Waveform,
}

impl Note {
    fn new(freq: f32, start: f64, duration: f64, gain: f32, wave: Waveform) -> Self {
        Self {
            freq,
            end_freq: None,
            start,
            duration,
            gain,
            wave,
        }
    }

    fn sweep(mut self, to: f32) -> Self {
        self.end_freq = Some(to);
        self
    }
}

/// A scheduled group of notes
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub notes: Vec<Note>,
    /// Loop period, or total length for one-shots (seconds)
    pub length: f64,
    pub looped: bool,
}

/// Equal temperament, A4 = 440 Hz
pub fn midi_to_freq(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}

/// Notes on an even grid; `None` is a rest
fn sequence(steps: &[Option<u8>], step: f64, hold: f64, gain: f32, wave: Waveform) -> Vec<Note> {
    steps
        .iter()
        .enumerate()
        .filter_map(|(i, midi)| {
            midi.map(|m| Note::new(midi_to_freq(m), i as f64 * step, step * hold, gain, wave))
        })
        .collect()
}

/// Music for a track
pub fn track_phrase(track: Track) -> Phrase {
    match track {
        // Slow rising arpeggio while waiting for the first point
        Track::Intro => {
            let step = 0.18;
            let notes = sequence(
                &[Some(60), Some(63), Some(67), Some(72), Some(67), Some(63)],
                step,
                0.9,
                0.22,
                Waveform::Triangle,
            );
            Phrase {
                notes,
                length: step * 6.0,
                looped: true,
            }
        }
        // 140 bpm eighths: square bass under a triangle lead
        Track::Main => {
            let step = 60.0 / 140.0 / 2.0;
            let mut notes = sequence(
                &[
                    Some(36),
                    Some(36),
                    Some(43),
                    Some(43),
                    Some(41),
                    Some(41),
                    Some(39),
                    Some(43),
                ],
                step,
                0.8,
                0.18,
                Waveform::Square,
            );
            notes.extend(sequence(
                &[Some(72), None, Some(75), Some(74), Some(72), None, Some(70), Some(72)],
                step,
                0.7,
                0.14,
                Waveform::Triangle,
            ));
            Phrase {
                notes,
                length: step * 8.0,
                looped: true,
            }
        }
        // Sad descending
        Track::GameOver => {
            let notes = [400.0, 350.0, 300.0, 200.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| Note::new(f, i as f64 * 0.2, 0.3, 0.3, Waveform::Sine))
                .collect();
            Phrase {
                notes,
                length: 0.9,
                looped: false,
            }
        }
    }
}

/// One-shot sound for an effect
pub fn effect_phrase(effect: SoundEffect) -> Phrase {
    let notes = match effect {
        // Solid thump
        SoundEffect::PaddleHit => {
            vec![Note::new(150.0, 0.0, 0.1, 0.6, Waveform::Sine).sweep(60.0)]
        }
        // Softer, higher knock for the computer's paddle
        SoundEffect::OpponentHit => {
            vec![Note::new(220.0, 0.0, 0.08, 0.4, Waveform::Sine).sweep(110.0)]
        }
        // Higher ping
        SoundEffect::WallHit => vec![Note::new(400.0, 0.0, 0.08, 0.3, Waveform::Sine)],
        // Whoosh up
        SoundEffect::SpeedUp => vec![
            Note::new(200.0, 0.0, 0.2, 0.3, Waveform::Triangle).sweep(600.0),
            Note::new(800.0, 0.12, 0.15, 0.15, Waveform::Sine),
        ],
        // Celebratory
        SoundEffect::HighScore => [500.0, 600.0, 700.0, 800.0, 1000.0]
            .iter()
            .enumerate()
            .map(|(i, &f)| Note::new(f, i as f64 * 0.08, 0.25, 0.25, Waveform::Triangle))
            .collect(),
    };
    let length = notes
        .iter()
        .map(|n| n.start + n.duration)
        .fold(0.0, f64::max);
    Phrase {
        notes,
        length,
        looped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-2);
        assert!((midi_to_freq(60) - 261.63).abs() < 0.01);
    }

    #[test]
    fn test_loops_fit_inside_their_period() {
        for track in [Track::Intro, Track::Main] {
            let phrase = track_phrase(track);
            assert!(phrase.looped);
            assert!(!phrase.notes.is_empty());
            for note in &phrase.notes {
                assert!(note.start + note.duration <= phrase.length + 1e-9);
            }
        }
    }

    #[test]
    fn test_game_over_is_one_shot() {
        let phrase = track_phrase(Track::GameOver);
        assert!(!phrase.looped);
        assert_eq!(phrase.notes.len(), 4);
        assert!(phrase.notes.windows(2).all(|w| w[0].freq > w[1].freq));
    }

    #[test]
    fn test_effect_length_covers_notes() {
        let phrase = effect_phrase(SoundEffect::HighScore);
        assert_eq!(phrase.notes.len(), 5);
        assert!((phrase.length - (0.32 + 0.25)).abs() < 1e-9);
    }
}
