/// Procedural sound effects via rodio (feature `sound`).
///
/// Every effect is a short note sequence rendered to an in-memory WAV
/// once at start-up; playback is fire-and-forget on rodio's thread.
/// Without the feature (or without an output device) the engine is a
/// no-op.

use crate::domain::power::PowerKind;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// Every effect the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Ghost,
    Slow,
    Fast,
    Expire,
    Unblock,
    TooFast,
    Clear,
    TimeUp,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const ALL_SFX: [Sfx; 8] = [
    Sfx::Ghost, Sfx::Slow, Sfx::Fast, Sfx::Expire,
    Sfx::Unblock, Sfx::TooFast, Sfx::Clear, Sfx::TimeUp,
];

impl Sfx {
    pub fn pickup(kind: PowerKind) -> Sfx {
        match kind {
            PowerKind::Ghost => Sfx::Ghost,
            PowerKind::Slow => Sfx::Slow,
            PowerKind::Fast => Sfx::Fast,
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis (pure, always compiled so it can be tested)
// ════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
enum Wave {
    Sine,
    /// Sine plus odd harmonic, a soft square.
    Square,
    /// Sine with vibrato.
    Wobble,
}

/// (frequency Hz, seconds) per note.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn score(sfx: Sfx) -> (&'static [(f32, f32)], Wave, f32) {
    match sfx {
        Sfx::Ghost => (&[(392.0, 0.09), (523.0, 0.09), (659.0, 0.16)], Wave::Wobble, 0.25),
        Sfx::Slow => (&[(330.0, 0.12), (262.0, 0.18)], Wave::Sine, 0.3),
        Sfx::Fast => (&[(1047.0, 0.04), (1319.0, 0.04), (1568.0, 0.04), (2093.0, 0.06)], Wave::Square, 0.2),
        Sfx::Expire => (&[(784.0, 0.06), (523.0, 0.08)], Wave::Sine, 0.2),
        Sfx::Unblock => (&[(523.0, 0.07), (784.0, 0.07), (1047.0, 0.12)], Wave::Square, 0.25),
        Sfx::TooFast => (&[(220.0, 0.10), (0.0, 0.04), (220.0, 0.10), (0.0, 0.04), (165.0, 0.20)], Wave::Square, 0.3),
        Sfx::Clear => (&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.35)], Wave::Square, 0.3),
        Sfx::TimeUp => (&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.3)], Wave::Sine, 0.3),
    }
}

/// Mono samples for a note sequence. A frequency of 0 is a rest.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn render(notes: &[(f32, f32)], wave: Wave, volume: f32) -> Vec<f32> {
    use std::f32::consts::TAU;
    let mut samples = Vec::new();
    for &(freq, dur) in notes {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            if freq <= 0.0 {
                samples.push(0.0);
                continue;
            }
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.7);
            let phase = t * freq * TAU;
            let s = match wave {
                Wave::Sine => phase.sin(),
                Wave::Square => phase.sin() * 0.7 + (phase * 3.0).sin() * 0.3,
                Wave::Wobble => (phase + (t * 7.0 * TAU).sin() * 2.0).sin(),
            };
            samples.push(s * env * volume);
        }
    }
    samples
}

/// 16-bit mono PCM WAV.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let data_size = samples.len() as u32 * 2;
    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

// ════════════════════════════════════════════════════════════
//  Playback
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::{debug, warn};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{make_wav, render, score, Sfx, ALL_SFX};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        /// None when no audio output is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = ALL_SFX
                .iter()
                .map(|&sfx| {
                    let (notes, wave, volume) = score(sfx);
                    (sfx, Arc::new(make_wav(&render(notes, wave, volume))))
                })
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.buffers.iter().find(|(s, _)| *s == sfx) else { return };
            let sink = match Sink::try_new(&self.handle) {
                Ok(sink) => sink,
                Err(e) => {
                    debug!("sink for {sfx:?} failed: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => debug!("decode {sfx:?} failed: {e}"),
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
