//! Tones behind the audio cues: the Jingle Bells phrase, paced by the
//! current tempo, and the short falling boop played on every hit.

use std::f32::consts::TAU;

use crate::audio::AudioEvent;
use crate::spawn::TempoTier;

pub const SAMPLE_RATE: u32 = 44_100;

const MELODY_GAIN: f32 = 0.25;
const BOOP_GAIN: f32 = 0.3;
/// Every tone fades towards this gain by its last sample
const FADE_FLOOR: f32 = 0.01;

const C4: f32 = 262.0;
const D4: f32 = 294.0;
const E4: f32 = 330.0;
const G4: f32 = 392.0;

/// (pitch, length in beats): E E E, E E E, E G C D E
const JINGLE_BELLS: [(f32, f32); 11] = [
    (E4, 1.0),
    (E4, 1.0),
    (E4, 1.5),
    (E4, 1.0),
    (E4, 1.0),
    (E4, 1.5),
    (E4, 1.0),
    (G4, 1.0),
    (C4, 1.0),
    (D4, 1.0),
    (E4, 2.0),
];

/// One oscillator note. Pitch glides exponentially from `start_hz` to
/// `end_hz` while the gain fades out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub start_hz: f32,
    pub end_hz: f32,
    pub duration_ms: u64,
    pub gain: f32,
}

impl Tone {
    pub fn steady(hz: f32, duration_ms: u64, gain: f32) -> Self {
        Self {
            start_hz: hz,
            end_hz: hz,
            duration_ms,
            gain,
        }
    }

    pub fn sample_count(&self, sample_rate: u32) -> usize {
        (self.duration_ms * u64::from(sample_rate) / 1000) as usize
    }

    /// Mono sine samples in `[-gain, gain]`
    pub fn samples(&self, sample_rate: u32) -> ToneSamples {
        ToneSamples {
            tone: *self,
            sample_rate,
            index: 0,
            len: self.sample_count(sample_rate),
            phase: 0.0,
        }
    }
}

/// The hit cue: 800 Hz falling to 400 Hz over 100 ms
pub fn boop() -> Tone {
    Tone {
        start_hz: 800.0,
        end_hz: 400.0,
        duration_ms: 100,
        gain: BOOP_GAIN,
    }
}

/// The phrase with one beat lasting [`TempoTier::beat_ms`]
pub fn jingle_bells(tempo: TempoTier) -> Vec<Tone> {
    let beat = tempo.beat_ms() as f32;
    JINGLE_BELLS
        .iter()
        .map(|&(hz, beats)| Tone::steady(hz, (beat * beats).round() as u64, MELODY_GAIN))
        .collect()
}

pub fn tones_for(event: AudioEvent) -> Vec<Tone> {
    match event {
        AudioEvent::TapHit => vec![boop()],
        AudioEvent::MelodyStart(tempo) | AudioEvent::TempoChange(tempo) => jingle_bells(tempo),
    }
}

pub fn total_ms(tones: &[Tone]) -> u64 {
    tones.iter().map(|t| t.duration_ms).sum()
}

#[derive(Clone, Debug)]
pub struct ToneSamples {
    tone: Tone,
    sample_rate: u32,
    index: usize,
    len: usize,
    phase: f32,
}

impl Iterator for ToneSamples {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.len {
            return None;
        }
        let progress = self.index as f32 / self.len as f32;
        let Tone {
            start_hz,
            end_hz,
            gain,
            ..
        } = self.tone;
        let hz = start_hz * (end_hz / start_hz).powf(progress);
        let level = gain * (FADE_FLOOR / gain).powf(progress);

        let sample = (self.phase * TAU).sin() * level;
        self.phase = (self.phase + hz / self.sample_rate as f32).fract();
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ToneSamples {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn melody_follows_tempo() {
        let base = jingle_bells(TempoTier::Base);
        assert_eq!(base.len(), 11);
        assert_eq!(base[0].duration_ms, 400);
        assert_eq!(base[2].duration_ms, 600);
        assert_eq!(base[10].duration_ms, 800);
        assert_eq!(total_ms(&base), 5200);

        let frantic = jingle_bells(TempoTier::Frantic);
        assert_eq!(total_ms(&frantic), 2600);
        assert!(total_ms(&jingle_bells(TempoTier::Brisk)) < total_ms(&base));
    }

    #[test]
    fn melody_ends_on_long_e() {
        let notes = jingle_bells(TempoTier::Base);
        let pitches: Vec<f32> = notes.iter().map(|t| t.start_hz).collect();
        assert_eq!(&pitches[7..], &[G4, C4, D4, E4]);
        assert!(notes.iter().all(|t| t.start_hz == t.end_hz));
    }

    #[test]
    fn cues_pick_their_tones() {
        assert_eq!(tones_for(AudioEvent::TapHit), vec![boop()]);
        assert_eq!(
            tones_for(AudioEvent::TempoChange(TempoTier::Brisk)),
            jingle_bells(TempoTier::Brisk)
        );
    }

    #[test]
    fn boop_samples_fade_out() {
        let samples: Vec<f32> = boop().samples(SAMPLE_RATE).collect();
        assert_eq!(samples.len(), 4410);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= BOOP_GAIN));
        let tail_peak = samples[4310..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.02, "tail peak {tail_peak}");
    }

    #[test]
    fn samples_report_exact_len() {
        let mut samples = Tone::steady(E4, 10, 0.5).samples(1000);
        assert_eq!(samples.len(), 10);
        samples.next();
        assert_eq!(samples.len(), 9);
    }
}
