//! Plays cues through the default output device with rodio.

use std::io;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::audio::{AudioEvent, AudioSink};
use crate::melody::{self, Tone, ToneSamples, SAMPLE_RATE};

/// One synthesized tone as a rodio source
struct ToneSource {
    samples: ToneSamples,
    duration: Duration,
}

impl ToneSource {
    fn new(tone: Tone) -> Self {
        Self {
            samples: tone.samples(SAMPLE_RATE),
            duration: Duration::from_millis(tone.duration_ms),
        }
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.samples.next()
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples.len())
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration)
    }
}

/// Melody on its own sink so a tempo change can cut the previous phrase;
/// hit boops are mixed straight into the output stream.
pub struct Speaker {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    melody: Option<Sink>,
}

impl Speaker {
    pub fn try_default() -> io::Result<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(to_io)?;
        Ok(Self {
            _stream: stream,
            handle,
            melody: None,
        })
    }

    fn play_melody(&mut self, tones: Vec<Tone>) -> io::Result<()> {
        if let Some(previous) = self.melody.take() {
            previous.stop();
        }
        let sink = Sink::try_new(&self.handle).map_err(to_io)?;
        for tone in tones {
            sink.append(ToneSource::new(tone));
        }
        self.melody = Some(sink);
        Ok(())
    }
}

impl AudioSink for Speaker {
    fn notify(&mut self, event: AudioEvent) -> io::Result<()> {
        let tones = melody::tones_for(event);
        match event {
            AudioEvent::TapHit => {
                for tone in tones {
                    self.handle
                        .play_raw(ToneSource::new(tone))
                        .map_err(to_io)?;
                }
                Ok(())
            }
            AudioEvent::MelodyStart(_) | AudioEvent::TempoChange(_) => self.play_melody(tones),
        }
    }
}

fn to_io(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}
