//! Fire-and-forget audio cues.
//!
//! The session only says *what* happened; sinks decide what to play.
//! Muting is local to [`Audio`] and short-circuits before the sink is reached.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::spawn::TempoTier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioEvent {
    /// A tap landed on an occupant
    TapHit,
    /// Session started; the melody plays at this tempo
    MelodyStart(TempoTier),
    /// Elapsed time crossed a tempo threshold
    TempoChange(TempoTier),
}

pub trait AudioSink {
    fn notify(&mut self, event: AudioEvent) -> io::Result<()>;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn notify(&mut self, _event: AudioEvent) -> io::Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell once per cue. Used when no sound device is
/// available; tempo is not audible through it.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AudioSink for TerminalBell<W> {
    fn notify(&mut self, event: AudioEvent) -> io::Result<()> {
        log::trace!("bell for {:?}", event);
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn notify(&mut self, event: AudioEvent) -> io::Result<()> {
        (**self).notify(event)
    }
}

/// Keeps every event it receives; clones share the same log
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AudioEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AudioEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(*e)).count()
    }
}

impl AudioSink for RecordingSink {
    fn notify(&mut self, event: AudioEvent) -> io::Result<()> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

/// Owns the sink and the mute toggle
pub struct Audio {
    sink: Box<dyn AudioSink>,
    muted: bool,
}

impl Audio {
    pub fn new(sink: Box<dyn AudioSink>, muted: bool) -> Self {
        Self { sink, muted }
    }

    pub fn notify(&mut self, event: AudioEvent) {
        if self.muted {
            return;
        }
        if let Err(err) = self.sink.notify(event) {
            log::debug!("audio cue {:?} dropped: {}", event, err);
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl std::fmt::Debug for Audio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Audio").field("muted", &self.muted).finish()
    }
}
