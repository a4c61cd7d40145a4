use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::time::Duration;

use crate::audio::{Audio, AudioEvent, AudioSink};
use crate::best_score::BestScoreStore;
use crate::clock::{Clock, SESSION_SECS, TICK_MS};
use crate::config::{Config, DEFAULT_SLOT_COUNT};
use crate::hit::{self, FEEDBACK_MS};
use crate::slot::{Slot, SlotPatch, SlotStore};
use crate::spawn::{self, SpawnRandom, TempoTier, FIRST_SPAWN_MS};
use crate::timer::{Task, TimerQueue};

/// Snapshots held for a subscriber that is not draining; newer ones are
/// dropped for it until it catches up
pub const SUBSCRIBER_BACKLOG: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Active,
    Finished,
}

/// Everything that can change a session, processed one at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
    Tap(usize),
    ToggleMute,
    Advance(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub slot_count: usize,
    pub muted: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            muted: false,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            slot_count: cfg.slot_count,
            muted: cfg.muted,
        }
    }
}

/// Read-only view published after every mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub score: u32,
    pub best_score: u32,
    pub remaining_secs: u32,
    pub phase: Phase,
    pub tempo: TempoTier,
    pub muted: bool,
    pub slots: Vec<Slot>,
    /// The session that just finished set a new best
    pub new_best: bool,
}

/// One game: owns the clock, the board, the timers and the score.
///
/// Time is virtual. Nothing happens between calls; [`Session::advance`]
/// fires every timer that has come due, in order, one at a time.
pub struct Session {
    phase: Phase,
    score: u32,
    best_score: u32,
    new_best: bool,
    tempo: TempoTier,
    slots: SlotStore,
    clock: Clock,
    timers: TimerQueue,
    now_ms: u64,
    audio: Audio,
    rng: Box<dyn SpawnRandom>,
    store: Box<dyn BestScoreStore>,
    queue: VecDeque<Command>,
    subscribers: Vec<SyncSender<Snapshot>>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        store: impl BestScoreStore + 'static,
        sink: impl AudioSink + 'static,
        rng: impl SpawnRandom + 'static,
    ) -> Self {
        let best_score = store.get();
        Self {
            phase: Phase::Idle,
            score: 0,
            best_score,
            new_best: false,
            tempo: TempoTier::Base,
            slots: SlotStore::new(config.slot_count.max(1)),
            clock: Clock::new(SESSION_SECS),
            timers: TimerQueue::new(),
            now_ms: 0,
            audio: Audio::new(Box::new(sink), config.muted),
            rng: Box::new(rng),
            store: Box::new(store),
            queue: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }

    /// Queues a command for the next [`Session::pump`]
    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Drains queued commands in order. Returns how many were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Some(command) = self.queue.pop_front() {
            self.apply(command);
            processed += 1;
        }
        processed
    }

    /// Runs one command now. Returns whether any state changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Start => self.on_start(),
            Command::Restart => self.on_restart(),
            Command::Tap(slot) => self.on_tap(slot),
            Command::ToggleMute => self.on_toggle_mute(),
            Command::Advance(dt) => self.on_advance(dt),
        }
    }

    pub fn start(&mut self) -> bool {
        self.apply(Command::Start)
    }

    pub fn restart(&mut self) -> bool {
        self.apply(Command::Restart)
    }

    pub fn tap(&mut self, slot: usize) -> bool {
        self.apply(Command::Tap(slot))
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.apply(Command::ToggleMute)
    }

    pub fn advance(&mut self, dt: Duration) -> bool {
        self.apply(Command::Advance(dt))
    }

    /// Receives a snapshot after every mutation until the receiver is dropped.
    /// At most [`SUBSCRIBER_BACKLOG`] undrained snapshots are kept.
    pub fn subscribe(&mut self) -> Receiver<Snapshot> {
        let (tx, rx) = mpsc::sync_channel(SUBSCRIBER_BACKLOG);
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            score: self.score,
            best_score: self.best_score,
            remaining_secs: self.clock.remaining(),
            phase: self.phase,
            tempo: self.tempo,
            muted: self.audio.is_muted(),
            slots: self.slots.to_vec(),
            new_best: self.new_best,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn remaining_secs(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn tempo(&self) -> TempoTier {
        self.tempo
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn on_start(&mut self) -> bool {
        if self.phase == Phase::Active {
            return false;
        }
        self.begin();
        true
    }

    fn on_restart(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        log::info!("restarting with {}s left", self.clock.remaining());
        self.begin();
        true
    }

    /// Shared by start, restart and try-again
    fn begin(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.clock.stop();
        self.slots.reset_all();
        self.score = 0;
        self.new_best = false;
        self.tempo = TempoTier::Base;

        self.clock.start();
        self.phase = Phase::Active;
        self.timers.schedule(self.now_ms, TICK_MS, Task::ClockTick);
        self.timers.schedule(self.now_ms, FIRST_SPAWN_MS, Task::Spawn);
        self.audio.notify(AudioEvent::MelodyStart(self.tempo));

        log::info!(
            "session started: {} slots, best {}, {} stale timers cancelled",
            self.slots.len(),
            self.best_score,
            cancelled
        );
        self.publish();
    }

    fn on_tap(&mut self, slot: usize) -> bool {
        let Some(hit) = hit::resolve(self.phase, &self.slots, slot) else {
            return false;
        };

        self.audio.notify(AudioEvent::TapHit);
        self.score = hit::apply_delta(self.score, hit.delta);
        if let Some(generation) = self.slots.update(hit.slot, SlotPatch::struck()) {
            self.timers.schedule(
                self.now_ms,
                FEEDBACK_MS,
                Task::ClearFeedback {
                    slot: hit.slot,
                    generation,
                },
            );
        }
        log::debug!("hit {} on slot {}, score {}", hit.occupant, hit.slot, self.score);
        self.publish();
        true
    }

    fn on_toggle_mute(&mut self) -> bool {
        let muted = self.audio.toggle_mute();
        log::debug!("muted: {}", muted);
        self.publish();
        true
    }

    fn on_advance(&mut self, dt: Duration) -> bool {
        let target = self.now_ms.saturating_add(dt.as_millis() as u64);
        let mut changed = false;
        while let Some(timer) = self.timers.pop_due(target) {
            self.now_ms = timer.due_ms;
            if self.run(timer.task) {
                changed = true;
                self.publish();
            }
        }
        self.now_ms = target;
        changed
    }

    fn run(&mut self, task: Task) -> bool {
        match task {
            Task::ClockTick => self.on_clock_tick(),
            Task::Spawn => {
                self.on_spawn();
                true
            }
            Task::ClearSpawn {
                slot,
                generation,
                occupant,
            } => self
                .slots
                .clear_occupant_if_current(slot, generation, occupant),
            Task::ClearFeedback { slot, generation } => {
                self.slots.clear_feedback_if_current(slot, generation)
            }
        }
    }

    fn on_clock_tick(&mut self) -> bool {
        let Some(remaining) = self.clock.tick() else {
            return false;
        };

        let tempo = TempoTier::for_elapsed(self.clock.elapsed());
        if tempo != self.tempo {
            self.tempo = tempo;
            self.audio.notify(AudioEvent::TempoChange(tempo));
            log::debug!("tempo now {}", tempo);
        }

        if remaining == 0 {
            self.finish();
        } else {
            self.timers.schedule(self.now_ms, TICK_MS, Task::ClockTick);
        }
        true
    }

    fn on_spawn(&mut self) {
        let plan = spawn::plan(self.clock.elapsed(), self.slots.len(), self.rng.as_mut());
        if let Some(generation) = self.slots.update(plan.slot, SlotPatch::reveal(plan.occupant)) {
            self.timers.schedule(
                self.now_ms,
                plan.visible_ms,
                Task::ClearSpawn {
                    slot: plan.slot,
                    generation,
                    occupant: plan.occupant,
                },
            );
        }
        self.timers.schedule(self.now_ms, plan.next_in_ms, Task::Spawn);
    }

    fn finish(&mut self) {
        self.clock.stop();
        let cancelled = self.timers.cancel_all();
        self.slots.reset_all();
        self.phase = Phase::Finished;

        if self.score > self.best_score {
            self.best_score = self.score;
            self.new_best = true;
            if let Err(err) = self.store.set(self.score) {
                log::warn!("could not persist best score {}: {}", self.score, err);
            }
        }
        log::info!(
            "session finished: score {}, best {}, {} timers cancelled",
            self.score,
            self.best_score,
            cancelled
        );
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|tx| match tx.try_send(snapshot.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("best_score", &self.best_score)
            .field("remaining_secs", &self.clock.remaining())
            .field("now_ms", &self.now_ms)
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSink;
    use crate::best_score::MemoryBestScoreStore;
    use crate::slot::Occupant;
    use crate::spawn::ScriptedRandom;
    use assert_matches::assert_matches;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session_with(rng: ScriptedRandom) -> (Session, RecordingSink, MemoryBestScoreStore) {
        let sink = RecordingSink::new();
        let store = MemoryBestScoreStore::new(0);
        let session = Session::new(
            SessionConfig::default(),
            store.clone(),
            sink.clone(),
            rng,
        );
        (session, sink, store)
    }

    #[test]
    fn starts_idle_with_full_clock() {
        let (session, _, _) = session_with(ScriptedRandom::new());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.remaining_secs(), 60);
        assert_eq!(session.pending_timers(), 0);
    }

    #[test]
    fn start_schedules_clock_and_first_spawn() {
        let (mut session, sink, _) = session_with(ScriptedRandom::new());
        assert!(session.start());
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.pending_timers(), 2);
        assert_eq!(sink.events(), vec![AudioEvent::MelodyStart(TempoTier::Base)]);

        // Starting again while active changes nothing
        assert!(!session.start());
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn first_spawn_lands_at_800ms() {
        let (mut session, _, _) = session_with(ScriptedRandom::new().with_slots([2]));
        session.start();
        session.advance(ms(799));
        assert!(session.slots().iter().all(|s| s.occupant.is_none()));

        session.advance(ms(1));
        let slot = session.slots().get(2).unwrap();
        assert_eq!(slot.occupant, Some(Occupant::Favorable));
        assert!(slot.visible);
    }

    #[test]
    fn spawn_clears_after_visible_duration() {
        let (mut session, _, _) = session_with(ScriptedRandom::new().with_slots([1, 4]));
        session.start();
        session.advance(ms(800));
        session.advance(ms(999));
        assert!(session.slots().get(1).unwrap().visible);
        session.advance(ms(1));
        assert!(!session.slots().get(1).unwrap().visible);
        assert_eq!(session.slots().get(1).unwrap().occupant, None);
    }

    #[test]
    fn restart_only_while_active() {
        let (mut session, _, _) = session_with(ScriptedRandom::new());
        assert!(!session.restart());
        session.start();
        session.advance(ms(5_000));
        assert!(session.restart());
        assert_eq!(session.remaining_secs(), 60);
        assert_eq!(session.phase(), Phase::Active);
    }

    #[test]
    fn commands_queue_in_order() {
        let (mut session, _, _) = session_with(ScriptedRandom::new().with_slots([0]));
        session.submit(Command::Start);
        session.submit(Command::Advance(ms(800)));
        session.submit(Command::Tap(0));
        session.submit(Command::Tap(0));
        assert_eq!(session.pump(), 4);
        assert_eq!(session.score(), 1);
        assert_eq!(session.pump(), 0);
    }

    #[test]
    fn finish_blanks_board_and_cancels_timers() {
        let (mut session, _, _) = session_with(ScriptedRandom::new());
        session.start();
        session.advance(Duration::from_secs(60));
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(session.pending_timers(), 0);
        assert!(session
            .slots()
            .iter()
            .all(|s| s.occupant.is_none() && !s.visible && !s.feedback_active));

        // Taps after the whistle are ignored
        assert!(!session.tap(0));
    }

    #[test]
    fn subscribers_see_mutations() {
        let (mut session, _, _) = session_with(ScriptedRandom::new());
        let rx = session.subscribe();
        session.start();
        session.advance(ms(800));
        let seen: Vec<Snapshot> = rx.try_iter().collect();
        assert_eq!(seen.len(), 2);
        assert_matches!(seen[0].phase, Phase::Active);
        assert!(seen[1].slots[0].visible);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let (mut session, _, _) = session_with(ScriptedRandom::new());
        drop(session.subscribe());
        session.start();
        assert!(session.subscribers.is_empty());
    }

    #[test]
    fn slow_subscriber_backlog_is_bounded() {
        let (mut session, _, _) = session_with(ScriptedRandom::new());
        let rx = session.subscribe();
        session.start();
        session.advance(Duration::from_secs(60));
        assert_eq!(session.phase(), Phase::Finished);

        assert_eq!(rx.try_iter().count(), SUBSCRIBER_BACKLOG);
        assert_eq!(session.subscribers.len(), 1);

        // Drained subscribers get fresh snapshots again
        session.toggle_mute();
        let latest = rx.try_recv().unwrap();
        assert!(latest.muted);
    }

    #[test]
    fn zero_slots_clamped_to_one() {
        let session = Session::new(
            SessionConfig {
                slot_count: 0,
                muted: true,
            },
            MemoryBestScoreStore::new(0),
            RecordingSink::new(),
            ScriptedRandom::new(),
        );
        assert_eq!(session.slots().len(), 1);
        assert!(session.is_muted());
    }
}
