use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::slot::Occupant;

/// Deferred work owned by a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    ClockTick,
    Spawn,
    ClearSpawn {
        slot: usize,
        generation: u64,
        occupant: Occupant,
    },
    ClearFeedback {
        slot: usize,
        generation: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub due_ms: u64,
    /// Schedule order, breaks ties between timers due at the same instant
    seq: u64,
    pub task: Task,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-threaded timer queue on virtual milliseconds.
///
/// Timers fire in due order, ties broken by the order they were scheduled.
/// `cancel_all` drops everything scheduled so far.
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Timer {
            due_ms: now_ms.saturating_add(delay_ms),
            seq,
            task,
        }));
    }

    /// Removes and returns the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Timer> {
        let Reverse(head) = self.pending.peek()?;
        if head.due_ms > now_ms {
            return None;
        }
        self.pending.pop().map(|Reverse(timer)| timer)
    }

    /// Drops every pending timer in O(pending). Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
