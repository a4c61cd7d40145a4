use crate::session::Phase;
use crate::slot::{Occupant, SlotStore};

/// How long the "ouch" bubble stays up after a hit
pub const FEEDBACK_MS: u64 = 600;

/// A tap that landed on a live occupant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub slot: usize,
    pub occupant: Occupant,
    pub delta: i32,
}

/// Validates a tap against the current board. Taps outside an active
/// session, on unknown slots, or on empty/hidden slots resolve to `None`.
pub fn resolve(phase: Phase, slots: &SlotStore, slot_id: usize) -> Option<Hit> {
    if phase != Phase::Active {
        return None;
    }
    let slot = slots.get(slot_id)?;
    if !slot.visible {
        return None;
    }
    let occupant = slot.occupant?;

    Some(Hit {
        slot: slot_id,
        occupant,
        delta: occupant.score_delta(),
    })
}

/// Applies a score delta, never dropping below zero
pub fn apply_delta(score: u32, delta: i32) -> u32 {
    score.saturating_add_signed(delta)
}
