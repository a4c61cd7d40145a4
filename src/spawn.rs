use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::slot::Occupant;

/// Delay before the first spawn of a session
pub const FIRST_SPAWN_MS: u64 = 800;
/// Upper bound (exclusive) of the random extra delay between spawns
pub const JITTER_MS: u64 = 200;
/// No occupant is ever shown for less than this
pub const MIN_VISIBLE_MS: u64 = 250;

/// Difficulty band, selected from elapsed session time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnTier {
    Warmup,
    Steady,
    Rush,
}

impl SpawnTier {
    pub fn for_elapsed(elapsed_secs: u32) -> Self {
        match elapsed_secs {
            0..=19 => SpawnTier::Warmup,
            20..=39 => SpawnTier::Steady,
            _ => SpawnTier::Rush,
        }
    }

    pub fn delay_base_ms(self) -> u64 {
        match self {
            SpawnTier::Warmup => 1500,
            SpawnTier::Steady => 900,
            SpawnTier::Rush => 500,
        }
    }

    pub fn visible_ms(self) -> u64 {
        let ms = match self {
            SpawnTier::Warmup => 1000,
            SpawnTier::Steady => 550,
            SpawnTier::Rush => 350,
        };
        ms.max(MIN_VISIBLE_MS)
    }

    pub fn unfavorable_chance(self) -> f64 {
        match self {
            SpawnTier::Warmup => 0.30,
            SpawnTier::Steady => 0.20,
            SpawnTier::Rush => 0.15,
        }
    }
}

/// Music pace; advances at 20s and 40s elapsed
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TempoTier {
    #[strum(to_string = "x1")]
    Base,
    #[strum(to_string = "x1.5")]
    Brisk,
    #[strum(to_string = "x2")]
    Frantic,
}

impl TempoTier {
    pub fn for_elapsed(elapsed_secs: u32) -> Self {
        match elapsed_secs {
            0..=19 => TempoTier::Base,
            20..=39 => TempoTier::Brisk,
            _ => TempoTier::Frantic,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            TempoTier::Base => 1.0,
            TempoTier::Brisk => 1.5,
            TempoTier::Frantic => 2.0,
        }
    }

    /// Length of one melody beat at this tempo
    pub fn beat_ms(self) -> u64 {
        (400.0 / self.multiplier()).round() as u64
    }
}

/// Random draws the spawner needs. Injected so sessions can be replayed.
pub trait SpawnRandom {
    /// Uniform slot index in `0..slot_count`
    fn pick_slot(&mut self, slot_count: usize) -> usize;
    /// Uniform value in `[0, 1)`
    fn roll(&mut self) -> f64;
    /// Uniform value in `0..max`
    fn jitter_ms(&mut self, max: u64) -> u64;
}

/// `SpawnRandom` backed by any `rand` generator
#[derive(Debug)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SpawnRandom for RngSource<R> {
    fn pick_slot(&mut self, slot_count: usize) -> usize {
        self.rng.gen_range(0..slot_count)
    }

    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn jitter_ms(&mut self, max: u64) -> u64 {
        if max == 0 {
            0
        } else {
            self.rng.gen_range(0..max)
        }
    }
}

/// Replays fixed draws for deterministic sessions. Empty queues fall back
/// to slot 0, a roll of 0.99 (favorable in every tier) and zero jitter.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    slots: VecDeque<usize>,
    rolls: VecDeque<f64>,
    jitters: VecDeque<u64>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(mut self, slots: impl IntoIterator<Item = usize>) -> Self {
        self.slots.extend(slots);
        self
    }

    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = f64>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    pub fn with_jitters(mut self, jitters: impl IntoIterator<Item = u64>) -> Self {
        self.jitters.extend(jitters);
        self
    }
}

impl SpawnRandom for ScriptedRandom {
    fn pick_slot(&mut self, slot_count: usize) -> usize {
        self.slots.pop_front().unwrap_or(0) % slot_count.max(1)
    }

    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.99)
    }

    fn jitter_ms(&mut self, max: u64) -> u64 {
        self.jitters.pop_front().unwrap_or(0).min(max.saturating_sub(1))
    }
}

/// Outcome of one spawn tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnPlan {
    pub slot: usize,
    pub occupant: Occupant,
    pub visible_ms: u64,
    pub next_in_ms: u64,
}

/// Decides where, what and for how long; the session applies the plan.
/// The tier is recomputed on every call so the ramp follows the clock.
pub fn plan(elapsed_secs: u32, slot_count: usize, rng: &mut dyn SpawnRandom) -> SpawnPlan {
    let tier = SpawnTier::for_elapsed(elapsed_secs);
    let slot = rng.pick_slot(slot_count);
    let occupant = if rng.roll() < tier.unfavorable_chance() {
        Occupant::Unfavorable
    } else {
        Occupant::Favorable
    };

    SpawnPlan {
        slot,
        occupant,
        visible_ms: tier.visible_ms(),
        next_in_ms: tier.delay_base_ms() + rng.jitter_ms(JITTER_MS),
    }
}
