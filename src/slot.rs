/// Character that can occupy a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Occupant {
    /// The grinch: worth a point when tapped
    Favorable,
    /// Santa: costs a point when tapped
    Unfavorable,
}

impl Occupant {
    pub fn score_delta(self) -> i32 {
        match self {
            Occupant::Favorable => 1,
            Occupant::Unfavorable => -1,
        }
    }
}

/// One reveal position on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub id: usize,
    pub occupant: Option<Occupant>,
    pub visible: bool,
    pub feedback_active: bool,
    /// Bumped on every write; deferred clears compare against it
    pub generation: u64,
}

impl Slot {
    fn blank(id: usize) -> Self {
        Self {
            id,
            occupant: None,
            visible: false,
            feedback_active: false,
            generation: 0,
        }
    }

    /// True when a tap on this slot would count
    pub fn is_hittable(&self) -> bool {
        self.visible && self.occupant.is_some()
    }
}

/// Partial update merged into a slot record; `None` fields are left untouched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotPatch {
    pub occupant: Option<Option<Occupant>>,
    pub visible: Option<bool>,
    pub feedback_active: Option<bool>,
}

impl SlotPatch {
    /// A freshly spawned, exposed occupant
    pub fn reveal(occupant: Occupant) -> Self {
        Self {
            occupant: Some(Some(occupant)),
            visible: Some(true),
            feedback_active: Some(false),
        }
    }

    /// Emptied by a hit, showing the feedback bubble
    pub fn struck() -> Self {
        Self {
            occupant: Some(None),
            visible: Some(false),
            feedback_active: Some(true),
        }
    }

    pub fn hidden() -> Self {
        Self {
            occupant: Some(None),
            visible: Some(false),
            feedback_active: None,
        }
    }

    pub fn feedback_off() -> Self {
        Self {
            feedback_active: Some(false),
            ..Self::default()
        }
    }
}

/// Shared per-slot state, written by the spawner and by hit resolution
#[derive(Clone, Debug)]
pub struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(Slot::blank).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Slot> {
        self.slots.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn to_vec(&self) -> Vec<Slot> {
        self.slots.clone()
    }

    /// Merges `patch` into slot `id`. Returns the slot's new generation,
    /// or `None` when the id is out of range.
    pub fn update(&mut self, id: usize, patch: SlotPatch) -> Option<u64> {
        let slot = self.slots.get_mut(id)?;
        if let Some(occupant) = patch.occupant {
            slot.occupant = occupant;
        }
        if let Some(visible) = patch.visible {
            slot.visible = visible;
        }
        if let Some(feedback_active) = patch.feedback_active {
            slot.feedback_active = feedback_active;
        }
        slot.generation += 1;
        Some(slot.generation)
    }

    /// Blanks every slot. Generations keep counting so clears scheduled
    /// before the reset can never match again.
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.occupant = None;
            slot.visible = false;
            slot.feedback_active = false;
            slot.generation += 1;
        }
    }

    /// Hides the occupant only if the slot still holds the write made at
    /// `generation` with the same `occupant`.
    pub fn clear_occupant_if_current(
        &mut self,
        id: usize,
        generation: u64,
        occupant: Occupant,
    ) -> bool {
        let slot = self.guarded(id);
        if slot.generation != generation || slot.occupant != Some(occupant) {
            return false;
        }
        self.update(id, SlotPatch::hidden()).is_some()
    }

    /// Drops the feedback bubble only if it still belongs to the hit made at
    /// `generation`.
    pub fn clear_feedback_if_current(&mut self, id: usize, generation: u64) -> bool {
        let slot = self.guarded(id);
        if slot.generation != generation || !slot.feedback_active {
            return false;
        }
        self.update(id, SlotPatch::feedback_off()).is_some()
    }

    fn guarded(&self, id: usize) -> &Slot {
        assert!(
            id < self.slots.len(),
            "deferred slot callback for slot {id} but only {} slots exist",
            self.slots.len()
        );
        &self.slots[id]
    }
}
