use log::warn;

use crate::ParticipantKey;

/// Fixed-length table of seats, each either empty or holding exactly one
/// participant. The length never changes after construction.
#[derive(Clone, Debug)]
pub struct SeatTable {
    slots: Vec<Option<ParticipantKey>>,
}

impl SeatTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the participant seated at `index`, if any
    pub fn get(&self, index: usize) -> Option<ParticipantKey> {
        self.slots.get(index).copied().flatten()
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Lowest empty index, scanning from 0
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    pub fn index_of(&self, key: &ParticipantKey) -> Option<usize> {
        self.slots.iter().position(|slot| slot.as_ref() == Some(key))
    }

    /// Seats `key` at `index` if that seat is empty. Returns whether the
    /// seat now holds `key`.
    pub fn occupy(&mut self, index: usize, key: ParticipantKey) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            warn!("seat index {} is out of range (capacity {})", index, self.capacity());
            return false;
        };
        match slot {
            None => {
                *slot = Some(key);
                true
            }
            Some(existing) => *existing == key,
        }
    }

    /// Vacates `index` only if it still holds `key`. Returns whether the
    /// seat was vacated.
    pub fn release(&mut self, index: usize, key: &ParticipantKey) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.as_ref() == Some(key) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Moves `key` from `previous` to `current`. The previous seat is only
    /// vacated if it still holds `key`; the current seat is overwritten.
    pub fn relocate(&mut self, key: ParticipantKey, previous: Option<usize>, current: usize) {
        if let Some(previous) = previous {
            self.release(previous, &key);
        }
        let Some(slot) = self.slots.get_mut(current) else {
            warn!("seat index {} is out of range (capacity {})", current, self.slots.len());
            return;
        };
        *slot = Some(key);
    }

    /// Occupied seats as `(index, participant)`, lowest index first
    pub fn iter(&self) -> impl Iterator<Item = (usize, ParticipantKey)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|key| (index, key)))
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }
}
