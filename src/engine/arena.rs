//! Slot storage for the cuts of one cutflow.
//!
//! Cuts live in a `Vec<Option<Cut>>` and are addressed by [`CutId`], the slot
//! index tagged with the arena that issued it. Removing a cut empties its
//! slot; slots are never reused, so the arena grows by one slot per
//! `replace` and a stale handle can only ever miss, never alias a different
//! cut. Dropping the arena drops every cut it holds.

use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::cut::{Cut, CutId};

static NEXT_TAG: AtomicU32 = AtomicU32::new(1);

#[derive(Debug)]
pub(crate) struct Arena {
    tag: u32,
    slots: Vec<Option<Cut>>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Arena { tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed), slots: Vec::new() }
    }

    pub(crate) fn insert(&mut self, cut: Cut) -> CutId {
        let id = CutId { arena: self.tag, slot: self.slots.len() };
        self.slots.push(Some(cut));
        id
    }

    pub(crate) fn get(&self, id: CutId) -> Option<&Cut> {
        self.slot(id).and_then(|slot| self.slots[slot].as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: CutId) -> Option<&mut Cut> {
        self.slot(id).and_then(|slot| self.slots[slot].as_mut())
    }

    pub(crate) fn remove(&mut self, id: CutId) -> Option<Cut> {
        self.slot(id).and_then(|slot| self.slots[slot].take())
    }

    fn slot(&self, id: CutId) -> Option<usize> {
        (id.arena == self.tag && id.slot < self.slots.len()).then_some(id.slot)
    }
}

/// Indexing is reserved for handles reached through tree links, which always
/// point at live slots.
impl Index<CutId> for Arena {
    type Output = Cut;

    fn index(&self, id: CutId) -> &Cut {
        match self.get(id) {
            Some(cut) => cut,
            None => panic!("dangling cut handle {id}"),
        }
    }
}

impl IndexMut<CutId> for Arena {
    fn index_mut(&mut self, id: CutId) -> &mut Cut {
        match self.get_mut(id) {
            Some(cut) => cut,
            None => panic!("dangling cut handle {id}"),
        }
    }
}
