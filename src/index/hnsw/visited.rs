//! Per-traversal "seen" marks over dense internal ids
//!
//! A slot counts as seen only when it holds the current pass number.
//! Starting a new pass just bumps that number, so the slots are rewritten
//! only when the counter wraps.

use crate::types::InternalId;
use std::cell::RefCell;

#[derive(Debug)]
pub struct VisitedSet {
    stamps: Vec<u32>,
    pass: u32,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity],
            pass: 1,
        }
    }

    /// Begin a new traversal; every id reads as unseen afterwards
    pub fn start_pass(&mut self) {
        self.pass = self.pass.wrapping_add(1);
        if self.pass == 0 {
            self.stamps.iter_mut().for_each(|s| *s = 0);
            self.pass = 1;
        }
    }

    /// Make room for ids below `capacity`
    pub fn reserve_ids(&mut self, capacity: usize) {
        if self.stamps.len() < capacity {
            self.stamps.resize(capacity, 0);
        }
    }

    /// Mark `id` seen in this pass. `false` if it already was.
    #[inline]
    pub fn mark(&mut self, id: InternalId) -> bool {
        let slot = &mut self.stamps[id as usize];
        if *slot == self.pass {
            return false;
        }
        *slot = self.pass;
        true
    }
}

thread_local! {
    static VISITED_POOL: RefCell<VisitedSet> = RefCell::new(VisitedSet::new(0));
}

/// Run `f` with this thread's pooled set, grown to cover `capacity` ids.
///
/// A nested call (pool already borrowed) gets a fresh set instead.
pub(crate) fn with_visited<R>(capacity: usize, f: impl FnOnce(&mut VisitedSet) -> R) -> R {
    VISITED_POOL.with(|cell| match cell.try_borrow_mut() {
        Ok(mut visited) => {
            visited.reserve_ids(capacity);
            f(&mut visited)
        }
        Err(_) => f(&mut VisitedSet::new(capacity)),
    })
}
