//! Session-local copy of a remote collection with loading and saving flags.

use std::sync::{
    RwLock,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use super::Resource;

/// Identifies one load; a newer [`ResourceCollection::begin_load`] supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Held for the duration of one save. Dropping it clears the saving flag.
#[must_use = "the saving flag is cleared as soon as the guard is dropped"]
pub struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct ResourceCollection<R> {
    items: RwLock<Vec<R>>,
    loading: AtomicBool,
    saving: AtomicBool,
    generation: AtomicU64,
}

impl<R> Default for ResourceCollection<R> {
    fn default() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            loading: AtomicBool::new(true),
            saving: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }
}

impl<R: Resource> ResourceCollection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<R> {
        match self.items.read() {
            Ok(items) => items.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn find(&self, id: &str) -> Option<R> {
        self.with_items(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.with_items(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Start a load, superseding any load still in flight.
    pub fn begin_load(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.loading.store(true, Ordering::Release);
        LoadTicket(generation)
    }

    /// Store the result of a load. Returns `false` and discards `items` when a
    /// newer load has started since `ticket` was issued.
    pub fn finish_load(&self, ticket: LoadTicket, items: Vec<R>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.replace_items(items);
        self.loading.store(false, Ordering::Release);
        true
    }

    /// End a failed load, keeping the previous items.
    pub fn abandon_load(&self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading.store(false, Ordering::Release);
        true
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Claim the saving flag. `None` while another save of this collection is in flight.
    pub fn try_begin_save(&self) -> Option<SaveGuard<'_>> {
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveGuard { flag: &self.saving })
    }

    pub fn apply_created(&self, item: R) {
        self.with_items_mut(|items| items.push(item));
    }

    /// Replace the item with the same id; unknown ids are ignored.
    pub fn apply_updated(&self, item: R) {
        self.with_items_mut(|items| {
            if let Some(slot) = items.iter_mut().find(|existing| existing.id() == item.id()) {
                *slot = item;
            }
        });
    }

    pub fn apply_deleted(&self, id: &str) {
        self.with_items_mut(|items| items.retain(|item| item.id() != id));
    }

    fn replace_items(&self, next: Vec<R>) {
        self.with_items_mut(|items| *items = next);
    }

    fn with_items<T>(&self, f: impl FnOnce(&Vec<R>) -> T) -> T {
        match self.items.read() {
            Ok(items) => f(&items),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn with_items_mut(&self, f: impl FnOnce(&mut Vec<R>)) {
        match self.items.write() {
            Ok(mut items) => f(&mut items),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
