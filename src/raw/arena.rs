use alloc::vec::Vec;
use core::mem;

use super::handle::Handle;

#[derive(Clone)]
enum Slot<T> {
    Occupied(T),
    /// Link to the next vacant slot, forming an intrusive free list.
    Vacant(Option<Handle>),
}

/// Slot storage for tree nodes.
///
/// Every node of a tree lives in exactly one slot. Vacated slots are threaded into a free
/// list and handed out again, most recent first, by the next [`alloc`](Arena::alloc), so a
/// tree that churns through inserts and removes does not grow without bound.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    next_free: Option<Handle>,
    live: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self { slots: Vec::new(), next_free: None, live: 0 }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity), next_free: None, live: 0 }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of occupied slots.
    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        self.live
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever handed out, live or free. Every live handle indexes below this.
    pub(crate) const fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        let handle = if let Some(handle) = self.next_free {
            match mem::replace(&mut self.slots[handle.to_index()], Slot::Occupied(element)) {
                Slot::Vacant(next) => self.next_free = next,
                Slot::Occupied(_) => unreachable!("`Arena::alloc()` - free list points at a live slot!"),
            }
            handle
        } else {
            // Strict less-than keeps the newest index representable as a `Handle`.
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Slot::Occupied(element));
            Handle::from_index(self.slots.len() - 1)
        };
        self.live += 1;
        handle
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        matches!(self.slots.get(handle.to_index()), Some(Slot::Occupied(_)))
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        match &self.slots[handle.to_index()] {
            Slot::Occupied(element) => element,
            Slot::Vacant(_) => panic!("`Arena::get()` - `handle` is invalid!"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        match &mut self.slots[handle.to_index()] {
            Slot::Occupied(element) => element,
            Slot::Vacant(_) => panic!("`Arena::get_mut()` - `handle` is invalid!"),
        }
    }

    /// Iterates over every live element mutably, in slot order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied(element) => Some((Handle::from_index(index), element)),
            Slot::Vacant(_) => None,
        })
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let slot = &mut self.slots[handle.to_index()];
        match mem::replace(slot, Slot::Vacant(self.next_free)) {
            Slot::Occupied(element) => {
                self.next_free = Some(handle);
                self.live -= 1;
                element
            }
            Slot::Vacant(next) => {
                *slot = Slot::Vacant(next);
                panic!("`Arena::take()` - `handle` is invalid!");
            }
        }
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.next_free = None;
        self.live = 0;
    }
}
