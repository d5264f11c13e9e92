//! Table: open-addressed hash table keyed by interned string handles.
//!
//! Linear probing over a power-of-two entry array. Deleted entries become
//! tombstones so that probe chains running through them stay intact;
//! tombstones count toward the load factor and are dropped on rehash.

use crate::memory::RawArray;
use crate::object::{StrHandle, Strings};
use core::fmt;

/// Maximum ratio of occupied-or-tombstoned slots to capacity.
pub const TABLE_MAX_LOAD: f64 = 0.75;

/// Capacity of the first allocation.
pub const MIN_CAPACITY: usize = 8;

/// Capacity to grow to from `capacity`.
#[inline]
pub fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

#[derive(Copy, Clone, Debug)]
enum Slot<V> {
    Empty,
    Tombstone,
    Occupied { key: StrHandle, value: V },
}

// Linear probe sequence over a power-of-two table.
struct Probe {
    index: usize,
    mask: usize,
}

impl Probe {
    #[inline]
    fn start(hash: u32, capacity: usize) -> Probe {
        debug_assert!(capacity.is_power_of_two());
        let mask = capacity - 1;
        Probe {
            index: hash as usize & mask,
            mask,
        }
    }

    #[inline]
    fn next(&mut self) {
        self.index = (self.index + 1) & self.mask;
    }
}

// Index of the slot holding `key`, or of the slot an insert of `key` should
// claim: the first tombstone passed, else the empty slot ending the chain.
//
// The load factor guarantees at least one empty slot, so this terminates.
fn find_slot<V>(entries: &[Slot<V>], key: StrHandle) -> usize {
    let mut probe = Probe::start(key.hash(), entries.len());
    let mut tombstone = None;
    loop {
        match &entries[probe.index] {
            Slot::Empty => return tombstone.unwrap_or(probe.index),
            Slot::Tombstone => {
                if tombstone.is_none() {
                    tombstone = Some(probe.index);
                }
            }
            Slot::Occupied { key: k, .. } if *k == key => return probe.index,
            Slot::Occupied { .. } => {}
        }
        probe.next();
    }
}

/// Open-addressed map from interned string handles to `Copy` values.
///
/// Keys compare by handle identity, never by content, so every key must be
/// the canonical handle from [`StringHeap::copy_string`]; use
/// [`Table::find_string`] to look up by content. Deleted entries stay
/// behind as tombstones that count toward the 0.75 load factor until the
/// next growth drops them.
///
/// [`StringHeap::copy_string`]: crate::object::StringHeap::copy_string
pub struct Table<V> {
    // Occupied plus tombstoned slots.
    pub(crate) count: usize,
    live: usize,
    entries: RawArray<Slot<V>>,
}

impl<V: Copy> Table<V> {
    pub const fn new() -> Self {
        Self {
            count: 0,
            live: 0,
            entries: RawArray::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Release the entry array and return to the empty state.
    pub fn free(&mut self) {
        self.entries.release();
        self.count = 0;
        self.live = 0;
    }

    pub fn get(&self, key: StrHandle) -> Option<V> {
        if self.count == 0 {
            return None;
        }
        let entries = self.entries.as_slice();
        match entries[find_slot(entries, key)] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: StrHandle) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite. Returns true if `key` was not already present.
    pub fn set(&mut self, key: StrHandle, value: V) -> bool {
        if exceeds_max_load(self.count + 1, self.capacity()) {
            self.adjust_capacity(grow_capacity(self.capacity()));
        }

        let entries = self.entries.as_mut_slice();
        let index = find_slot(entries, key);
        let slot = &mut entries[index];
        let is_new = !matches!(slot, Slot::Occupied { .. });
        if matches!(slot, Slot::Empty) {
            self.count += 1;
        }
        if is_new {
            self.live += 1;
        }
        *slot = Slot::Occupied { key, value };
        is_new
    }

    /// Remove `key`, leaving a tombstone. Returns whether it was present.
    pub fn delete(&mut self, key: StrHandle) -> bool {
        if self.count == 0 {
            return false;
        }
        let entries = self.entries.as_mut_slice();
        let index = find_slot(entries, key);
        match entries[index] {
            Slot::Occupied { .. } => {
                entries[index] = Slot::Tombstone;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Copy every live entry of `self` into `to`, overwriting existing keys.
    pub fn add_all(&self, to: &mut Table<V>) {
        for (key, value) in self.iter() {
            to.set(key, *value);
        }
    }

    /// Find a key by content rather than identity.
    ///
    /// Used while constructing a string, before a handle for it exists.
    pub fn find_string(&self, strings: &Strings, chars: &str, hash: u32) -> Option<StrHandle> {
        if self.count == 0 {
            return None;
        }
        let entries = self.entries.as_slice();
        let mut probe = Probe::start(hash, entries.len());
        loop {
            match &entries[probe.index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied { key, .. } => {
                    if key.hash() == hash
                        && strings
                            .get(*key)
                            .is_some_and(|s| s.as_bytes() == chars.as_bytes())
                    {
                        return Some(*key);
                    }
                }
            }
            probe.next();
        }
    }

    /// Mark every key and value as reachable.
    pub fn mark_table<M>(&self, marker: &mut M)
    where
        M: crate::gc::Marker<V> + ?Sized,
    {
        for (key, value) in self.iter() {
            marker.mark_string(key);
            marker.mark_value(value);
        }
    }

    /// Delete every entry whose key `is_marked` rejects. Returns the number
    /// of entries removed.
    pub fn remove_white(&mut self, is_marked: impl Fn(StrHandle) -> bool) -> usize {
        let mut removed = 0;
        for slot in self.entries.as_mut_slice() {
            if let Slot::Occupied { key, .. } = *slot {
                if !is_marked(key) {
                    *slot = Slot::Tombstone;
                    removed += 1;
                }
            }
        }
        self.live -= removed;
        removed
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.entries.as_slice().iter(),
        }
    }

    fn adjust_capacity(&mut self, capacity: usize) {
        let mut entries = RawArray::filled(capacity, Slot::Empty);
        let dest = entries.as_mut_slice();
        let mut count = 0;
        for slot in self.entries.as_slice() {
            if let Slot::Occupied { key, value } = *slot {
                let index = find_slot(dest, key);
                dest[index] = Slot::Occupied { key, value };
                count += 1;
            }
        }
        log::trace!(
            "table rehash: capacity {} -> {}, {} tombstones dropped",
            self.capacity(),
            capacity,
            self.count - count
        );
        // The old array is released when it is dropped here.
        self.entries = entries;
        self.count = count;
    }
}

#[inline]
fn exceeds_max_load(count: usize, capacity: usize) -> bool {
    count as f64 > capacity as f64 * TABLE_MAX_LOAD
}

impl<V: Copy> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy + fmt::Debug> fmt::Debug for Table<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the live entries of a [`Table`].
pub struct Iter<'a, V> {
    it: core::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (StrHandle, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().find_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((*key, value)),
            _ => None,
        })
    }
}
