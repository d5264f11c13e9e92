//! String registry: canonical string objects and the handles that name them.
//!
//! Handles compare by identity. [`StringHeap::copy_string`] guarantees one
//! handle per distinct content, which is what lets [`Table`] compare keys
//! by identity instead of by bytes.

use crate::memory::RawArray;
use crate::table::Table;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational slot key of a string in [`Strings`].
    pub struct StringKey;
}

/// 32-bit FNV-1a.
pub fn hash_string(chars: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in chars.as_bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Identity of an interned string together with its precomputed hash.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StrHandle {
    pub(crate) key: StringKey,
    pub(crate) hash: u32,
}

impl StrHandle {
    pub(crate) fn new(key: StringKey, hash: u32) -> Self {
        Self { key, hash }
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn chars<'a>(&self, heap: &'a StringHeap) -> Option<&'a str> {
        heap.chars(*self)
    }
}

/// String object. The bytes live in allocator-backed storage.
#[derive(Debug)]
pub struct ObjString {
    chars: RawArray<u8>,
    hash: u32,
}

impl ObjString {
    fn new(chars: &str, hash: u32) -> Self {
        Self {
            chars: RawArray::from_slice(chars.as_bytes()),
            hash,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.chars.as_slice()
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: the bytes were copied from a `&str` and never mutated.
        unsafe { core::str::from_utf8_unchecked(self.chars.as_slice()) }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

/// Storage for string objects, addressed by [`StrHandle`].
#[derive(Debug, Default)]
pub struct Strings {
    slots: SlotMap<StringKey, ObjString>,
}

impl Strings {
    pub fn get(&self, handle: StrHandle) -> Option<&ObjString> {
        self.slots.get(handle.key)
    }

    pub fn contains(&self, handle: StrHandle) -> bool {
        self.slots.contains_key(handle.key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, chars: &str, hash: u32) -> StrHandle {
        let key = self.slots.insert(ObjString::new(chars, hash));
        StrHandle::new(key, hash)
    }
}

/// All live strings plus the weakly-held intern table that deduplicates
/// them.
#[derive(Debug, Default)]
pub struct StringHeap {
    strings: Strings,
    interned: Table<()>,
}

impl StringHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical handle for `chars`, creating it on first use.
    pub fn copy_string(&mut self, chars: &str) -> StrHandle {
        let hash = hash_string(chars);
        if let Some(existing) = self.interned.find_string(&self.strings, chars, hash) {
            return existing;
        }
        let handle = self.strings.insert(chars, hash);
        self.interned.set(handle, ());
        log::debug!("interned {:?} (hash {:#010x})", chars, hash);
        handle
    }

    /// Look up the canonical handle for `chars` without creating one.
    pub fn find_interned(&self, chars: &str) -> Option<StrHandle> {
        self.interned
            .find_string(&self.strings, chars, hash_string(chars))
    }

    pub fn get(&self, handle: StrHandle) -> Option<&ObjString> {
        self.strings.get(handle)
    }

    pub fn chars(&self, handle: StrHandle) -> Option<&str> {
        self.strings.get(handle).map(ObjString::as_str)
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    /// Number of live strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Sweep strings after a mark phase: prune the intern table, then free
    /// every string `is_marked` rejects. Returns the number freed.
    pub fn collect(&mut self, is_marked: impl Fn(StrHandle) -> bool) -> usize {
        let pruned = self.interned.remove_white(&is_marked);
        let before = self.strings.len();
        self.strings.slots.retain(|key, obj| {
            let handle = StrHandle::new(key, obj.hash);
            is_marked(handle)
        });
        let freed = before - self.strings.len();
        log::debug!(
            "string sweep: {} freed, {} unlinked from intern table, {} live",
            freed,
            pruned,
            self.strings.len()
        );
        freed
    }
}
