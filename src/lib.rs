//! intern-table: a string-keyed, open-addressed hash table for a bytecode
//! VM's object system, plus the allocator primitive all of its storage
//! goes through.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the three tables a small VM needs (globals, per-class methods,
//!   the string intern set) as instances of one type, with the collector
//!   hooks that tell strong tables from weak ones.
//! - Layers:
//!   - `memory`: `reallocate`, the single allocate/grow/shrink/free
//!     primitive, and `RawArray<T>`, an exclusively-owned buffer built on
//!     it that frees itself on drop.
//!   - `object`: `StrHandle` (identity + precomputed hash), the string
//!     registry, and `StringHeap`, which interns through a weakly-held
//!     `Table<()>`.
//!   - `table`: `Table<V>`, linear probing with tombstones over a
//!     power-of-two `RawArray`.
//!   - `gc`: `StrongRootSource`/`WeaklyHeldCollection` capabilities for a
//!     collector, and `MarkSet`, a ready-made marker.
//!
//! Constraints
//! - Single-threaded: storage-owning types are `!Send`/`!Sync`.
//! - Keys compare by identity. Only handles from `StringHeap::copy_string`
//!   are canonical; content lookup exists only as `Table::find_string`.
//! - Load factor never exceeds 0.75 counting tombstones; growth doubles
//!   from a minimum of 8 and drops tombstones.
//! - Allocation failure aborts the process. There is no fallible path.
//!
//! Handles and staleness
//! - Handles are generational slot keys. Once the heap frees a string, its
//!   old handle never aliases a string created later, even if the slot is
//!   reused.
//! - The table does not own strings. A collector must prune weak tables
//!   (`remove_white`) before freeing the strings they name.
//!
//! Notes and non-goals
//! - Values are opaque `Copy` data; the table only stores and returns them.
//! - No serialization, no concurrent access, no arbitrary key types.

pub mod gc;
pub mod memory;
pub mod object;
pub mod table;
mod table_proptest;

// Public surface
pub use gc::{MarkSet, Marker, StrongRootSource, Trace, WeaklyHeldCollection};
pub use memory::{bytes_allocated, reallocate, MemoryError, RawArray};
pub use object::{hash_string, ObjString, StrHandle, StringHeap, Strings};
pub use table::{Table, MIN_CAPACITY, TABLE_MAX_LOAD};
