// Table integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Round trip: get after set returns the stored value.
// - Overwrite: set on a present key is "not new" and keeps len.
// - Deletion: delete, then get misses, then set is "new" again.
// - Growth: crossing the 0.75 load factor grows and keeps every key.
// - Interning: equal content yields one handle; find_string misses
//   content that was never interned.
// - Merge: add_all copies every live entry, source wins on conflict.
use intern_table::{StrHandle, StringHeap, Table, MIN_CAPACITY};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test: the worked example.
// Assumes: a fresh table has no storage.
// Verifies: first insert allocates the minimum capacity; delete then
// reinsert behaves as a fresh key; unrelated keys are untouched.
#[test]
fn worked_example() {
    init_logging();
    let mut heap = StringHeap::new();
    let foo = heap.copy_string("foo");
    let bar = heap.copy_string("bar");
    let mut t: Table<i64> = Table::new();
    assert_eq!(t.capacity(), 0);

    assert!(t.set(foo, 1));
    assert_eq!(t.capacity(), MIN_CAPACITY);
    assert_eq!(t.get(foo), Some(1));
    assert!(t.set(bar, 2));
    assert!(t.delete(bar));
    assert_eq!(t.get(bar), None);
    assert!(t.set(bar, 3));
    assert_eq!(t.get(bar), Some(3));
    assert_eq!(t.get(foo), Some(1));
}

// Test: overwrite semantics.
// Verifies: "not new", len unchanged, new value visible.
#[test]
fn set_existing_key_overwrites() {
    let mut heap = StringHeap::new();
    let k = heap.copy_string("answer");
    let mut t = Table::new();
    assert!(t.set(k, 41));
    assert!(!t.set(k, 42));
    assert_eq!(t.len(), 1);
    assert_eq!(t.get(k), Some(42));
}

// Test: growth keeps contents.
// Assumes: growth doubles from the minimum capacity.
// Verifies: every key inserted before each growth is still retrievable.
#[test]
fn growth_preserves_all_entries() {
    init_logging();
    let mut heap = StringHeap::new();
    let mut t = Table::new();
    let mut inserted: Vec<(StrHandle, usize)> = Vec::new();
    let mut capacities = vec![t.capacity()];
    for i in 0..200 {
        let k = heap.copy_string(&format!("global_{}", i));
        assert!(t.set(k, i));
        inserted.push((k, i));
        if *capacities.last().unwrap() != t.capacity() {
            capacities.push(t.capacity());
        }
    }
    assert_eq!(capacities, vec![0, 8, 16, 32, 64, 128, 256, 512]);
    for (k, v) in inserted {
        assert_eq!(t.get(k), Some(v));
    }
}

// Test: churn through deletes.
// Assumes: tombstones count toward load until a rehash drops them; a new
// key may reuse a tombstone on its probe path, so how often growth
// happens depends on the key hashes.
// Verifies: every deleted key stays absent, capacity stays a power of
// two, and growth is geometric: at most one doubling per 0.75 * capacity
// inserts.
#[test]
fn delete_churn_rehashes_tombstones_away() {
    let mut heap = StringHeap::new();
    let mut t = Table::new();
    let mut keys = Vec::new();
    for i in 0..1_000 {
        let k = heap.copy_string(&format!("tmp{}", i));
        t.set(k, i);
        assert!(t.delete(k));
        assert!(t.capacity().is_power_of_two());
        keys.push(k);
    }
    assert!(t.is_empty());
    assert!(t.capacity() >= MIN_CAPACITY);
    assert!(t.capacity() <= 1024);
    assert!(keys.iter().all(|&k| t.get(k).is_none()));
}

// Test: interning through the heap.
// Verifies: independently built equal strings share a handle; unknown
// content is not found; the intern table does not create on lookup.
#[test]
fn find_string_deduplicates() {
    let mut heap = StringHeap::new();
    let a = heap.copy_string("print");
    let built: String = ['p', 'r', 'i', 'n', 't'].iter().collect();
    let b = heap.copy_string(&built);
    assert_eq!(a, b);
    assert_eq!(heap.find_interned(&built), Some(a));
    assert_eq!(heap.find_interned("println"), None);
    assert_eq!(heap.len(), 1);
}

// Test: add_all merge semantics.
// Verifies: destination ends with every live source key with the source
// value; destination-only keys survive.
#[test]
fn add_all_merges_inherited_methods() {
    let mut heap = StringHeap::new();
    let init = heap.copy_string("init");
    let speak = heap.copy_string("speak");
    let fly = heap.copy_string("fly");

    let mut superclass: Table<u32> = Table::new();
    superclass.set(init, 1);
    superclass.set(speak, 2);
    let mut subclass: Table<u32> = Table::new();
    subclass.set(speak, 20);
    subclass.set(fly, 30);

    superclass.add_all(&mut subclass);
    assert_eq!(subclass.get(init), Some(1));
    assert_eq!(subclass.get(speak), Some(2));
    assert_eq!(subclass.get(fly), Some(30));
    assert_eq!(subclass.len(), 3);
    assert_eq!(superclass.len(), 2, "source is unchanged");
}

// Test: Debug renders live entries as a map.
#[test]
fn debug_lists_live_entries() {
    let mut heap = StringHeap::new();
    let k = heap.copy_string("k");
    let mut t: Table<i32> = Table::new();
    assert_eq!(format!("{:?}", t), "{}");
    t.set(k, 7);
    assert!(format!("{:?}", t).contains(": 7"));
}
