#![cfg(test)]

// Property tests for Table kept inside the crate so the collision variant
// can forge handles with a shared hash.

use crate::object::{hash_string, StrHandle, StringHeap};
use crate::table::{Table, TABLE_MAX_LOAD};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Delete(usize),
    Get(usize),
    FindString(String),
    RemoveWhite(u32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let find_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            2 => idx.clone().prop_map(OpI::Delete),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![find_pool.prop_map(|s: String| s), "[a-z]{0,5}".prop_map(|s| s)]
                .prop_map(OpI::FindString),
            1 => any::<u32>().prop_map(OpI::RemoveWhite),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Runs `ops` against a Table and a std HashMap model. `forge` maps each
// interned handle to the handle actually used as a key.
fn run_scenario(
    pool: &[String],
    ops: Vec<OpI>,
    forge: impl Fn(StrHandle) -> StrHandle,
) -> Result<(), TestCaseError> {
    let mut heap = StringHeap::new();
    let handles: Vec<StrHandle> = pool.iter().map(|s| forge(heap.copy_string(s))).collect();
    let mut sut: Table<i32> = Table::new();
    let mut model: HashMap<StrHandle, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = handles[i];
                let is_new = sut.set(k, v);
                let was_absent = model.insert(k, v).is_none();
                prop_assert_eq!(is_new, was_absent, "set reports new iff key was absent");
            }
            OpI::Delete(i) => {
                let k = handles[i];
                prop_assert_eq!(sut.delete(k), model.remove(&k).is_some());
            }
            OpI::Get(i) => {
                let k = handles[i];
                prop_assert_eq!(sut.get(k), model.get(&k).copied());
            }
            OpI::FindString(s) => {
                // Keys are the forged handles, so compare against their hash.
                let found = handles
                    .iter()
                    .position(|&h| heap.chars(h) == Some(s.as_str()))
                    .map(|i| handles[i]);
                let hash = found.map(|h| h.hash()).unwrap_or_else(|| hash_string(&s));
                let expected = found.filter(|h| model.contains_key(h));
                prop_assert_eq!(sut.find_string(heap.strings(), &s, hash), expected);
            }
            OpI::RemoveWhite(bits) => {
                let marked = |k: StrHandle| {
                    handles
                        .iter()
                        .position(|&h| h == k)
                        .is_some_and(|i| bits & (1 << (i % 32)) != 0)
                };
                let expected = model.keys().filter(|&&k| !marked(k)).count();
                prop_assert_eq!(sut.remove_white(marked), expected);
                model.retain(|&k, _| marked(k));
            }
            OpI::Iterate => {
                let s: BTreeSet<(usize, i32)> = sut
                    .iter()
                    .map(|(k, v)| (handles.iter().position(|&h| h == k).unwrap(), *v))
                    .collect();
                let m: BTreeSet<(usize, i32)> = model
                    .iter()
                    .map(|(k, v)| (handles.iter().position(|h| h == k).unwrap(), *v))
                    .collect();
                prop_assert_eq!(s, m);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.count as f64 <= sut.capacity() as f64 * TABLE_MAX_LOAD);
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` reports a new key iff the model lacked it; overwrites keep len.
// - `get`/`delete` agree with the model, including after tombstones.
// - `find_string` finds exactly the live keys with matching content.
// - `remove_white` removes exactly the unmarked entries.
// - `len` parity and the load-factor bound hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, |h| h)?;
    }
}

// Property: Same invariants under worst-case collisions: every key carries
// hash 0, so every probe walks one chain through tombstones.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, |h| StrHandle::new(h.key, 0))?;
    }
}
