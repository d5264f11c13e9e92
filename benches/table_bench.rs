use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use intern_table::{StrHandle, StringHeap, Table};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn interned(seed: u64, n: usize) -> (StringHeap, Vec<StrHandle>) {
    let mut heap = StringHeap::new();
    let handles = lcg(seed).take(n).map(|x| heap.copy_string(&key(x))).collect();
    (heap, handles)
}

fn bench_set_fresh_100k(c: &mut Criterion) {
    let (_heap, handles) = interned(1, 100_000);
    c.bench_function("table::set_fresh_100k", |b| {
        b.iter_batched(
            Table::<u64>::new,
            |mut t| {
                for (i, &h) in handles.iter().enumerate() {
                    t.set(h, i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    let (_heap, handles) = interned(2, 100_000);
    let mut t = Table::new();
    for (i, &h) in handles.iter().enumerate() {
        t.set(h, i as u64);
    }
    c.bench_function("table::get_hit_10k_of_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &h in handles.iter().step_by(10) {
                sum = sum.wrapping_add(t.get(h).unwrap_or(0));
            }
            black_box(sum)
        })
    });
}

fn bench_delete_reinsert_10k(c: &mut Criterion) {
    let (_heap, handles) = interned(3, 20_000);
    c.bench_function("table::delete_reinsert_10k", |b| {
        b.iter_batched(
            || {
                let mut t = Table::new();
                for (i, &h) in handles.iter().enumerate() {
                    t.set(h, i as u64);
                }
                t
            },
            |mut t| {
                for &h in handles.iter().take(10_000) {
                    t.delete(h);
                }
                for (i, &h) in handles.iter().take(10_000).enumerate() {
                    t.set(h, i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_intern_hit_and_miss(c: &mut Criterion) {
    let strings: Vec<String> = lcg(4).take(10_000).map(key).collect();
    c.bench_function("heap::copy_string_10k_twice", |b| {
        b.iter_batched(
            StringHeap::new,
            |mut heap| {
                for s in &strings {
                    black_box(heap.copy_string(s));
                }
                for s in &strings {
                    black_box(heap.copy_string(s));
                }
                heap
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_table;
    config = bench_config();
    targets = bench_set_fresh_100k, bench_get_hit_10k, bench_delete_reinsert_10k
}
criterion_group! {
    name = benches_intern;
    config = bench_config();
    targets = bench_intern_hit_and_miss
}
criterion_main!(benches_table, benches_intern);
