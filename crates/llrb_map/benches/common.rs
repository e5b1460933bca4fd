use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use bench::{
    apply_medium_runtime_config, apply_small_runtime_config, default_rng, distinct_keys,
    mix_seed, seed_for_iter,
};
use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use llrb_map::{LlrbMap, OrderedMap};

const SIZES: [usize; 4] = [1_000, 4_000, 16_000, 64_000];
const SEQUENTIAL_SIZES: [usize; 3] = [1_000, 10_000, 100_000];
const OPS_PER_ITER: usize = 200;
const GET_HIT_RATE_PERCENT: u64 = 80;

#[derive(Clone)]
enum ReadOp {
    Get { key: u64 },
    Contains { key: u64 },
}

#[derive(Clone)]
enum UpdateOp {
    Put { key: u64, value: u64 },
    Delete { key: u64 },
}

fn filled<M>(keys: &[u64], seed: u64) -> M
where
    M: OrderedMap<Key = u64, Value = u64>,
{
    let mut init_rng = StdRng::seed_from_u64(seed);
    let mut map = M::new();
    for &k in keys {
        let v: u64 = init_rng.random();
        black_box(map.put(k, v));
    }
    map
}

pub fn bench_read<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let base_seed = seed_base(1, size as u64);
        let keys = distinct_keys(size, base_seed);
        let map = filled::<M>(&keys, base_seed ^ 0x11_22_33_44);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(base_seed, iter));
                    let ops = generate_read_ops(&keys, &mut rng);
                    let start = Instant::now();
                    run_read_ops(&map, &ops);
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

pub fn bench_update<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_small_runtime_config(group);
        let base_seed = seed_base(2, size as u64);
        let keys = distinct_keys(size, base_seed);
        let mut map = filled::<M>(&keys, base_seed ^ 0x55_66_77_88);

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let mut rng = StdRng::seed_from_u64(seed_for_iter(base_seed, iter));
                    let ops = generate_update_ops(size, base_seed, iter, &mut rng);
                    let start = Instant::now();
                    run_update_ops(&mut map, &ops);
                    black_box(map.size());
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

/// Ascending inserts into an empty map, the worst case for an unbalanced BST.
pub fn bench_sequential_put<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SEQUENTIAL_SIZES {
        apply_medium_runtime_config(group);
        let mut rng = default_rng();
        let values: Vec<u64> = (0..size).map(|_| rng.random()).collect();

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let mut map = M::new();
                    let start = Instant::now();
                    for (k, &v) in values.iter().enumerate() {
                        black_box(map.put(k as u64, v));
                    }
                    total += start.elapsed();
                    black_box(map.size());
                }
                total
            })
        });
    }
}

fn generate_read_ops(keys: &[u64], rng: &mut StdRng) -> Vec<ReadOp> {
    let mut ops = Vec::with_capacity(OPS_PER_ITER);
    for _ in 0..OPS_PER_ITER {
        let hit = rng.random_range(0..100) < GET_HIT_RATE_PERCENT;
        let key = if hit {
            keys[rng.random_range(0..keys.len())]
        } else {
            rng.random()
        };
        if rng.random::<u64>() & 1 == 0 {
            ops.push(ReadOp::Get { key });
        } else {
            ops.push(ReadOp::Contains { key });
        }
    }
    ops
}

fn generate_update_ops(size: usize, base_seed: u64, iter: u64, rng: &mut StdRng) -> Vec<UpdateOp> {
    let puts = OPS_PER_ITER / 2;
    let mut inserted = Vec::with_capacity(puts);
    let mut ops = Vec::with_capacity(OPS_PER_ITER);
    for i in 0..OPS_PER_ITER {
        if i % 2 == 0 {
            let id = (size as u64)
                .wrapping_add(iter.wrapping_mul(puts as u64))
                .wrapping_add((i / 2) as u64);
            let key = mix_seed(base_seed ^ id);
            let value: u64 = rng.random();
            inserted.push(key);
            ops.push(UpdateOp::Put { key, value });
        } else {
            let idx = rng.random_range(0..inserted.len());
            let key = inserted.swap_remove(idx);
            ops.push(UpdateOp::Delete { key });
        }
    }
    debug_assert!(inserted.is_empty());
    ops
}

fn run_read_ops<M>(map: &M, ops: &[ReadOp])
where
    M: OrderedMap<Key = u64, Value = u64>,
{
    for op in ops {
        match *op {
            ReadOp::Get { key } => {
                black_box(map.get(&key).copied());
            }
            ReadOp::Contains { key } => {
                black_box(map.contains(&key));
            }
        }
    }
}

fn run_update_ops<M>(map: &mut M, ops: &[UpdateOp])
where
    M: OrderedMap<Key = u64, Value = u64>,
{
    for op in ops {
        match *op {
            UpdateOp::Put { key, value } => {
                black_box(map.put(key, value));
            }
            UpdateOp::Delete { key } => {
                black_box(map.delete(&key));
            }
        }
    }
}

fn seed_base(workload_id: u64, size: u64) -> u64 {
    mix_seed(0x0DDB_A11A_2026_0000_u64 ^ (workload_id << 48) ^ size)
}

pub fn bench_all_read<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_read::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_read::<LlrbMap<u64, u64>, _>(group, "llrb");
}

pub fn bench_all_update<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_update::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_update::<LlrbMap<u64, u64>, _>(group, "llrb");
}

pub fn bench_all_sequential_put<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_sequential_put::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_sequential_put::<LlrbMap<u64, u64>, _>(group, "llrb");
}
