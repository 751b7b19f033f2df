//! 混合哈希表性能基准测试

use criterion::{
    criterion_group, criterion_main, BenchmarkId, Criterion, PlotConfiguration, Throughput,
};

use hybrid_hashtable::{batch_get, batch_insert, HashMode, HybridMap, HybridMapConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

// 基准测试配置
const SEED: u64 = 42;
const ITEM_COUNTS: [usize; 3] = [10_000, 100_000, 1_000_000];
const KEY_SIZE: usize = 16; // 128位键
const VALUE_SIZE: usize = 8;

type ByteMap = HybridMap<Vec<u8>, Vec<u8>>;

/// 生成随机键值对
fn generate_items(count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..count)
        .map(|_| {
            let mut key = vec![0u8; KEY_SIZE];
            let mut value = vec![0u8; VALUE_SIZE];
            rng.fill(&mut key[..]);
            rng.fill(&mut value[..]);
            (key, value)
        })
        .collect()
}

/// 容量取元素数的两倍，避免基准中出现大量溢出
fn create_map(count: usize, mode: HashMode) -> ByteMap {
    let config = HybridMapConfig {
        initial_capacity: count * 2,
        initial_mode: mode,
        ..HybridMapConfig::default()
    };
    HybridMap::with_config(config).unwrap()
}

fn filled_map(items: &[(Vec<u8>, Vec<u8>)], mode: HashMode) -> ByteMap {
    let map = create_map(items.len(), mode);
    for (key, value) in items {
        map.insert(key.clone(), value.clone());
    }
    map
}

/// 插入操作基准测试
fn bench_insert(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(criterion::AxisScale::Logarithmic);
    let mut group = c.benchmark_group("Insert");
    group.plot_config(plot_config);

    for &count in ITEM_COUNTS.iter() {
        let items = generate_items(count);
        group.throughput(Throughput::Elements(count as u64));

        for mode in HashMode::ALL {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), count), &items, |b, items| {
                b.iter_batched(
                    || create_map(count, mode),
                    |map| {
                        for (key, value) in items {
                            map.insert(key.clone(), value.clone());
                        }
                    },
                    criterion::BatchSize::PerIteration,
                );
            });
        }
    }
    group.finish();
}

/// 查询操作基准测试
fn bench_search(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(criterion::AxisScale::Logarithmic);
    let mut group = c.benchmark_group("Search");
    group.plot_config(plot_config);

    for &count in ITEM_COUNTS.iter() {
        let items = generate_items(count);
        let keys: Vec<Vec<u8>> = items.iter().map(|(k, _)| k.clone()).collect();
        group.throughput(Throughput::Elements(count as u64));

        for mode in HashMode::ALL {
            let map = filled_map(&items, mode);
            group.bench_with_input(BenchmarkId::new(mode.as_str(), count), &keys, |b, keys| {
                b.iter(|| {
                    for key in keys {
                        criterion::black_box(map.search(key));
                    }
                });
            });
        }
    }
    group.finish();
}

/// 删除操作基准测试
fn bench_remove(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(criterion::AxisScale::Logarithmic);
    let mut group = c.benchmark_group("Remove");
    group.plot_config(plot_config);

    for &count in ITEM_COUNTS.iter() {
        let items = generate_items(count);
        let keys: Vec<Vec<u8>> = items.iter().map(|(k, _)| k.clone()).collect();
        group.throughput(Throughput::Elements(count as u64));

        for mode in HashMode::ALL {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), count), &keys, |b, keys| {
                b.iter_batched(
                    || filled_map(&items, mode),
                    |map| {
                        for key in keys {
                            criterion::black_box(map.remove(key));
                        }
                    },
                    criterion::BatchSize::PerIteration,
                );
            });
        }
    }
    group.finish();
}

/// 批量操作基准测试
fn bench_batch_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch Operations");

    for &count in [10_000, 100_000].iter() {
        let items = generate_items(count);
        let keys: Vec<Vec<u8>> = items.iter().map(|(k, _)| k.clone()).collect();

        group.bench_with_input(BenchmarkId::new("Batch Insert", count), &items, |b, items| {
            b.iter_batched(
                || create_map(count, HashMode::Hopscotch),
                |map| {
                    criterion::black_box(batch_insert(&map, items.iter().cloned()));
                },
                criterion::BatchSize::PerIteration,
            );
        });

        let map = filled_map(&items, HashMode::Hopscotch);
        group.bench_with_input(BenchmarkId::new("Batch Get", count), &keys, |b, keys| {
            b.iter(|| {
                let results = batch_get(&map, keys.iter());
                criterion::black_box(results);
            });
        });
    }
    group.finish();
}

/// 并发读性能测试
fn bench_concurrent(c: &mut Criterion) {
    use std::sync::Arc;
    use std::thread;

    let mut group = c.benchmark_group("Concurrent");
    let count = 100_000;
    let items = generate_items(count);
    let keys: Arc<Vec<Vec<u8>>> = Arc::new(items.iter().map(|(k, _)| k.clone()).collect());
    let map = Arc::new(filled_map(&items, HashMode::RobinHood));

    for &thread_count in [1, 4, 8, 16].iter() {
        group.bench_with_input(
            BenchmarkId::new("Concurrent Search", format!("{} threads", thread_count)),
            &thread_count,
            |b, &thread_count| {
                b.iter(|| {
                    let chunk_size = count.div_ceil(thread_count);
                    let handles: Vec<_> = (0..thread_count)
                        .map(|t| {
                            let map = Arc::clone(&map);
                            let keys = Arc::clone(&keys);
                            thread::spawn(move || {
                                let end = ((t + 1) * chunk_size).min(keys.len());
                                for key in &keys[t * chunk_size..end] {
                                    criterion::black_box(map.search(key));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// 迁移性能测试
fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("Migration");

    for &count in [100_000, 1_000_000].iter() {
        let items = generate_items(count);

        // 扩容 2 倍
        group.bench_with_input(BenchmarkId::new("Resize", count), &items, |b, items| {
            b.iter_batched(
                || filled_map(items, HashMode::Hopscotch),
                |map| {
                    let capacity = map.capacity();
                    map.resize(capacity * 2).unwrap();
                },
                criterion::BatchSize::PerIteration,
            );
        });

        // 模式切换
        group.bench_with_input(BenchmarkId::new("Mode Switch", count), &items, |b, items| {
            b.iter_batched(
                || filled_map(items, HashMode::Hopscotch),
                |map| map.set_mode(HashMode::RobinHood),
                criterion::BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .noise_threshold(0.05);
    targets =
        bench_insert,
        bench_search,
        bench_remove,
        bench_batch_operations,
        bench_concurrent,
        bench_migration
);
criterion_main!(benches);
