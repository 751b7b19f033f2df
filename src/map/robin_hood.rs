//! Robin Hood策略 - 单表线性探测、劫富济贫插入、后移删除
//!
//! 每个占用槽位的 `probe_distances[idx]` 等于 `(idx - ideal) mod capacity`。
//! 探测上限取 `min(max_probe_distance, capacity)`，保证距离不会绕表一圈。

use crate::{
    error::HybridError,
    hash::{calculate_bucket, HashStrategy},
    memory::{Slot, SlotStorage},
    types::{HashMode, Key, ProbeMetrics},
};

#[inline]
fn ideal_bucket<K, S: HashStrategy<K>>(hasher: &S, key: &K, capacity: usize) -> usize {
    calculate_bucket(hasher.primary_hash(key), capacity)
}

/// 插入条目
///
/// 到达距离大于常驻者距离时交换，被换出的条目带着自己的距离继续向后探测。
/// 整次插入共用一个步数上限，交换不会重置；上限耗尽或手中条目的距离
/// 达到上限时返回手中的条目。
pub(crate) fn insert<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    max_probe_distance: usize,
    metrics: &mut ProbeMetrics,
    key: K,
    value: V,
) -> Result<(), (K, V)> {
    let capacity = storage.capacity();
    let limit = max_probe_distance.min(capacity);
    let mut idx = ideal_bucket(hasher, &key, capacity);
    let mut dist = 0;
    let mut current = (key, value);

    for _ in 0..limit {
        if dist >= limit {
            break;
        }
        metrics.probes += 1;
        if storage.primary[idx].is_free() {
            storage.primary[idx].put(current.0, current.1);
            storage.probe_distances[idx] = dist;
            return Ok(());
        }

        let resident_dist = storage.probe_distances[idx];
        if dist > resident_dist {
            if let Some(evicted) = storage.primary[idx].put(current.0, current.1) {
                current = evicted;
            } else {
                storage.probe_distances[idx] = dist;
                return Ok(());
            }
            storage.probe_distances[idx] = dist;
            dist = resident_dist;
        } else {
            metrics.collisions += 1;
        }

        dist += 1;
        idx = (idx + 1) % capacity;
    }

    log_debug!("robin hood probe bound {} exhausted", limit);
    Err(current)
}

/// 查找键所在槽位，遇到空槽位即停止，跳过墓碑
pub(crate) fn find<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
    max_probe_distance: usize,
    key: &K,
) -> Option<usize> {
    let capacity = storage.capacity();
    let mut idx = ideal_bucket(hasher, key, capacity);
    for _ in 0..max_probe_distance.min(capacity) {
        match &storage.primary[idx] {
            Slot::Empty => return None,
            slot if slot.holds(key) => return Some(idx),
            _ => {}
        }
        idx = (idx + 1) % capacity;
    }
    None
}

/// 删除键并执行后移修复
///
/// 后续槽位被占用且距离非零时整体前移一格、距离减一；
/// 遇到空槽位、墓碑或已在理想桶的条目时停止，最后腾出的槽位留下墓碑。
pub(crate) fn remove<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    max_probe_distance: usize,
    key: &K,
) -> Option<(K, V)> {
    let capacity = storage.capacity();
    let mut hole = find(storage, hasher, max_probe_distance, key)?;
    let removed = storage.primary[hole].bury();
    storage.probe_distances[hole] = 0;

    for _ in 1..capacity {
        let next = (hole + 1) % capacity;
        if !storage.primary[next].is_occupied() || storage.probe_distances[next] == 0 {
            break;
        }
        if let Some((k, v)) = storage.primary[next].take() {
            storage.primary[hole].put(k, v);
            storage.probe_distances[hole] = storage.probe_distances[next] - 1;
        }
        storage.primary[next] = Slot::Tombstone;
        storage.probe_distances[next] = 0;
        hole = next;
    }
    removed
}

/// 校验探测距离不变量
pub(crate) fn check<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
) -> Result<(), HybridError> {
    let capacity = storage.capacity();
    for (idx, slot) in storage.primary.iter().enumerate() {
        if let Some(key) = slot.key() {
            let ideal = ideal_bucket(hasher, key, capacity);
            let expected = (idx + capacity - ideal) % capacity;
            let stored = storage.probe_distances[idx];
            if stored != expected {
                return Err(HybridError::InvariantViolation {
                    mode: HashMode::RobinHood,
                    index: idx,
                    reason: format!("{key:?} 记录距离 {stored}，实际距离 {expected}"),
                });
            }
        }
    }
    Ok(())
}
