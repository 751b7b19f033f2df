//! Cuckoo策略 - 两张表、两个哈希函数、有界踢出链

use crate::{
    error::HybridError,
    hash::{calculate_bucket, HashStrategy},
    memory::SlotStorage,
    types::{EntryLocation, HashMode, Key, ProbeMetrics},
};

#[inline]
fn primary_index<K, S: HashStrategy<K>>(hasher: &S, key: &K, capacity: usize) -> usize {
    calculate_bucket(hasher.primary_hash(key), capacity)
}

#[inline]
fn secondary_index<K, S: HashStrategy<K>>(hasher: &S, key: &K, capacity: usize) -> usize {
    calculate_bucket(hasher.secondary_hash(key), capacity)
}

/// 插入条目
///
/// 先尝试两个候选槽位，都被占用时开始踢出链：新条目换入主表槽位，
/// 被踢出者转向副表，依次交替。踢出次数达到 `max_evictions` 时
/// 返回当前手中的条目，由调用方放入溢出区。
pub(crate) fn insert<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    max_evictions: usize,
    metrics: &mut ProbeMetrics,
    key: K,
    value: V,
) -> Result<(), (K, V)> {
    let capacity = storage.capacity();

    let h1 = primary_index(hasher, &key, capacity);
    metrics.probes += 1;
    if storage.primary[h1].is_free() {
        storage.primary[h1].put(key, value);
        return Ok(());
    }

    let h2 = secondary_index(hasher, &key, capacity);
    metrics.probes += 1;
    if storage.secondary[h2].is_free() {
        storage.secondary[h2].put(key, value);
        return Ok(());
    }

    metrics.collisions += 1;
    let mut current = (key, value);
    let mut evictions = 0;

    while evictions < max_evictions {
        let h1 = primary_index(hasher, &current.0, capacity);
        metrics.probes += 1;
        match storage.primary[h1].put(current.0, current.1) {
            None => return Ok(()),
            Some(evicted) => current = evicted,
        }
        evictions += 1;
        metrics.evictions += 1;
        if evictions >= max_evictions {
            break;
        }

        let h2 = secondary_index(hasher, &current.0, capacity);
        metrics.probes += 1;
        match storage.secondary[h2].put(current.0, current.1) {
            None => return Ok(()),
            Some(evicted) => current = evicted,
        }
        evictions += 1;
        metrics.evictions += 1;
        metrics.collisions += 1;
    }

    log_debug!("cuckoo eviction chain exhausted after {} evictions", evictions);
    Err(current)
}

/// 查找键所在槽位，只检查两个固定候选位置
pub(crate) fn find<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
    key: &K,
) -> Option<EntryLocation> {
    let capacity = storage.capacity();
    let h1 = primary_index(hasher, key, capacity);
    if storage.primary[h1].holds(key) {
        return Some(EntryLocation::Primary(h1));
    }
    let h2 = secondary_index(hasher, key, capacity);
    if storage.secondary[h2].holds(key) {
        return Some(EntryLocation::Secondary(h2));
    }
    None
}

/// 删除键，槽位留下墓碑
pub(crate) fn remove<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    key: &K,
) -> Option<(K, V)> {
    match find(storage, hasher, key)? {
        EntryLocation::Primary(idx) => storage.primary[idx].bury(),
        EntryLocation::Secondary(idx) => storage.secondary[idx].bury(),
        EntryLocation::Stash(_) => None,
    }
}

/// 校验双位置不变量：表内每个键都位于其两个候选槽位之一
pub(crate) fn check<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
) -> Result<(), HybridError> {
    let capacity = storage.capacity();
    let violation = |index: usize, reason: String| HybridError::InvariantViolation {
        mode: HashMode::Cuckoo,
        index,
        reason,
    };

    for (idx, slot) in storage.primary.iter().enumerate() {
        if let Some(key) = slot.key() {
            let expected = primary_index(hasher, key, capacity);
            if expected != idx {
                return Err(violation(idx, format!("{key:?} 应位于主表槽位 {expected}")));
            }
            let h2 = secondary_index(hasher, key, capacity);
            if storage.secondary[h2].holds(key) {
                return Err(violation(idx, format!("{key:?} 同时出现在两张表中")));
            }
        }
    }
    for (idx, slot) in storage.secondary.iter().enumerate() {
        if let Some(key) = slot.key() {
            let expected = secondary_index(hasher, key, capacity);
            if expected != idx {
                return Err(violation(idx, format!("{key:?} 应位于副表槽位 {expected}")));
            }
        }
    }
    Ok(())
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{DoubleHashStrategy, FnHashStrategy};
    use std::collections::HashMap;

    /// 按表指定每个键的 (主哈希, 副哈希)
    fn table_hasher(
        table: HashMap<u64, (u64, u64)>,
    ) -> FnHashStrategy<impl Fn(&u64) -> u64, impl Fn(&u64) -> u64> {
        let primary = table.clone();
        FnHashStrategy::new(move |k: &u64| primary[k].0, move |k: &u64| table[k].1)
    }

    #[test]
    fn test_direct_insert_uses_secondary_when_primary_taken() {
        let hasher = table_hasher(HashMap::from([(1, (0, 1)), (2, (0, 2))]));
        let mut storage = SlotStorage::new(4);
        let mut metrics = ProbeMetrics::default();

        insert(&mut storage, &hasher, 500, &mut metrics, 1u64, "x").unwrap();
        insert(&mut storage, &hasher, 500, &mut metrics, 2u64, "y").unwrap();

        assert_eq!(find(&storage, &hasher, &1), Some(EntryLocation::Primary(0)));
        assert_eq!(find(&storage, &hasher, &2), Some(EntryLocation::Secondary(2)));
        assert_eq!(metrics.evictions, 0);
        assert!(check(&storage, &hasher).is_ok());
    }

    #[test]
    fn test_eviction_chain_relocates_resident() {
        let hasher = table_hasher(HashMap::from([(1, (0, 1)), (2, (0, 2)), (3, (0, 2))]));
        let mut storage = SlotStorage::new(4);
        let mut metrics = ProbeMetrics::default();

        for (k, v) in [(1u64, "x"), (2, "y"), (3, "z")] {
            insert(&mut storage, &hasher, 500, &mut metrics, k, v).unwrap();
        }

        // 链长为 2: 3 换入主表槽位 0，1 被踢到副表槽位 1
        assert_eq!(find(&storage, &hasher, &3), Some(EntryLocation::Primary(0)));
        assert_eq!(find(&storage, &hasher, &1), Some(EntryLocation::Secondary(1)));
        assert_eq!(find(&storage, &hasher, &2), Some(EntryLocation::Secondary(2)));
        assert_eq!(metrics.evictions, 1);
        assert!(check(&storage, &hasher).is_ok());
    }

    #[test]
    fn test_cycle_hands_back_an_entry() {
        // 三个键共享全部候选位置，必然成环
        let hasher = table_hasher(HashMap::from([(1, (0, 0)), (2, (0, 0)), (3, (0, 0))]));
        let mut storage = SlotStorage::new(2);
        let mut metrics = ProbeMetrics::default();

        insert(&mut storage, &hasher, 10, &mut metrics, 1u64, 1).unwrap();
        insert(&mut storage, &hasher, 10, &mut metrics, 2u64, 2).unwrap();
        let (overflow_key, _) =
            insert(&mut storage, &hasher, 10, &mut metrics, 3u64, 3).unwrap_err();

        assert_eq!(metrics.evictions, 10);
        assert_eq!(storage.live_count(), 2);
        // 交还的条目不在表中，另外两个仍可找到
        assert!(find(&storage, &hasher, &overflow_key).is_none());
        for k in [1u64, 2, 3].into_iter().filter(|k| *k != overflow_key) {
            assert!(find(&storage, &hasher, &k).is_some());
        }
    }

    #[test]
    fn test_remove_leaves_tombstone_that_is_reused() {
        let hasher = table_hasher(HashMap::from([(1, (3, 1)), (2, (3, 2))]));
        let mut storage = SlotStorage::new(4);
        let mut metrics = ProbeMetrics::default();

        insert(&mut storage, &hasher, 500, &mut metrics, 1u64, "a").unwrap();
        assert_eq!(remove(&mut storage, &hasher, &1), Some((1, "a")));
        assert!(storage.primary[3].is_tombstone());
        assert_eq!(remove(&mut storage, &hasher, &1), None);

        insert(&mut storage, &hasher, 500, &mut metrics, 2u64, "b").unwrap();
        assert_eq!(find(&storage, &hasher, &2), Some(EntryLocation::Primary(3)));
    }

    #[test]
    fn test_many_keys_keep_bi_location() {
        let hasher = DoubleHashStrategy::default();
        let mut storage = SlotStorage::new(1024);
        let mut metrics = ProbeMetrics::default();
        let mut overflow = 0;
        for k in 0..800u64 {
            if insert(&mut storage, &hasher, 500, &mut metrics, k, k).is_err() {
                overflow += 1;
            }
        }
        assert_eq!(storage.live_count() + overflow, 800);
        assert!(check(&storage, &hasher).is_ok());
    }
}
