//! Hopscotch策略 - 单表、邻域位图、有界位移搜索
//!
//! 邻域是包含理想桶的对齐窗口 `[start, start + H)`，`start = ideal / H * H`，
//! 末尾窗口截断到容量。理想桶的位图第 i 位置位 ⇔ 槽位 `start + i`
//! 存放的条目以该桶为理想桶。

use std::ops::Range;

use crate::{
    error::HybridError,
    hash::{calculate_bucket, HashStrategy},
    memory::SlotStorage,
    types::{HashMode, Key, ProbeMetrics},
};

/// 邻域位图最大宽度
pub const MAX_NEIGHBORHOOD: usize = u32::BITS as usize;

#[inline]
fn ideal_bucket<K, S: HashStrategy<K>>(hasher: &S, key: &K, capacity: usize) -> usize {
    calculate_bucket(hasher.primary_hash(key), capacity)
}

/// 理想桶所在的邻域窗口
#[inline]
pub(crate) fn neighborhood(ideal: usize, size: usize, capacity: usize) -> Range<usize> {
    let start = (ideal / size) * size;
    start..(start + size).min(capacity)
}

#[inline]
fn set_hop_bit(hop_info: &mut [u32], ideal: usize, window_start: usize, index: usize) {
    hop_info[ideal] |= 1u32 << (index - window_start);
}

#[inline]
fn clear_hop_bit(hop_info: &mut [u32], ideal: usize, window_start: usize, index: usize) {
    hop_info[ideal] &= !(1u32 << (index - window_start));
}

fn find_free<K, V>(
    storage: &SlotStorage<K, V>,
    window: Range<usize>,
    metrics: &mut ProbeMetrics,
) -> Option<usize> {
    for idx in window {
        metrics.probes += 1;
        if storage.primary[idx].is_free() {
            return Some(idx);
        }
    }
    None
}

/// 插入条目
///
/// 邻域内有空位时直接放入；否则执行位移搜索后重试一次。
/// 仍无空位时交还条目，由调用方放入溢出区。
pub(crate) fn insert<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    neighborhood_size: usize,
    max_displacements: usize,
    metrics: &mut ProbeMetrics,
    key: K,
    value: V,
) -> Result<(), (K, V)> {
    let capacity = storage.capacity();
    let ideal = ideal_bucket(hasher, &key, capacity);
    let window = neighborhood(ideal, neighborhood_size, capacity);

    if let Some(idx) = find_free(storage, window.clone(), metrics) {
        storage.primary[idx].put(key, value);
        set_hop_bit(&mut storage.hop_info, ideal, window.start, idx);
        return Ok(());
    }

    metrics.collisions += 1;
    metrics.displacements += 1;
    if displace(storage, hasher, neighborhood_size, max_displacements, ideal, &window, metrics) {
        if let Some(idx) = find_free(storage, window.clone(), metrics) {
            storage.primary[idx].put(key, value);
            set_hop_bit(&mut storage.hop_info, ideal, window.start, idx);
            return Ok(());
        }
    }

    log_debug!("hopscotch neighborhood {:?} full, displacement failed", window);
    Err((key, value))
}

/// 位移搜索
///
/// 扫描目标窗口内理想桶之后的槽位 (至多 `max_displacements` 个)，寻找自身邻域
/// 还有空位的条目，把它移到该空位上，同时更新两处位图。腾出目标窗口内的槽位时返回 true。
///
/// 对齐窗口互不重叠，窗口内条目的自身邻域就是目标窗口本身。
/// 目标窗口已满时搜索必然失败，条目最终进入溢出区。
fn displace<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    neighborhood_size: usize,
    max_displacements: usize,
    ideal: usize,
    target: &Range<usize>,
    metrics: &mut ProbeMetrics,
) -> bool {
    let capacity = storage.capacity();
    let end = target.end.min(ideal.saturating_add(max_displacements).saturating_add(1));
    for candidate in ideal + 1..end {
        metrics.probes += 1;
        let Some(key) = storage.primary[candidate].key() else {
            continue;
        };

        let home = ideal_bucket(hasher, key, capacity);
        let home_window = neighborhood(home, neighborhood_size, capacity);
        let free = home_window
            .clone()
            .find(|idx| *idx != candidate && storage.primary[*idx].is_free());
        if let Some(free) = free {
            if let Some((k, v)) = storage.primary[candidate].take() {
                storage.primary[free].put(k, v);
                clear_hop_bit(&mut storage.hop_info, home, home_window.start, candidate);
                set_hop_bit(&mut storage.hop_info, home, home_window.start, free);
                return true;
            }
        }
    }
    false
}

/// 查找键所在槽位，只检查理想桶位图中置位的槽位
pub(crate) fn find<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
    neighborhood_size: usize,
    key: &K,
) -> Option<usize> {
    let capacity = storage.capacity();
    let ideal = ideal_bucket(hasher, key, capacity);
    let window = neighborhood(ideal, neighborhood_size, capacity);
    let bitmap = storage.hop_info[ideal];
    if bitmap == 0 {
        return None;
    }
    window
        .enumerate()
        .filter(|(offset, _)| bitmap & (1u32 << offset) != 0)
        .map(|(_, idx)| idx)
        .find(|idx| storage.primary[*idx].holds(key))
}

/// 删除键，槽位留下墓碑并清除位图对应位
pub(crate) fn remove<K: Key, V, S: HashStrategy<K>>(
    storage: &mut SlotStorage<K, V>,
    hasher: &S,
    neighborhood_size: usize,
    key: &K,
) -> Option<(K, V)> {
    let idx = find(storage, hasher, neighborhood_size, key)?;
    let capacity = storage.capacity();
    let ideal = ideal_bucket(hasher, key, capacity);
    let window = neighborhood(ideal, neighborhood_size, capacity);
    clear_hop_bit(&mut storage.hop_info, ideal, window.start, idx);
    storage.primary[idx].bury()
}

/// 校验邻域局部性与位图一致性
pub(crate) fn check<K: Key, V, S: HashStrategy<K>>(
    storage: &SlotStorage<K, V>,
    hasher: &S,
    neighborhood_size: usize,
) -> Result<(), HybridError> {
    let capacity = storage.capacity();
    let violation = |index: usize, reason: String| HybridError::InvariantViolation {
        mode: HashMode::Hopscotch,
        index,
        reason,
    };

    for (idx, slot) in storage.primary.iter().enumerate() {
        if let Some(key) = slot.key() {
            let ideal = ideal_bucket(hasher, key, capacity);
            let window = neighborhood(ideal, neighborhood_size, capacity);
            if !window.contains(&idx) {
                return Err(violation(idx, format!("{key:?} 不在理想桶 {ideal} 的邻域 {window:?} 内")));
            }
            if storage.hop_info[ideal] & (1u32 << (idx - window.start)) == 0 {
                return Err(violation(idx, format!("理想桶 {ideal} 的位图缺少该槽位")));
            }
        }
    }

    for (bucket, bitmap) in storage.hop_info.iter().enumerate() {
        let window = neighborhood(bucket, neighborhood_size, capacity);
        for (offset, idx) in window.enumerate() {
            if bitmap & (1u32 << offset) == 0 {
                continue;
            }
            let owned = storage.primary[idx]
                .key()
                .map(|key| ideal_bucket(hasher, key, capacity) == bucket)
                .unwrap_or(false);
            if !owned {
                return Err(violation(idx, format!("桶 {bucket} 的位图指向不属于它的槽位")));
            }
        }
    }
    Ok(())
}
