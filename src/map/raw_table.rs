//! 表核心 - 不加锁的内部实现
//!
//! 按当前模式分派到对应策略，策略放置失败时转入溢出区，
//! 负责重新散列、扩容与模式切换。调用方必须已经持有外层锁。

use std::time::Instant;

use crate::{
    error::HybridError,
    hash::HashStrategy,
    map::{cuckoo, hopscotch, hybrid_map::HybridMapConfig, robin_hood, stash::Stash},
    memory::SlotStorage,
    stats::MigrationSnapshot,
    types::{EntryLocation, HashMode, Key, ProbeMetrics},
};

pub(crate) struct RawTable<K, V, S> {
    storage: SlotStorage<K, V>,
    stash: Stash<K, V>,
    hasher: S,
    mode: HashMode,
    len: usize,
    config: HybridMapConfig,
    // 自上次模式切换以来的统计，驱动切换启发式
    metrics: ProbeMetrics,
    // 生命周期累计，不随模式切换清零
    totals: ProbeMetrics,
}

impl<K: Key, V: Clone, S: HashStrategy<K>> RawTable<K, V, S> {
    pub(crate) fn new(config: HybridMapConfig, hasher: S) -> Self {
        Self {
            storage: SlotStorage::new(config.initial_capacity),
            stash: Stash::new(config.max_stash_size),
            hasher,
            mode: config.initial_mode,
            len: 0,
            config,
            metrics: ProbeMetrics::default(),
            totals: ProbeMetrics::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub(crate) fn mode(&self) -> HashMode {
        self.mode
    }

    pub(crate) fn stash_len(&self) -> usize {
        self.stash.len()
    }

    pub(crate) fn metrics(&self) -> ProbeMetrics {
        self.metrics
    }

    pub(crate) fn totals(&self) -> ProbeMetrics {
        self.totals
    }

    pub(crate) fn config(&self) -> &HybridMapConfig {
        &self.config
    }

    /// 负载因子 = 元素数 / (容量 + 溢出区条目数)
    pub(crate) fn load_factor(&self) -> f64 {
        self.len as f64 / (self.capacity() + self.stash.len()) as f64
    }

    /// 按当前模式在表内查找，找不到再扫描溢出区
    pub(crate) fn locate(&self, key: &K) -> Option<EntryLocation> {
        let in_table = match self.mode {
            HashMode::Cuckoo => cuckoo::find(&self.storage, &self.hasher, key),
            HashMode::Hopscotch => {
                hopscotch::find(&self.storage, &self.hasher, self.config.neighborhood_size, key)
                    .map(EntryLocation::Primary)
            }
            HashMode::RobinHood => {
                robin_hood::find(&self.storage, &self.hasher, self.config.max_probe_distance, key)
                    .map(EntryLocation::Primary)
            }
        };
        in_table.or_else(|| self.stash.find(key).map(EntryLocation::Stash))
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        match self.locate(key)? {
            EntryLocation::Primary(idx) => self.storage.primary[idx].value(),
            EntryLocation::Secondary(idx) => self.storage.secondary[idx].value(),
            EntryLocation::Stash(_) => self.stash.get(key),
        }
    }

    /// 用当前模式的策略放置条目，失败时交还手中的条目
    fn place(&mut self, key: K, value: V, metrics: &mut ProbeMetrics) -> Result<(), (K, V)> {
        let config = &self.config;
        match self.mode {
            HashMode::Cuckoo => cuckoo::insert(
                &mut self.storage,
                &self.hasher,
                config.max_evictions,
                metrics,
                key,
                value,
            ),
            HashMode::Hopscotch => hopscotch::insert(
                &mut self.storage,
                &self.hasher,
                config.neighborhood_size,
                config.max_displacements,
                metrics,
                key,
                value,
            ),
            HashMode::RobinHood => robin_hood::insert(
                &mut self.storage,
                &self.hasher,
                config.max_probe_distance,
                metrics,
                key,
                value,
            ),
        }
    }

    /// 插入新键
    ///
    /// 已存在的键不会被覆盖。策略放置失败时手中的条目进入溢出区；
    /// 溢出区已满且手中的正是新键时返回 `TableFull`，表保持不变。
    /// 若手中的是被新键挤出的常驻条目，则越过上限放入溢出区，保证不丢数据。
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<(), HybridError> {
        if self.locate(&key).is_some() {
            return Err(HybridError::KeyAlreadyExists {
                key: format!("{key:?}"),
            });
        }

        let mut delta = ProbeMetrics {
            insertions: 1,
            ..ProbeMetrics::default()
        };
        let incoming = self.stash.is_full().then(|| key.clone());
        let placed = self.place(key, value, &mut delta);
        self.metrics.accumulate(&delta);
        self.totals.accumulate(&delta);

        if let Err((key, value)) = placed {
            match self.stash.push(key, value) {
                Ok(()) => {
                    log_debug!(
                        "{} mode could not place entry, moved to stash (len={})",
                        self.mode,
                        self.stash.len()
                    );
                }
                Err((key, value)) => {
                    if incoming.as_ref() == Some(&key) {
                        log_warn!(
                            "insert failed: stash full (capacity={}, size={}, stash={})",
                            self.capacity(),
                            self.len,
                            self.stash.len()
                        );
                        return Err(HybridError::TableFull {
                            capacity: self.capacity(),
                            size: self.len,
                            stash_len: self.stash.len(),
                        });
                    }
                    log_warn!("stash full, keeping displaced entry {:?} beyond the bound", key);
                    self.stash.force_push(key, value);
                }
            }
        }

        self.len += 1;
        Ok(())
    }

    /// 删除键，返回被删除的条目
    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let removed = match self.mode {
            HashMode::Cuckoo => cuckoo::remove(&mut self.storage, &self.hasher, key),
            HashMode::Hopscotch => hopscotch::remove(
                &mut self.storage,
                &self.hasher,
                self.config.neighborhood_size,
                key,
            ),
            HashMode::RobinHood => robin_hood::remove(
                &mut self.storage,
                &self.hasher,
                self.config.max_probe_distance,
                key,
            ),
        }
        .or_else(|| self.stash.remove(key));

        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// 收集全部存活条目，按新容量和新模式重建后逐个重新插入
    ///
    /// 重新插入不检查重复键，不受溢出区上限约束，也不计入切换统计。
    fn rehash(&mut self, capacity: usize, mode: HashMode) -> MigrationSnapshot {
        let start = Instant::now();
        let mut entries = self.storage.drain_live();
        entries.extend(self.stash.drain());

        self.storage.reset(capacity);
        self.mode = mode;

        let mut scratch = ProbeMetrics::default();
        let migrated = entries.len();
        for (key, value) in entries {
            if let Err((key, value)) = self.place(key, value, &mut scratch) {
                self.stash.force_push(key, value);
            }
        }
        self.len = migrated;

        debug_assert!(self.check_invariants().is_ok(), "{:?}", self.check_invariants());

        MigrationSnapshot {
            migrated_items: migrated as u64,
            stashed_items: self.stash.len() as u64,
            duration: start.elapsed(),
        }
    }

    /// 扩容到 `new_capacity` 并重新散列，切换统计保持不变
    pub(crate) fn resize(&mut self, new_capacity: usize) -> Result<MigrationSnapshot, HybridError> {
        let current = self.capacity();
        if new_capacity < current {
            return Err(HybridError::ShrinkNotSupported {
                current,
                requested: new_capacity,
            });
        }

        let snapshot = self.rehash(new_capacity, self.mode);
        log_info!(
            "resized {} -> {} ({} entries, {} in stash, {:?})",
            current,
            new_capacity,
            snapshot.migrated_items,
            snapshot.stashed_items,
            snapshot.duration
        );
        Ok(snapshot)
    }

    /// 切换模式并迁移全部条目，切换统计清零
    ///
    /// 目标模式与当前模式相同时只清零统计，返回 `None`。
    pub(crate) fn set_mode(&mut self, mode: HashMode) -> Option<MigrationSnapshot> {
        self.metrics = ProbeMetrics::default();
        if mode == self.mode {
            return None;
        }

        let from = self.mode;
        let snapshot = self.rehash(self.capacity(), mode);
        log_info!(
            "mode switched {} -> {} ({} entries migrated, {} in stash, {:?})",
            from,
            mode,
            snapshot.migrated_items,
            snapshot.stashed_items,
            snapshot.duration
        );
        Some(snapshot)
    }

    /// 按负载因子和冲突率给出建议模式，条件按顺序互斥
    pub(crate) fn recommended_mode(&self) -> Option<HashMode> {
        let load = self.load_factor();
        let collision_rate = self.metrics.collision_rate();

        if load > self.config.high_load_threshold && self.mode != HashMode::RobinHood {
            Some(HashMode::RobinHood)
        } else if collision_rate > self.config.high_collision_rate
            && self.mode != HashMode::Cuckoo
        {
            Some(HashMode::Cuckoo)
        } else if load < self.config.low_load_threshold && self.mode != HashMode::Hopscotch {
            Some(HashMode::Hopscotch)
        } else {
            None
        }
    }

    /// 满足条件时切换模式，返回新模式与迁移统计
    pub(crate) fn switch_mode_if_needed(&mut self) -> Option<(HashMode, MigrationSnapshot)> {
        let target = self.recommended_mode()?;
        let snapshot = self.set_mode(target)?;
        Some((target, snapshot))
    }

    /// 自动切换是否已攒够样本
    pub(crate) fn auto_switch_due(&self) -> bool {
        self.config.auto_switch && self.metrics.insertions >= self.config.switch_sample_size as u64
    }

    /// 全部存活条目的快照
    pub(crate) fn entries(&self) -> Vec<(K, V)> {
        self.storage
            .live_entries()
            .chain(self.stash.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 清空全部条目，容量与模式不变
    pub(crate) fn clear(&mut self) {
        self.storage.reset(self.capacity());
        self.stash.drain();
        self.len = 0;
        self.metrics = ProbeMetrics::default();
    }

    /// 校验当前模式的结构不变量以及元素计数
    pub(crate) fn check_invariants(&self) -> Result<(), HybridError> {
        match self.mode {
            HashMode::Cuckoo => cuckoo::check(&self.storage, &self.hasher)?,
            HashMode::Hopscotch => {
                hopscotch::check(&self.storage, &self.hasher, self.config.neighborhood_size)?
            }
            HashMode::RobinHood => robin_hood::check(&self.storage, &self.hasher)?,
        }

        if self.mode != HashMode::Cuckoo {
            if let Some(index) = self.storage.secondary.iter().position(|slot| slot.is_occupied()) {
                return Err(HybridError::InvariantViolation {
                    mode: self.mode,
                    index,
                    reason: "副表只在Cuckoo模式下使用".to_string(),
                });
            }
        }

        let counted = self.storage.live_count() + self.stash.len();
        if counted != self.len {
            return Err(HybridError::InvariantViolation {
                mode: self.mode,
                index: 0,
                reason: format!("元素计数 {} 与实际条目数 {} 不一致", self.len, counted),
            });
        }
        Ok(())
    }
}
