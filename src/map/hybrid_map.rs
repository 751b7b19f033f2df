//! 混合哈希表 - 单把读写锁包裹的公共接口

use std::{fmt, sync::Arc, time::Instant};

use parking_lot::RwLock;

use crate::{
    error::HybridError,
    hash::{DoubleHashStrategy, HashAlgorithm, HashStrategy},
    map::{
        hopscotch::MAX_NEIGHBORHOOD, raw_table::RawTable, DEFAULT_LOOP_BOUND,
        DEFAULT_MAX_STASH_SIZE, DEFAULT_NEIGHBORHOOD_SIZE,
    },
    stats::{
        migration::{MigrationAccumulatedSnapshot, MigrationSnapshot},
        operation::OperationStatsSnapshot,
        recorder::{GlobalStatsRecorder, StatsRecorder},
    },
    types::{EntryLocation, HashMode, Key, OperationType, ProbeMetrics, Value},
};

/// 哈希表配置
#[derive(Clone, Debug, PartialEq)]
pub struct HybridMapConfig {
    // 每张表的槽位数
    pub initial_capacity: usize,
    // 仅用于统计报告，不会自动触发扩容
    pub max_load_factor: f64,
    pub initial_mode: HashMode,
    pub max_evictions: usize,
    pub neighborhood_size: usize,
    pub max_displacements: usize,
    pub max_probe_distance: usize,
    pub max_stash_size: usize,
    pub high_load_threshold: f64,
    pub high_collision_rate: f64,
    pub low_load_threshold: f64,
    /// 插入后自动评估模式切换
    pub auto_switch: bool,
    /// 自动评估前需要的插入次数
    pub switch_sample_size: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for HybridMapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_load_factor: 0.75,
            initial_mode: HashMode::Hopscotch,
            max_evictions: DEFAULT_LOOP_BOUND,
            neighborhood_size: DEFAULT_NEIGHBORHOOD_SIZE,
            max_displacements: DEFAULT_LOOP_BOUND,
            max_probe_distance: DEFAULT_LOOP_BOUND,
            max_stash_size: DEFAULT_MAX_STASH_SIZE,
            high_load_threshold: 0.8,
            high_collision_rate: 0.5,
            low_load_threshold: 0.5,
            auto_switch: false,
            switch_sample_size: 1024,
            hash_algorithm: HashAlgorithm::AHash,
        }
    }
}

impl HybridMapConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), HybridError> {
        let invalid = |reason: &str| {
            Err(HybridError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.initial_capacity == 0 {
            return invalid("initial_capacity 必须大于 0");
        }
        if !(self.max_load_factor > 0.0) {
            return invalid("max_load_factor 必须大于 0");
        }
        if self.neighborhood_size == 0 || self.neighborhood_size > MAX_NEIGHBORHOOD {
            return invalid("neighborhood_size 必须在 1..=32 之间");
        }
        if self.max_evictions == 0 || self.max_displacements == 0 || self.max_probe_distance == 0 {
            return invalid("踢出、位移与探测上限必须大于 0");
        }
        if !(self.high_load_threshold > 0.0
            && self.high_collision_rate > 0.0
            && self.low_load_threshold > 0.0)
        {
            return invalid("模式切换阈值必须大于 0");
        }
        if self.low_load_threshold > self.high_load_threshold {
            return invalid("low_load_threshold 不能大于 high_load_threshold");
        }
        if self.auto_switch && self.switch_sample_size == 0 {
            return invalid("开启自动切换时 switch_sample_size 必须大于 0");
        }
        Ok(())
    }
}

/// 哈希表统计信息
#[derive(Debug, Clone)]
pub struct HybridMapStats {
    pub size: usize,
    pub capacity: usize,
    pub stash_len: usize,
    pub load_factor: f64,
    pub max_load_factor: f64,
    pub mode: HashMode,
    pub collision_rate: f64,
    /// 自上次模式切换以来
    pub metrics: ProbeMetrics,
    /// 生命周期累计
    pub totals: ProbeMetrics,
    pub operations: OperationStatsSnapshot,
    pub migrations: MigrationAccumulatedSnapshot,
}

/// 混合哈希表
///
/// 所有公共操作都经过同一把读写锁：查询类操作共享锁，修改类操作独占锁。
/// 内部的重新散列在已持有的独占锁内完成，不会重复加锁。
pub struct HybridMap<K: Key, V: Value, S = DoubleHashStrategy> {
    inner: RwLock<RawTable<K, V, S>>,
    stats_recorder: Arc<dyn StatsRecorder>,
}

impl<K: Key, V: Value> HybridMap<K, V> {
    /// 按初始容量和最大负载因子创建，容量至少为 1
    pub fn new(capacity: usize, max_load_factor: f64) -> Self {
        let config = HybridMapConfig {
            initial_capacity: capacity.max(1),
            max_load_factor,
            ..HybridMapConfig::default()
        };
        let hasher = DoubleHashStrategy::new(config.hash_algorithm);
        Self::from_parts(config, hasher)
    }

    /// 按配置创建
    pub fn with_config(config: HybridMapConfig) -> Result<Self, HybridError> {
        config.validate()?;
        let hasher = DoubleHashStrategy::new(config.hash_algorithm);
        Ok(Self::from_parts(config, hasher))
    }
}

impl<K: Key, V: Value> Default for HybridMap<K, V> {
    fn default() -> Self {
        let config = crate::map::DEFAULT_CONFIG.clone();
        let hasher = DoubleHashStrategy::new(config.hash_algorithm);
        Self::from_parts(config, hasher)
    }
}

impl<K: Key, V: Value, S: HashStrategy<K>> HybridMap<K, V, S> {
    /// 按配置和自定义哈希策略创建
    pub fn with_config_and_hasher(config: HybridMapConfig, hasher: S) -> Result<Self, HybridError> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: HybridMapConfig, hasher: S) -> Self {
        Self {
            inner: RwLock::new(RawTable::new(config, hasher)),
            stats_recorder: Arc::new(GlobalStatsRecorder::new()),
        }
    }

    /// 替换统计记录器
    pub fn with_stats_recorder(mut self, recorder: Arc<dyn StatsRecorder>) -> Self {
        self.stats_recorder = recorder;
        self
    }

    fn record(&self, op_type: OperationType, start: Instant, success: bool) {
        self.stats_recorder.record_operation(op_type, start.elapsed(), success);
    }

    fn record_migration(
        &self,
        op_type: OperationType,
        start: Instant,
        snapshot: MigrationSnapshot,
    ) {
        self.stats_recorder.record_migration(snapshot);
        self.record(op_type, start, true);
    }

    /// 插入新键，键已存在或无处放置时返回 false
    pub fn insert(&self, key: K, value: V) -> bool {
        self.try_insert(key, value).is_ok()
    }

    /// 插入新键并返回失败原因
    ///
    /// 键已存在时返回 `KeyAlreadyExists`，原值保持不变；
    /// 表和溢出区都放不下时返回 `TableFull`，调用方应扩容后重试。
    pub fn try_insert(&self, key: K, value: V) -> Result<(), HybridError> {
        let start = Instant::now();
        let mut table = self.inner.write();
        let result = table.insert(key, value);
        self.record(OperationType::Insert, start, result.is_ok());

        if result.is_ok() && table.auto_switch_due() {
            let switch_start = Instant::now();
            if let Some((mode, snapshot)) = table.switch_mode_if_needed() {
                log_info!("automatic mode switch to {} after {} entries", mode, table.len());
                self.record_migration(OperationType::ModeSwitch, switch_start, snapshot);
            }
        }
        result
    }

    /// 删除键，键不存在时返回 false
    pub fn remove(&self, key: &K) -> bool {
        let start = Instant::now();
        let removed = self.inner.write().remove(key).is_some();
        self.record(OperationType::Remove, start, removed);
        removed
    }

    /// 查询键对应的值
    pub fn search(&self, key: &K) -> Option<V> {
        let start = Instant::now();
        let value = self.inner.read().get(key).cloned();
        self.record(OperationType::Search, start, value.is_some());
        value
    }

    /// 查询键对应的值，同 `search`
    pub fn get(&self, key: &K) -> Option<V> {
        self.search(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().locate(key).is_some()
    }

    /// 键所在位置 (主表、副表或溢出区)
    pub fn locate(&self, key: &K) -> Option<EntryLocation> {
        self.inner.read().locate(key)
    }

    /// 当前元素数
    pub fn size(&self) -> usize {
        self.inner.read().len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn stash_len(&self) -> usize {
        self.inner.read().stash_len()
    }

    pub fn mode(&self) -> HashMode {
        self.inner.read().mode()
    }

    /// 负载因子，分母包含溢出区条目数
    pub fn load_factor(&self) -> f64 {
        self.inner.read().load_factor()
    }

    /// 自上次模式切换以来的探测统计
    pub fn metrics(&self) -> ProbeMetrics {
        self.inner.read().metrics()
    }

    pub fn collision_rate(&self) -> f64 {
        self.metrics().collision_rate()
    }

    /// 扩容并重新散列全部条目，不支持缩容
    pub fn resize(&self, new_capacity: usize) -> Result<(), HybridError> {
        let start = Instant::now();
        let result = self.inner.write().resize(new_capacity);
        match result {
            Ok(snapshot) => {
                self.record_migration(OperationType::Resize, start, snapshot);
                Ok(())
            }
            Err(e) => {
                log_warn!("resize rejected: {}", e);
                self.record(OperationType::Resize, start, false);
                Err(e)
            }
        }
    }

    /// 切换冲突解决模式，全部条目迁移到新模式下
    pub fn set_mode(&self, mode: HashMode) {
        let start = Instant::now();
        let migrated = self.inner.write().set_mode(mode);
        match migrated {
            Some(snapshot) => self.record_migration(OperationType::ModeSwitch, start, snapshot),
            None => self.record(OperationType::ModeSwitch, start, true),
        }
    }

    /// 按负载因子和冲突率立即评估，发生切换时返回新模式
    pub fn switch_mode_if_needed(&self) -> Option<HashMode> {
        let start = Instant::now();
        let switched = self.inner.write().switch_mode_if_needed();
        switched.map(|(mode, snapshot)| {
            self.record_migration(OperationType::ModeSwitch, start, snapshot);
            mode
        })
    }

    /// 全部存活条目的快照，顺序不保证
    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner.read().entries()
    }

    /// 清空全部条目，容量与模式保持不变
    pub fn clear(&self) {
        let start = Instant::now();
        self.inner.write().clear();
        self.record(OperationType::Clear, start, true);
    }

    /// 校验当前模式的结构不变量
    pub fn check_invariants(&self) -> Result<(), HybridError> {
        let result = self.inner.read().check_invariants();
        if let Err(ref e) = result {
            log_error!("invariant violation: {}", e);
        }
        result
    }

    /// 获取统计信息
    pub fn stats(&self) -> HybridMapStats {
        let table = self.inner.read();
        let metrics = table.metrics();
        HybridMapStats {
            size: table.len(),
            capacity: table.capacity(),
            stash_len: table.stash_len(),
            load_factor: table.load_factor(),
            max_load_factor: table.config().max_load_factor,
            mode: table.mode(),
            collision_rate: metrics.collision_rate(),
            metrics,
            totals: table.totals(),
            operations: self.stats_recorder.operation_stats_snapshot(),
            migrations: self.stats_recorder.migration_stats_snapshot(),
        }
    }

    /// 导出Prometheus格式指标
    pub fn export_prometheus(&self) -> String {
        let mut output = self.stats_recorder.export_prometheus();
        let table = self.inner.read();

        output.push_str("# HELP hybrid_size Live entries\n");
        output.push_str("# TYPE hybrid_size gauge\n");
        output.push_str(&format!("hybrid_size {}\n", table.len()));

        output.push_str("# HELP hybrid_capacity Slots per table\n");
        output.push_str("# TYPE hybrid_capacity gauge\n");
        output.push_str(&format!("hybrid_capacity {}\n", table.capacity()));

        output.push_str("# HELP hybrid_stash_len Entries in the overflow stash\n");
        output.push_str("# TYPE hybrid_stash_len gauge\n");
        output.push_str(&format!("hybrid_stash_len {}\n", table.stash_len()));

        output.push_str("# HELP hybrid_load_factor size / (capacity + stash_len)\n");
        output.push_str("# TYPE hybrid_load_factor gauge\n");
        output.push_str(&format!("hybrid_load_factor {:.4}\n", table.load_factor()));

        output.push_str("# HELP hybrid_mode Active collision resolution mode\n");
        output.push_str("# TYPE hybrid_mode gauge\n");
        for mode in HashMode::ALL {
            let active = u8::from(mode == table.mode());
            output.push_str(&format!("hybrid_mode{{mode=\"{}\"}} {}\n", mode, active));
        }

        let totals = table.totals();
        output.push_str("# HELP hybrid_probe_collisions_total Collisions over the table lifetime\n");
        output.push_str("# TYPE hybrid_probe_collisions_total counter\n");
        output.push_str(&format!("hybrid_probe_collisions_total {}\n", totals.collisions));

        output.push_str("# HELP hybrid_probe_evictions_total Cuckoo evictions over the table lifetime\n");
        output.push_str("# TYPE hybrid_probe_evictions_total counter\n");
        output.push_str(&format!("hybrid_probe_evictions_total {}\n", totals.evictions));

        output
    }
}

impl<K: Key, V: Value, S: HashStrategy<K>> fmt::Debug for HybridMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.read();
        f.debug_struct("HybridMap")
            .field("mode", &table.mode())
            .field("size", &table.len())
            .field("capacity", &table.capacity())
            .field("stash_len", &table.stash_len())
            .field("load_factor", &table.load_factor())
            .finish()
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::FnHashStrategy;

    #[test]
    fn test_config_validation() {
        assert!(HybridMapConfig::default().validate().is_ok());

        let cases = [
            HybridMapConfig {
                initial_capacity: 0,
                ..Default::default()
            },
            HybridMapConfig {
                max_load_factor: 0.0,
                ..Default::default()
            },
            HybridMapConfig {
                neighborhood_size: 0,
                ..Default::default()
            },
            HybridMapConfig {
                neighborhood_size: 33,
                ..Default::default()
            },
            HybridMapConfig {
                max_evictions: 0,
                ..Default::default()
            },
            HybridMapConfig {
                max_probe_distance: 0,
                ..Default::default()
            },
            HybridMapConfig {
                high_collision_rate: f64::NAN,
                ..Default::default()
            },
            HybridMapConfig {
                low_load_threshold: 0.9,
                ..Default::default()
            },
            HybridMapConfig {
                auto_switch: true,
                switch_sample_size: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            let err = HybridMap::<u64, u64>::with_config(config).unwrap_err();
            assert!(matches!(err, HybridError::InvalidConfig { .. }));
        }
    }

    #[test]
    fn test_new_clamps_capacity() {
        let map: HybridMap<u64, u64> = HybridMap::new(0, 0.9);
        assert_eq!(map.capacity(), 1);
        assert_eq!(map.mode(), HashMode::Hopscotch);
        assert!(map.insert(1, 1));
        assert!(map.insert(2, 2));
        assert_eq!(map.search(&2), Some(2));
        assert_eq!(map.stats().max_load_factor, 0.9);
    }

    #[test]
    fn test_operations_are_recorded() {
        let map: HybridMap<String, u32> = HybridMap::default();
        assert!(map.insert("a".to_string(), 1));
        assert!(!map.insert("a".to_string(), 2));
        assert_eq!(map.search(&"a".to_string()), Some(1));
        assert!(map.remove(&"a".to_string()));
        assert!(!map.remove(&"a".to_string()));
        map.set_mode(HashMode::Cuckoo);
        map.resize(64).unwrap();

        let stats = map.stats();
        assert_eq!(stats.operations.insert_count, 2);
        assert_eq!(stats.operations.search_count, 1);
        assert_eq!(stats.operations.remove_count, 2);
        assert_eq!(stats.operations.failure_count, 2);
        assert_eq!(stats.operations.mode_switch_count, 1);
        assert_eq!(stats.operations.resize_count, 1);
        assert_eq!(stats.migrations.count, 2);
        assert_eq!(stats.capacity, 64);
        assert_eq!(stats.mode, HashMode::Cuckoo);

        let output = map.export_prometheus();
        assert!(output.contains("hybrid_operation_insert_count 2\n"));
        assert!(output.contains("hybrid_mode{mode=\"cuckoo\"} 1\n"));
        assert!(output.contains("hybrid_capacity 64\n"));
    }

    #[test]
    fn test_auto_switch_after_sample() {
        let config = HybridMapConfig {
            initial_capacity: 64,
            initial_mode: HashMode::Cuckoo,
            auto_switch: true,
            switch_sample_size: 8,
            ..HybridMapConfig::default()
        };
        let map: HybridMap<u64, u64> = HybridMap::with_config(config).unwrap();
        for k in 0..7u64 {
            assert!(map.insert(k, k));
        }
        assert_eq!(map.mode(), HashMode::Cuckoo);

        // 第 8 次插入后负载很低，切换到Hopscotch
        assert!(map.insert(7, 7));
        assert_eq!(map.mode(), HashMode::Hopscotch);
        assert_eq!(map.len(), 8);
        assert_eq!(map.metrics(), ProbeMetrics::default());
        for k in 0..8u64 {
            assert_eq!(map.search(&k), Some(k));
        }
    }

    #[test]
    fn test_custom_hasher_and_locate() {
        let hasher = FnHashStrategy::new(|k: &u64| *k, |k: &u64| *k + 1);
        let config = HybridMapConfig {
            initial_capacity: 8,
            initial_mode: HashMode::Cuckoo,
            ..HybridMapConfig::default()
        };
        let map = HybridMap::with_config_and_hasher(config, hasher).unwrap();
        assert!(map.insert(3u64, "x"));
        assert!(map.insert(11u64, "y"));
        assert_eq!(map.locate(&3), Some(EntryLocation::Primary(3)));
        assert_eq!(map.locate(&11), Some(EntryLocation::Secondary(4)));
        assert!(map.contains_key(&11));
        assert!(!map.contains_key(&4));
        assert!(map.check_invariants().is_ok());
    }

    #[test]
    fn test_debug_output() {
        let map: HybridMap<u64, u64> = HybridMap::new(16, 0.75);
        map.insert(1, 1);
        let debug = format!("{map:?}");
        assert!(debug.contains("HybridMap"));
        assert!(debug.contains("size: 1"));
        assert!(debug.contains("Hopscotch"));
    }
}
