//! Rust混合哈希表库
//! 
//! 一个键值容器，支持在运行时于三种冲突解决方式之间切换：
//! Cuckoo (双表踢出)、Hopscotch (邻域位图)、Robin Hood (劫富济贫线性探测)。
//! 
//! ## 主要特性
//! - 三种模式共享同一组槽位存储，切换模式时迁移全部条目
//! - 有界的踢出链、位移搜索和探测序列，溢出条目进入有界溢出区
//! - 单把读写锁：查询并发执行，修改互斥执行
//! - 操作与迁移统计，支持Prometheus格式导出
//! 
//! ## 快速开始
//! 
//! ```rust
//! use hybrid_hashtable::*;
//! 
//! // 初始容量 1024，最大负载因子 0.75
//! let map: HybridMap<String, String> = HybridMap::new(1024, 0.75);
//! 
//! assert!(map.insert("key1".to_string(), "value1".to_string()));
//! assert_eq!(map.search(&"key1".to_string()), Some("value1".to_string()));
//! 
//! // 切换模式不会丢失数据
//! map.set_mode(HashMode::RobinHood);
//! assert_eq!(map.size(), 1);
//! 
//! assert!(map.remove(&"key1".to_string()));
//! println!("{:?}", map.stats());
//! ```


#![warn(clippy::all)]
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}
// 核心模块导出
pub mod error;
pub mod types;
pub mod map;
pub mod memory;
pub mod hash;
pub mod stats;

// 公共接口导出
pub use crate::{
    map::{
        HybridMap,
        HybridMapConfig,
        HybridMapStats,
        Stash,
        DEFAULT_CONFIG,
    },
    hash::{
        HashAlgorithm,
        HashStrategy,
        DoubleHashStrategy,
        FnHashStrategy,
        default_hash_strategy,
    },
    memory::{
        Slot,
        SlotState,
    },
    stats::{
        StatsRecorder,
        StatsRecorderFactory,
        global_recorder,
        operation_snapshot,
        migration_snapshot,
        reset_stats,
        export_prometheus,
    },
    error::HybridError,
    types::{EntryLocation, HashMode, Key, OperationType, ProbeMetrics, Value},
};

// 简化默认类型别名
pub type DefaultMap = HybridMap<String, String>;

// 便捷功能函数

/// 批量插入，返回成功插入的条目数
pub fn batch_insert<K: Key, V: Value, S: HashStrategy<K>>(
    map: &HybridMap<K, V, S>,
    items: impl IntoIterator<Item = (K, V)>,
) -> usize {
    items
        .into_iter()
        .map(|(k, v)| map.insert(k, v))
        .filter(|inserted| *inserted)
        .count()
}

/// 批量查询
pub fn batch_get<'a, K: Key, V: Value, S: HashStrategy<K>>(
    map: &HybridMap<K, V, S>,
    keys: impl IntoIterator<Item = &'a K>,
) -> Vec<Option<V>> {
    keys.into_iter().map(|k| map.search(k)).collect()
}
