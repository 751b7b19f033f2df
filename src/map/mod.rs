//! 哈希表核心模块 - 三种冲突解决策略、溢出区、表核心与并发包装

pub(crate) mod cuckoo;
pub mod hopscotch;
pub(crate) mod robin_hood;
pub mod stash;
pub mod hybrid_map;
pub(crate) mod raw_table;

pub use hybrid_map::{HybridMap, HybridMapConfig, HybridMapStats};
pub use stash::Stash;

use once_cell::sync::Lazy;

/// 全局默认配置
pub static DEFAULT_CONFIG: Lazy<HybridMapConfig> = Lazy::new(HybridMapConfig::default);

/// Hopscotch 默认邻域大小
pub const DEFAULT_NEIGHBORHOOD_SIZE: usize = 32;
/// 踢出、位移、探测三种循环的默认上限
pub const DEFAULT_LOOP_BOUND: usize = 500;
pub const DEFAULT_MAX_STASH_SIZE: usize = 10_000_000;
