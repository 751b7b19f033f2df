//! 哈希模块 - 统一管理哈希相关功能

pub mod strategy;
pub mod double_hash;

pub use strategy::{FnHashStrategy, HashAlgorithm, HashStrategy};
pub use double_hash::DoubleHashStrategy;

/// 默认哈希策略
pub fn default_hash_strategy() -> DoubleHashStrategy {
    DoubleHashStrategy::new(HashAlgorithm::AHash)
}

/// 哈希工具函数
pub fn calculate_bucket(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}
