//! 双哈希策略 - 使用两个独立哈希函数定位桶

use crate::hash::strategy::{HashAlgorithm, HashStrategy};
use ahash::RandomState;
use std::{
    collections::hash_map::DefaultHasher,
    hash::{BuildHasher, Hash, Hasher},
};

const PRIMARY_SEED: u64 = 42;
const SECONDARY_SEED: u64 = 123;

/// 带种子的单个哈希函数
#[derive(Clone, Debug)]
enum SeededHasher {
    AHash(RandomState),
    XxHash(u64),
    Default(u64),
}

impl SeededHasher {
    fn new(algorithm: HashAlgorithm, seed: u64) -> Self {
        match algorithm {
            HashAlgorithm::AHash => SeededHasher::AHash(RandomState::with_seed(seed as usize)),
            HashAlgorithm::XxHash => SeededHasher::XxHash(seed),
            HashAlgorithm::Default => SeededHasher::Default(seed),
        }
    }

    fn hash<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        match self {
            SeededHasher::AHash(state) => {
                let mut hasher = state.build_hasher();
                key.hash(&mut hasher);
                hasher.finish()
            }
            SeededHasher::XxHash(seed) => {
                let mut hasher = twox_hash::XxHash64::with_seed(*seed);
                key.hash(&mut hasher);
                hasher.finish()
            }
            SeededHasher::Default(seed) => {
                // DefaultHasher::new() 使用固定密钥，先写入种子区分两个函数
                let mut hasher = DefaultHasher::new();
                seed.hash(&mut hasher);
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

/// 双哈希策略
///
/// 两个哈希函数使用固定种子，同一键在不同进程中落在相同位置。
#[derive(Clone, Debug)]
pub struct DoubleHashStrategy {
    algorithm: HashAlgorithm,
    primary: SeededHasher,
    secondary: SeededHasher,
}

impl DoubleHashStrategy {
    /// 创建新双哈希策略
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self::with_seeds(algorithm, PRIMARY_SEED, SECONDARY_SEED)
    }

    /// 使用指定种子创建
    pub fn with_seeds(algorithm: HashAlgorithm, primary_seed: u64, secondary_seed: u64) -> Self {
        Self {
            algorithm,
            primary: SeededHasher::new(algorithm, primary_seed),
            secondary: SeededHasher::new(algorithm, secondary_seed),
        }
    }

    /// 获取哈希算法
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl Default for DoubleHashStrategy {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl<K: Hash + ?Sized> HashStrategy<K> for DoubleHashStrategy {
    fn primary_hash(&self, key: &K) -> u64 {
        self.primary.hash(key)
    }

    fn secondary_hash(&self, key: &K) -> u64 {
        self.secondary.hash(key)
    }
}
