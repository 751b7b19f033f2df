//! 哈希策略模块 - 定义桶定位策略

use std::fmt;

/// 哈希算法选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    AHash,
    XxHash,
    Default,
}

/// 哈希策略特征
///
/// Hopscotch和Robin Hood只使用主哈希；Cuckoo的第一张表使用主哈希，
/// 第二张表使用副哈希。返回值由表按容量取模。
pub trait HashStrategy<K: ?Sized>: Send + Sync {
    /// 主哈希值
    fn primary_hash(&self, key: &K) -> u64;

    /// 副哈希值 (仅Cuckoo使用)
    fn secondary_hash(&self, key: &K) -> u64;
}

/// 闭包哈希策略 - 用两个闭包构造策略，便于构造指定的冲突布局
#[derive(Clone)]
pub struct FnHashStrategy<F, G> {
    primary: F,
    secondary: G,
}

impl<F, G> FnHashStrategy<F, G> {
    /// 创建新策略
    pub fn new(primary: F, secondary: G) -> Self {
        Self { primary, secondary }
    }
}

impl<F, G> fmt::Debug for FnHashStrategy<F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHashStrategy")
    }
}

impl<K, F, G> HashStrategy<K> for FnHashStrategy<F, G>
where
    K: ?Sized,
    F: Fn(&K) -> u64 + Send + Sync,
    G: Fn(&K) -> u64 + Send + Sync,
{
    fn primary_hash(&self, key: &K) -> u64 {
        (self.primary)(key)
    }

    fn secondary_hash(&self, key: &K) -> u64 {
        (self.secondary)(key)
    }
}
