//! 核心类型定义 - 共享类型和接口

use std::{
    fmt::{self, Debug, Display},
    hash::Hash,
    str::FromStr,
};

use crate::error::HybridError;

/// 键特征 - 可哈希、可比较、可跨线程共享
pub trait Key: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

impl<T> Key for T where T: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

/// 值类型 - 要求可克隆
pub trait Value: Clone + Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + Debug + Send + Sync + 'static {}

/// 冲突解决模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashMode {
    /// 双表Cuckoo哈希
    Cuckoo,
    /// 邻域位图Hopscotch哈希
    Hopscotch,
    /// Robin Hood线性探测
    RobinHood,
}

impl HashMode {
    /// 全部模式
    pub const ALL: [HashMode; 3] = [HashMode::Cuckoo, HashMode::Hopscotch, HashMode::RobinHood];

    /// 转换为字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            HashMode::Cuckoo => "cuckoo",
            HashMode::Hopscotch => "hopscotch",
            HashMode::RobinHood => "robin_hood",
        }
    }
}

impl Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMode {
    type Err = HybridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cuckoo" => Ok(HashMode::Cuckoo),
            "hopscotch" => Ok(HashMode::Hopscotch),
            "robin_hood" | "robinhood" | "robin-hood" => Ok(HashMode::RobinHood),
            other => Err(HybridError::InvalidConfig {
                reason: format!("未知的哈希模式: {other}"),
            }),
        }
    }
}

/// 条目所在位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryLocation {
    /// 主表槽位
    Primary(usize),
    /// 副表槽位 (仅Cuckoo)
    Secondary(usize),
    /// 溢出区下标
    Stash(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// 插入操作
    Insert,
    /// 查询操作
    Search,
    /// 删除操作
    Remove,
    /// 调整大小操作
    Resize,
    /// 模式切换
    ModeSwitch,
    /// 清空
    Clear,
}

impl OperationType {
    pub const ALL: [OperationType; 6] = [
        OperationType::Insert,
        OperationType::Search,
        OperationType::Remove,
        OperationType::Resize,
        OperationType::ModeSwitch,
        OperationType::Clear,
    ];

    /// 判断是否为读操作
    pub fn is_read(&self) -> bool {
        matches!(self, OperationType::Search)
    }

    /// 判断是否为写操作
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }

    /// 转换为字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Search => "search",
            OperationType::Remove => "remove",
            OperationType::Resize => "resize",
            OperationType::ModeSwitch => "mode_switch",
            OperationType::Clear => "clear",
        }
    }
}

/// 探测统计 - 驱动模式切换启发式
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMetrics {
    /// 插入尝试次数
    pub insertions: u64,
    /// 冲突次数
    pub collisions: u64,
    /// 探测步数
    pub probes: u64,
    /// Cuckoo踢出次数
    pub evictions: u64,
    /// Hopscotch位移搜索次数
    pub displacements: u64,
}

impl ProbeMetrics {
    /// 冲突率 = 冲突次数 / 插入尝试次数
    pub fn collision_rate(&self) -> f64 {
        if self.insertions > 0 {
            self.collisions as f64 / self.insertions as f64
        } else {
            0.0
        }
    }

    /// 累加另一份统计
    pub fn accumulate(&mut self, other: &ProbeMetrics) {
        self.insertions += other.insertions;
        self.collisions += other.collisions;
        self.probes += other.probes;
        self.evictions += other.evictions;
        self.displacements += other.displacements;
    }
}
