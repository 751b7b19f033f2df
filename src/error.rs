//! 统一错误处理 - 所有可能错误类型和恢复逻辑

use crate::types::HashMode;

/// 混合哈希表可能发生的错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HybridError {
    #[error("键已存在: {key}")]
    KeyAlreadyExists {
        key: String,
    },

    #[error("表已满，无法插入新条目 (容量: {capacity}, 当前大小: {size}, 溢出区: {stash_len})")]
    TableFull {
        capacity: usize,
        size: usize,
        stash_len: usize,
    },

    #[error("不支持缩容 (当前容量: {current}, 请求容量: {requested})")]
    ShrinkNotSupported {
        current: usize,
        requested: usize,
    },

    #[error("无效配置: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("内部不变量被破坏 (模式: {mode}, 槽位: {index}): {reason}")]
    InvariantViolation {
        mode: HashMode,
        index: usize,
        reason: String,
    },
}

impl HybridError {
    /// 获取错误恢复建议
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::KeyAlreadyExists { .. } => Some("先删除旧键再插入"),
            Self::TableFull { .. } => Some("调用resize扩容后重试"),
            Self::ShrinkNotSupported { .. } => Some("请求不小于当前容量的新容量"),
            Self::InvalidConfig { .. } => Some("检查配置参数"),
            Self::InvariantViolation { .. } => None,
        }
    }

    /// 判断错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation { .. })
    }
}
