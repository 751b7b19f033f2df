// src/memory/slot.rs
//! 槽位模型 - 三种策略共享的空/墓碑/占用表示

use std::{fmt, mem};

/// 槽位状态 (不含负载)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    Empty,
    Tombstone,
    Occupied,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Empty => f.write_str("Empty"),
            SlotState::Tombstone => f.write_str("Tombstone"),
            SlotState::Occupied => f.write_str("Occupied"),
        }
    }
}

/// 槽位
///
/// 墓碑是独立的标记，不占用键空间，任何键都可以合法存入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied(K, V),
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<K, V> Slot<K, V> {
    /// 获取槽位状态
    pub fn state(&self) -> SlotState {
        match self {
            Slot::Empty => SlotState::Empty,
            Slot::Tombstone => SlotState::Tombstone,
            Slot::Occupied(..) => SlotState::Occupied,
        }
    }

    /// 检查是否为空槽位
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// 检查是否为墓碑
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }

    /// 检查是否被占用
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(..))
    }

    /// 空槽位或墓碑都可以直接放置新条目
    pub fn is_free(&self) -> bool {
        !self.is_occupied()
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            Slot::Occupied(k, _) => Some(k),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    /// 检查槽位是否存放指定键
    pub fn holds<Q>(&self, key: &Q) -> bool
    where
        K: PartialEq<Q>,
        Q: ?Sized,
    {
        matches!(self, Slot::Occupied(k, _) if k == key)
    }

    /// 放入条目，返回原占用者
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        mem::replace(self, Slot::Occupied(key, value)).into_entry()
    }

    /// 取出条目并留下墓碑
    pub fn bury(&mut self) -> Option<(K, V)> {
        match self {
            Slot::Occupied(..) => mem::replace(self, Slot::Tombstone).into_entry(),
            _ => None,
        }
    }

    /// 取出条目并留下空槽位
    pub fn take(&mut self) -> Option<(K, V)> {
        mem::replace(self, Slot::Empty).into_entry()
    }

    /// 转换为键值对
    pub fn into_entry(self) -> Option<(K, V)> {
        match self {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let mut slot: Slot<String, u32> = Slot::default();
        assert!(slot.is_empty());
        assert!(slot.is_free());

        assert_eq!(slot.put("a".into(), 1), None);
        assert_eq!(slot.state(), SlotState::Occupied);
        assert!(slot.holds("a"));
        assert_eq!(slot.value(), Some(&1));

        assert_eq!(slot.bury(), Some(("a".to_string(), 1)));
        assert!(slot.is_tombstone());
        assert!(slot.is_free());
        assert!(!slot.holds("a"));

        // 墓碑上再次删除不应返回任何内容
        assert_eq!(slot.bury(), None);
        assert!(slot.is_tombstone());
    }

    #[test]
    fn test_put_returns_previous_resident() {
        let mut slot = Slot::Occupied(1u64, "x");
        assert_eq!(slot.put(2, "y"), Some((1, "x")));
        assert_eq!(slot.key(), Some(&2));
        assert_eq!(slot.take(), Some((2, "y")));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_tombstone_does_not_reserve_keys() {
        // 任意键 (包括类似旧哨兵的字符串) 都能正常存放
        let mut slot: Slot<String, i32> = Slot::Tombstone;
        slot.put("__TOMBSTONE__".to_string(), 7);
        assert!(slot.is_occupied());
        assert!(slot.holds("__TOMBSTONE__"));
    }
}
