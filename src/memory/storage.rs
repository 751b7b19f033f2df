//! 共享槽位存储 - 三种策略按下标访问同一组数组

use crate::memory::slot::Slot;

/// 共享槽位存储
///
/// 主表被三种模式共用；副表只在Cuckoo模式下使用；
/// `hop_info` 只在Hopscotch模式下使用；`probe_distances` 只在Robin Hood模式下使用。
/// 所有数组长度始终等于 `capacity`。
#[derive(Debug, Clone)]
pub struct SlotStorage<K, V> {
    pub(crate) primary: Vec<Slot<K, V>>,
    pub(crate) secondary: Vec<Slot<K, V>>,
    pub(crate) hop_info: Vec<u32>,
    pub(crate) probe_distances: Vec<usize>,
    capacity: usize,
}

impl<K, V> SlotStorage<K, V> {
    /// 创建指定容量的存储
    pub fn new(capacity: usize) -> Self {
        let mut storage = Self {
            primary: Vec::new(),
            secondary: Vec::new(),
            hop_info: Vec::new(),
            probe_distances: Vec::new(),
            capacity: 0,
        };
        storage.reset(capacity);
        storage
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 按新容量重新初始化全部结构
    pub fn reset(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.primary.clear();
        self.primary.resize_with(capacity, Slot::default);
        self.secondary.clear();
        self.secondary.resize_with(capacity, Slot::default);
        self.hop_info.clear();
        self.hop_info.resize(capacity, 0);
        self.probe_distances.clear();
        self.probe_distances.resize(capacity, 0);
    }

    /// 取出两张表中的全部存活条目，结构保持原容量
    pub fn drain_live(&mut self) -> Vec<(K, V)> {
        let mut entries = Vec::new();
        for slot in self.primary.iter_mut().chain(self.secondary.iter_mut()) {
            if let Some(entry) = slot.take() {
                entries.push(entry);
            }
        }
        self.hop_info.iter_mut().for_each(|bits| *bits = 0);
        self.probe_distances.iter_mut().for_each(|d| *d = 0);
        entries
    }

    /// 两张表中存活条目的迭代器
    pub fn live_entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .filter_map(|slot| match slot {
                Slot::Occupied(k, v) => Some((k, v)),
                _ => None,
            })
    }

    /// 两张表中的存活条目数
    pub fn live_count(&self) -> usize {
        self.live_entries().count()
    }
}
