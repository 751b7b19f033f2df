//! 溢出区 - 策略无法放置的条目的无序后备存储
//!
//! 查找与删除都是线性扫描；正常容量下溢出区只应保存极少量条目。

/// 溢出区
///
/// `max_len` 只约束 `push`，即新键能否进入溢出区。重新散列时放不下的条目，
/// 以及新键插入时被挤出的常驻条目，会经 `force_push` 越过上限放入，
/// 因此 `len()` 可以大于 `max_len()`。
#[derive(Debug, Clone)]
pub struct Stash<K, V> {
    entries: Vec<(K, V)>,
    max_len: usize,
}

impl<K: PartialEq, V> Stash<K, V> {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// 放入条目，已满时原样交还
    pub fn push(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        if self.is_full() {
            return Err((key, value));
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// 忽略上限放入条目 (仅用于重新散列和被挤出的常驻条目)，长度可能超过 `max_len`
    pub(crate) fn force_push(&mut self, key: K, value: V) {
        self.entries.push((key, value));
    }

    /// 查找键所在下标
    pub fn find(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|idx| &self.entries[idx].1)
    }

    /// 删除键，顺序不保证
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let idx = self.find(key)?;
        Some(self.entries.swap_remove(idx))
    }

    /// 取出全部条目
    pub fn drain(&mut self) -> Vec<(K, V)> {
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_push() {
        let mut stash = Stash::new(2);
        assert!(stash.push("a", 1).is_ok());
        assert!(stash.push("b", 2).is_ok());
        assert!(stash.is_full());
        assert_eq!(stash.push("c", 3), Err(("c", 3)));

        stash.force_push("c", 3);
        assert_eq!(stash.len(), 3);
        assert_eq!(stash.get(&"c"), Some(&3));
    }

    #[test]
    fn test_remove_and_drain() {
        let mut stash = Stash::new(10);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            stash.push(k, v).unwrap();
        }
        assert_eq!(stash.remove(&"a"), Some(("a", 1)));
        assert_eq!(stash.remove(&"a"), None);
        assert_eq!(stash.find(&"a"), None);
        assert!(stash.find(&"c").is_some());

        let mut drained = stash.drain();
        drained.sort();
        assert_eq!(drained, vec![("b", 2), ("c", 3)]);
        assert!(stash.is_empty());
    }
}
