//! 内存存储
//!
//! 使用 DashMap 实现的并发内存存储，适用于测试和开发环境。

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 自增 id 序列
///
/// 从 1 开始单调递增，清空存储时不重置
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSequence {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// 取出下一个 id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// 通用内存存储
///
/// 以数值 id 为键，基于 DashMap 实现 O(1) 查找。
/// 由于 id 单调递增，列表按 id 排序即为插入顺序。
#[derive(Debug)]
pub struct MemoryStore<T> {
    data: Arc<DashMap<u64, T>>,
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryStore<T> {
    /// 创建新的内存存储实例
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// 插入或更新数据
    ///
    /// 如果 id 已存在则覆盖原有数据
    pub fn insert(&self, id: u64, value: T) {
        self.data.insert(id, value);
    }

    /// 获取数据
    ///
    /// 返回数据的克隆，不持有锁
    pub fn get(&self, id: u64) -> Option<T> {
        self.data.get(&id).map(|v| v.clone())
    }

    /// 删除数据
    ///
    /// 返回被删除的数据
    pub fn remove(&self, id: u64) -> Option<T> {
        self.data.remove(&id).map(|(_, v)| v)
    }

    /// 在条目锁内修改数据
    ///
    /// 闭包执行期间其他写者无法修改同一条目，用于"检查后修改"的原子操作。
    /// id 不存在时返回 None。闭包内不得再访问本存储的同一分片。
    pub fn update<R, F>(&self, id: u64, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.data.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    /// 按插入顺序列出所有数据
    pub fn list(&self) -> Vec<T> {
        self.list_by(|_| true)
    }

    /// 按条件筛选数据
    ///
    /// 返回满足条件的所有数据，保持插入顺序
    pub fn list_by<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut entries: Vec<(u64, T)> = self
            .data
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, v)| v).collect()
    }

    /// 获取数据总数
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// 清空所有数据
    ///
    /// 返回被清除的条目数
    pub fn clear(&self) -> usize {
        let count = self.data.len();
        self.data.clear();
        count
    }

    /// 检查是否存在指定 id
    pub fn contains(&self, id: u64) -> bool {
        self.data.contains_key(&id)
    }
}

impl<T: Clone> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestItem {
        id: u64,
        value: i32,
    }

    fn item(id: u64, value: i32) -> TestItem {
        TestItem { id, value }
    }

    #[test]
    fn test_id_sequence_monotonic() {
        let seq = IdSequence::new();
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.next_id(), 2);
        assert_eq!(seq.next_id(), 3);
    }

    #[test]
    fn test_memory_store_crud() {
        let store: MemoryStore<TestItem> = MemoryStore::new();

        // Create
        store.insert(1, item(1, 42));

        // Read
        assert_eq!(store.get(1).unwrap(), item(1, 42));

        // Update
        store.insert(1, item(1, 100));
        assert_eq!(store.get(1).unwrap().value, 100);

        // Delete
        let removed = store.remove(1).unwrap();
        assert_eq!(removed.value, 100);
        assert!(store.get(1).is_none());
        assert!(store.remove(1).is_none());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        for id in [3, 1, 2, 10, 7] {
            store.insert(id, item(id, id as i32 * 10));
        }

        let ids: Vec<u64> = store.list().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 7, 10]);
        assert_eq!(store.count(), 5);
    }

    #[test]
    fn test_memory_store_list_by() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        store.insert(1, item(1, 10));
        store.insert(2, item(2, 20));
        store.insert(3, item(3, 30));

        // 筛选 value > 15 的项
        let filtered = store.list_by(|item| item.value > 15);
        assert_eq!(filtered, vec![item(2, 20), item(3, 30)]);
    }

    #[test]
    fn test_update_in_place() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        store.insert(1, item(1, 10));

        let result = store.update(1, |i| {
            i.value += 5;
            i.value
        });
        assert_eq!(result, Some(15));
        assert_eq!(store.get(1).unwrap().value, 15);

        assert!(store.update(99, |i| i.value).is_none());
    }

    #[test]
    fn test_memory_store_clear() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        store.insert(1, item(1, 10));
        store.insert(2, item(2, 20));

        assert_eq!(store.clear(), 2);
        assert_eq!(store.count(), 0);
        assert_eq!(store.clear(), 0);
    }

    #[test]
    fn test_memory_store_contains() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        store.insert(7, item(7, 1));

        assert!(store.contains(7));
        assert!(!store.contains(8));
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let store: MemoryStore<TestItem> = MemoryStore::new();
        store.insert(1, item(1, 0));

        std::thread::scope(|s| {
            for _ in 0..8 {
                let store = store.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        store.update(1, |i| i.value += 1);
                    }
                });
            }
        });

        assert_eq!(store.get(1).unwrap().value, 8000);
    }
}
