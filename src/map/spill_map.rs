//! 溢出分片表核心实现
//!
//! 由一组容量受限的哈希分片组成。写入总是落在活跃分片，活跃分片写满后
//! 追加新分片并切换为活跃分片；删除使非活跃分片变空时回收该分片。
//! 全部状态由一把读写锁保护：写入、删除持有写锁，其余操作持有读锁。

use crate::{
    map::config::SpillMapConfig,
    stats::{AtomicStatsRecorder, StatsRecorder},
    types::{OperationType, ShardInfo, WritePolicy},
};
use parking_lot::RwLock;
use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt,
    hash::{BuildHasher, Hash},
    sync::Arc,
    time::Instant,
};

/// 溢出分片表统计信息
#[derive(Debug, Default, Clone)]
pub struct SpillMapStats {
    pub size: usize,
    pub shard_count: usize,
    pub active_index: usize,
    pub shard_capacity: usize,
    /// 活跃分片填充率
    pub active_fill_ratio: f32,
    pub put_count: u64,
    pub get_count: u64,
    pub remove_count: u64,
    pub spill_count: u64,
    pub compaction_count: u64,
    pub iterate_count: u64,
    pub hit_rate: f32,
}

/// 单次删除的结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Removal {
    removed: usize,
    compacted: usize,
}

/// 锁内状态：分片序列与活跃分片下标
struct ShardSet<K, V, S> {
    shards: Vec<HashMap<K, V, S>>,
    active: usize,
}

impl<K, V, S> ShardSet<K, V, S> {
    fn len(&self) -> usize {
        self.shards.iter().map(HashMap::len).sum()
    }

    /// 若分片为空、非活跃且不是唯一分片则移除它，返回是否移除
    ///
    /// 被移除分片位于活跃分片之前时，后续分片整体前移一位，活跃下标随之减一。
    fn compact(&mut self, index: usize) -> bool {
        if !self.shards[index].is_empty() || index == self.active || self.shards.len() <= 1 {
            return false;
        }

        self.shards.remove(index);
        if index < self.active {
            self.active -= 1;
        }
        log_debug!(
            "compacted empty shard {}, shard_count={} active={}",
            index,
            self.shards.len(),
            self.active
        );
        true
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ShardSet<K, V, S> {
    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shards.iter().find_map(|shard| shard.get(key))
    }

    /// 只删除扫描到的第一个副本
    fn remove_first<Q>(&mut self, key: &Q) -> Removal
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(index) = self.shards.iter().position(|shard| shard.contains_key(key)) else {
            return Removal::default();
        };

        self.shards[index].remove(key);
        Removal {
            removed: 1,
            compacted: usize::from(self.compact(index)),
        }
    }

    /// 删除所有分片中的副本
    fn remove_all<Q>(&mut self, key: &Q) -> Removal
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut removal = Removal::default();
        let mut index = 0;
        while index < self.shards.len() {
            if self.shards[index].remove(key).is_some() {
                removal.removed += 1;
                if self.compact(index) {
                    removal.compacted += 1;
                    // 后续分片已前移，原下标继续
                    continue;
                }
            }
            index += 1;
        }
        removal
    }
}

/// 溢出分片表
///
/// 对外表现为单个键值表，内部每个分片的条目数不超过 `shard_capacity`。
/// 所有方法都接受 `&self`，可以通过 `Arc` 在线程间共享。
pub struct SpillMap<K, V, S = ahash::RandomState> {
    inner: RwLock<ShardSet<K, V, S>>,
    config: SpillMapConfig,
    hasher: S,
    stats_recorder: Arc<dyn StatsRecorder>,
}

impl<K, V, S> SpillMap<K, V, S> {
    /// 当前条目总数（各分片之和）
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前分片数量
    pub fn shard_count(&self) -> usize {
        self.inner.read().shards.len()
    }

    /// 活跃分片下标
    pub fn active_index(&self) -> usize {
        self.inner.read().active
    }

    pub fn shard_capacity(&self) -> usize {
        self.config.shard_capacity
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.config.write_policy
    }

    pub fn config(&self) -> &SpillMapConfig {
        &self.config
    }

    /// 各分片条目数，按分片顺序
    pub fn shard_sizes(&self) -> Vec<usize> {
        self.inner.read().shards.iter().map(HashMap::len).collect()
    }

    /// 各分片的快照信息
    pub fn shard_snapshot(&self) -> Vec<ShardInfo> {
        let set = self.inner.read();
        set.shards
            .iter()
            .enumerate()
            .map(|(index, shard)| ShardInfo {
                index,
                len: shard.len(),
                is_active: index == set.active,
            })
            .collect()
    }

    /// 替换统计记录器
    pub fn with_stats_recorder(mut self, recorder: Arc<dyn StatsRecorder>) -> Self {
        self.stats_recorder = recorder;
        self
    }

    pub fn stats_recorder(&self) -> &Arc<dyn StatsRecorder> {
        &self.stats_recorder
    }

    /// 获取统计信息
    pub fn stats(&self) -> SpillMapStats {
        self.stats_recorder.record_operation_count(OperationType::Statistics);
        let op_stats = self.stats_recorder.snapshot();

        let (size, shard_count, active_index, active_len) = {
            let set = self.inner.read();
            (set.len(), set.shards.len(), set.active, set.shards[set.active].len())
        };

        SpillMapStats {
            size,
            shard_count,
            active_index,
            shard_capacity: self.config.shard_capacity,
            active_fill_ratio: active_len as f32 / self.config.shard_capacity as f32,
            put_count: op_stats.put_count,
            get_count: op_stats.get_count,
            remove_count: op_stats.remove_count,
            spill_count: op_stats.spill_count,
            compaction_count: op_stats.compaction_count,
            iterate_count: op_stats.iterate_count,
            hit_rate: op_stats.hit_rate(),
        }
    }

    /// 导出Prometheus格式指标
    pub fn export_prometheus(&self) -> String {
        let mut output = self.stats_recorder.export_prometheus();
        let (size, shard_count) = {
            let set = self.inner.read();
            (set.len(), set.shards.len())
        };
        output.push_str("# HELP spill_map_size Entries across all shards\n");
        output.push_str("# TYPE spill_map_size gauge\n");
        output.push_str(&format!("spill_map_size {}\n", size));
        output.push_str("# HELP spill_map_shard_count Shards currently held\n");
        output.push_str("# TYPE spill_map_shard_count gauge\n");
        output.push_str(&format!("spill_map_shard_count {}\n", shard_count));
        output
    }
}

impl<K, V, S> SpillMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    /// 以指定分片容量创建，容量为0时使用默认值
    pub fn new(shard_capacity: usize) -> Self {
        Self::with_config(SpillMapConfig::new(shard_capacity))
    }

    /// 以配置创建，非法容量会被修正为默认值
    pub fn with_config(config: SpillMapConfig) -> Self {
        Self::with_config_and_hasher(config, S::default())
    }

    /// 以配置创建，配置非法时返回错误而不是修正
    pub fn try_with_config(config: SpillMapConfig) -> Result<Self, crate::SpillError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }
}

impl<K, V, S> SpillMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// 以配置和哈希构造器创建
    pub fn with_config_and_hasher(mut config: SpillMapConfig, hasher: S) -> Self {
        if config.normalize() {
            log_warn!(
                "shard capacity must be positive, falling back to {}",
                config.shard_capacity
            );
        }

        let mut map = Self {
            inner: RwLock::new(ShardSet { shards: Vec::new(), active: 0 }),
            config,
            hasher,
            stats_recorder: Arc::new(AtomicStatsRecorder::new()),
        };
        let first = map.new_shard();
        map.inner.get_mut().shards.push(first);
        map
    }

    fn new_shard(&self) -> HashMap<K, V, S> {
        if self.config.preallocate_shards {
            HashMap::with_capacity_and_hasher(self.config.shard_capacity, self.hasher.clone())
        } else {
            HashMap::with_hasher(self.hasher.clone())
        }
    }

    /// 写入键值对
    ///
    /// 活跃分片已满时先追加新分片再写入。`ActiveShard` 策略下不检查其他分片，
    /// 已溢出的键再次写入，或覆盖已满活跃分片中的键，都会产生副本；
    /// `UpdateInPlace` 策略下原地覆盖已存在的键。
    pub fn put(&self, key: K, value: V) {
        let start = Instant::now();
        let mut set = self.inner.write();

        if self.config.write_policy == WritePolicy::UpdateInPlace {
            if let Some(slot) = set.shards.iter_mut().find_map(|shard| shard.get_mut(&key)) {
                *slot = value;
                drop(set);
                self.stats_recorder
                    .record_operation(OperationType::Put, start.elapsed(), true);
                return;
            }
        }

        if set.shards[set.active].len() >= self.config.shard_capacity {
            let shard = self.new_shard();
            set.shards.push(shard);
            set.active += 1;
            debug_assert_eq!(set.active, set.shards.len() - 1);
            self.stats_recorder.record_operation_count(OperationType::Spill);
            log_debug!(
                "active shard reached capacity {}, spilled to shard {}",
                self.config.shard_capacity,
                set.active
            );
        }

        let active = set.active;
        set.shards[active].insert(key, value);
        drop(set);

        self.stats_recorder
            .record_operation(OperationType::Put, start.elapsed(), true);
    }

    /// 查询键，返回值的克隆
    ///
    /// 按分片顺序扫描，返回第一个命中的值。
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// 查询键并在读锁内对值调用 `f`
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let start = Instant::now();
        let result = self.inner.read().find(key).map(f);
        self.stats_recorder
            .record_operation(OperationType::Get, start.elapsed(), result.is_some());
        result
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // 只判断存在性，不计入查询命中统计
        self.inner.read().find(key).is_some()
    }

    /// 删除键，返回是否找到
    ///
    /// 删除使非活跃分片变空时回收该分片。`ActiveShard` 策略下只删除扫描到的
    /// 第一个副本，`UpdateInPlace` 策略下删除所有副本。
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let start = Instant::now();
        let removal = {
            let mut set = self.inner.write();
            match self.config.write_policy {
                WritePolicy::ActiveShard => set.remove_first(key),
                WritePolicy::UpdateInPlace => set.remove_all(key),
            }
        };

        for _ in 0..removal.compacted {
            self.stats_recorder.record_operation_count(OperationType::Compaction);
        }
        let found = removal.removed > 0;
        self.stats_recorder
            .record_operation(OperationType::Remove, start.elapsed(), found);
        found
    }

    /// 按分片顺序遍历所有条目，`visitor` 返回 `false` 时立即停止
    ///
    /// 整个遍历期间持有读锁，`visitor` 内不得再调用本表的任何方法，
    /// 否则可能与等待中的写者形成死锁。返回是否遍历了全部条目。
    pub fn for_each<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        let start = Instant::now();
        let completed = {
            let set = self.inner.read();
            set.shards
                .iter()
                .flat_map(|shard| shard.iter())
                .all(|(key, value)| visitor(key, value))
        };
        self.stats_recorder
            .record_operation(OperationType::Iterate, start.elapsed(), completed);
        completed
    }
}

impl<K, V, S> Default for SpillMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn default() -> Self {
        Self::with_config(crate::map::DEFAULT_CONFIG.clone())
    }
}

impl<K, V, S> FromIterator<(K, V)> for SpillMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = Self::default();
        for (key, value) in iter {
            map.put(key, value);
        }
        map
    }
}

impl<K, V, S> fmt::Debug for SpillMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.inner.read();
        f.debug_struct("SpillMap")
            .field("size", &set.len())
            .field("shard_count", &set.shards.len())
            .field("active_index", &set.active)
            .field("shard_capacity", &self.config.shard_capacity)
            .field("write_policy", &self.config.write_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{map::DEFAULT_SHARD_CAPACITY, stats::DisabledStatsRecorder};
    use env_logger::{Builder, Env};
    use std::{io::Write, sync::Barrier, thread};

    // 初始化日志记录器
    fn init_logger() {
        let env = Env::default().filter_or("RUST_LOG", "debug");
        let _ = Builder::from_env(env)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {}:{} - {}",
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .is_test(true)
            .try_init();
    }

    fn create_test_map(capacity: usize) -> SpillMap<i32, i32> {
        init_logger();
        SpillMap::new(capacity)
    }

    fn shard_set(sizes: &[usize], active: usize) -> ShardSet<i32, i32, ahash::RandomState> {
        let mut next = 0;
        let shards = sizes
            .iter()
            .map(|&len| {
                let mut shard = HashMap::with_hasher(ahash::RandomState::new());
                for _ in 0..len {
                    shard.insert(next, next);
                    next += 1;
                }
                shard
            })
            .collect();
        ShardSet { shards, active }
    }

    #[test]
    fn test_new_map_has_one_empty_shard() {
        let map = create_test_map(5);
        assert_eq!(map.shard_count(), 1);
        assert_eq!(map.active_index(), 0);
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.shard_capacity(), 5);
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let map = create_test_map(0);
        assert_eq!(map.shard_capacity(), DEFAULT_SHARD_CAPACITY);
    }

    #[test]
    fn test_try_with_config_rejects_zero_capacity() {
        let result = SpillMap::<i32, i32>::try_with_config(SpillMapConfig::new(0));
        assert!(matches!(result, Err(crate::SpillError::InvalidConfig { .. })));
        assert!(SpillMap::<i32, i32>::try_with_config(SpillMapConfig::new(3)).is_ok());
    }

    #[test]
    fn test_basic_scenario() {
        let map = create_test_map(5);
        for i in 0..10 {
            map.put(i, i * 10);
        }
        assert_eq!(map.shard_count(), 2);
        assert_eq!(map.len(), 10);
        for i in 0..10 {
            assert_eq!(map.get(&i), Some(i * 10));
        }

        assert!(map.remove(&1));
        assert!(map.remove(&6));
        assert_eq!(map.len(), 8);
        assert_eq!(map.get(&1), None);

        let mut count = 0;
        assert!(map.for_each(|_, _| {
            count += 1;
            true
        }));
        assert_eq!(count, 8);

        count = 0;
        assert!(!map.for_each(|_, _| {
            count += 1;
            count < 3
        }));
        assert_eq!(count, 3);
    }

    #[test]
    fn test_spill_happens_only_when_active_is_full() {
        let map = create_test_map(3);
        for i in 0..3 {
            map.put(i, i);
        }
        assert_eq!(map.shard_count(), 1);
        map.put(3, 3);
        assert_eq!(map.shard_count(), 2);
        assert_eq!(map.active_index(), 1);
        assert_eq!(map.shard_sizes(), vec![3, 1]);
    }

    #[test]
    fn test_overwrite_in_active_shard_keeps_size() {
        let map = create_test_map(3);
        map.put(1, 10);
        map.put(1, 11);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(11));
    }

    #[test]
    fn test_overwrite_in_full_active_shard_duplicates_key() {
        let map = create_test_map(2);
        map.put(1, 10);
        map.put(2, 20);
        // 活跃分片已满，覆盖写入会先溢出到新分片
        map.put(2, 21);
        assert_eq!(map.shard_sizes(), vec![2, 1]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2), Some(20));

        assert!(map.remove(&2));
        assert_eq!(map.get(&2), Some(21));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_contains_key_skips_lookup_stats() {
        let map = create_test_map(2);
        map.put(1, 1);
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
        let stats = map.stats();
        assert_eq!(stats.get_count, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_remove_missing_key() {
        let map = create_test_map(3);
        map.put(1, 1);
        assert!(!map.remove(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_last_key_of_single_shard_keeps_shard() {
        let map = create_test_map(3);
        map.put(1, 1);
        assert!(map.remove(&1));
        assert_eq!(map.shard_count(), 1);
        assert!(map.is_empty());
    }

    #[test]
    fn test_compaction_of_middle_shard() {
        let map = create_test_map(2);
        for i in 0..6 {
            map.put(i, i);
        }
        assert_eq!(map.shard_sizes(), vec![2, 2, 2]);
        assert_eq!(map.active_index(), 2);

        assert!(map.remove(&2));
        assert_eq!(map.shard_count(), 3);
        assert!(map.remove(&3));
        assert_eq!(map.shard_count(), 2);
        assert_eq!(map.active_index(), 1);

        // 活跃分片仍是原来保存4和5的分片，已满，下一次写入会溢出
        map.put(6, 6);
        assert_eq!(map.shard_sizes(), vec![2, 2, 1]);
        assert_eq!(map.active_index(), 2);
        for key in [0, 1, 4, 5, 6] {
            assert_eq!(map.get(&key), Some(key));
        }
    }

    #[test]
    fn test_compaction_of_first_shard() {
        let map = create_test_map(2);
        for i in 0..5 {
            map.put(i, i);
        }
        assert!(map.remove(&0));
        assert!(map.remove(&1));
        assert_eq!(map.shard_sizes(), vec![2, 1]);
        assert_eq!(map.active_index(), 1);

        // 活跃分片还有空位，不会溢出
        map.put(5, 5);
        assert_eq!(map.shard_sizes(), vec![2, 2]);
    }

    #[test]
    fn test_active_shard_is_never_compacted() {
        let map = create_test_map(2);
        for i in 0..3 {
            map.put(i, i);
        }
        assert!(map.remove(&2));
        assert_eq!(map.shard_sizes(), vec![2, 0]);
        assert_eq!(map.active_index(), 1);

        map.put(7, 7);
        assert_eq!(map.shard_sizes(), vec![2, 1]);
    }

    #[test]
    fn test_compact_before_active_decrements_index() {
        let mut set = shard_set(&[1, 0, 2, 1], 3);
        assert!(set.compact(1));
        assert_eq!(set.active, 2);
        assert_eq!(set.shards.len(), 3);
        assert_eq!(set.shards[set.active].len(), 1);
    }

    #[test]
    fn test_compact_after_active_keeps_index() {
        let mut set = shard_set(&[2, 1, 0], 1);
        assert!(set.compact(2));
        assert_eq!(set.active, 1);
        assert_eq!(set.shards.len(), 2);
        assert_eq!(set.shards[set.active].len(), 1);
    }

    #[test]
    fn test_compact_refuses_active_nonempty_or_sole_shard() {
        let mut set = shard_set(&[0, 0], 1);
        assert!(!set.compact(1));
        let mut set = shard_set(&[0], 0);
        assert!(!set.compact(0));
        let mut set = shard_set(&[1, 1], 1);
        assert!(!set.compact(0));
        assert_eq!(set.shards.len(), 2);
    }

    #[test]
    fn test_duplicate_key_with_active_shard_policy() {
        let map = create_test_map(2);
        map.put(1, 100);
        map.put(2, 200);
        map.put(3, 300);
        // 1已在分片0中，再次写入落到活跃分片1
        map.put(1, 101);
        assert_eq!(map.shard_sizes(), vec![2, 2]);
        assert_eq!(map.len(), 4);
        // 返回下标最小的副本，即旧值
        assert_eq!(map.get(&1), Some(100));

        assert!(map.remove(&1));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(101));

        assert!(map.remove(&1));
        assert_eq!(map.get(&1), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_update_in_place_policy() {
        let map: SpillMap<i32, i32> = SpillMap::with_config(
            SpillMapConfig::new(2).with_write_policy(WritePolicy::UpdateInPlace),
        );
        map.put(1, 100);
        map.put(2, 200);
        map.put(3, 300);
        map.put(1, 101);
        assert_eq!(map.shard_sizes(), vec![2, 1]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(101));

        assert!(map.remove(&1));
        assert_eq!(map.get(&1), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_update_in_place_does_not_spill_on_overwrite() {
        let map: SpillMap<i32, i32> = SpillMap::with_config(
            SpillMapConfig::new(2).with_write_policy(WritePolicy::UpdateInPlace),
        );
        map.put(1, 1);
        map.put(2, 2);
        map.put(2, 22);
        assert_eq!(map.shard_count(), 1);
        assert_eq!(map.get(&2), Some(22));
    }

    #[test]
    fn test_remove_all_compacts_every_emptied_shard() {
        let mut set = shard_set(&[1, 1, 1], 2);
        // 让分片0和1都只含键42
        set.shards[0].clear();
        set.shards[0].insert(42, 0);
        set.shards[1].clear();
        set.shards[1].insert(42, 1);

        let removal = set.remove_all(&42);
        assert_eq!(removal, Removal { removed: 2, compacted: 2 });
        assert_eq!(set.shards.len(), 1);
        assert_eq!(set.active, 0);
    }

    #[test]
    fn test_borrowed_key_lookup() {
        let map: SpillMap<String, usize> = SpillMap::new(2);
        map.put("alpha".to_string(), 1);
        map.put("beta".to_string(), 2);
        map.put("gamma".to_string(), 3);
        assert_eq!(map.get("gamma"), Some(3));
        assert!(map.contains_key("alpha"));
        assert_eq!(map.get_with("beta", |v| v * 10), Some(20));
        assert!(map.remove("alpha"));
        assert!(!map.contains_key("alpha"));
    }

    #[test]
    fn test_preallocated_shards() {
        let map: SpillMap<i32, i32> =
            SpillMap::with_config(SpillMapConfig::new(4).with_preallocate_shards(true));
        for i in 0..9 {
            map.put(i, i);
        }
        assert_eq!(map.shard_sizes(), vec![4, 4, 1]);
    }

    #[test]
    fn test_shard_snapshot_marks_active() {
        let map = create_test_map(2);
        for i in 0..3 {
            map.put(i, i);
        }
        let snapshot = map.shard_snapshot();
        assert_eq!(
            snapshot,
            vec![
                ShardInfo { index: 0, len: 2, is_active: false },
                ShardInfo { index: 1, len: 1, is_active: true },
            ]
        );
    }

    #[test]
    fn test_stats_counts_operations() {
        let map = create_test_map(2);
        for i in 0..5 {
            map.put(i, i);
        }
        map.get(&1);
        map.get(&99);
        map.remove(&0);
        map.remove(&1);
        map.for_each(|_, _| true);

        let stats = map.stats();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.shard_count, 2);
        assert_eq!(stats.active_index, 1);
        assert_eq!(stats.put_count, 5);
        assert_eq!(stats.get_count, 2);
        assert_eq!(stats.remove_count, 2);
        assert_eq!(stats.spill_count, 2);
        assert_eq!(stats.compaction_count, 1);
        assert_eq!(stats.iterate_count, 1);
        assert!((stats.active_fill_ratio - 0.5).abs() < f32::EPSILON);
        assert!((stats.hit_rate - 0.75).abs() < f32::EPSILON);

        let metrics = map.export_prometheus();
        assert!(metrics.contains("spill_map_shard_count 2"));
        assert!(metrics.contains("spill_operation_spill_count 2"));
    }

    #[test]
    fn test_disabled_stats_recorder() {
        let map = create_test_map(2).with_stats_recorder(Arc::new(DisabledStatsRecorder));
        map.put(1, 1);
        let stats = map.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.put_count, 0);
    }

    #[test]
    fn test_from_iterator_and_debug() {
        let map: SpillMap<i32, i32> = (0..250).map(|i| (i, i)).collect();
        assert_eq!(map.len(), 250);
        assert_eq!(map.shard_count(), 3);
        let debug = format!("{:?}", map);
        assert!(debug.contains("size: 250"));
        assert!(debug.contains("shard_count: 3"));
    }

    #[test]
    fn test_concurrent_put_and_get() {
        let map = Arc::new(create_test_map(16));
        let threads = 8;
        let per_thread = 500;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let base = (t * per_thread) as i32;
                    for i in base..base + per_thread as i32 {
                        map.put(i, i * 2);
                        assert_eq!(map.get(&i), Some(i * 2));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), threads * per_thread);
        assert!(map.shard_sizes().iter().all(|&len| len <= 16));
    }
}
