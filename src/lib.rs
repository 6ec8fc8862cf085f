//! 容量受限分片的溢出式键值容器
//!
//! 由若干固定容量的哈希分片组成，对外表现为一个无上限的键值表。
//! 活跃分片写满后新条目溢出到新建分片，单个分片的条目数始终受限，
//! 从而限制单表扩容（rehash）的代价。
//!
//! ## 主要特性
//! - 分片容量可配置，非法容量自动修正为默认值
//! - 删除使非活跃分片变空时自动回收该分片
//! - 单把读写锁保护全部状态，可在线程间共享
//! - 可选的写入策略，决定已溢出的键如何被覆盖
//! - 操作统计与Prometheus格式导出
//!
//! ## 快速开始
//!
//! ```rust
//! use spill_map::SpillMap;
//!
//! let map: SpillMap<i32, i32> = SpillMap::new(5);
//! for i in 0..10 {
//!     map.put(i, i * 10);
//! }
//! assert_eq!(map.shard_count(), 2);
//! assert_eq!(map.get(&3), Some(30));
//!
//! assert!(map.remove(&3));
//! assert_eq!(map.len(), 9);
//!
//! let mut visited = 0;
//! map.for_each(|_, _| {
//!     visited += 1;
//!     true
//! });
//! assert_eq!(visited, 9);
//! ```

#![warn(clippy::all)]
#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}
// 核心模块导出
pub mod error;
pub mod types;
pub mod map;
pub mod stats;

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
};

// 公共接口导出
pub use crate::{
    map::{
        SpillMap,
        SpillMapConfig,
        SpillMapStats,
        DEFAULT_CONFIG,
        DEFAULT_SHARD_CAPACITY,
    },
    stats::{
        StatsRecorder,
        AtomicStatsRecorder,
        DisabledStatsRecorder,
        OperationStatsSnapshot,
    },
    error::SpillError,
    types::{OperationType, ShardInfo, WritePolicy},
};

// 简化默认类型别名
pub type DefaultSpillMap = SpillMap<String, String>;

// 便捷功能函数

/// 批量写入，返回写入条数
///
/// 每个条目单独加写锁，期间其他线程的读写可以穿插进来。
pub fn batch_insert<K, V, S>(
    map: &SpillMap<K, V, S>,
    items: impl IntoIterator<Item = (K, V)>,
) -> usize
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    let mut count = 0;
    for (k, v) in items {
        map.put(k, v);
        count += 1;
    }
    log_debug!("batch inserted {} entries", count);
    count
}

/// 批量查询
pub fn batch_get<'a, K, V, S, Q>(
    map: &SpillMap<K, V, S>,
    keys: impl IntoIterator<Item = &'a Q>,
) -> Vec<Option<V>>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized + 'a,
    V: Clone,
    S: BuildHasher + Clone,
{
    keys.into_iter().map(|k| map.get(k)).collect()
}
