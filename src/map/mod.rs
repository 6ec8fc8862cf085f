//! 分片表核心模块 - 实现溢出分片表及其配置

pub mod config;
pub mod spill_map;

pub use config::{SpillMapConfig, DEFAULT_SHARD_CAPACITY};
pub use spill_map::{SpillMap, SpillMapStats};

use once_cell::sync::Lazy;

/// 全局默认配置
pub static DEFAULT_CONFIG: Lazy<SpillMapConfig> = Lazy::new(SpillMapConfig::default);
