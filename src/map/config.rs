//! 溢出分片表配置

use crate::{error::SpillError, types::WritePolicy};

/// 默认单分片容量
pub const DEFAULT_SHARD_CAPACITY: usize = 100;

/// 溢出分片表配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpillMapConfig {
    /// 单个分片的最大条目数，达到后写入会溢出到新分片
    pub shard_capacity: usize,
    /// 已存在键的写入策略
    pub write_policy: WritePolicy,
    /// 新建分片时是否按容量预分配
    pub preallocate_shards: bool,
}

impl Default for SpillMapConfig {
    fn default() -> Self {
        Self {
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            write_policy: WritePolicy::default(),
            preallocate_shards: false,
        }
    }
}

impl SpillMapConfig {
    /// 以指定分片容量创建配置
    pub fn new(shard_capacity: usize) -> Self {
        Self {
            shard_capacity,
            ..Self::default()
        }
    }

    pub fn with_shard_capacity(mut self, shard_capacity: usize) -> Self {
        self.shard_capacity = shard_capacity;
        self
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn with_preallocate_shards(mut self, preallocate: bool) -> Self {
        self.preallocate_shards = preallocate;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), SpillError> {
        if self.shard_capacity == 0 {
            return Err(SpillError::InvalidConfig {
                reason: "分片容量必须大于0".to_string(),
            });
        }
        Ok(())
    }

    /// 修正非法配置，返回是否发生了修正
    pub(crate) fn normalize(&mut self) -> bool {
        if self.shard_capacity == 0 {
            self.shard_capacity = DEFAULT_SHARD_CAPACITY;
            return true;
        }
        false
    }
}
