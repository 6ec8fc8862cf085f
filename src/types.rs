//! 核心类型定义 - 共享类型和接口

use std::fmt;

/// 写入策略 - 决定已存在的键如何被覆盖
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritePolicy {
    /// 总是写入活跃分片，不检查其他分片
    ///
    /// 已溢出到旧分片的键再次写入时会在活跃分片中产生副本。
    /// 活跃分片已满时覆盖其中已有的键也一样：写入先溢出到新分片，
    /// 旧值留在原分片，查询仍返回旧值。
    /// 查询返回下标最小的副本，单次删除只移除一个副本。
    #[default]
    ActiveShard,
    /// 先扫描所有分片，命中则原地覆盖；删除会移除所有副本
    UpdateInPlace,
}

impl WritePolicy {
    /// 转换为字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePolicy::ActiveShard => "active_shard",
            WritePolicy::UpdateInPlace => "update_in_place",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// 写入操作
    Put,
    /// 查询操作
    Get,
    /// 删除操作
    Remove,
    /// 分片溢出（新建分片）
    Spill,
    /// 空分片回收
    Compaction,
    /// 迭代操作
    Iterate,
    /// 统计操作
    Statistics,
}

impl OperationType {
    /// 所有操作类型，按导出顺序排列
    pub const ALL: [OperationType; 7] = [
        OperationType::Put,
        OperationType::Get,
        OperationType::Remove,
        OperationType::Spill,
        OperationType::Compaction,
        OperationType::Iterate,
        OperationType::Statistics,
    ];

    /// 判断是否为读操作
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            OperationType::Get | OperationType::Iterate | OperationType::Statistics
        )
    }

    /// 判断是否为写操作
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }

    /// 转换为字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Put => "put",
            OperationType::Get => "get",
            OperationType::Remove => "remove",
            OperationType::Spill => "spill",
            OperationType::Compaction => "compaction",
            OperationType::Iterate => "iterate",
            OperationType::Statistics => "statistics",
        }
    }
}

/// 单个分片的快照信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardInfo {
    /// 分片在序列中的下标
    pub index: usize,
    /// 分片内条目数
    pub len: usize,
    /// 是否为活跃分片
    pub is_active: bool,
}

impl fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_active { "*" } else { "" };
        write!(f, "shard[{}{}]={}", self.index, marker, self.len)
    }
}
