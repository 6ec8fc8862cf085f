//! 统计模块 - 统一管理溢出分片表的操作指标

pub mod recorder;
pub mod operation;

pub use recorder::{StatsRecorder, AtomicStatsRecorder, DisabledStatsRecorder};
pub use operation::OperationStatsSnapshot;
