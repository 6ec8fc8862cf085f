// src/stats/recorder.rs
//! 统计记录器接口 - 定义统一统计API

use std::time::Duration;

use crate::{
    stats::operation::{AtomicOperationStats, OperationStatsSnapshot},
    types::OperationType,
};

/// 统计记录器特征
pub trait StatsRecorder: Send + Sync {
    /// 记录操作
    fn record_operation(&self, op_type: OperationType, duration: Duration, success: bool);

    /// 记录操作计数
    fn record_operation_count(&self, op_type: OperationType);

    /// 获取操作统计快照
    fn snapshot(&self) -> OperationStatsSnapshot;

    /// 重置所有统计
    fn reset(&self);

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String;
}

/// 基于原子计数器的记录器
#[derive(Debug, Default)]
pub struct AtomicStatsRecorder {
    operation: AtomicOperationStats,
}

impl AtomicStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsRecorder for AtomicStatsRecorder {
    fn record_operation(&self, op_type: OperationType, duration: Duration, success: bool) {
        self.operation.record(op_type, duration, success);
    }

    fn record_operation_count(&self, op_type: OperationType) {
        self.operation.record_count(op_type);
    }

    fn snapshot(&self) -> OperationStatsSnapshot {
        self.operation.snapshot()
    }

    fn reset(&self) {
        self.operation.reset();
    }

    fn export_prometheus(&self) -> String {
        self.operation.export_prometheus()
    }
}

/// 禁用统计实现
#[derive(Debug, Default)]
pub struct DisabledStatsRecorder;

impl StatsRecorder for DisabledStatsRecorder {
    fn record_operation(&self, _op_type: OperationType, _duration: Duration, _success: bool) {}
    fn record_operation_count(&self, _op_type: OperationType) {}
    fn snapshot(&self) -> OperationStatsSnapshot { OperationStatsSnapshot::default() }
    fn reset(&self) {}
    fn export_prometheus(&self) -> String { String::new() }
}
