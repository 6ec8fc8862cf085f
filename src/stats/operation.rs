// src/stats/operation.rs
//! 操作统计 - 跟踪溢出分片表操作次数与耗时

use crate::types::OperationType;
use std::{
    fmt::Write as _,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// 操作统计快照
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationStatsSnapshot {
    pub put_count: u64,
    pub get_count: u64,
    pub remove_count: u64,
    pub spill_count: u64,
    pub compaction_count: u64,
    pub iterate_count: u64,
    pub statistics_count: u64,
    /// 查询/删除命中次数
    pub hit_count: u64,
    /// 查询/删除未命中次数
    pub miss_count: u64,
    pub total_duration: u64, // 纳秒
}

impl OperationStatsSnapshot {
    /// 按操作类型取计数
    pub fn count(&self, op_type: OperationType) -> u64 {
        match op_type {
            OperationType::Put => self.put_count,
            OperationType::Get => self.get_count,
            OperationType::Remove => self.remove_count,
            OperationType::Spill => self.spill_count,
            OperationType::Compaction => self.compaction_count,
            OperationType::Iterate => self.iterate_count,
            OperationType::Statistics => self.statistics_count,
        }
    }

    /// 命中率，无查询时为0
    pub fn hit_rate(&self) -> f32 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f32 / total as f32
        }
    }
}

/// 原子操作统计
#[derive(Debug, Default)]
pub struct AtomicOperationStats {
    put_count: AtomicU64,
    get_count: AtomicU64,
    remove_count: AtomicU64,
    spill_count: AtomicU64,
    compaction_count: AtomicU64,
    iterate_count: AtomicU64,
    statistics_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    total_duration: AtomicU64, // 纳秒
}

impl AtomicOperationStats {
    /// 创建新统计
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, op_type: OperationType) -> &AtomicU64 {
        match op_type {
            OperationType::Put => &self.put_count,
            OperationType::Get => &self.get_count,
            OperationType::Remove => &self.remove_count,
            OperationType::Spill => &self.spill_count,
            OperationType::Compaction => &self.compaction_count,
            OperationType::Iterate => &self.iterate_count,
            OperationType::Statistics => &self.statistics_count,
        }
    }

    /// 记录操作
    pub fn record(&self, op_type: OperationType, duration: Duration, success: bool) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.counter(op_type).fetch_add(1, Ordering::Relaxed);
        self.total_duration.fetch_add(nanos, Ordering::Relaxed);

        // 只有查找类操作区分命中
        if matches!(op_type, OperationType::Get | OperationType::Remove) {
            if success {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
            } else {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// 仅增加计数，不计耗时
    pub fn record_count(&self, op_type: OperationType) {
        self.counter(op_type).fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OperationStatsSnapshot {
        OperationStatsSnapshot {
            put_count: self.put_count.load(Ordering::Relaxed),
            get_count: self.get_count.load(Ordering::Relaxed),
            remove_count: self.remove_count.load(Ordering::Relaxed),
            spill_count: self.spill_count.load(Ordering::Relaxed),
            compaction_count: self.compaction_count.load(Ordering::Relaxed),
            iterate_count: self.iterate_count.load(Ordering::Relaxed),
            statistics_count: self.statistics_count.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            total_duration: self.total_duration.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for op in OperationType::ALL {
            self.counter(op).store(0, Ordering::Relaxed);
        }
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
        self.total_duration.store(0, Ordering::Relaxed);
    }

    /// 导出Prometheus格式指标
    pub fn export_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        for op in OperationType::ALL {
            let name = op.as_str();
            let _ = writeln!(output, "# HELP spill_operation_{name}_count Total {name} operations");
            let _ = writeln!(output, "# TYPE spill_operation_{name}_count counter");
            let _ = writeln!(output, "spill_operation_{name}_count {}", snapshot.count(op));
        }

        output.push_str("# HELP spill_operation_hit_count Lookups that found the key\n");
        output.push_str("# TYPE spill_operation_hit_count counter\n");
        let _ = writeln!(output, "spill_operation_hit_count {}", snapshot.hit_count);

        output.push_str("# HELP spill_operation_miss_count Lookups that missed the key\n");
        output.push_str("# TYPE spill_operation_miss_count counter\n");
        let _ = writeln!(output, "spill_operation_miss_count {}", snapshot.miss_count);

        output.push_str("# HELP spill_operation_total_duration Total operation duration (ns)\n");
        output.push_str("# TYPE spill_operation_total_duration counter\n");
        let _ = writeln!(output, "spill_operation_total_duration {}", snapshot.total_duration);

        output
    }
}
