// src/stats/operation.rs
//! 操作统计 - 跟踪混合哈希表各类操作的次数与耗时

use crate::types::OperationType;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// 操作统计接口
pub trait OperationRecorder: Send + Sync {
    /// 记录操作
    fn record(&self, op_type: OperationType, duration: Duration, success: bool);

    /// 获取操作统计快照
    fn snapshot(&self) -> OperationStatsSnapshot;

    /// 重置统计
    fn reset(&self);

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String;
}

/// 操作统计快照
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationStatsSnapshot {
    pub insert_count: u64,
    pub search_count: u64,
    pub remove_count: u64,
    pub resize_count: u64,
    pub mode_switch_count: u64,
    pub clear_count: u64,
    pub read_count: u64,
    pub write_count: u64,
    /// 返回失败的操作数 (重复键、键不存在、表满等)
    pub failure_count: u64,
    pub total_duration: u64, // 纳秒
}

impl OperationStatsSnapshot {
    /// 指定操作类型的次数
    pub fn count(&self, op_type: OperationType) -> u64 {
        match op_type {
            OperationType::Insert => self.insert_count,
            OperationType::Search => self.search_count,
            OperationType::Remove => self.remove_count,
            OperationType::Resize => self.resize_count,
            OperationType::ModeSwitch => self.mode_switch_count,
            OperationType::Clear => self.clear_count,
        }
    }

    /// 全部操作次数
    pub fn total(&self) -> u64 {
        self.read_count + self.write_count
    }

    /// 平均耗时
    pub fn average_duration(&self) -> Duration {
        match self.total() {
            0 => Duration::ZERO,
            total => Duration::from_nanos(self.total_duration / total),
        }
    }
}

/// 原子操作统计
#[derive(Debug, Default)]
pub struct AtomicOperationStats {
    insert_count: AtomicU64,
    search_count: AtomicU64,
    remove_count: AtomicU64,
    resize_count: AtomicU64,
    mode_switch_count: AtomicU64,
    clear_count: AtomicU64,
    read_count: AtomicU64,
    write_count: AtomicU64,
    failure_count: AtomicU64,
    total_duration: AtomicU64, // 纳秒
}

impl AtomicOperationStats {
    /// 创建新统计
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, op_type: OperationType) -> &AtomicU64 {
        match op_type {
            OperationType::Insert => &self.insert_count,
            OperationType::Search => &self.search_count,
            OperationType::Remove => &self.remove_count,
            OperationType::Resize => &self.resize_count,
            OperationType::ModeSwitch => &self.mode_switch_count,
            OperationType::Clear => &self.clear_count,
        }
    }
}

impl OperationRecorder for AtomicOperationStats {
    fn record(&self, op_type: OperationType, duration: Duration, success: bool) {
        let nanos = duration.as_nanos() as u64;

        self.counter(op_type).fetch_add(1, Ordering::Relaxed);
        if op_type.is_read() {
            self.read_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.write_count.fetch_add(1, Ordering::Relaxed);
        }

        // 更新总耗时
        self.total_duration.fetch_add(nanos, Ordering::Relaxed);

        if !success {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> OperationStatsSnapshot {
        OperationStatsSnapshot {
            insert_count: self.insert_count.load(Ordering::Relaxed),
            search_count: self.search_count.load(Ordering::Relaxed),
            remove_count: self.remove_count.load(Ordering::Relaxed),
            resize_count: self.resize_count.load(Ordering::Relaxed),
            mode_switch_count: self.mode_switch_count.load(Ordering::Relaxed),
            clear_count: self.clear_count.load(Ordering::Relaxed),
            read_count: self.read_count.load(Ordering::Relaxed),
            write_count: self.write_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            total_duration: self.total_duration.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for op in OperationType::ALL {
            self.counter(op).store(0, Ordering::Relaxed);
        }
        self.read_count.store(0, Ordering::Relaxed);
        self.write_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.total_duration.store(0, Ordering::Relaxed);
    }

    fn export_prometheus(&self) -> String {
        let mut output = String::new();

        for op in OperationType::ALL {
            let count = self.counter(op).load(Ordering::Relaxed);
            output.push_str(&format!(
                "# HELP hybrid_operation_{}_count Total {} operations\n",
                op.as_str(),
                op.as_str()
            ));
            output.push_str(&format!("# TYPE hybrid_operation_{}_count counter\n", op.as_str()));
            output.push_str(&format!("hybrid_operation_{}_count {}\n", op.as_str(), count));
        }

        // 添加总持续时间和失败计数
        output.push_str("# HELP hybrid_operation_total_duration Total operation duration (ns)\n");
        output.push_str("# TYPE hybrid_operation_total_duration counter\n");
        output.push_str(&format!(
            "hybrid_operation_total_duration {}\n",
            self.total_duration.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP hybrid_operation_failure_count Operations that returned failure\n");
        output.push_str("# TYPE hybrid_operation_failure_count counter\n");
        output.push_str(&format!(
            "hybrid_operation_failure_count {}\n",
            self.failure_count.load(Ordering::Relaxed)
        ));

        output
    }
}

/// 禁用操作统计实现
#[derive(Debug, Default)]
pub struct DisabledOperationRecorder;

impl OperationRecorder for DisabledOperationRecorder {
    fn record(&self, _op_type: OperationType, _duration: Duration, _success: bool) {}
    fn snapshot(&self) -> OperationStatsSnapshot { OperationStatsSnapshot::default() }
    fn reset(&self) {}
    fn export_prometheus(&self) -> String { String::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_reads_and_writes() {
        let stats = AtomicOperationStats::new();
        stats.record(OperationType::Insert, Duration::from_nanos(100), true);
        stats.record(OperationType::Insert, Duration::from_nanos(100), false);
        stats.record(OperationType::Search, Duration::from_nanos(50), true);
        stats.record(OperationType::ModeSwitch, Duration::from_nanos(750), true);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.count(OperationType::Insert), 2);
        assert_eq!(snapshot.count(OperationType::ModeSwitch), 1);
        assert_eq!(snapshot.read_count, 1);
        assert_eq!(snapshot.write_count, 3);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.total_duration, 1000);
        assert_eq!(snapshot.average_duration(), Duration::from_nanos(250));

        stats.reset();
        assert_eq!(stats.snapshot(), OperationStatsSnapshot::default());
    }

    #[test]
    fn test_prometheus_export() {
        let stats = AtomicOperationStats::new();
        stats.record(OperationType::Remove, Duration::from_nanos(10), true);

        let output = stats.export_prometheus();
        assert!(output.contains("hybrid_operation_remove_count 1\n"));
        assert!(output.contains("hybrid_operation_mode_switch_count 0\n"));
        assert!(output.contains("# TYPE hybrid_operation_failure_count counter"));
        assert!(DisabledOperationRecorder.export_prometheus().is_empty());
    }
}
