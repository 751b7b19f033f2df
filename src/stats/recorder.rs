// src/stats/recorder.rs
//! 统计记录器接口 - 定义统一统计API

use std::{sync::Arc, time::Duration};

use crate::{
    stats::{
        migration::{
            DisabledMigrationRecorder, MigrationAccumulatedSnapshot, MigrationRecorder,
            MigrationSnapshot, MigrationStats,
        },
        operation::{
            AtomicOperationStats, DisabledOperationRecorder, OperationRecorder,
            OperationStatsSnapshot,
        },
    },
    types::OperationType,
};

/// 统计记录器特征
pub trait StatsRecorder: Send + Sync {
    /// 记录操作
    fn record_operation(&self, op_type: OperationType, duration: Duration, success: bool);

    /// 获取操作统计接口
    fn operation_stats(&self) -> &dyn OperationRecorder;

    /// 获取迁移统计接口
    fn migration_stats(&self) -> &dyn MigrationRecorder;

    /// 记录一次完成的重新散列
    fn record_migration(&self, snapshot: MigrationSnapshot) {
        self.migration_stats().start_migration();
        self.migration_stats().record_migration(snapshot);
    }

    /// 重置所有统计
    fn reset(&self) {
        self.operation_stats().reset();
        self.migration_stats().reset();
    }

    /// 导出Prometheus格式指标
    fn export_prometheus(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.operation_stats().export_prometheus());
        output.push_str(&self.migration_stats().export_prometheus());
        output
    }

    /// 获取操作统计快照
    fn operation_stats_snapshot(&self) -> OperationStatsSnapshot {
        self.operation_stats().snapshot()
    }

    /// 获取迁移统计快照
    fn migration_stats_snapshot(&self) -> MigrationAccumulatedSnapshot {
        self.migration_stats().snapshot()
    }
}

/// 全局统计记录器实现
#[derive(Debug, Default)]
pub struct GlobalStatsRecorder {
    operation: AtomicOperationStats,
    migration: MigrationStats,
}

impl GlobalStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsRecorder for GlobalStatsRecorder {
    fn record_operation(&self, op_type: OperationType, duration: Duration, success: bool) {
        self.operation.record(op_type, duration, success);
    }

    fn operation_stats(&self) -> &dyn OperationRecorder {
        &self.operation
    }

    fn migration_stats(&self) -> &dyn MigrationRecorder {
        &self.migration
    }
}

/// 禁用统计的记录器
#[derive(Debug, Default)]
pub struct DisabledStatsRecorder;

impl StatsRecorder for DisabledStatsRecorder {
    fn record_operation(&self, _op_type: OperationType, _duration: Duration, _success: bool) {}
    fn operation_stats(&self) -> &dyn OperationRecorder { &DisabledOperationRecorder }
    fn migration_stats(&self) -> &dyn MigrationRecorder { &DisabledMigrationRecorder }
}

/// 统计记录器工厂
pub struct StatsRecorderFactory;

impl StatsRecorderFactory {
    /// 创建默认记录器
    pub fn create_default() -> Arc<dyn StatsRecorder> {
        Arc::new(GlobalStatsRecorder::new())
    }

    /// 创建禁用统计的记录器
    pub fn create_disabled() -> Arc<dyn StatsRecorder> {
        Arc::new(DisabledStatsRecorder)
    }

    /// 创建带自定义组件的记录器
    pub fn create_custom(
        operation: impl OperationRecorder + 'static,
        migration: impl MigrationRecorder + 'static,
    ) -> Arc<dyn StatsRecorder> {
        Arc::new(CustomStatsRecorder {
            operation: Box::new(operation),
            migration: Box::new(migration),
        })
    }
}

/// 自定义统计记录器
struct CustomStatsRecorder {
    operation: Box<dyn OperationRecorder>,
    migration: Box<dyn MigrationRecorder>,
}

impl StatsRecorder for CustomStatsRecorder {
    fn record_operation(&self, op_type: OperationType, duration: Duration, success: bool) {
        self.operation.record(op_type, duration, success);
    }

    fn operation_stats(&self) -> &dyn OperationRecorder {
        self.operation.as_ref()
    }

    fn migration_stats(&self) -> &dyn MigrationRecorder {
        self.migration.as_ref()
    }
}
