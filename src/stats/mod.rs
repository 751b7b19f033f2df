//! 统计模块 - 统一管理哈希表性能指标

pub mod recorder;
pub mod operation;
pub mod migration;

use std::sync::Arc;

pub use recorder::{
    DisabledStatsRecorder, GlobalStatsRecorder, StatsRecorder, StatsRecorderFactory,
};
pub use operation::{AtomicOperationStats, OperationRecorder, OperationStatsSnapshot};
pub use migration::{
    MigrationAccumulatedSnapshot, MigrationRecorder, MigrationSnapshot, MigrationStats,
};

/// 全局统计记录器，多个表可以通过 `HybridMap::with_stats_recorder(global_recorder())` 共享
pub static GLOBAL_STATS: once_cell::sync::Lazy<Arc<dyn StatsRecorder>> =
    once_cell::sync::Lazy::new(|| Arc::new(GlobalStatsRecorder::new()));

/// 获取全局统计记录器
pub fn global_recorder() -> Arc<dyn StatsRecorder> {
    Arc::clone(&GLOBAL_STATS)
}

/// 获取全局操作统计快照
pub fn operation_snapshot() -> OperationStatsSnapshot {
    GLOBAL_STATS.operation_stats_snapshot()
}

/// 获取全局迁移统计快照
pub fn migration_snapshot() -> MigrationAccumulatedSnapshot {
    GLOBAL_STATS.migration_stats_snapshot()
}

/// 重置全局统计
pub fn reset_stats() {
    GLOBAL_STATS.reset();
}

/// 导出全局Prometheus格式指标
pub fn export_prometheus() -> String {
    GLOBAL_STATS.export_prometheus()
}
