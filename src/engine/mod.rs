// ==========================================
// 礼品分配系统 - 引擎层
// ==========================================
// 职责: 合规判定 / 目录过滤 / 礼品选择 / 定价 / 预算优化 / 批次编排
// 红线: 引擎不持有全局状态, 诊断经由事件端口输出
// ==========================================

pub mod aggregator;
pub mod budget_optimizer;
pub mod catalog_filter;
pub mod compliance;
pub mod compliance_core;
pub mod error;
pub mod events;
pub mod gift_selector;
pub mod orchestrator;
pub mod price_calculator;
pub mod repositories;
pub mod worker_pool;

// 重导出核心引擎
pub use aggregator::{ReportAggregator, ReportMeta};
pub use budget_optimizer::{BudgetOptimizer, OptimizationOutcome};
pub use catalog_filter::{AdmissionCheck, CatalogFilter};
pub use compliance::ComplianceChecker;
pub use compliance_core::ComplianceCore;
pub use error::{EngineError, EngineResult};
pub use events::{GiftEvent, GiftEventPublisher, NoOpEventPublisher, TracingEventPublisher};
pub use gift_selector::{GiftSelector, SelectionOutcome};
pub use orchestrator::BatchOrchestrator;
pub use price_calculator::{PriceCalculator, PriceQuote};
pub use repositories::GiftRepositories;
pub use worker_pool::{PoolHandle, PoolStats, WorkerPool};
