// ==========================================
// 礼品分配系统 - 核心库
// ==========================================
// 技术栈: Rust + Tokio
// 系统定位: 批量礼品分配（合规筛选 → 选择 → 定价 → 预算优化）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 只读数据端口
pub mod repository;

// 引擎层 - 业务规则与批次编排
pub mod engine;

// 文件适配层 - 数据加载与报告输出
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AgeGroup, BatchState, ResultStatus, SelectionReason, WishPriority};

// 领域实体
pub use domain::{
    CatalogItem, Child, ChildResult, GiftSelection, ProductionPlan, Region, Report, SpecialRequirements,
    Wish,
};

// 引擎
pub use engine::{
    BatchOrchestrator, BudgetOptimizer, CatalogFilter, ComplianceChecker, EngineError, GiftEvent,
    GiftEventPublisher, GiftRepositories, GiftSelector, PriceCalculator, WorkerPool,
};

// 配置
pub use config::{ConfigManager, GiftCalcConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "礼品分配系统";
