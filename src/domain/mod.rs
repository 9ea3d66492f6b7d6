// ==========================================
// 礼品分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、需求枚举与报告结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod child;
pub mod region;
pub mod report;
pub mod requirements;
pub mod types;
pub mod wish;

// 重导出核心类型
pub use catalog::{CatalogItem, ItemMetadata};
pub use child::Child;
pub use region::{Region, DEFAULT_COEFFICIENT};
pub use report::{
    AgeGroupAnalysis, ChildResult, CostSummary, DataFiles, GiftSelection, ProductionLine,
    ProductionPlan, Report, ReportParameters, ReportSummary,
};
pub use requirements::{
    DietaryRequirement, MedicalRequirement, OtherRequirement, Requirement, RequirementCategory,
    SafetyRequirement, SpecialRequirements,
};
pub use types::{AgeGroup, BatchState, ResultStatus, SelectionReason, WishPriority};
pub use wish::Wish;
