// ==========================================
// 礼品分配系统 - 运行报告
// ==========================================
// 职责: 单儿童结果、运行汇总、年龄分组分析、生产计划
// 序列化: snake_case 字段名 (JSON 报告)
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::child::Child;
use crate::domain::requirements::SpecialRequirements;
use crate::domain::types::{AgeGroup, ResultStatus, SelectionReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 取消结果的错误文本
pub const CANCELLED_ERROR: &str = "cancelled";

// ==========================================
// GiftSelection - 单件礼品选择
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftSelection {
    pub item: CatalogItem,
    pub reason: SelectionReason,
}

impl GiftSelection {
    pub fn new(item: CatalogItem, reason: SelectionReason) -> Self {
        Self { item, reason }
    }
}

// ==========================================
// CostSummary - 单儿童费用汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// 基础总价（未乘地区系数）
    pub total_cost: f64,
    pub total_weight: f64,
    pub coefficient: f64,
    /// round(total_cost * coefficient, 2)
    pub final_cost: f64,
    pub items_count: usize,
}

// ==========================================
// ChildResult - 单儿童处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResult {
    pub child_id: i64,
    pub child_name: String,
    pub age: i32,
    pub region: String,
    #[serde(default, skip_serializing_if = "SpecialRequirements::is_empty")]
    pub special_requirements: SpecialRequirements,
    pub selections: Vec<GiftSelection>,
    #[serde(flatten)]
    pub cost: CostSummary,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub budget_optimized: bool,
    #[serde(default)]
    pub over_budget: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChildResult {
    fn base(child: &Child, status: ResultStatus) -> Self {
        Self {
            child_id: child.id,
            child_name: child.name.clone(),
            age: child.age,
            region: child.region.clone(),
            special_requirements: child.requirements().clone(),
            selections: Vec::new(),
            cost: CostSummary::default(),
            status,
            warnings: Vec::new(),
            budget_optimized: false,
            over_budget: false,
            error: None,
        }
    }

    /// 成功结果
    pub fn success(child: &Child, selections: Vec<GiftSelection>, cost: CostSummary) -> Self {
        let mut result = Self::base(child, ResultStatus::Success);
        result.selections = selections;
        result.cost = cost;
        result
    }

    /// 失败结果（选择失败或处理异常）
    pub fn failed(child: &Child, error: impl Into<String>) -> Self {
        let mut result = Self::base(child, ResultStatus::Failed);
        result.error = Some(error.into());
        result
    }

    /// 已分发但因取消未处理
    pub fn cancelled(child: &Child) -> Self {
        let mut result = Self::base(child, ResultStatus::Cancelled);
        result.error = Some(CANCELLED_ERROR.to_string());
        result
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }
}

// ==========================================
// 报告参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wishes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    /// 单儿童价格上限（None 表示不限）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gift_price: Option<f64>,
    /// 运行总预算（None 表示不限）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<f64>,
    pub max_items: usize,
    pub min_items: usize,
    pub fallback_category: String,
    pub worker_count: usize,
    pub data_files: DataFiles,
}

// ==========================================
// ReportSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_children: usize,
    pub successful: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// 平均每名成功儿童的最终费用
    pub avg_cost_per_gift: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub total_weight: f64,
    pub total_items: usize,
    pub over_budget: usize,
    /// 总预算使用率 (%)，未设置总预算时为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_usage: Option<f64>,
}

// ==========================================
// AgeGroupAnalysis - 年龄分组分析
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroupAnalysis {
    pub age_group: AgeGroup,
    pub min_age: i32,
    pub max_age: i32,
    pub children_count: usize,
    pub total_cost: f64,
    pub average_cost: f64,
}

// ==========================================
// Report - 运行报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub parameters: ReportParameters,
    pub results: Vec<ChildResult>,
    pub summary: ReportSummary,
    pub total_cost: f64,
    #[serde(default)]
    pub age_group_analysis: Vec<AgeGroupAnalysis>,
}

impl Report {
    pub fn successful_results(&self) -> impl Iterator<Item = &ChildResult> {
        self.results.iter().filter(|r| r.is_success())
    }
}

// ==========================================
// ProductionPlan - 生产计划（按商品汇总）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub item_id: i64,
    pub name: String,
    pub category: String,
    pub quantity: usize,
    pub total_weight: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionPlan {
    pub lines: Vec<ProductionLine>,
    pub total_quantity: usize,
    pub total_weight: f64,
}

impl ProductionPlan {
    /// 汇总成功结果中全部已选商品，按商品ID排序
    pub fn from_report(report: &Report) -> Self {
        let mut lines: BTreeMap<i64, ProductionLine> = BTreeMap::new();

        for selection in report.successful_results().flat_map(|r| r.selections.iter()) {
            let item = &selection.item;
            let line = lines.entry(item.id).or_insert_with(|| ProductionLine {
                item_id: item.id,
                name: item.name.clone(),
                category: item.category.clone(),
                quantity: 0,
                total_weight: 0.0,
                total_cost: 0.0,
            });
            line.quantity += 1;
            line.total_weight += item.weight;
            line.total_cost += item.price;
        }

        let lines: Vec<ProductionLine> = lines.into_values().collect();
        let total_quantity = lines.iter().map(|l| l.quantity).sum();
        let total_weight = lines.iter().map(|l| l.total_weight).sum();

        Self {
            lines,
            total_quantity,
            total_weight,
        }
    }
}
