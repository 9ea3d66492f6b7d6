// ==========================================
// 礼品分配系统 - 引擎层诊断事件
// ==========================================
// 职责: 定义诊断事件发布 trait, 由调用方注入
// 说明: 引擎不持有全局日志状态, 所有诊断经由此端口输出
// ==========================================

use crate::domain::types::BatchState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ==========================================
// 诊断事件类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GiftEvent {
    /// 愿望商品在目录中不存在
    LookupMiss { child_id: i64, item_id: i64 },
    /// 愿望商品被合规/年龄过滤
    ItemFiltered {
        child_id: i64,
        item_id: i64,
        reasons: Vec<String>,
    },
    /// 愿望仓储查询失败（按无愿望处理）
    WishLookupFailed { child_id: i64, error: String },
    /// 地区系数回退为 1.0
    CoefficientDefaulted {
        child_id: i64,
        region: String,
        reason: String,
    },
    SelectionFailed { child_id: i64, reason: String },
    BudgetOptimized {
        child_id: i64,
        before: f64,
        after: f64,
        substituted: usize,
        removed: usize,
    },
    OptimizationInfeasible {
        child_id: i64,
        final_cost: f64,
        ceiling: f64,
    },
    /// 单儿童处理异常（panic 已隔离）
    ChildFault { child_id: i64, message: String },
    Progress { processed: usize, total: usize },
    StateChanged { from: BatchState, to: BatchState },
}

impl GiftEvent {
    /// 事件类型标识
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftEvent::LookupMiss { .. } => "LookupMiss",
            GiftEvent::ItemFiltered { .. } => "ItemFiltered",
            GiftEvent::WishLookupFailed { .. } => "WishLookupFailed",
            GiftEvent::CoefficientDefaulted { .. } => "CoefficientDefaulted",
            GiftEvent::SelectionFailed { .. } => "SelectionFailed",
            GiftEvent::BudgetOptimized { .. } => "BudgetOptimized",
            GiftEvent::OptimizationInfeasible { .. } => "OptimizationInfeasible",
            GiftEvent::ChildFault { .. } => "ChildFault",
            GiftEvent::Progress { .. } => "Progress",
            GiftEvent::StateChanged { .. } => "StateChanged",
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 诊断事件发布者
///
/// 发布不可失败, 实现方自行吞掉内部错误
pub trait GiftEventPublisher: Send + Sync {
    fn publish(&self, event: &GiftEvent);
}

/// 空操作事件发布者
///
/// 用于不需要诊断输出的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl GiftEventPublisher for NoOpEventPublisher {
    fn publish(&self, _event: &GiftEvent) {}
}

/// tracing 事件发布者
///
/// 将诊断事件转为结构化日志
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

impl GiftEventPublisher for TracingEventPublisher {
    fn publish(&self, event: &GiftEvent) {
        match event {
            GiftEvent::LookupMiss { child_id, item_id } => {
                warn!(child_id, item_id, "愿望商品不在目录中, 已跳过");
            }
            GiftEvent::ItemFiltered {
                child_id,
                item_id,
                reasons,
            } => {
                debug!(child_id, item_id, reasons = ?reasons, "愿望商品未通过过滤");
            }
            GiftEvent::WishLookupFailed { child_id, error } => {
                warn!(child_id, error = %error, "愿望查询失败, 按无愿望处理");
            }
            GiftEvent::CoefficientDefaulted {
                child_id,
                region,
                reason,
            } => {
                warn!(child_id, region = %region, reason = %reason, "地区系数回退为 1.0");
            }
            GiftEvent::SelectionFailed { child_id, reason } => {
                warn!(child_id, reason = %reason, "礼品选择失败");
            }
            GiftEvent::BudgetOptimized {
                child_id,
                before,
                after,
                substituted,
                removed,
            } => {
                info!(child_id, before, after, substituted, removed, "预算优化已应用");
            }
            GiftEvent::OptimizationInfeasible {
                child_id,
                final_cost,
                ceiling,
            } => {
                warn!(child_id, final_cost, ceiling, "预算优化不可行, 保留原选择");
            }
            GiftEvent::ChildFault { child_id, message } => {
                warn!(child_id, message = %message, "儿童处理异常, 记为失败");
            }
            GiftEvent::Progress { processed, total } => {
                info!(processed, total, "处理进度");
            }
            GiftEvent::StateChanged { from, to } => {
                info!(from = %from, to = %to, "批次状态变更");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tagged() {
        let event = GiftEvent::LookupMiss {
            child_id: 1,
            item_id: 99,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "lookup_miss");
        assert_eq!(value["item_id"], 99);
        assert_eq!(event.as_str(), "LookupMiss");
    }

    #[test]
    fn test_publishers_accept_all_events() {
        let events = vec![
            GiftEvent::Progress { processed: 1, total: 2 },
            GiftEvent::StateChanged {
                from: BatchState::Idle,
                to: BatchState::Dispatching,
            },
        ];
        for event in &events {
            NoOpEventPublisher.publish(event);
            TracingEventPublisher.publish(event);
        }
    }
}
