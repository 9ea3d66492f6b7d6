// ==========================================
// 礼品分配系统 - 运行配置
// ==========================================

use crate::config::config_manager::ConfigError;
use serde::{Deserialize, Serialize};

/// 运行配置快照（运行开始后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftCalcConfig {
    /// 单儿童最多礼品数
    pub max_items: usize,
    /// 兜底补足下限
    pub min_items: usize,
    /// 兜底类别
    pub fallback_category: String,
    /// 工作协程数
    pub worker_count: usize,
    /// 单儿童价格上限（<= 0 表示不限）
    pub max_gift_price: f64,
    /// 运行总预算（<= 0 表示不限）
    pub total_budget: f64,
    pub report_version: String,
    /// 进度日志间隔（儿童数）
    pub progress_interval: usize,
    pub enable_metrics: bool,
    /// 严格模式: 未识别的需求名称视为输入错误
    pub strict_requirements: bool,
}

impl Default for GiftCalcConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            min_items: 3,
            fallback_category: "standard".to_string(),
            worker_count: 10,
            max_gift_price: 0.0,
            total_budget: 0.0,
            report_version: "1.0.0".to_string(),
            progress_interval: 1000,
            enable_metrics: false,
            strict_requirements: false,
        }
    }
}

impl GiftCalcConfig {
    /// 价格上限（未设置时为 None）
    pub fn price_ceiling(&self) -> Option<f64> {
        (self.max_gift_price > 0.0).then_some(self.max_gift_price)
    }

    pub fn budget_limit(&self) -> Option<f64> {
        (self.total_budget > 0.0).then_some(self.total_budget)
    }

    /// 校验
    ///
    /// # 规则
    /// - max_items >= 1
    /// - min_items <= max_items
    /// - worker_count >= 1
    /// - 价格/预算非负且有限
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::Validation("max_items 必须 >= 1".to_string()));
        }
        if self.min_items > self.max_items {
            return Err(ConfigError::Validation(format!(
                "min_items ({}) 不能大于 max_items ({})",
                self.min_items, self.max_items
            )));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Validation("worker_count 必须 >= 1".to_string()));
        }
        if self.fallback_category.trim().is_empty() {
            return Err(ConfigError::Validation("fallback_category 不能为空".to_string()));
        }
        for (name, value) in [("max_gift_price", self.max_gift_price), ("total_budget", self.total_budget)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!("{} 无效: {}", name, value)));
            }
        }
        Ok(())
    }
}
