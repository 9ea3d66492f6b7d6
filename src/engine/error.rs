// ==========================================
// 礼品分配系统 - 引擎层错误类型
// ==========================================
// 分级:
// - Input: 致命, 分发前中止运行
// - LookupMiss: 本地恢复, 仅诊断
// - SelectionFailure: 记录到该儿童结果, 批次继续
// - OptimizationInfeasible: 警告, 保留原选择
// 取消不经由错误: 以 ResultStatus::Cancelled 记录到结果
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::BatchState;
use thiserror::Error;

/// 选择失败的标准原因
pub const NO_SUITABLE_GIFTS: &str = "no suitable gifts";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("输入数据错误: {0}")]
    Input(String),

    #[error("目录中不存在商品: item_id={item_id}")]
    LookupMiss { item_id: i64 },

    #[error("{reason}")]
    SelectionFailure { child_id: i64, reason: String },

    #[error("预算优化不可行: child_id={child_id}, final_cost={final_cost:.2}, ceiling={ceiling:.2}")]
    OptimizationInfeasible {
        child_id: i64,
        final_cost: f64,
        ceiling: f64,
    },

    #[error("批次运行中, 不允许修改: state={0}")]
    BatchRunning(BatchState),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn no_suitable_gifts(child_id: i64) -> Self {
        EngineError::SelectionFailure {
            child_id,
            reason: NO_SUITABLE_GIFTS.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
