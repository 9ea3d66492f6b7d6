// ==========================================
// 礼品分配系统 - 领域类型定义
// ==========================================
// 职责: 愿望优先级、选择原因、批次状态、年龄分组等枚举
// 红线: 等级制,不是评分制
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 愿望优先级 (Wish Priority)
// ==========================================
// 排序: High < Medium < Low (按处理顺序)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishPriority {
    High,   // 高
    Medium, // 中
    Low,    // 低
}

impl WishPriority {
    /// 按处理顺序列出全部优先级
    pub const ALL: [WishPriority; 3] = [WishPriority::High, WishPriority::Medium, WishPriority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            WishPriority::High => "high",
            WishPriority::Medium => "medium",
            WishPriority::Low => "low",
        }
    }
}

impl fmt::Display for WishPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WishPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(WishPriority::High),
            "medium" => Ok(WishPriority::Medium),
            "low" => Ok(WishPriority::Low),
            other => Err(format!("未知的愿望优先级: {}", other)),
        }
    }
}

// ==========================================
// 选择原因 (Selection Reason)
// ==========================================
// 序列化格式: "<priority>_priority_wish" / "basic_gift"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionReason {
    #[serde(rename = "high_priority_wish")]
    HighPriorityWish,
    #[serde(rename = "medium_priority_wish")]
    MediumPriorityWish,
    #[serde(rename = "low_priority_wish")]
    LowPriorityWish,
    #[serde(rename = "basic_gift")]
    BasicGift,
}

impl SelectionReason {
    pub fn from_priority(priority: WishPriority) -> Self {
        match priority {
            WishPriority::High => SelectionReason::HighPriorityWish,
            WishPriority::Medium => SelectionReason::MediumPriorityWish,
            WishPriority::Low => SelectionReason::LowPriorityWish,
        }
    }

    /// 来源愿望的优先级（兜底礼品返回 None）
    pub fn wish_priority(&self) -> Option<WishPriority> {
        match self {
            SelectionReason::HighPriorityWish => Some(WishPriority::High),
            SelectionReason::MediumPriorityWish => Some(WishPriority::Medium),
            SelectionReason::LowPriorityWish => Some(WishPriority::Low),
            SelectionReason::BasicGift => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SelectionReason::BasicGift)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionReason::HighPriorityWish => "high_priority_wish",
            SelectionReason::MediumPriorityWish => "medium_priority_wish",
            SelectionReason::LowPriorityWish => "low_priority_wish",
            SelectionReason::BasicGift => "basic_gift",
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 批次状态 (Batch State)
// ==========================================
// 状态流转: IDLE → DISPATCHING → COLLECTING → FINALIZED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    Idle,        // 空闲
    Dispatching, // 任务分发中
    Collecting,  // 结果收集中
    Finalized,   // 报告已生成
}

impl BatchState {
    /// 批次是否正在运行（运行期间预算上限不可修改）
    pub fn is_running(&self) -> bool {
        matches!(self, BatchState::Dispatching | BatchState::Collecting)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Idle => write!(f, "IDLE"),
            BatchState::Dispatching => write!(f, "DISPATCHING"),
            BatchState::Collecting => write!(f, "COLLECTING"),
            BatchState::Finalized => write!(f, "FINALIZED"),
        }
    }
}

// ==========================================
// 儿童结果状态 (Result Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
    Cancelled,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
            ResultStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 年龄分组 (Age Group)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Toddlers,     // 0-3
    Preschoolers, // 4-6
    YoungSchool,  // 7-10
    Teens,        // 11-14
    OlderTeens,   // 15-18
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Toddlers,
        AgeGroup::Preschoolers,
        AgeGroup::YoungSchool,
        AgeGroup::Teens,
        AgeGroup::OlderTeens,
    ];

    pub fn from_age(age: i32) -> Self {
        match age {
            a if a < 4 => AgeGroup::Toddlers,
            a if a < 7 => AgeGroup::Preschoolers,
            a if a < 11 => AgeGroup::YoungSchool,
            a if a < 15 => AgeGroup::Teens,
            _ => AgeGroup::OlderTeens,
        }
    }

    /// 分组年龄区间（闭区间）
    pub fn age_range(&self) -> (i32, i32) {
        match self {
            AgeGroup::Toddlers => (0, 3),
            AgeGroup::Preschoolers => (4, 6),
            AgeGroup::YoungSchool => (7, 10),
            AgeGroup::Teens => (11, 14),
            AgeGroup::OlderTeens => (15, 18),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Toddlers => "toddlers",
            AgeGroup::Preschoolers => "preschoolers",
            AgeGroup::YoungSchool => "young_school",
            AgeGroup::Teens => "teens",
            AgeGroup::OlderTeens => "older_teens",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_follows_processing_order() {
        let mut priorities = vec![WishPriority::Low, WishPriority::High, WishPriority::Medium];
        priorities.sort();
        assert_eq!(priorities, WishPriority::ALL.to_vec());
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<WishPriority>().unwrap(), WishPriority::High);
        assert_eq!(" low ".parse::<WishPriority>().unwrap(), WishPriority::Low);
        assert!("urgent".parse::<WishPriority>().is_err());
    }

    #[test]
    fn test_selection_reason_serialization() {
        let json = serde_json::to_string(&SelectionReason::from_priority(WishPriority::Medium)).unwrap();
        assert_eq!(json, "\"medium_priority_wish\"");
        let json = serde_json::to_string(&SelectionReason::BasicGift).unwrap();
        assert_eq!(json, "\"basic_gift\"");
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(3), AgeGroup::Toddlers);
        assert_eq!(AgeGroup::from_age(4), AgeGroup::Preschoolers);
        assert_eq!(AgeGroup::from_age(10), AgeGroup::YoungSchool);
        assert_eq!(AgeGroup::from_age(11), AgeGroup::Teens);
        assert_eq!(AgeGroup::from_age(15), AgeGroup::OlderTeens);
        assert_eq!(AgeGroup::from_age(18), AgeGroup::OlderTeens);
    }

    #[test]
    fn test_batch_state_running() {
        assert!(!BatchState::Idle.is_running());
        assert!(BatchState::Dispatching.is_running());
        assert!(BatchState::Collecting.is_running());
        assert!(!BatchState::Finalized.is_running());
    }
}
