// ==========================================
// 礼品分配系统 - 儿童档案
// ==========================================
// 职责: 儿童实体定义与边界校验
// 生命周期: 每次运行加载一次, 运行期间只读
// ==========================================

use crate::domain::requirements::SpecialRequirements;
use crate::domain::types::AgeGroup;
use serde::{Deserialize, Serialize};

/// 年龄上限（含）
pub const MAX_CHILD_AGE: i32 = 18;

static NO_REQUIREMENTS: SpecialRequirements = SpecialRequirements::EMPTY;

// ==========================================
// Child - 儿童档案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<SpecialRequirements>,
}

impl Child {
    /// 特殊需求（缺省视为无约束）
    pub fn requirements(&self) -> &SpecialRequirements {
        self.special_requirements
            .as_ref()
            .unwrap_or(&NO_REQUIREMENTS)
    }

    pub fn has_any_requirements(&self) -> bool {
        !self.requirements().is_empty()
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }

    /// 非空备注
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// 边界校验
    ///
    /// # 规则
    /// - id > 0
    /// - name 非空
    /// - age ∈ [0, 18]
    /// - region 非空
    pub fn validate(&self) -> Result<(), String> {
        if self.id <= 0 {
            return Err(format!("儿童ID必须为正数: id={}", self.id));
        }
        if self.name.trim().is_empty() {
            return Err(format!("儿童姓名为空: id={}", self.id));
        }
        if !(0..=MAX_CHILD_AGE).contains(&self.age) {
            return Err(format!(
                "儿童年龄超出范围 [0, {}]: id={}, age={}",
                MAX_CHILD_AGE, self.id, self.age
            ));
        }
        if self.region.trim().is_empty() {
            return Err(format!("儿童地区为空: id={}", self.id));
        }
        Ok(())
    }
}
