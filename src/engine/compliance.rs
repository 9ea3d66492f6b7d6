// ==========================================
// 礼品分配系统 - 合规检查引擎
// ==========================================
// 职责: 判定单件商品是否满足单条/全部需求
// 规则: 类别内逐条 AND, 类别间 AND; 未识别需求放行
// 输出: 违规原因 "<category>.<requirement>: <description>"
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::requirements::{Requirement, SpecialRequirements};
use crate::engine::compliance_core::ComplianceCore;
use std::collections::BTreeMap;

// ==========================================
// ComplianceChecker - 合规检查引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ComplianceChecker {
    // 无状态引擎
}

impl ComplianceChecker {
    pub fn new() -> Self {
        Self {}
    }

    /// 单条需求判定
    pub fn complies(&self, item: &CatalogItem, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Dietary(r) => ComplianceCore::dietary(item, r),
            Requirement::Safety(r) => ComplianceCore::safety(item, r),
            Requirement::Medical(r) => ComplianceCore::medical(item, r),
            Requirement::Other(r) => ComplianceCore::other(item, r),
        }
    }

    /// 全部需求判定（短路）
    pub fn complies_all(&self, item: &CatalogItem, requirements: &SpecialRequirements) -> bool {
        requirements.iter().all(|r| self.complies(item, &r))
    }

    /// 违规原因列表（空表示合规）
    pub fn violations(&self, item: &CatalogItem, requirements: &SpecialRequirements) -> Vec<String> {
        requirements
            .iter()
            .filter(|r| !self.complies(item, r))
            .map(|r| format!("{}: {}", r.key(), r.description()))
            .collect()
    }

    /// 合规摘要: "<category>_<requirement>" → 是否满足
    pub fn compliance_summary(
        &self,
        item: &CatalogItem,
        requirements: &SpecialRequirements,
    ) -> BTreeMap<String, bool> {
        requirements
            .iter()
            .map(|r| {
                let key = format!("{}_{}", r.category(), r.name());
                (key, self.complies(item, &r))
            })
            .collect()
    }
}
