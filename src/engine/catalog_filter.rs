// ==========================================
// 礼品分配系统 - 目录过滤引擎
// ==========================================
// 职责: 为单个儿童收窄目录
// 规则: child.age >= item.min_age 且 四类需求全部合规
// 红线: 保持输入顺序, 不做隐式随机化
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::child::Child;
use crate::engine::compliance::ComplianceChecker;

/// 商品准入判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionCheck {
    pub admitted: bool,
    /// 拒绝原因（年龄 + 合规违规）
    pub reasons: Vec<String>,
    /// 非阻断提示（例如儿童备注需人工复核）
    pub warnings: Vec<String>,
}

// ==========================================
// CatalogFilter - 目录过滤引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    checker: ComplianceChecker,
}

impl CatalogFilter {
    pub fn new(checker: ComplianceChecker) -> Self {
        Self { checker }
    }

    pub fn checker(&self) -> &ComplianceChecker {
        &self.checker
    }

    /// 单件商品准入
    pub fn admits(&self, child: &Child, item: &CatalogItem) -> bool {
        item.is_suitable_for_age(child.age) && self.checker.complies_all(item, child.requirements())
    }

    /// 过滤目录（保持输入顺序）
    pub fn filter(&self, child: &Child, catalog: &[CatalogItem]) -> Vec<CatalogItem> {
        catalog
            .iter()
            .filter(|item| self.admits(child, item))
            .cloned()
            .collect()
    }

    /// 拒绝原因（用于诊断）
    pub fn explain(&self, child: &Child, item: &CatalogItem) -> Vec<String> {
        let mut reasons = Vec::new();
        if !item.is_suitable_for_age(child.age) {
            reasons.push(format!(
                "age: child age {} < min_age {}",
                child.age, item.min_age
            ));
        }
        reasons.extend(self.checker.violations(item, child.requirements()));
        reasons
    }

    /// 准入判定 + 提示
    pub fn can_be_included(&self, child: &Child, item: &CatalogItem) -> AdmissionCheck {
        let reasons = self.explain(child, item);
        let mut warnings = Vec::new();
        if let Some(notes) = child.notes() {
            warnings.push(format!("儿童备注需人工复核: {}", notes));
        }
        AdmissionCheck {
            admitted: reasons.is_empty(),
            reasons,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemMetadata;
    use crate::domain::requirements::{SafetyRequirement, SpecialRequirements};

    fn child(age: i32, requirements: Option<SpecialRequirements>) -> Child {
        Child {
            id: 1,
            name: "Лиза".to_string(),
            age,
            region: "Омск".to_string(),
            notes: None,
            tags: vec![],
            special_requirements: requirements,
        }
    }

    fn item(id: i64, min_age: i32, metadata: ItemMetadata) -> CatalogItem {
        CatalogItem {
            id,
            name: format!("item-{}", id),
            category: "standard".to_string(),
            price: 10.0,
            weight: 1.0,
            min_age,
            metadata,
        }
    }

    #[test]
    fn test_filter_applies_age_and_requirements() {
        let filter = CatalogFilter::default();
        let reqs = SpecialRequirements {
            safety: vec![SafetyRequirement::NoSmallParts],
            ..Default::default()
        };
        let c = child(5, Some(reqs));
        let catalog = vec![
            item(1, 3, ItemMetadata::default()),
            item(2, 8, ItemMetadata::default()),
            item(3, 0, ItemMetadata { has_small_parts: true, small_parts_size: 1.0, ..Default::default() }),
            item(4, 5, ItemMetadata::default()),
        ];

        let ids: Vec<i64> = filter.filter(&c, &catalog).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_explain_lists_age_and_violations() {
        let filter = CatalogFilter::default();
        let reqs = SpecialRequirements {
            safety: vec![SafetyRequirement::Washable],
            ..Default::default()
        };
        let c = child(5, Some(reqs));

        let reasons = filter.explain(&c, &item(2, 8, ItemMetadata::default()));
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].starts_with("age:"));
        assert!(reasons[1].starts_with("safety.washable"));
    }

    #[test]
    fn test_can_be_included_adds_notes_warning() {
        let filter = CatalogFilter::default();
        let mut c = child(7, None);
        c.notes = Some("аллергия на краску".to_string());

        let check = filter.can_be_included(&c, &item(1, 0, ItemMetadata::default()));
        assert!(check.admitted);
        assert!(check.reasons.is_empty());
        assert_eq!(check.warnings.len(), 1);
    }
}
