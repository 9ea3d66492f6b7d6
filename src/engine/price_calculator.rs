// ==========================================
// 礼品分配系统 - 地区定价引擎
// ==========================================
// 规则: final_cost = round(sum(price) * coefficient, 2)
// 回退: 系数查询失败或系数 <= 0 → 1.0 + 软警告
// ==========================================

use crate::domain::child::Child;
use crate::domain::region::DEFAULT_COEFFICIENT;
use crate::domain::report::GiftSelection;
use crate::engine::events::{GiftEvent, GiftEventPublisher};
use crate::engine::gift_selector::total_price;
use crate::repository::RegionRepository;

/// 四舍五入到分
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 定价结果
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub base_total: f64,
    pub coefficient: f64,
    pub final_cost: f64,
    /// 系数回退时的软警告
    pub warning: Option<String>,
}

// ==========================================
// PriceCalculator - 地区定价引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PriceCalculator {
    // 无状态引擎
}

impl PriceCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析地区系数
    ///
    /// # 返回
    /// (系数, 回退警告)
    pub fn resolve_coefficient(
        &self,
        child: &Child,
        regions: &dyn RegionRepository,
        events: &dyn GiftEventPublisher,
    ) -> (f64, Option<String>) {
        let reason = match regions.get_coefficient(&child.region) {
            Ok(c) if c.is_finite() && c > 0.0 => return (c, None),
            Ok(c) => format!("地区系数无效: {}", c),
            Err(e) => e.to_string(),
        };

        events.publish(&GiftEvent::CoefficientDefaulted {
            child_id: child.id,
            region: child.region.clone(),
            reason: reason.clone(),
        });

        let warning = format!(
            "地区 {} 系数不可用 ({}), 使用默认系数 {}",
            child.region, reason, DEFAULT_COEFFICIENT
        );
        (DEFAULT_COEFFICIENT, Some(warning))
    }

    /// 按给定系数计算最终价格
    pub fn apply(&self, base_total: f64, coefficient: f64) -> f64 {
        round_to_cents(base_total * coefficient)
    }

    /// 计算一组选择的最终价格
    pub fn price(
        &self,
        child: &Child,
        selections: &[GiftSelection],
        regions: &dyn RegionRepository,
        events: &dyn GiftEventPublisher,
    ) -> PriceQuote {
        let base_total = total_price(selections);
        let (coefficient, warning) = self.resolve_coefficient(child, regions, events);

        PriceQuote {
            base_total,
            coefficient,
            final_cost: self.apply(base_total, coefficient),
            warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogItem, ItemMetadata};
    use crate::domain::region::Region;
    use crate::domain::types::SelectionReason;
    use crate::engine::events::NoOpEventPublisher;
    use crate::repository::InMemoryRegionRepository;

    fn child(region: &str) -> Child {
        Child {
            id: 1,
            name: "Оля".to_string(),
            age: 8,
            region: region.to_string(),
            notes: None,
            tags: vec![],
            special_requirements: None,
        }
    }

    fn selection(price: f64) -> GiftSelection {
        GiftSelection::new(
            CatalogItem {
                id: 1,
                name: "Книга".to_string(),
                category: "books".to_string(),
                price,
                weight: 0.4,
                min_age: 0,
                metadata: ItemMetadata::default(),
            },
            SelectionReason::BasicGift,
        )
    }

    fn regions() -> InMemoryRegionRepository {
        InMemoryRegionRepository::new(vec![
            Region { name: "Север".to_string(), coefficient: 1.333 },
            Region { name: "Сломанный".to_string(), coefficient: 0.0 },
        ])
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(26.66), 26.66);
        assert_eq!(round_to_cents(1.234), 1.23);
        assert_eq!(round_to_cents(1.236), 1.24);
    }

    #[test]
    fn test_price_with_coefficient() {
        let quote = PriceCalculator::new().price(
            &child("Север"),
            &[selection(10.0), selection(10.0)],
            &regions(),
            &NoOpEventPublisher,
        );
        assert_eq!(quote.base_total, 20.0);
        assert_eq!(quote.coefficient, 1.333);
        assert_eq!(quote.final_cost, 26.66);
        assert!(quote.warning.is_none());
    }

    #[test]
    fn test_missing_region_defaults_to_one() {
        let quote = PriceCalculator::new().price(
            &child("Атлантида"),
            &[selection(12.5)],
            &regions(),
            &NoOpEventPublisher,
        );
        assert_eq!(quote.coefficient, 1.0);
        assert_eq!(quote.final_cost, quote.base_total);
        assert!(quote.warning.is_some());
    }

    #[test]
    fn test_non_positive_coefficient_defaults_to_one() {
        let quote = PriceCalculator::new().price(
            &child("Сломанный"),
            &[selection(7.0)],
            &regions(),
            &NoOpEventPublisher,
        );
        assert_eq!(quote.coefficient, 1.0);
        assert_eq!(quote.final_cost, 7.0);
    }
}
