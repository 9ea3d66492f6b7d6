// ==========================================
// 礼品分配系统 - 礼品选择引擎
// ==========================================
// 职责: 按愿望优先级选择礼品, 兜底类别补足下限
// 状态: 单儿童状态机, 终态 Selected / Failed
// ==========================================
// 规则:
// 1) 候选池 = CatalogFilter 对该儿童的目录视图
// 2) 愿望按 high → medium → low 处理, 同级保持原顺序; 达到上限立即停止
// 3) 数量低于下限时从兜底类别补足 (reason = basic_gift)
// 4) 零件礼品 → Failed("no suitable gifts")
// ==========================================

use crate::config::GiftCalcConfig;
use crate::domain::catalog::CatalogItem;
use crate::domain::child::Child;
use crate::domain::report::GiftSelection;
use crate::domain::types::SelectionReason;
use crate::domain::wish::{order_by_priority, Wish};
use crate::engine::catalog_filter::CatalogFilter;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{GiftEvent, GiftEventPublisher};
use crate::repository::GiftRepository;
use std::collections::HashSet;
use tracing::{debug, instrument};

// ==========================================
// SelectionOutcome - 选择结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub selections: Vec<GiftSelection>,
    /// 兜底类别中对该儿童合规的商品（目录顺序, 供预算替换使用）
    pub fallback_pool: Vec<CatalogItem>,
    pub warnings: Vec<String>,
}

impl SelectionOutcome {
    pub fn total_price(&self) -> f64 {
        total_price(&self.selections)
    }

    pub fn total_weight(&self) -> f64 {
        total_weight(&self.selections)
    }
}

pub fn total_price(selections: &[GiftSelection]) -> f64 {
    selections.iter().map(|s| s.item.price).sum()
}

pub fn total_weight(selections: &[GiftSelection]) -> f64 {
    selections.iter().map(|s| s.item.weight).sum()
}

// ==========================================
// GiftSelector - 礼品选择引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct GiftSelector {
    filter: CatalogFilter,
    max_items: usize,
    min_items: usize,
    fallback_category: String,
}

impl GiftSelector {
    pub fn new(filter: CatalogFilter, config: &GiftCalcConfig) -> Self {
        Self {
            filter,
            max_items: config.max_items,
            min_items: config.min_items.min(config.max_items),
            fallback_category: config.fallback_category.clone(),
        }
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    /// 为单个儿童选择礼品
    ///
    /// # 参数
    /// - child: 儿童档案
    /// - wishes: 该儿童的愿望（任意顺序, 内部按优先级稳定排序）
    /// - gifts: 目录仓储
    /// - events: 诊断端口
    ///
    /// # 返回
    /// - Ok(SelectionOutcome): 至少一件礼品
    /// - Err(SelectionFailure): 无可选礼品
    #[instrument(skip(self, child, wishes, gifts, events), fields(
        child_id = child.id,
        wishes_count = wishes.len()
    ))]
    pub fn select(
        &self,
        child: &Child,
        wishes: &[Wish],
        gifts: &dyn GiftRepository,
        events: &dyn GiftEventPublisher,
    ) -> EngineResult<SelectionOutcome> {
        let mut selections: Vec<GiftSelection> = Vec::new();
        let mut chosen: HashSet<i64> = HashSet::new();
        let mut warnings = Vec::new();

        // ==========================================
        // 阶段1: 愿望
        // ==========================================
        'wishes: for wish in order_by_priority(wishes) {
            let reason = SelectionReason::from_priority(wish.priority);

            for &item_id in &wish.item_ids {
                if selections.len() >= self.max_items {
                    break 'wishes;
                }
                if chosen.contains(&item_id) {
                    continue;
                }

                let item = match gifts.find_by_id(item_id) {
                    Ok(item) => item,
                    Err(e) => {
                        let miss = EngineError::LookupMiss { item_id };
                        if e.is_not_found() {
                            debug!("{}", miss);
                        } else {
                            warnings.push(format!("{} ({})", miss, e));
                        }
                        events.publish(&GiftEvent::LookupMiss {
                            child_id: child.id,
                            item_id,
                        });
                        continue;
                    }
                };

                if !self.filter.admits(child, &item) {
                    events.publish(&GiftEvent::ItemFiltered {
                        child_id: child.id,
                        item_id,
                        reasons: self.filter.explain(child, &item),
                    });
                    continue;
                }

                chosen.insert(item_id);
                selections.push(GiftSelection::new(item, reason));
            }
        }

        // ==========================================
        // 阶段2: 兜底补足
        // ==========================================
        let fallback_pool = match gifts.find_by_category(&self.fallback_category) {
            Ok(items) => self.filter.filter(child, &items),
            Err(e) => {
                warnings.push(format!(
                    "兜底类别查询失败: category={}, {}",
                    self.fallback_category, e
                ));
                Vec::new()
            }
        };

        if selections.len() < self.min_items {
            for item in &fallback_pool {
                if selections.len() >= self.min_items {
                    break;
                }
                if chosen.insert(item.id) {
                    selections.push(GiftSelection::new(item.clone(), SelectionReason::BasicGift));
                }
            }
        }

        if selections.is_empty() {
            return Err(EngineError::no_suitable_gifts(child.id));
        }

        debug!(
            selected = selections.len(),
            fallback_pool = fallback_pool.len(),
            "礼品选择完成"
        );

        Ok(SelectionOutcome {
            selections,
            fallback_pool,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemMetadata;
    use crate::domain::types::WishPriority;
    use crate::engine::events::NoOpEventPublisher;
    use crate::repository::{InMemoryGiftRepository, RepositoryError, RepositoryResult};

    fn child(age: i32) -> Child {
        Child {
            id: 1,
            name: "Ваня".to_string(),
            age,
            region: "Тверь".to_string(),
            notes: None,
            tags: vec![],
            special_requirements: None,
        }
    }

    fn item(id: i64, category: &str, price: f64, min_age: i32) -> CatalogItem {
        CatalogItem {
            id,
            name: format!("item-{}", id),
            category: category.to_string(),
            price,
            weight: 0.5,
            min_age,
            metadata: ItemMetadata::default(),
        }
    }

    fn wish(items: Vec<i64>, priority: WishPriority) -> Wish {
        Wish {
            child_id: 1,
            item_ids: items,
            priority,
        }
    }

    fn selector() -> GiftSelector {
        GiftSelector::new(CatalogFilter::default(), &GiftCalcConfig::default())
    }

    fn ids(outcome: &SelectionOutcome) -> Vec<i64> {
        outcome.selections.iter().map(|s| s.item.id).collect()
    }

    #[test]
    fn test_wishes_processed_by_priority_and_deduplicated() {
        let repo = InMemoryGiftRepository::new(vec![
            item(1, "toys", 5.0, 0),
            item(2, "toys", 5.0, 0),
            item(3, "toys", 5.0, 0),
        ]);
        let wishes = vec![
            wish(vec![3, 1], WishPriority::Low),
            wish(vec![2, 1], WishPriority::High),
        ];

        let outcome = selector().select(&child(6), &wishes, &repo, &NoOpEventPublisher).unwrap();

        assert_eq!(ids(&outcome), vec![2, 1, 3]);
        assert_eq!(outcome.selections[0].reason, SelectionReason::HighPriorityWish);
        assert_eq!(outcome.selections[2].reason, SelectionReason::LowPriorityWish);
    }

    #[test]
    fn test_stops_at_max_items() {
        let repo = InMemoryGiftRepository::new((1..=8).map(|i| item(i, "toys", 1.0, 0)).collect());
        let wishes = vec![wish((1..=8).collect(), WishPriority::Medium)];

        let outcome = selector().select(&child(6), &wishes, &repo, &NoOpEventPublisher).unwrap();
        assert_eq!(ids(&outcome), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_top_up_from_fallback_to_floor() {
        let repo = InMemoryGiftRepository::new(vec![
            item(1, "toys", 9.0, 0),
            item(10, "standard", 2.0, 0),
            item(11, "standard", 2.0, 12),
            item(12, "standard", 2.0, 0),
            item(13, "standard", 2.0, 0),
        ]);
        let wishes = vec![wish(vec![1], WishPriority::High)];

        let outcome = selector().select(&child(6), &wishes, &repo, &NoOpEventPublisher).unwrap();

        assert_eq!(ids(&outcome), vec![1, 10, 12]);
        assert_eq!(outcome.selections[1].reason, SelectionReason::BasicGift);
        // 兜底池已按年龄过滤
        assert_eq!(outcome.fallback_pool.len(), 3);
    }

    /// 单件查询不可用, 类别查询正常
    struct FlakyLookupRepository {
        fallback: Vec<CatalogItem>,
    }

    impl GiftRepository for FlakyLookupRepository {
        fn find_by_id(&self, _id: i64) -> RepositoryResult<CatalogItem> {
            Err(RepositoryError::Unavailable("catalog offline".to_string()))
        }

        fn find_by_category(&self, _category: &str) -> RepositoryResult<Vec<CatalogItem>> {
            Ok(self.fallback.clone())
        }

        fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>> {
            Ok(self.fallback.clone())
        }

        fn find_cheaper_alternative(&self, _item: &CatalogItem) -> RepositoryResult<Option<CatalogItem>> {
            Ok(None)
        }

        fn find_by_age_range(&self, _min_age: i32, _max_age: i32) -> RepositoryResult<Vec<CatalogItem>> {
            Ok(self.fallback.clone())
        }
    }

    #[test]
    fn test_lookup_failure_becomes_warning() {
        let repo = FlakyLookupRepository {
            fallback: vec![item(10, "standard", 2.0, 0)],
        };
        let wishes = vec![wish(vec![7], WishPriority::High)];

        let outcome = selector().select(&child(6), &wishes, &repo, &NoOpEventPublisher).unwrap();

        assert_eq!(ids(&outcome), vec![10]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("目录中不存在商品: item_id=7"));
        assert!(outcome.warnings[0].contains("catalog offline"));
    }

    #[test]
    fn test_no_suitable_gifts() {
        let repo = InMemoryGiftRepository::new(vec![item(1, "toys", 9.0, 16)]);
        let wishes = vec![wish(vec![1, 404], WishPriority::High)];

        let err = selector()
            .select(&child(6), &wishes, &repo, &NoOpEventPublisher)
            .unwrap_err();
        assert_eq!(err.to_string(), "no suitable gifts");
    }
}
