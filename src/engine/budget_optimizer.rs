// ==========================================
// 礼品分配系统 - 预算优化引擎
// ==========================================
// 触发: final_cost 超过正的单儿童价格上限
// 比较口径: 地区系数调整并四舍五入后的价格
// ==========================================
// 规则:
// 1) 替换: 兜底礼品按价格降序(同价ID升序)逐件换为更便宜的合规兜底商品, 达标即停
// 2) 删减: 在替换后的选择上选最优非空子集
//    偏好: high 愿望数 > medium > low > 总件数 > 总价 > ID 字典序最小
//    子集规模 <= 16 时穷举, 否则贪心
// 3) 不可行: 保留原选择并标记超预算
// 红线: 件数只减不增, 结果非空
// ==========================================

use crate::domain::catalog::{cheapest_below, CatalogItem};
use crate::domain::report::GiftSelection;
use crate::domain::types::{SelectionReason, WishPriority};
use crate::engine::gift_selector::total_price;
use crate::engine::price_calculator::round_to_cents;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// 穷举子集的最大件数
pub const EXHAUSTIVE_LIMIT: usize = 16;

// 浮点比较容差
const EPSILON: f64 = 1e-9;

// ==========================================
// OptimizationOutcome - 优化结果
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub selections: Vec<GiftSelection>,
    pub final_cost: f64,
    /// 选择是否发生变化
    pub changed: bool,
    /// 是否满足上限（false 时 selections 为原选择）
    pub feasible: bool,
    pub substituted: usize,
    pub removed: usize,
}

// 子集评分
#[derive(Debug, Clone)]
struct SubsetScore {
    high: usize,
    medium: usize,
    low: usize,
    count: usize,
    price: f64,
    ids: Vec<i64>,
}

impl SubsetScore {
    fn of(selections: &[&GiftSelection]) -> Self {
        let count_of = |p: WishPriority| {
            selections
                .iter()
                .filter(|s| s.reason.wish_priority() == Some(p))
                .count()
        };
        let mut ids: Vec<i64> = selections.iter().map(|s| s.item.id).collect();
        ids.sort_unstable();

        Self {
            high: count_of(WishPriority::High),
            medium: count_of(WishPriority::Medium),
            low: count_of(WishPriority::Low),
            count: selections.len(),
            price: selections.iter().map(|s| s.item.price).sum(),
            ids,
        }
    }

    /// Greater 表示 self 更优
    fn compare(&self, other: &Self) -> Ordering {
        self.high
            .cmp(&other.high)
            .then(self.medium.cmp(&other.medium))
            .then(self.low.cmp(&other.low))
            .then(self.count.cmp(&other.count))
            .then(self.price.total_cmp(&other.price))
            .then(other.ids.cmp(&self.ids))
    }
}

/// 删减顺序: 兜底 → low → medium → high, 同级价格降序, 同价ID升序
fn drop_rank(reason: &SelectionReason) -> u8 {
    match reason.wish_priority() {
        None => 0,
        Some(WishPriority::Low) => 1,
        Some(WishPriority::Medium) => 2,
        Some(WishPriority::High) => 3,
    }
}

// ==========================================
// BudgetOptimizer - 预算优化引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BudgetOptimizer {
    // 无状态引擎
}

impl BudgetOptimizer {
    pub fn new() -> Self {
        Self {}
    }

    fn cost(selections: &[GiftSelection], coefficient: f64) -> f64 {
        round_to_cents(total_price(selections) * coefficient)
    }

    fn fits(selections: &[GiftSelection], coefficient: f64, ceiling: f64) -> bool {
        Self::cost(selections, coefficient) <= ceiling + EPSILON
    }

    /// 优化选择以满足价格上限
    ///
    /// # 参数
    /// - selections: 当前选择
    /// - coefficient: 地区系数
    /// - ceiling: 单儿童价格上限 (> 0)
    /// - alternatives: 对该儿童合规的兜底类别商品
    pub fn optimize(
        &self,
        selections: &[GiftSelection],
        coefficient: f64,
        ceiling: f64,
        alternatives: &[CatalogItem],
    ) -> OptimizationOutcome {
        let original_cost = Self::cost(selections, coefficient);
        if selections.is_empty() || original_cost <= ceiling + EPSILON {
            return OptimizationOutcome {
                selections: selections.to_vec(),
                final_cost: original_cost,
                changed: false,
                feasible: true,
                substituted: 0,
                removed: 0,
            };
        }

        // ==========================================
        // 阶段1: 替换
        // ==========================================
        let (current, substituted) = self.substitute(selections, coefficient, ceiling, alternatives);
        if Self::fits(&current, coefficient, ceiling) {
            debug!(substituted, "替换后满足预算上限");
            return OptimizationOutcome {
                final_cost: Self::cost(&current, coefficient),
                selections: current,
                changed: true,
                feasible: true,
                substituted,
                removed: 0,
            };
        }

        // ==========================================
        // 阶段2: 删减
        // ==========================================
        let trimmed = if current.len() <= EXHAUSTIVE_LIMIT {
            self.best_subset(&current, coefficient, ceiling)
        } else {
            self.greedy_subset(&current, coefficient, ceiling)
        };

        match trimmed {
            Some(kept) => {
                let removed = current.len() - kept.len();
                debug!(substituted, removed, "删减后满足预算上限");
                OptimizationOutcome {
                    final_cost: Self::cost(&kept, coefficient),
                    selections: kept,
                    changed: true,
                    feasible: true,
                    substituted,
                    removed,
                }
            }
            // ==========================================
            // 阶段3: 不可行
            // ==========================================
            None => OptimizationOutcome {
                selections: selections.to_vec(),
                final_cost: original_cost,
                changed: false,
                feasible: false,
                substituted: 0,
                removed: 0,
            },
        }
    }

    fn substitute(
        &self,
        selections: &[GiftSelection],
        coefficient: f64,
        ceiling: f64,
        alternatives: &[CatalogItem],
    ) -> (Vec<GiftSelection>, usize) {
        let mut current = selections.to_vec();
        let mut selected: HashSet<i64> = current.iter().map(|s| s.item.id).collect();
        let mut substituted = 0;

        let mut order: Vec<usize> = (0..current.len())
            .filter(|&i| current[i].reason.is_fallback())
            .collect();
        order.sort_by(|&a, &b| {
            current[b]
                .item
                .price
                .total_cmp(&current[a].item.price)
                .then(current[a].item.id.cmp(&current[b].item.id))
        });

        for idx in order {
            if Self::fits(&current, coefficient, ceiling) {
                break;
            }
            let price = current[idx].item.price;
            let replacement = cheapest_below(alternatives.iter().filter(|a| !selected.contains(&a.id)), price);

            if let Some(alt) = replacement {
                selected.remove(&current[idx].item.id);
                selected.insert(alt.id);
                current[idx] = GiftSelection::new(alt.clone(), SelectionReason::BasicGift);
                substituted += 1;
            }
        }

        (current, substituted)
    }

    /// 穷举全部非空子集, 保持原相对顺序
    fn best_subset(
        &self,
        selections: &[GiftSelection],
        coefficient: f64,
        ceiling: f64,
    ) -> Option<Vec<GiftSelection>> {
        let n = selections.len();
        let mut best: Option<(u32, SubsetScore)> = None;

        for mask in 1u32..(1u32 << n) {
            let subset: Vec<&GiftSelection> = (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| &selections[i])
                .collect();
            let cost = round_to_cents(subset.iter().map(|s| s.item.price).sum::<f64>() * coefficient);
            if cost > ceiling + EPSILON {
                continue;
            }

            let score = SubsetScore::of(&subset);
            let better = match &best {
                None => true,
                Some((_, current)) => score.compare(current) == Ordering::Greater,
            };
            if better {
                best = Some((mask, score));
            }
        }

        best.map(|(mask, _)| {
            (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| selections[i].clone())
                .collect()
        })
    }

    /// 贪心删减（件数超过穷举上限时）
    fn greedy_subset(
        &self,
        selections: &[GiftSelection],
        coefficient: f64,
        ceiling: f64,
    ) -> Option<Vec<GiftSelection>> {
        let mut order: Vec<usize> = (0..selections.len()).collect();
        order.sort_by(|&a, &b| {
            let (sa, sb) = (&selections[a], &selections[b]);
            drop_rank(&sa.reason)
                .cmp(&drop_rank(&sb.reason))
                .then(sb.item.price.total_cmp(&sa.item.price))
                .then(sa.item.id.cmp(&sb.item.id))
        });

        let mut dropped: HashSet<usize> = HashSet::new();
        for idx in &order {
            if dropped.len() + 1 >= selections.len() {
                break;
            }
            let kept: Vec<GiftSelection> = Self::retain(selections, &dropped);
            if Self::fits(&kept, coefficient, ceiling) {
                return Some(kept);
            }
            dropped.insert(*idx);
        }

        let kept = Self::retain(selections, &dropped);
        if Self::fits(&kept, coefficient, ceiling) {
            return Some(kept);
        }

        // 仅剩一件仍超限: 退化为最优单件
        order
            .iter()
            .rev()
            .map(|&i| &selections[i])
            .find(|s| Self::fits(std::slice::from_ref(*s), coefficient, ceiling))
            .map(|s| vec![s.clone()])
    }

    fn retain(selections: &[GiftSelection], dropped: &HashSet<usize>) -> Vec<GiftSelection> {
        selections
            .iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, s)| s.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemMetadata;

    fn item(id: i64, price: f64) -> CatalogItem {
        CatalogItem {
            id,
            name: format!("item-{}", id),
            category: "standard".to_string(),
            price,
            weight: 1.0,
            min_age: 0,
            metadata: ItemMetadata::default(),
        }
    }

    fn sel(id: i64, price: f64, reason: SelectionReason) -> GiftSelection {
        GiftSelection::new(item(id, price), reason)
    }

    fn ids(selections: &[GiftSelection]) -> Vec<i64> {
        selections.iter().map(|s| s.item.id).collect()
    }

    #[test]
    fn test_under_ceiling_unchanged() {
        let selections = vec![sel(1, 10.0, SelectionReason::BasicGift)];
        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 10.0, &[]);
        assert!(!outcome.changed);
        assert!(outcome.feasible);
    }

    #[test]
    fn test_substitution_before_removal() {
        let selections = vec![
            sel(1, 20.0, SelectionReason::HighPriorityWish),
            sel(2, 15.0, SelectionReason::BasicGift),
            sel(3, 10.0, SelectionReason::BasicGift),
        ];
        let alternatives = vec![item(2, 15.0), item(3, 10.0), item(7, 4.0), item(8, 4.0), item(9, 6.0)];

        // 45 → 替换 15 为 4 → 34
        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 35.0, &alternatives);

        assert!(outcome.feasible);
        assert_eq!(ids(&outcome.selections), vec![1, 7, 3]);
        assert_eq!(outcome.substituted, 1);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.final_cost, 34.0);
    }

    #[test]
    fn test_removal_keeps_high_priority_wishes() {
        let selections = vec![
            sel(1, 30.0, SelectionReason::HighPriorityWish),
            sel(2, 5.0, SelectionReason::LowPriorityWish),
            sel(3, 6.0, SelectionReason::MediumPriorityWish),
            sel(4, 3.0, SelectionReason::BasicGift),
        ];

        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 37.0, &[]);

        assert!(outcome.feasible);
        // high + medium = 36 (最多 high/medium)
        assert_eq!(ids(&outcome.selections), vec![1, 3]);
        assert_eq!(outcome.removed, 2);
        assert!(outcome.final_cost <= 37.0);
    }

    #[test]
    fn test_coefficient_applied_to_ceiling_check() {
        let selections = vec![
            sel(1, 10.0, SelectionReason::HighPriorityWish),
            sel(2, 10.0, SelectionReason::HighPriorityWish),
        ];
        // 20 * 1.5 = 30 > 20; 单件 15 <= 20
        let outcome = BudgetOptimizer::new().optimize(&selections, 1.5, 20.0, &[]);

        assert!(outcome.feasible);
        assert_eq!(ids(&outcome.selections), vec![1]);
        assert_eq!(outcome.final_cost, 15.0);
    }

    #[test]
    fn test_infeasible_keeps_original() {
        let selections = vec![
            sel(1, 50.0, SelectionReason::HighPriorityWish),
            sel(2, 40.0, SelectionReason::BasicGift),
        ];
        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 30.0, &[]);

        assert!(!outcome.feasible);
        assert!(!outcome.changed);
        assert_eq!(ids(&outcome.selections), vec![1, 2]);
        assert_eq!(outcome.final_cost, 90.0);
    }

    #[test]
    fn test_tie_break_smallest_ids() {
        let selections = vec![
            sel(5, 10.0, SelectionReason::BasicGift),
            sel(3, 10.0, SelectionReason::BasicGift),
            sel(4, 10.0, SelectionReason::BasicGift),
        ];
        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 20.0, &[]);

        // 原相对顺序保留
        assert_eq!(ids(&outcome.selections), vec![3, 4]);
    }

    #[test]
    fn test_greedy_for_large_selection() {
        let mut selections: Vec<GiftSelection> = (1..=17)
            .map(|i| sel(i, 1.0, SelectionReason::BasicGift))
            .collect();
        selections.push(sel(100, 10.0, SelectionReason::HighPriorityWish));

        let outcome = BudgetOptimizer::new().optimize(&selections, 1.0, 12.0, &[]);

        assert!(outcome.feasible);
        assert!(outcome.final_cost <= 12.0);
        assert!(ids(&outcome.selections).contains(&100));
        assert!(outcome.selections.len() < selections.len());
    }
}
