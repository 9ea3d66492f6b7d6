// ==========================================
// 礼品分配系统 - 愿望清单
// ==========================================

use crate::domain::types::WishPriority;
use serde::{Deserialize, Serialize};

/// 愿望: 一组按顺序排列的商品ID + 优先级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub child_id: i64,
    pub item_ids: Vec<i64>,
    pub priority: WishPriority,
}

impl Wish {
    /// 边界校验: child_id > 0 且 item_ids 非空
    pub fn validate(&self) -> Result<(), String> {
        if self.child_id <= 0 {
            return Err(format!("愿望的儿童ID必须为正数: child_id={}", self.child_id));
        }
        if self.item_ids.is_empty() {
            return Err(format!("愿望商品列表为空: child_id={}", self.child_id));
        }
        Ok(())
    }
}

/// 按优先级稳定排序（High → Medium → Low，同级保持原顺序）
pub fn order_by_priority(wishes: &[Wish]) -> Vec<&Wish> {
    let mut ordered: Vec<&Wish> = wishes.iter().collect();
    ordered.sort_by_key(|w| w.priority);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wish(child_id: i64, items: Vec<i64>, priority: WishPriority) -> Wish {
        Wish {
            child_id,
            item_ids: items,
            priority,
        }
    }

    #[test]
    fn test_validate() {
        assert!(wish(1, vec![10], WishPriority::High).validate().is_ok());
        assert!(wish(0, vec![10], WishPriority::High).validate().is_err());
        assert!(wish(1, vec![], WishPriority::Low).validate().is_err());
    }

    #[test]
    fn test_invalid_priority_rejected_by_serde() {
        let json = r#"{"child_id": 1, "item_ids": [1], "priority": "urgent"}"#;
        assert!(serde_json::from_str::<Wish>(json).is_err());
    }

    #[test]
    fn test_order_by_priority_is_stable() {
        let wishes = vec![
            wish(1, vec![1], WishPriority::Low),
            wish(1, vec![2], WishPriority::High),
            wish(1, vec![3], WishPriority::Medium),
            wish(1, vec![4], WishPriority::High),
        ];
        let ordered: Vec<i64> = order_by_priority(&wishes)
            .iter()
            .map(|w| w.item_ids[0])
            .collect();
        assert_eq!(ordered, vec![2, 4, 3, 1]);
    }
}
