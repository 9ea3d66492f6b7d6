// ==========================================
// 礼品分配系统 - 商品目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑（合规过滤由 CatalogFilter 负责）
// ==========================================

use crate::domain::catalog::{cheapest_below, CatalogItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;

// ==========================================
// GiftRepository - 商品目录端口
// ==========================================
/// 商品目录仓储
///
/// # 约束
/// - find_by_id 未命中返回 NotFound（可恢复）
/// - 列表查询保持目录原始顺序
pub trait GiftRepository: Send + Sync {
    fn find_by_id(&self, id: i64) -> RepositoryResult<CatalogItem>;

    /// 按类别查询（大小写不敏感）
    fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<CatalogItem>>;

    fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>>;

    /// 同类别中严格更便宜的最便宜商品（同价按ID升序）
    fn find_cheaper_alternative(&self, item: &CatalogItem) -> RepositoryResult<Option<CatalogItem>>;

    /// 适用年龄区间内的商品（min_age ∈ [min_age, max_age]）
    fn find_by_age_range(&self, min_age: i32, max_age: i32) -> RepositoryResult<Vec<CatalogItem>>;
}

// ==========================================
// InMemoryGiftRepository - 内存实现
// ==========================================
pub struct InMemoryGiftRepository {
    items: Vec<CatalogItem>,
    index: HashMap<i64, usize>,
}

impl InMemoryGiftRepository {
    /// 创建仓储实例（ID 重复时保留首条）
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            index.entry(item.id).or_insert(pos);
        }
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl GiftRepository for InMemoryGiftRepository {
    fn find_by_id(&self, id: i64) -> RepositoryResult<CatalogItem> {
        self.index
            .get(&id)
            .map(|&pos| self.items[pos].clone())
            .ok_or_else(|| RepositoryError::not_found("CatalogItem", id))
    }

    fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<CatalogItem>> {
        let category = category.trim().to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|i| i.category.trim().to_lowercase() == category)
            .cloned()
            .collect())
    }

    fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }

    fn find_cheaper_alternative(&self, item: &CatalogItem) -> RepositoryResult<Option<CatalogItem>> {
        let same_category = self.find_by_category(&item.category)?;
        Ok(cheapest_below(same_category.iter().filter(|c| c.id != item.id), item.price).cloned())
    }

    fn find_by_age_range(&self, min_age: i32, max_age: i32) -> RepositoryResult<Vec<CatalogItem>> {
        if min_age > max_age {
            return Err(RepositoryError::FieldValueError {
                field: "age_range".to_string(),
                message: format!("min_age={} > max_age={}", min_age, max_age),
            });
        }
        Ok(self
            .items
            .iter()
            .filter(|i| i.min_age >= min_age && i.min_age <= max_age)
            .cloned()
            .collect())
    }
}
