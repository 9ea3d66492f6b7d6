// ==========================================
// 礼品分配系统 - 儿童档案仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::child::Child;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;

// ==========================================
// ChildRepository - 儿童档案端口
// ==========================================
/// 儿童档案仓储
///
/// # 约束
/// - get_all 失败时整个运行中止（InputError）
/// - 返回顺序即输入顺序
pub trait ChildRepository: Send + Sync {
    /// 全部儿童（输入顺序）
    fn get_all(&self) -> RepositoryResult<Vec<Child>>;

    /// 按ID查询
    fn get_by_id(&self, id: i64) -> RepositoryResult<Child>;

    /// 按地区查询（大小写不敏感）
    fn get_by_region(&self, region: &str) -> RepositoryResult<Vec<Child>>;

    /// 按年龄区间查询（闭区间）
    fn get_by_age_range(&self, min_age: i32, max_age: i32) -> RepositoryResult<Vec<Child>>;

    /// 按标签查询（任一标签命中即返回）
    fn get_by_tags(&self, tags: &[String]) -> RepositoryResult<Vec<Child>>;
}

// ==========================================
// InMemoryChildRepository - 内存实现
// ==========================================
pub struct InMemoryChildRepository {
    children: Vec<Child>,
    index: HashMap<i64, usize>,
}

impl InMemoryChildRepository {
    /// 创建仓储实例（ID 重复时保留首条）
    pub fn new(children: Vec<Child>) -> Self {
        let mut index = HashMap::with_capacity(children.len());
        for (pos, child) in children.iter().enumerate() {
            index.entry(child.id).or_insert(pos);
        }
        Self { children, index }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_where<F>(&self, predicate: F) -> Vec<Child>
    where
        F: Fn(&Child) -> bool,
    {
        self.children
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect()
    }
}

impl ChildRepository for InMemoryChildRepository {
    fn get_all(&self) -> RepositoryResult<Vec<Child>> {
        Ok(self.children.clone())
    }

    fn get_by_id(&self, id: i64) -> RepositoryResult<Child> {
        self.index
            .get(&id)
            .map(|&pos| self.children[pos].clone())
            .ok_or_else(|| RepositoryError::not_found("Child", id))
    }

    fn get_by_region(&self, region: &str) -> RepositoryResult<Vec<Child>> {
        let region = region.trim().to_lowercase();
        Ok(self.collect_where(|c| c.region.trim().to_lowercase() == region))
    }

    fn get_by_age_range(&self, min_age: i32, max_age: i32) -> RepositoryResult<Vec<Child>> {
        if min_age > max_age {
            return Err(RepositoryError::FieldValueError {
                field: "age_range".to_string(),
                message: format!("min_age={} > max_age={}", min_age, max_age),
            });
        }
        Ok(self.collect_where(|c| c.age >= min_age && c.age <= max_age))
    }

    fn get_by_tags(&self, tags: &[String]) -> RepositoryResult<Vec<Child>> {
        Ok(self.collect_where(|c| tags.iter().any(|t| c.has_tag(t))))
    }
}
