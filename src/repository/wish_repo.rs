// ==========================================
// 礼品分配系统 - 愿望清单仓储
// ==========================================

use crate::domain::wish::Wish;
use crate::repository::error::RepositoryResult;
use std::collections::HashMap;

/// 愿望清单仓储
///
/// 仓储本身可缺省（引擎侧为 Option），缺省时跳过愿望阶段
pub trait WishRepository: Send + Sync {
    /// 儿童的全部愿望（输入顺序），无愿望返回空列表
    fn get_by_child_id(&self, child_id: i64) -> RepositoryResult<Vec<Wish>>;

    fn get_all(&self) -> RepositoryResult<Vec<Wish>>;
}

pub struct InMemoryWishRepository {
    wishes: Vec<Wish>,
    by_child: HashMap<i64, Vec<usize>>,
}

impl InMemoryWishRepository {
    pub fn new(wishes: Vec<Wish>) -> Self {
        let mut by_child: HashMap<i64, Vec<usize>> = HashMap::new();
        for (pos, wish) in wishes.iter().enumerate() {
            by_child.entry(wish.child_id).or_default().push(pos);
        }
        Self { wishes, by_child }
    }
}

impl WishRepository for InMemoryWishRepository {
    fn get_by_child_id(&self, child_id: i64) -> RepositoryResult<Vec<Wish>> {
        Ok(self
            .by_child
            .get(&child_id)
            .map(|positions| positions.iter().map(|&p| self.wishes[p].clone()).collect())
            .unwrap_or_default())
    }

    fn get_all(&self) -> RepositoryResult<Vec<Wish>> {
        Ok(self.wishes.clone())
    }
}
