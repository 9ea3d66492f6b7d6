// ==========================================
// 礼品分配系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合批次编排所需的全部只读仓储
// ==========================================

use std::sync::Arc;

use crate::repository::{ChildRepository, GiftRepository, RegionRepository, WishRepository};

/// 批次仓储集合
///
/// # 包含的仓储
/// - `children`: 儿童档案（运行开始时一次性读取）
/// - `gifts`: 礼品目录
/// - `wishes`: 愿望（可缺省, 缺省时跳过愿望阶段）
/// - `regions`: 地区系数
#[derive(Clone)]
pub struct GiftRepositories {
    pub children: Arc<dyn ChildRepository>,
    pub gifts: Arc<dyn GiftRepository>,
    pub wishes: Option<Arc<dyn WishRepository>>,
    pub regions: Arc<dyn RegionRepository>,
}

impl GiftRepositories {
    pub fn new(
        children: Arc<dyn ChildRepository>,
        gifts: Arc<dyn GiftRepository>,
        wishes: Option<Arc<dyn WishRepository>>,
        regions: Arc<dyn RegionRepository>,
    ) -> Self {
        Self {
            children,
            gifts,
            wishes,
            regions,
        }
    }

    pub fn children(&self) -> &Arc<dyn ChildRepository> {
        &self.children
    }

    pub fn gifts(&self) -> &Arc<dyn GiftRepository> {
        &self.gifts
    }

    /// 愿望仓储（可能缺省）
    pub fn wishes(&self) -> Option<&Arc<dyn WishRepository>> {
        self.wishes.as_ref()
    }

    pub fn regions(&self) -> &Arc<dyn RegionRepository> {
        &self.regions
    }
}

impl std::fmt::Debug for GiftRepositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiftRepositories")
            .field("has_wishes", &self.wishes.is_some())
            .finish_non_exhaustive()
    }
}
