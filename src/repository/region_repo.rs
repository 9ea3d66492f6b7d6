// ==========================================
// 礼品分配系统 - 地区系数仓储
// ==========================================

use crate::domain::region::Region;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;

/// 地区系数仓储
///
/// get_coefficient 出错可恢复（定价侧回退为 1.0）
pub trait RegionRepository: Send + Sync {
    fn get_coefficient(&self, region: &str) -> RepositoryResult<f64>;

    fn get_all(&self) -> RepositoryResult<Vec<Region>>;
}

pub struct InMemoryRegionRepository {
    regions: Vec<Region>,
    // 小写名称 → 位置
    index: HashMap<String, usize>,
}

impl InMemoryRegionRepository {
    pub fn new(regions: Vec<Region>) -> Self {
        let mut index = HashMap::with_capacity(regions.len());
        for (pos, region) in regions.iter().enumerate() {
            index.entry(region.name.trim().to_lowercase()).or_insert(pos);
        }
        Self { regions, index }
    }
}

impl RegionRepository for InMemoryRegionRepository {
    fn get_coefficient(&self, region: &str) -> RepositoryResult<f64> {
        self.index
            .get(&region.trim().to_lowercase())
            .map(|&pos| self.regions[pos].coefficient)
            .ok_or_else(|| RepositoryError::not_found("Region", region))
    }

    fn get_all(&self) -> RepositoryResult<Vec<Region>> {
        Ok(self.regions.clone())
    }
}
