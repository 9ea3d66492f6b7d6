// ==========================================
// 礼品分配系统 - 商品目录
// ==========================================
// 职责: 目录商品与合规元数据定义
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ItemMetadata - 合规判定用元数据
// ==========================================
// 所有字段缺省为 false / 空
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMetadata {
    // ===== 饮食信号 =====
    pub contains_meat: bool,
    pub contains_fish: bool,
    pub contains_dairy: bool,
    pub contains_nuts: bool,
    pub contains_gluten: bool,
    pub contains_sugar: bool,
    pub sugar_free: bool,
    pub vegetarian: bool,
    pub vegan: bool,
    pub halal_certified: bool,
    pub kosher_certified: bool,

    // ===== 安全信号 =====
    pub has_small_parts: bool,
    /// 小零件尺寸 (cm)
    pub small_parts_size: f64,
    pub hypoallergenic: bool,
    pub non_toxic: bool,
    pub washable: bool,
    pub flame_retardant: bool,
    pub bpa_free: bool,

    // ===== 医疗信号 =====
    pub has_flashing_lights: bool,
    pub has_fuzzy_material: bool,
    pub is_dusty: bool,
    pub calming_effect: bool,
    pub tactile: bool,
    pub predictable: bool,
    pub wireless_compatible: bool,
    pub accessible_size: bool,

    // ===== 其他信号 =====
    pub eco_friendly: bool,
    pub educational: bool,
    pub gender_neutral: bool,
    pub bilingual: bool,
    pub durable: bool,
    pub repairable: bool,
    pub charity_supported: bool,

    // ===== 自由文本 =====
    pub materials: Vec<String>,
    pub certifications: Vec<String>,
    pub warnings: Vec<String>,
}

// ==========================================
// CatalogItem - 目录商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub weight: f64,
    #[serde(default)]
    pub min_age: i32,
    #[serde(default)]
    pub metadata: ItemMetadata,
}

impl CatalogItem {
    /// 年龄准入: child.age >= item.min_age
    pub fn is_suitable_for_age(&self, age: i32) -> bool {
        age >= self.min_age
    }

    /// 边界校验
    ///
    /// # 规则
    /// - id > 0
    /// - name / category 非空
    /// - price / weight / min_age >= 0
    pub fn validate(&self) -> Result<(), String> {
        if self.id <= 0 {
            return Err(format!("商品ID必须为正数: id={}", self.id));
        }
        if self.name.trim().is_empty() {
            return Err(format!("商品名称为空: id={}", self.id));
        }
        if self.category.trim().is_empty() {
            return Err(format!("商品类别为空: id={}", self.id));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("商品价格无效: id={}, price={}", self.id, self.price));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(format!("商品重量无效: id={}, weight={}", self.id, self.weight));
        }
        if self.min_age < 0 {
            return Err(format!("商品最小年龄无效: id={}, min_age={}", self.id, self.min_age));
        }
        Ok(())
    }
}

/// 候选中严格低于 price 的最便宜商品（同价按ID升序）
pub fn cheapest_below<'a, I>(candidates: I, price: f64) -> Option<&'a CatalogItem>
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    candidates
        .into_iter()
        .filter(|c| c.price < price)
        .min_by(|a, b| a.price.total_cmp(&b.price).then(a.id.cmp(&b.id)))
}
