// ==========================================
// 礼品分配系统 - 地区系数
// ==========================================

use serde::{Deserialize, Serialize};

/// 缺省地区系数
pub const DEFAULT_COEFFICIENT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub coefficient: f64,
}

impl Region {
    /// 系数是否可直接使用（> 0 且有限）
    pub fn has_usable_coefficient(&self) -> bool {
        self.coefficient.is_finite() && self.coefficient > 0.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("地区名称为空".to_string());
        }
        Ok(())
    }
}
