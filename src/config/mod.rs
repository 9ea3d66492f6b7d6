// ==========================================
// 礼品分配系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持文件 + 环境变量覆写
// ==========================================

pub mod config_manager;
pub mod gift_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager};
pub use gift_config::GiftCalcConfig;
