// ==========================================
// 礼品分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 来源优先级: 环境变量 GIFTCALC_* > 配置文件 (JSON) > 默认值
// ==========================================

use crate::config::gift_config::GiftCalcConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "GIFTCALC_";

// ==========================================
// ConfigError - 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置项取值无效 (key={key}, value={value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置校验失败: {0}")]
    Validation(String),
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
}

impl ConfigManager {
    /// 创建空配置（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载
    ///
    /// 文件为扁平对象, 值可为字符串/数字/布尔, 例如:
    /// `{"max_items": 5, "fallback_category": "standard"}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_text = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path_text.clone(),
            source,
        })?;

        let manager = Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path_text.clone(),
            source,
        })?;

        info!(path = %path_text, keys = manager.values.len(), "配置文件已加载");
        Ok(manager)
    }

    /// 从 JSON 字符串加载（null 值忽略, 嵌套值保留为 JSON 文本）
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let object: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let values = object
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect();
        Ok(Self { values })
    }

    /// 应用环境变量覆写: GIFTCALC_MAX_ITEMS → max_items
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::vars())
    }

    /// 应用任意键值覆写（仅接受带前缀的已知键）
    pub fn with_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = suffix.to_ascii_lowercase();
            if config_keys::ALL.contains(&key.as_str()) {
                debug!(key = %key, "环境变量覆写配置");
                self.values.insert(key, value);
            }
        }
        self
    }

    /// 设置配置值
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// 读取配置值
    pub fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// 读取配置值，带默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_config_value(key)
            .unwrap_or(default)
            .to_string()
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 生成类型化配置快照（已校验）
    pub fn load_gift_config(&self) -> Result<GiftCalcConfig, ConfigError> {
        let defaults = GiftCalcConfig::default();

        let config = GiftCalcConfig {
            max_items: self.parse_or(config_keys::MAX_ITEMS, defaults.max_items)?,
            min_items: self.parse_or(config_keys::MIN_ITEMS, defaults.min_items)?,
            fallback_category: self
                .get_config_or_default(config_keys::FALLBACK_CATEGORY, &defaults.fallback_category),
            worker_count: self.parse_or(config_keys::WORKER_COUNT, defaults.worker_count)?,
            max_gift_price: self.parse_or(config_keys::MAX_GIFT_PRICE, defaults.max_gift_price)?,
            total_budget: self.parse_or(config_keys::TOTAL_BUDGET, defaults.total_budget)?,
            report_version: self
                .get_config_or_default(config_keys::REPORT_VERSION, &defaults.report_version),
            progress_interval: self
                .parse_or(config_keys::PROGRESS_INTERVAL, defaults.progress_interval)?,
            enable_metrics: self.parse_or(config_keys::ENABLE_METRICS, defaults.enable_metrics)?,
            strict_requirements: self
                .parse_or(config_keys::STRICT_REQUIREMENTS, defaults.strict_requirements)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// 全部配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> String {
        serde_json::to_string(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 选择
    pub const MAX_ITEMS: &str = "max_items";
    pub const MIN_ITEMS: &str = "min_items";
    pub const FALLBACK_CATEGORY: &str = "fallback_category";

    // 预算
    pub const MAX_GIFT_PRICE: &str = "max_gift_price";
    pub const TOTAL_BUDGET: &str = "total_budget";

    // 批处理
    pub const WORKER_COUNT: &str = "worker_count";
    pub const PROGRESS_INTERVAL: &str = "progress_interval";
    pub const ENABLE_METRICS: &str = "enable_metrics";

    // 报告
    pub const REPORT_VERSION: &str = "report_version";

    // 输入校验
    pub const STRICT_REQUIREMENTS: &str = "strict_requirements";

    pub const ALL: &[&str] = &[
        MAX_ITEMS,
        MIN_ITEMS,
        FALLBACK_CATEGORY,
        MAX_GIFT_PRICE,
        TOTAL_BUDGET,
        WORKER_COUNT,
        PROGRESS_INTERVAL,
        ENABLE_METRICS,
        REPORT_VERSION,
        STRICT_REQUIREMENTS,
    ];
}
