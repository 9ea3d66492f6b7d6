// ==========================================
// 礼品分配系统 - 导入/导出层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入/导出错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件写入失败: {0}")]
    FileWriteError(String),

    // ===== 解析错误 =====
    #[error("JSON 解析失败 ({file}): {message}")]
    JsonParseError { file: String, message: String },

    #[error("CSV 生成失败: {0}")]
    CsvWriteError(String),

    // ===== 数据质量错误 =====
    #[error("数据校验失败 ({file}): {message}")]
    ValidationError { file: String, message: String },

    #[error("ID 重复 ({entity}): {id}")]
    DuplicateId { entity: String, id: i64 },

    #[error("未识别的特殊需求 (child_id={child_id}): {requirements}")]
    UnknownRequirement { child_id: i64, requirements: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvWriteError(err.to_string())
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError {
            file: "<memory>".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
