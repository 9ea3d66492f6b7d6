// ==========================================
// 礼品分配系统 - 报告输出
// ==========================================
// 职责: 报告序列化为 JSON 文件 / 单儿童 CSV 汇总
// 接口: ReportSink（异步写出端口）
// ==========================================

use crate::domain::report::{ChildResult, Report};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 报告写出端口
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// 写出名称（日志用）
    fn name(&self) -> &str;

    async fn write(&self, report: &Report) -> ImportResult<()>;
}

async fn write_file(path: &Path, bytes: &[u8]) -> ImportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", parent.display(), e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))
}

// ==========================================
// JsonReportWriter - JSON 报告
// ==========================================
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    path: PathBuf,
    pretty: bool,
}

impl JsonReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for JsonReportWriter {
    fn name(&self) -> &str {
        "json"
    }

    async fn write(&self, report: &Report) -> ImportResult<()> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(report)?
        } else {
            serde_json::to_vec(report)?
        };
        write_file(&self.path, &bytes).await?;
        info!(path = %self.path.display(), results = report.results.len(), "JSON 报告已写出");
        Ok(())
    }
}

// ==========================================
// CsvSummaryWriter - 单儿童 CSV 汇总
// ==========================================
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    child_id: i64,
    child_name: &'a str,
    age: i32,
    region: &'a str,
    status: &'a str,
    items_count: usize,
    /// 以 ; 分隔的商品ID
    item_ids: String,
    total_cost: f64,
    coefficient: f64,
    final_cost: f64,
    total_weight: f64,
    budget_optimized: bool,
    over_budget: bool,
    error: &'a str,
}

impl<'a> From<&'a ChildResult> for CsvRow<'a> {
    fn from(result: &'a ChildResult) -> Self {
        CsvRow {
            child_id: result.child_id,
            child_name: &result.child_name,
            age: result.age,
            region: &result.region,
            status: result.status.as_str(),
            items_count: result.cost.items_count,
            item_ids: result
                .selections
                .iter()
                .map(|s| s.item.id.to_string())
                .collect::<Vec<_>>()
                .join(";"),
            total_cost: result.cost.total_cost,
            coefficient: result.cost.coefficient,
            final_cost: result.cost.final_cost,
            total_weight: result.cost.total_weight,
            budget_optimized: result.budget_optimized,
            over_budget: result.over_budget,
            error: result.error.as_deref().unwrap_or(""),
        }
    }
}

/// 生成 CSV 汇总文本（表头 + 每儿童一行, 按报告顺序）
pub fn render_csv(report: &Report) -> ImportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in &report.results {
        writer.serialize(CsvRow::from(result))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::CsvWriteError(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::CsvWriteError(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct CsvSummaryWriter {
    path: PathBuf,
}

impl CsvSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReportSink for CsvSummaryWriter {
    fn name(&self) -> &str {
        "csv"
    }

    async fn write(&self, report: &Report) -> ImportResult<()> {
        let text = render_csv(report)?;
        write_file(&self.path, text.as_bytes()).await?;
        info!(path = %self.path.display(), rows = report.results.len(), "CSV 汇总已写出");
        Ok(())
    }
}
