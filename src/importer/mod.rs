// ==========================================
// 礼品分配系统 - 文件适配层
// ==========================================
// 职责: JSON 数据文件 → 只读仓储; 报告 → JSON / CSV 文件
// 说明: 引擎只依赖仓储与事件端口, 不感知文件格式
// ==========================================

pub mod error;
pub mod loader;
pub mod report_writer;

pub use error::{ImportError, ImportResult};
pub use loader::{DataLoader, DataSources, LoadedData};
pub use report_writer::{render_csv, CsvSummaryWriter, JsonReportWriter, ReportSink};
