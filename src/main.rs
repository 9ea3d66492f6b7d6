// ==========================================
// 礼品分配系统 - 命令行入口
// ==========================================
// 子命令:
// - calculate: 运行批次并写出 JSON 报告（可选 CSV 汇总）
// - cost: 运行批次并打印成本汇总
// - production: 运行批次并打印生产计划
// 信号: SIGINT / SIGTERM 取消运行中的批次
// ==========================================

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gift_calc::config::{config_keys, ConfigManager, GiftCalcConfig};
use gift_calc::domain::report::{ProductionPlan, Report};
use gift_calc::engine::{BatchOrchestrator, TracingEventPublisher};
use gift_calc::importer::{CsvSummaryWriter, DataLoader, DataSources, JsonReportWriter, ReportSink};
use gift_calc::logging::{self, LogFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "giftcalc")]
#[command(about = "礼品分配批处理系统", version)]
struct Cli {
    /// 数据目录（children.json / catalog.json / wishes.json / regions.json）
    #[arg(short, long, global = true, env = "GIFTCALC_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// JSON 配置文件
    #[arg(short, long, global = true, env = "GIFTCALC_CONFIG")]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 日志格式
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Console)]
    log_format: LogFormat,

    /// 日志文件（默认输出到 stderr）
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// 详细输出（等同 --log-level debug）
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// 儿童数据文件（覆盖数据目录）
    #[arg(long)]
    children: Option<PathBuf>,

    /// 礼品目录文件
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// 愿望文件
    #[arg(long)]
    wishes: Option<PathBuf>,

    /// 地区系数文件
    #[arg(long)]
    regions: Option<PathBuf>,

    /// 单儿童价格上限
    #[arg(long)]
    max_gift_price: Option<f64>,

    /// 运行总预算
    #[arg(long)]
    total_budget: Option<f64>,

    /// 工作协程数
    #[arg(long)]
    workers: Option<usize>,

    /// 未识别的特殊需求视为错误
    #[arg(long)]
    strict: bool,

    /// 输出进度日志
    #[arg(long)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行批次并写出报告
    Calculate {
        #[command(flatten)]
        run: RunArgs,

        /// JSON 报告路径
        #[arg(long, default_value = "report.json")]
        report: PathBuf,

        /// CSV 汇总路径
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// 运行批次并打印成本汇总
    Cost {
        #[command(flatten)]
        run: RunArgs,
    },

    /// 运行批次并打印生产计划
    Production {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let _log_guard = logging::init_with(level, cli.log_format, cli.log_file.as_deref())?;

    info!("==================================================");
    info!("{} v{}", gift_calc::APP_NAME, gift_calc::VERSION);
    info!("==================================================");

    match &cli.command {
        Commands::Calculate { run, report, csv } => {
            let result = run_batch(&cli, run).await?;

            JsonReportWriter::new(report).write(&result).await?;
            if let Some(csv) = csv {
                CsvSummaryWriter::new(csv).write(&result).await?;
            }
            print_summary(&result);
            println!("报告已写出: {}", report.display());
        }
        Commands::Cost { run } => {
            let result = run_batch(&cli, run).await?;
            print_summary(&result);
        }
        Commands::Production { run } => {
            let result = run_batch(&cli, run).await?;
            print_production(&ProductionPlan::from_report(&result));
        }
    }

    Ok(())
}

/// 配置文件 → GIFTCALC_* 环境变量 → 命令行参数（后者优先）
fn load_config(config_path: Option<&Path>, run: &RunArgs) -> anyhow::Result<GiftCalcConfig> {
    let mut manager = match config_path {
        Some(path) => ConfigManager::from_json_file(path)?,
        None => ConfigManager::new(),
    }
    .with_env_overrides();

    if let Some(price) = run.max_gift_price {
        manager.set(config_keys::MAX_GIFT_PRICE, price.to_string());
    }
    if let Some(budget) = run.total_budget {
        manager.set(config_keys::TOTAL_BUDGET, budget.to_string());
    }
    if let Some(workers) = run.workers {
        manager.set(config_keys::WORKER_COUNT, workers.to_string());
    }
    if run.strict {
        manager.set(config_keys::STRICT_REQUIREMENTS, "true");
    }
    if run.metrics {
        manager.set(config_keys::ENABLE_METRICS, "true");
    }

    manager.load_gift_config().context("配置无效")
}

fn data_sources(data_dir: &Path, run: &RunArgs) -> DataSources {
    let mut sources = DataSources::in_dir(data_dir);
    if let Some(path) = &run.children {
        sources.children = path.clone();
    }
    if let Some(path) = &run.catalog {
        sources.catalog = path.clone();
    }
    if let Some(path) = &run.wishes {
        sources.wishes = Some(path.clone());
    }
    if let Some(path) = &run.regions {
        sources.regions = Some(path.clone());
    }
    sources
}

async fn run_batch(cli: &Cli, run: &RunArgs) -> anyhow::Result<Report> {
    let config = load_config(cli.config.as_deref(), run)?;
    let sources = data_sources(&cli.data_dir, run);

    let data = DataLoader::new(config.strict_requirements)
        .load(&sources)
        .await
        .context("加载数据失败")?;
    for warning in &data.warnings {
        warn!("{}", warning);
    }

    let orchestrator = BatchOrchestrator::new(data.into_repositories(), config, Arc::new(TracingEventPublisher));

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(shutdown_signal(cancel.clone()));
    let result = orchestrator.run(cancel, sources.data_files()).await;
    signal_task.abort();

    Ok(result?)
}

/// 等待 SIGINT / SIGTERM 并取消批次
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "无法监听 Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("收到终止信号, 正在取消批次");
    cancel.cancel();
}

fn print_summary(report: &Report) {
    let s = &report.summary;
    println!("运行ID:       {}", report.run_id);
    println!("儿童总数:     {}", s.total_children);
    println!("成功/失败/取消: {} / {} / {}", s.successful, s.failed, s.cancelled);
    println!("总成本:       {:.2}", report.total_cost);
    println!("平均成本:     {:.2}", s.avg_cost_per_gift);
    println!("最低/最高:    {:.2} / {:.2}", s.min_cost, s.max_cost);
    println!("总重量:       {:.2}", s.total_weight);
    println!("礼品总数:     {}", s.total_items);
    if s.over_budget > 0 {
        println!("超出上限:     {}", s.over_budget);
    }
    if let Some(usage) = s.budget_usage {
        println!("预算使用率:   {:.1}%", usage);
    }

    if !report.age_group_analysis.is_empty() {
        println!();
        println!("{:<14} {:>8} {:>12} {:>12}", "年龄组", "人数", "总成本", "平均成本");
        for group in &report.age_group_analysis {
            println!(
                "{:<14} {:>8} {:>12.2} {:>12.2}",
                format!("{} ({}-{})", group.age_group, group.min_age, group.max_age),
                group.children_count,
                group.total_cost,
                group.average_cost
            );
        }
    }
}

fn print_production(plan: &ProductionPlan) {
    println!("{:>8}  {:<32} {:<16} {:>8} {:>10} {:>12}", "ID", "名称", "类别", "数量", "重量", "成本");
    for line in &plan.lines {
        println!(
            "{:>8}  {:<32} {:<16} {:>8} {:>10.2} {:>12.2}",
            line.item_id, line.name, line.category, line.quantity, line.total_weight, line.total_cost
        );
    }
    println!();
    println!("合计数量: {}", plan.total_quantity);
    println!("合计重量: {:.2}", plan.total_weight);
}
