// ==========================================
// 礼品分配系统 - 批次编排器
// ==========================================
// 状态: Idle → Dispatching → Collecting → Finalized
// 流程:
// 1) 读取全部儿童（失败 → InputError, 分发前中止）
// 2) 快照价格上限, 启动有界工作池
// 3) 每个儿童: 愿望 → 选择 → 定价 → (超限时) 预算优化
// 4) 聚合器排空结果流, 补齐取消结果, 按 child_id 排序定稿
// ==========================================
// 红线:
// - 单儿童失败（含 panic）只影响该儿童结果
// - 运行中价格上限只读
// ==========================================

use crate::config::GiftCalcConfig;
use crate::domain::child::Child;
use crate::domain::report::{ChildResult, CostSummary, DataFiles, Report, ReportParameters};
use crate::domain::types::BatchState;
use crate::domain::wish::Wish;
use crate::engine::aggregator::{ReportAggregator, ReportMeta};
use crate::engine::budget_optimizer::BudgetOptimizer;
use crate::engine::catalog_filter::CatalogFilter;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{GiftEvent, GiftEventPublisher};
use crate::engine::gift_selector::{total_price, total_weight, GiftSelector};
use crate::engine::price_calculator::{round_to_cents, PriceCalculator};
use crate::engine::repositories::GiftRepositories;
use crate::engine::worker_pool::WorkerPool;
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

// ==========================================
// ChildProcessor - 单儿童处理流水线
// ==========================================
struct ChildProcessor {
    repos: GiftRepositories,
    selector: GiftSelector,
    calculator: PriceCalculator,
    optimizer: BudgetOptimizer,
    events: Arc<dyn GiftEventPublisher>,
}

impl ChildProcessor {
    /// 读取愿望（仓储缺省 → 空; 查询失败 → 空 + 警告）
    fn load_wishes(&self, child: &Child) -> (Vec<Wish>, Option<String>) {
        let Some(repo) = self.repos.wishes() else {
            return (Vec::new(), None);
        };

        match repo.get_by_child_id(child.id) {
            Ok(wishes) => (wishes, None),
            Err(e) => {
                warn!(child_id = child.id, error = %e, "愿望查询失败, 按无愿望处理");
                self.events.publish(&GiftEvent::WishLookupFailed {
                    child_id: child.id,
                    error: e.to_string(),
                });
                (Vec::new(), Some(format!("愿望查询失败: {}", e)))
            }
        }
    }

    fn process(&self, child: &Child, ceiling: Option<f64>) -> ChildResult {
        let events = self.events.as_ref();
        let (wishes, wish_warning) = self.load_wishes(child);

        let outcome = match self.selector.select(child, &wishes, self.repos.gifts().as_ref(), events) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(child_id = child.id, error = %e, "礼品选择失败");
                events.publish(&GiftEvent::SelectionFailed {
                    child_id: child.id,
                    reason: e.to_string(),
                });
                let mut result = ChildResult::failed(child, e.to_string());
                result.warnings.extend(wish_warning);
                return result;
            }
        };

        let mut warnings: Vec<String> = wish_warning.into_iter().collect();
        warnings.extend(outcome.warnings);

        let quote = self
            .calculator
            .price(child, &outcome.selections, self.repos.regions().as_ref(), events);
        warnings.extend(quote.warning);

        let mut selections = outcome.selections;
        let mut final_cost = quote.final_cost;
        let mut budget_optimized = false;
        let mut over_budget = false;

        if let Some(ceiling) = ceiling.filter(|c| final_cost > *c) {
            let optimized = self
                .optimizer
                .optimize(&selections, quote.coefficient, ceiling, &outcome.fallback_pool);

            if !optimized.feasible {
                over_budget = true;
                events.publish(&GiftEvent::OptimizationInfeasible {
                    child_id: child.id,
                    final_cost,
                    ceiling,
                });
                warnings.push(
                    EngineError::OptimizationInfeasible {
                        child_id: child.id,
                        final_cost,
                        ceiling,
                    }
                    .to_string(),
                );
            } else if optimized.changed {
                events.publish(&GiftEvent::BudgetOptimized {
                    child_id: child.id,
                    before: final_cost,
                    after: optimized.final_cost,
                    substituted: optimized.substituted,
                    removed: optimized.removed,
                });
                budget_optimized = true;
                selections = optimized.selections;
                final_cost = optimized.final_cost;
            }
        }

        if let Some(notes) = child.notes() {
            warnings.push(format!("儿童备注需人工复核: {}", notes));
        }

        let cost = CostSummary {
            total_cost: round_to_cents(total_price(&selections)),
            total_weight: total_weight(&selections),
            coefficient: quote.coefficient,
            final_cost,
            items_count: selections.len(),
        };

        let mut result = ChildResult::success(child, selections, cost);
        result.warnings = warnings;
        result.budget_optimized = budget_optimized;
        result.over_budget = over_budget;
        result
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}

/// 在阻塞线程池中处理单个儿童, panic 转换为失败结果
async fn process_isolated(
    processor: Arc<ChildProcessor>,
    worker_id: usize,
    child: Child,
    ceiling: Option<f64>,
) -> ChildResult {
    let events = processor.events.clone();
    let fallback = child.clone();

    match tokio::task::spawn_blocking(move || processor.process(&child, ceiling)).await {
        Ok(result) => result,
        Err(e) => {
            let message = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            warn!(worker_id, child_id = fallback.id, error = %message, "儿童处理异常, 已隔离");
            events.publish(&GiftEvent::ChildFault {
                child_id: fallback.id,
                message: message.clone(),
            });
            ChildResult::failed(&fallback, format!("处理异常: {}", message))
        }
    }
}

// ==========================================
// BatchOrchestrator - 批次编排器
// ==========================================
pub struct BatchOrchestrator {
    repos: GiftRepositories,
    config: GiftCalcConfig,
    events: Arc<dyn GiftEventPublisher>,
    processor: Arc<ChildProcessor>,
    state: Mutex<BatchState>,
    max_gift_price: RwLock<Option<f64>>,
}

impl BatchOrchestrator {
    /// # 参数
    /// - repos: 只读仓储集合
    /// - config: 运行配置（初始价格上限取自 max_gift_price）
    /// - events: 诊断端口
    pub fn new(repos: GiftRepositories, config: GiftCalcConfig, events: Arc<dyn GiftEventPublisher>) -> Self {
        let processor = ChildProcessor {
            repos: repos.clone(),
            selector: GiftSelector::new(CatalogFilter::default(), &config),
            calculator: PriceCalculator::new(),
            optimizer: BudgetOptimizer::new(),
            events: events.clone(),
        };

        Self {
            max_gift_price: RwLock::new(config.price_ceiling()),
            repos,
            config,
            events,
            processor: Arc::new(processor),
            state: Mutex::new(BatchState::Idle),
        }
    }

    pub fn config(&self) -> &GiftCalcConfig {
        &self.config
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_gift_price(&self) -> Option<f64> {
        *self.max_gift_price.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// 设置单儿童价格上限（None 表示不限）
    ///
    /// # 错误
    /// - BatchRunning: 批次分发/收集中
    /// - Input: 上限非正或非有限值
    pub fn set_max_gift_price(&self, price: Option<f64>) -> EngineResult<()> {
        if let Some(p) = price {
            if !(p.is_finite() && p > 0.0) {
                return Err(EngineError::Input(format!("价格上限必须为正数: {}", p)));
            }
        }

        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_running() {
            return Err(EngineError::BatchRunning(*state));
        }
        *self.max_gift_price.write().unwrap_or_else(PoisonError::into_inner) = price;
        info!(max_gift_price = ?price, "价格上限已更新");
        Ok(())
    }

    fn transition(&self, to: BatchState) {
        let from = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, to)
        };
        debug!(%from, %to, "批次状态变更");
        self.events.publish(&GiftEvent::StateChanged { from, to });
    }

    /// 进入 Dispatching 并快照价格上限
    fn begin(&self) -> EngineResult<Option<f64>> {
        let (from, ceiling) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.is_running() {
                return Err(EngineError::BatchRunning(*state));
            }
            let ceiling = *self.max_gift_price.read().unwrap_or_else(PoisonError::into_inner);
            (std::mem::replace(&mut *state, BatchState::Dispatching), ceiling)
        };
        self.events.publish(&GiftEvent::StateChanged {
            from,
            to: BatchState::Dispatching,
        });
        Ok(ceiling)
    }

    fn load_children(&self) -> EngineResult<Vec<Child>> {
        let children = self
            .repos
            .children()
            .get_all()
            .map_err(|e| EngineError::Input(format!("读取儿童数据失败: {}", e)))?;

        let mut seen = HashSet::with_capacity(children.len());
        for child in &children {
            child
                .validate()
                .map_err(|e| EngineError::Input(format!("儿童数据无效: id={}, {}", child.id, e)))?;
            if !seen.insert(child.id) {
                return Err(EngineError::Input(format!("儿童ID重复: {}", child.id)));
            }
        }
        Ok(children)
    }

    /// 执行一次批次
    ///
    /// # 参数
    /// - cancel: 取消令牌（工作协程在儿童之间检查）
    /// - data_files: 记录到报告参数中的数据来源
    ///
    /// # 返回
    /// - Ok(Report): 每个已分发儿童恰好一条结果
    /// - Err(Input): 儿童数据读取/校验失败, 未分发
    /// - Err(BatchRunning): 已有批次在运行
    #[instrument(skip(self, cancel, data_files), fields(workers = self.config.worker_count))]
    pub async fn run(&self, cancel: CancellationToken, data_files: DataFiles) -> EngineResult<Report> {
        let ceiling = self.begin()?;

        let children = match self.load_children() {
            Ok(children) => children,
            Err(e) => {
                warn!(error = %e, "儿童数据不可用, 批次中止");
                self.transition(BatchState::Idle);
                return Err(e);
            }
        };

        let pool = WorkerPool::new(self.config.worker_count);
        let worker_count = pool.worker_count(children.len());
        info!(
            children = children.len(),
            workers = worker_count,
            max_gift_price = ?ceiling,
            "批次开始分发"
        );

        let processor = self.processor.clone();
        let mut handle = pool.start(children.clone(), cancel, move |worker_id, child: Child| {
            process_isolated(processor.clone(), worker_id, child, ceiling)
        });

        self.transition(BatchState::Collecting);

        let mut aggregator = ReportAggregator::new(
            children.len(),
            self.config.progress_interval,
            self.config.enable_metrics,
        );
        while let Some(result) = handle.next_result().await {
            aggregator.add(result, self.events.as_ref());
        }
        let stats = handle.join().await;

        let cancelled = aggregator.fill_cancelled(&children, self.events.as_ref());
        if cancelled > 0 {
            warn!(cancelled, processed = stats.processed, "批次被取消, 未处理儿童标记为 cancelled");
        }

        let parameters = ReportParameters {
            max_gift_price: ceiling,
            total_budget: self.config.budget_limit(),
            max_items: self.config.max_items,
            min_items: self.config.min_items.min(self.config.max_items),
            fallback_category: self.config.fallback_category.clone(),
            worker_count,
            data_files,
        };
        let report = aggregator.finalize(ReportMeta {
            version: self.config.report_version.clone(),
            parameters,
        });

        self.transition(BatchState::Finalized);
        info!(
            run_id = %report.run_id,
            total = report.summary.total_children,
            successful = report.summary.successful,
            failed = report.summary.failed,
            cancelled = report.summary.cancelled,
            total_cost = report.total_cost,
            "批次完成"
        );

        Ok(report)
    }
}
