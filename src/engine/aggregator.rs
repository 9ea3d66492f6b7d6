// ==========================================
// 礼品分配系统 - 报告聚合器
// ==========================================
// 职责: 汇总单儿童结果为运行报告
// 红线: 运行级计数器只由聚合器写入（单一写者）
// 排序: 结果到达顺序不确定, 定稿前按 child_id 稳定排序一次
// 浮点: 总成本/总重量在排序后求和, 与到达顺序无关
// ==========================================

use crate::domain::child::Child;
use crate::domain::report::{AgeGroupAnalysis, ChildResult, Report, ReportParameters, ReportSummary};
use crate::domain::types::{AgeGroup, ResultStatus};
use crate::engine::events::{GiftEvent, GiftEventPublisher};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// 报告元信息
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub version: String,
    pub parameters: ReportParameters,
}

// ==========================================
// ReportAggregator - 报告聚合器
// ==========================================
#[derive(Debug)]
pub struct ReportAggregator {
    expected: usize,
    results: Vec<ChildResult>,
    successful: usize,
    failed: usize,
    cancelled: usize,
    over_budget: usize,
    min_cost: Option<f64>,
    max_cost: f64,
    total_items: usize,
    progress_interval: usize,
    enable_metrics: bool,
}

impl ReportAggregator {
    /// # 参数
    /// - expected: 已分发儿童数
    /// - progress_interval: 进度日志间隔
    /// - enable_metrics: 是否输出进度
    pub fn new(expected: usize, progress_interval: usize, enable_metrics: bool) -> Self {
        Self {
            expected,
            results: Vec::with_capacity(expected),
            successful: 0,
            failed: 0,
            cancelled: 0,
            over_budget: 0,
            min_cost: None,
            max_cost: 0.0,
            total_items: 0,
            progress_interval,
            enable_metrics,
        }
    }

    pub fn processed(&self) -> usize {
        self.results.len()
    }

    /// 累加一条结果
    pub fn add(&mut self, result: ChildResult, events: &dyn GiftEventPublisher) {
        match result.status {
            ResultStatus::Success => {
                let cost = result.cost.final_cost;
                self.successful += 1;
                self.total_items += result.cost.items_count;
                self.max_cost = self.max_cost.max(cost);
                self.min_cost = Some(self.min_cost.map_or(cost, |m| m.min(cost)));
                if result.over_budget {
                    self.over_budget += 1;
                }
            }
            ResultStatus::Failed => self.failed += 1,
            ResultStatus::Cancelled => self.cancelled += 1,
        }
        self.results.push(result);

        let processed = self.results.len();
        if self.enable_metrics && self.progress_interval > 0 && processed % self.progress_interval == 0 {
            events.publish(&GiftEvent::Progress {
                processed,
                total: self.expected,
            });
        }
    }

    /// 为未产出结果的已分发儿童补充取消结果
    ///
    /// # 返回
    /// 补充的条数
    pub fn fill_cancelled(&mut self, dispatched: &[Child], events: &dyn GiftEventPublisher) -> usize {
        let reported: HashSet<i64> = self.results.iter().map(|r| r.child_id).collect();
        let missing: Vec<ChildResult> = dispatched
            .iter()
            .filter(|c| !reported.contains(&c.id))
            .map(ChildResult::cancelled)
            .collect();

        let count = missing.len();
        for result in missing {
            self.add(result, events);
        }
        count
    }

    /// 定稿报告
    pub fn finalize(mut self, meta: ReportMeta) -> Report {
        self.results.sort_by_key(|r| r.child_id);

        let (total_cost, total_weight) = self
            .results
            .iter()
            .filter(|r| r.is_success())
            .fold((0.0, 0.0), |(cost, weight), r| {
                (cost + r.cost.final_cost, weight + r.cost.total_weight)
            });

        let avg_cost_per_gift = if self.successful > 0 {
            total_cost / self.successful as f64
        } else {
            0.0
        };
        let budget_usage = meta
            .parameters
            .total_budget
            .filter(|b| *b > 0.0)
            .map(|b| total_cost / b * 100.0);

        let summary = ReportSummary {
            total_children: self.results.len(),
            successful: self.successful,
            failed: self.failed,
            cancelled: self.cancelled,
            avg_cost_per_gift,
            min_cost: self.min_cost.unwrap_or(0.0),
            max_cost: self.max_cost,
            total_weight,
            total_items: self.total_items,
            over_budget: self.over_budget,
            budget_usage,
        };

        Report {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: meta.version,
            parameters: meta.parameters,
            age_group_analysis: age_group_analysis(&self.results),
            results: self.results,
            summary,
            total_cost,
        }
    }
}

/// 按年龄分组统计成功结果（只输出有儿童的分组）
pub fn age_group_analysis(results: &[ChildResult]) -> Vec<AgeGroupAnalysis> {
    let mut groups: BTreeMap<AgeGroup, (usize, f64)> = BTreeMap::new();
    for result in results.iter().filter(|r| r.is_success()) {
        let entry = groups.entry(result.age_group()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += result.cost.final_cost;
    }

    groups
        .into_iter()
        .map(|(group, (count, total))| {
            let (min_age, max_age) = group.age_range();
            AgeGroupAnalysis {
                age_group: group,
                min_age,
                max_age,
                children_count: count,
                total_cost: total,
                average_cost: total / count as f64,
            }
        })
        .collect()
}
