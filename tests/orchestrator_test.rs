// ==========================================
// 批次编排集成测试
// ==========================================
// 覆盖: 聚合不变量 / 确定性 / 取消 / 价格上限 / 故障隔离 / 仓储异常
// ==========================================


use gift_calc::config::GiftCalcConfig;
use gift_calc::domain::catalog::CatalogItem;
use gift_calc::domain::child::Child;
use gift_calc::domain::report::{DataFiles, Report};
use gift_calc::domain::requirements::{DietaryRequirement, SafetyRequirement, SpecialRequirements};
use gift_calc::domain::types::{BatchState, ResultStatus, SelectionReason, WishPriority};
use gift_calc::domain::wish::Wish;
use gift_calc::engine::error::EngineError;
use gift_calc::engine::events::{GiftEvent, GiftEventPublisher, NoOpEventPublisher};
use gift_calc::engine::orchestrator::BatchOrchestrator;
use gift_calc::engine::repositories::GiftRepositories;
use gift_calc::repository::{
    ChildRepository, GiftRepository, InMemoryGiftRepository, InMemoryRegionRepository, RepositoryError,
    RepositoryResult, WishRepository,
};
use std::sync::Arc;
use test_helpers::*;
use tokio_util::sync::CancellationToken;

// ==========================================
// 测试数据
// ==========================================

fn catalog() -> Vec<CatalogItem> {
    let mut items = vec![
        ItemBuilder::new(1).name("Конструктор").price(25.0).min_age(6).build(),
        ItemBuilder::new(2).name("Кукла").price(15.0).build(),
        ItemBuilder::new(3).name("Сыр").category("food").price(4.0).metadata(|m| m.contains_dairy = true).build(),
        ItemBuilder::new(4).name("Пазл").price(12.5).min_age(3).build(),
        ItemBuilder::new(5)
            .name("Мелкие кубики")
            .price(8.0)
            .metadata(|m| {
                m.has_small_parts = true;
                m.small_parts_size = 1.5;
            })
            .build(),
        ItemBuilder::new(6).name("Книга").category("books").price(9.99).build(),
    ];
    items.extend(standard_items(100, 5, 3.5));
    items
}

fn children(count: i64) -> Vec<Child> {
    (1..=count)
        .map(|id| {
            let mut builder = ChildBuilder::new(id)
                .age((id % 17) as i32 + 1)
                .region(if id % 3 == 0 { "Север" } else { "Юг" });
            if id % 4 == 0 {
                builder = builder.requirements(SpecialRequirements {
                    dietary: vec![DietaryRequirement::Vegan],
                    safety: vec![SafetyRequirement::NoSmallParts],
                    ..Default::default()
                });
            }
            builder.build()
        })
        .collect()
}

fn wishes(count: i64) -> Vec<Wish> {
    (1..=count)
        .flat_map(|id| {
            vec![
                wish(id, vec![(id % 6) + 1, 3], WishPriority::Medium),
                wish(id, vec![5, (id % 4) + 1], WishPriority::High),
            ]
        })
        .collect()
}

fn repos(count: i64) -> GiftRepositories {
    repositories(
        children(count),
        catalog(),
        Some(wishes(count)),
        vec![region("Север", 1.5), region("Юг", 0.9)],
    )
}

fn config(workers: usize) -> GiftCalcConfig {
    GiftCalcConfig {
        worker_count: workers,
        ..Default::default()
    }
}

async fn run(orchestrator: &BatchOrchestrator) -> Report {
    orchestrator
        .run(CancellationToken::new(), DataFiles::default())
        .await
        .unwrap()
}

// ==========================================
// 聚合与确定性
// ==========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_aggregation_invariants() {
    let events = Arc::new(CollectingEventPublisher::new());
    let config = GiftCalcConfig {
        worker_count: 4,
        enable_metrics: true,
        progress_interval: 5,
        ..Default::default()
    };
    let orchestrator = BatchOrchestrator::new(repos(20), config, events.clone());

    let report = run(&orchestrator).await;
    let s = &report.summary;

    assert_eq!(orchestrator.state(), BatchState::Finalized);
    assert_eq!(s.total_children, 20);
    assert_eq!(s.total_children, s.successful + s.failed + s.cancelled);
    assert_eq!(s.cancelled, 0);

    let sum: f64 = report.successful_results().map(|r| r.cost.final_cost).sum();
    assert!((report.total_cost - sum).abs() < 1e-6);

    let ids: Vec<i64> = report.results.iter().map(|r| r.child_id).collect();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());

    let children = children(20);
    for (result, child) in report.results.iter().zip(&children) {
        assert!(result.selections.len() <= 5);
        for selection in &result.selections {
            assert!(child.age >= selection.item.min_age);
        }
        let mut ids: Vec<i64> = result.selections.iter().map(|s| s.item.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), result.selections.len());
    }

    assert_eq!(events.count("Progress"), 4);
    assert_eq!(events.count("StateChanged"), 3);
    assert!(!report.age_group_analysis.is_empty());
}

#[tokio::test]
async fn test_requirements_respected_in_batch() {
    let orchestrator = BatchOrchestrator::new(repos(12), config(3), Arc::new(NoOpEventPublisher));
    let report = run(&orchestrator).await;

    // 每 4 个儿童一个 vegan + no_small_parts
    for result in report.results.iter().filter(|r| r.child_id % 4 == 0) {
        assert!(result.is_success());
        assert!(result.selections.iter().all(|s| s.item.id != 3 && s.item.id != 5));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_runs_are_deterministic() {
    let first = run(&BatchOrchestrator::new(repos(30), config(8), Arc::new(NoOpEventPublisher))).await;
    let second = run(&BatchOrchestrator::new(repos(30), config(1), Arc::new(NoOpEventPublisher))).await;

    assert_eq!(first.results, second.results);
    assert_eq!(first.summary, second.summary);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_orchestrator_can_run_again_after_finalize() {
    let orchestrator = BatchOrchestrator::new(repos(3), config(2), Arc::new(NoOpEventPublisher));

    let first = run(&orchestrator).await;
    orchestrator.set_max_gift_price(Some(1000.0)).unwrap();
    let second = run(&orchestrator).await;

    assert_eq!(first.results.len(), second.results.len());
    assert_eq!(second.parameters.max_gift_price, Some(1000.0));
}

// ==========================================
// 取消
// ==========================================

#[tokio::test]
async fn test_cancelled_before_dispatch_marks_all_children() {
    let orchestrator = BatchOrchestrator::new(repos(6), config(2), Arc::new(NoOpEventPublisher));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = orchestrator.run(cancel, DataFiles::default()).await.unwrap();

    assert_eq!(report.summary.cancelled, 6);
    assert_eq!(report.summary.successful, 0);
    assert_eq!(report.total_cost, 0.0);
    assert!(report
        .results
        .iter()
        .all(|r| r.status == ResultStatus::Cancelled && r.error.as_deref() == Some("cancelled")));
}

/// 收到首个系数回退事件时取消批次
struct CancelOnCoefficientDefault {
    cancel: CancellationToken,
}

impl GiftEventPublisher for CancelOnCoefficientDefault {
    fn publish(&self, event: &GiftEvent) {
        if matches!(event, GiftEvent::CoefficientDefaulted { .. }) {
            self.cancel.cancel();
        }
    }
}

#[tokio::test]
async fn test_cancel_during_run_stops_pulling_new_children() {
    let kids: Vec<Child> = (1..=10)
        .map(|id| ChildBuilder::new(id).region("Атлантида").build())
        .collect();
    let repos = repositories(kids, catalog(), None, vec![]);
    let cancel = CancellationToken::new();
    let events = Arc::new(CancelOnCoefficientDefault { cancel: cancel.clone() });
    let orchestrator = BatchOrchestrator::new(repos, config(1), events);

    let report = orchestrator.run(cancel, DataFiles::default()).await.unwrap();
    let s = &report.summary;

    assert_eq!(s.total_children, 10);
    assert_eq!(s.total_children, s.successful + s.failed + s.cancelled);
    assert_eq!(s.successful, 1);
    assert_eq!(s.cancelled, 9);
    assert_eq!(report.results[0].status, ResultStatus::Success);
    for result in &report.results[1..] {
        assert_eq!(result.status, ResultStatus::Cancelled);
        assert_eq!(result.error.as_deref(), Some("cancelled"));
        assert!(result.selections.is_empty());
    }
    assert_eq!(report.total_cost, report.results[0].cost.final_cost);
}

// ==========================================
// 价格上限
// ==========================================

#[tokio::test]
async fn test_price_ceiling_applied() {
    let events = Arc::new(CollectingEventPublisher::new());
    let orchestrator = BatchOrchestrator::new(repos(10), config(4), events.clone());
    orchestrator.set_max_gift_price(Some(20.0)).unwrap();

    let report = run(&orchestrator).await;

    assert_eq!(report.parameters.max_gift_price, Some(20.0));
    for result in report.successful_results() {
        assert!(result.cost.final_cost <= 20.0 || result.over_budget, "child {}", result.child_id);
    }
    assert!(report.results.iter().any(|r| r.budget_optimized));
    assert_eq!(
        events.count("BudgetOptimized"),
        report.results.iter().filter(|r| r.budget_optimized).count()
    );
}

#[tokio::test]
async fn test_infeasible_ceiling_keeps_selection() {
    let events = Arc::new(CollectingEventPublisher::new());
    let repos = repositories(
        vec![ChildBuilder::new(1).region("Юг").build()],
        vec![ItemBuilder::new(1).price(30.0).build()],
        Some(vec![wish(1, vec![1], WishPriority::High)]),
        vec![region("Юг", 1.0)],
    );
    let config = GiftCalcConfig {
        max_gift_price: 10.0,
        ..Default::default()
    };
    let orchestrator = BatchOrchestrator::new(repos, config, events.clone());

    let report = run(&orchestrator).await;
    let result = &report.results[0];

    assert!(result.is_success());
    assert!(result.over_budget);
    assert_eq!(result.selections.len(), 1);
    assert_eq!(result.cost.final_cost, 30.0);
    assert_eq!(report.summary.over_budget, 1);
    assert_eq!(events.count("OptimizationInfeasible"), 1);
}

// ==========================================
// 故障隔离与仓储异常
// ==========================================

/// find_by_id(666) 触发 panic 的目录
struct PanickingGiftRepository {
    inner: InMemoryGiftRepository,
}

impl GiftRepository for PanickingGiftRepository {
    fn find_by_id(&self, id: i64) -> RepositoryResult<CatalogItem> {
        if id == 666 {
            panic!("catalog corrupted at item 666");
        }
        self.inner.find_by_id(id)
    }

    fn find_by_category(&self, category: &str) -> RepositoryResult<Vec<CatalogItem>> {
        self.inner.find_by_category(category)
    }

    fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>> {
        self.inner.find_all()
    }

    fn find_cheaper_alternative(&self, item: &CatalogItem) -> RepositoryResult<Option<CatalogItem>> {
        self.inner.find_cheaper_alternative(item)
    }

    fn find_by_age_range(&self, min_age: i32, max_age: i32) -> RepositoryResult<Vec<CatalogItem>> {
        self.inner.find_by_age_range(min_age, max_age)
    }
}

struct BrokenWishRepository;

impl WishRepository for BrokenWishRepository {
    fn get_by_child_id(&self, _child_id: i64) -> RepositoryResult<Vec<Wish>> {
        Err(RepositoryError::Unavailable("wishes.db locked".to_string()))
    }

    fn get_all(&self) -> RepositoryResult<Vec<Wish>> {
        Err(RepositoryError::Unavailable("wishes.db locked".to_string()))
    }
}

struct BrokenChildRepository;

impl ChildRepository for BrokenChildRepository {
    fn get_all(&self) -> RepositoryResult<Vec<Child>> {
        Err(RepositoryError::Unavailable("children feed offline".to_string()))
    }

    fn get_by_id(&self, id: i64) -> RepositoryResult<Child> {
        Err(RepositoryError::not_found("child", id))
    }

    fn get_by_region(&self, _region: &str) -> RepositoryResult<Vec<Child>> {
        Ok(vec![])
    }

    fn get_by_age_range(&self, _min_age: i32, _max_age: i32) -> RepositoryResult<Vec<Child>> {
        Ok(vec![])
    }

    fn get_by_tags(&self, _tags: &[String]) -> RepositoryResult<Vec<Child>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_panic_in_one_child_is_isolated() {
    let events = Arc::new(CollectingEventPublisher::new());
    let base = repos(4);
    let repos = GiftRepositories::new(
        base.children.clone(),
        Arc::new(PanickingGiftRepository {
            inner: InMemoryGiftRepository::new(catalog()),
        }),
        Some(Arc::new(gift_calc::repository::InMemoryWishRepository::new(vec![wish(
            2,
            vec![666],
            WishPriority::High,
        )]))),
        base.regions.clone(),
    );
    let orchestrator = BatchOrchestrator::new(repos, config(2), events.clone());

    let report = run(&orchestrator).await;

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.successful, 3);
    let faulty = &report.results[1];
    assert_eq!(faulty.child_id, 2);
    assert!(faulty.error.as_deref().unwrap_or_default().contains("catalog corrupted"));
    assert_eq!(events.count("ChildFault"), 1);
}

#[tokio::test]
async fn test_wish_lookup_failure_falls_back_to_basic_gifts() {
    let events = Arc::new(CollectingEventPublisher::new());
    let repos = GiftRepositories::new(
        Arc::new(gift_calc::repository::InMemoryChildRepository::new(vec![ChildBuilder::new(1).build()])),
        Arc::new(InMemoryGiftRepository::new(catalog())),
        Some(Arc::new(BrokenWishRepository)),
        Arc::new(InMemoryRegionRepository::new(vec![])),
    );
    let orchestrator = BatchOrchestrator::new(repos, config(1), events.clone());

    let report = run(&orchestrator).await;
    let result = &report.results[0];

    assert!(result.is_success());
    assert_eq!(result.selections.len(), 3);
    assert!(result.selections.iter().all(|s| s.reason == SelectionReason::BasicGift));
    assert_eq!(events.count("WishLookupFailed"), 1);
    assert!(result.warnings.iter().any(|w| w.contains("wishes.db locked")));
}

#[tokio::test]
async fn test_absent_wish_repository_skips_wish_phase() {
    let repos = repositories(
        vec![ChildBuilder::new(1).notes("аллергия на шерсть").build()],
        catalog(),
        None,
        vec![],
    );
    let orchestrator = BatchOrchestrator::new(repos, config(1), Arc::new(NoOpEventPublisher));

    let report = run(&orchestrator).await;
    let result = &report.results[0];

    let ids: Vec<i64> = result.selections.iter().map(|s| s.item.id).collect();
    assert_eq!(ids, vec![100, 101, 102]);
    assert_eq!(result.cost.coefficient, 1.0);
    assert!(result.warnings.iter().any(|w| w.contains("аллергия на шерсть")));
}

#[tokio::test]
async fn test_child_repository_failure_aborts_run() {
    let repos = GiftRepositories::new(
        Arc::new(BrokenChildRepository),
        Arc::new(InMemoryGiftRepository::new(catalog())),
        None,
        Arc::new(InMemoryRegionRepository::new(vec![])),
    );
    let orchestrator = BatchOrchestrator::new(repos, config(2), Arc::new(NoOpEventPublisher));

    let err = orchestrator
        .run(CancellationToken::new(), DataFiles::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Input(_)));
    assert!(err.to_string().contains("children feed offline"));
    assert_eq!(orchestrator.state(), BatchState::Idle);
}
