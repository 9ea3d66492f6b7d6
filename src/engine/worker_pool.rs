// ==========================================
// 礼品分配系统 - 有界工作池
// ==========================================
// 职责: 有界任务队列 + 固定数量工作协程 + 单一协调任务
// 模型:
// - 任务队列容量 = 任务数, 启动时一次性入队后关闭发送端
// - 结果队列容量 = 任务数
// - 协调任务等待全部工作协程退出后关闭结果流
// - 取消令牌在任务之间检查, 已领取的任务执行完毕
// ==========================================

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 工作池运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub dispatched: usize,
    pub processed: usize,
    pub cancelled: bool,
}

// ==========================================
// PoolHandle - 运行中的工作池句柄
// ==========================================
pub struct PoolHandle<R> {
    results: mpsc::Receiver<R>,
    coordinator: JoinHandle<PoolStats>,
    cancel: CancellationToken,
}

impl<R> PoolHandle<R> {
    /// 取下一条结果（全部工作协程退出且队列排空后返回 None）
    pub async fn next_result(&mut self) -> Option<R> {
        self.results.recv().await
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 等待协调任务结束
    pub async fn join(self) -> PoolStats {
        drop(self.results);
        match self.coordinator.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "工作池协调任务异常退出");
                PoolStats {
                    cancelled: self.cancel.is_cancelled(),
                    ..Default::default()
                }
            }
        }
    }
}

// ==========================================
// WorkerPool - 有界工作池
// ==========================================
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    /// 创建工作池（最少 1 个工作协程）
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    /// 实际工作协程数 = min(池大小, 任务数), 最少 1
    pub fn worker_count(&self, jobs: usize) -> usize {
        self.size.min(jobs).max(1)
    }

    /// 启动工作池
    ///
    /// # 参数
    /// - jobs: 全部任务
    /// - cancel: 取消令牌
    /// - handler: 任务处理函数 (worker_id, job) → 结果
    pub fn start<J, R, F, Fut>(
        &self,
        jobs: Vec<J>,
        cancel: CancellationToken,
        handler: F,
    ) -> PoolHandle<R>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(usize, J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let dispatched = jobs.len();
        let capacity = dispatched.max(1);
        let worker_count = self.worker_count(dispatched);

        // 任务队列: 一次性入队后关闭发送端
        let (job_tx, job_rx) = mpsc::channel::<J>(capacity);
        for job in jobs {
            if job_tx.try_send(job).is_err() {
                warn!("任务队列已满, 任务未入队");
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = mpsc::channel::<R>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let handler = Arc::new(handler);

        info!(workers = worker_count, jobs = dispatched, "工作池启动");

        let workers: Vec<JoinHandle<usize>> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    job_rx.clone(),
                    result_tx.clone(),
                    cancel.clone(),
                    handler.clone(),
                ))
            })
            .collect();

        let coordinator_cancel = cancel.clone();
        let coordinator = tokio::spawn(async move {
            let mut processed = 0;
            for outcome in join_all(workers).await {
                match outcome {
                    Ok(count) => processed += count,
                    Err(e) => warn!(error = %e, "工作协程异常退出"),
                }
            }
            // 全部工作协程退出后关闭结果流
            drop(result_tx);

            let stats = PoolStats {
                workers: worker_count,
                dispatched,
                processed,
                cancelled: coordinator_cancel.is_cancelled(),
            };
            info!(
                workers = stats.workers,
                processed = stats.processed,
                cancelled = stats.cancelled,
                "工作池结束"
            );
            stats
        });

        PoolHandle {
            results: result_rx,
            coordinator,
            cancel,
        }
    }
}

async fn worker_loop<J, R, F, Fut>(
    worker_id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<J>>>,
    results: mpsc::Sender<R>,
    cancel: CancellationToken,
    handler: Arc<F>,
) -> usize
where
    F: Fn(usize, J) -> Fut,
    Fut: Future<Output = R>,
{
    let mut processed = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(worker_id, "收到取消信号, 停止领取任务");
            break;
        }

        let next = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };
        let Some(job) = next else {
            break;
        };

        let result = handler(worker_id, job).await;
        if results.send(result).await.is_err() {
            warn!(worker_id, "结果队列已关闭");
            break;
        }
        processed += 1;
    }

    debug!(worker_id, processed, "工作协程退出");
    processed
}
