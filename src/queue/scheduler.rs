// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::PipelineJob;
use crate::queue::job_queue::{JobQueue, QueueError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct JobScheduler<Q: JobQueue + 'static> {
    /// 任务队列
    queue: Arc<Q>,
}

impl<Q: JobQueue + 'static> JobScheduler<Q> {
    /// 创建新的任务调度器实例
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }

    /// 启动调度器后台任务
    ///
    /// 定期让认领租约已过期的任务失败，直到 `cancel` 被触发。
    /// 任务的认领由 cron 触发的 process-next 主动拉取。
    pub fn start(&self, period: TokioDuration, cancel: CancellationToken) -> JoinHandle<()> {
        let queue = self.queue.clone();

        tokio::spawn(async move {
            let mut interval = interval(period);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Scheduler stopped");
                        break;
                    }
                    _ = interval.tick() => {}
                }

                match queue.expire_leases().await {
                    Ok(count) => {
                        if count > 0 {
                            info!("Failed {} jobs with expired claim leases", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to expire claim leases: {}", e);
                    }
                }
            }
        })
    }

    /// 在特定时间调度任务
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(PipelineJob))` - 调度成功的任务
    /// * `Ok(None)` - 同主题任务已存在
    /// * `Err(QueueError)` - 调度失败
    pub async fn schedule_at(
        &self,
        topic: String,
        target_keywords: Vec<String>,
        time: DateTime<Utc>,
    ) -> Result<Option<PipelineJob>, QueueError> {
        self.queue
            .enqueue(PipelineJob::new(topic, target_keywords, time))
            .await
    }
}
