// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::article::{
    ArticleUpdate, PostRef, PublishAttempt, PublishableArticle, TargetOutcome,
};
use crate::domain::models::job::PipelineJob;
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::adapters::{
    AdapterError, ContentGenerator, ContentOptimizer, DraftStore, PublishTarget,
};
use crate::queue::job_queue::{FailureDisposition, JobQueue};
use crate::utils::errors::WorkerError;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 一次 `process_next` 调用的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// 没有可处理的任务
    Idle,
    /// 任务已发布，附带各发布目标的结果
    Published {
        job_id: Uuid,
        article_id: Uuid,
        targets: Vec<TargetOutcome>,
    },
    /// 任务失败
    Failed { job_id: Uuid, error: String },
    /// 任务按重试策略重新排期
    Requeued {
        job_id: Uuid,
        error: String,
        retry_at: DateTime<Utc>,
    },
}

/// 流水线协作方
pub struct PipelineAdapters {
    pub generator: Arc<dyn ContentGenerator>,
    pub optimizer: Arc<dyn ContentOptimizer>,
    pub drafts: Arc<dyn DraftStore>,
    /// 按配置顺序依次发布
    pub targets: Vec<Arc<dyn PublishTarget>>,
}

/// 流水线工作器
///
/// 每次调用处理一个任务：生成 → 存草稿 → SEO 优化 → 更新并标记发布 →
/// 逐个目标发布 → 回写外部帖子 → 标记任务已发布。
/// 前四步任一失败都会使任务失败（或按重试策略重新排期）；
/// 单个发布目标失败只记录在该目标上。
pub struct PipelineWorker<Q: JobQueue, A: ArticleRepository> {
    /// 任务队列
    queue: Arc<Q>,
    /// 文章仓库
    articles: Arc<A>,
    /// 外部协作方
    adapters: PipelineAdapters,
    /// 单个阶段的超时时间
    stage_timeout: Duration,
}

impl<Q: JobQueue, A: ArticleRepository> PipelineWorker<Q, A> {
    /// 创建新的流水线工作器实例
    pub fn new(
        queue: Arc<Q>,
        articles: Arc<A>,
        adapters: PipelineAdapters,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            articles,
            adapters,
            stage_timeout,
        }
    }

    /// 处理下一个可处理的任务
    ///
    /// 先让租约已过期的任务失败，再认领最早的已排期任务。
    /// 只有任务存储本身不可用时才返回错误，外部协作方的错误都会落到任务状态上。
    pub async fn process_next(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, WorkerError> {
        match self.queue.expire_leases().await {
            Ok(0) => {}
            Ok(count) => warn!("Failed {} jobs whose claim lease expired", count),
            Err(e) => error!("Failed to sweep expired claim leases: {}", e),
        }

        let claim_token = Uuid::new_v4();
        let Some(job) = self.queue.dequeue(claim_token).await.map_err(queue_error)? else {
            return Ok(ProcessOutcome::Idle);
        };

        counter!("pipeline_jobs_claimed_total").increment(1);
        info!(job_id = %job.id, topic = %job.topic, attempts = job.attempts, "Claimed pipeline job");

        self.run(job, cancel).await
    }

    #[instrument(skip(self, job, cancel), fields(job_id = %job.id))]
    async fn run(
        &self,
        job: PipelineJob,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, WorkerError> {
        let (article_id, content) = match self.prepare_article(&job, cancel).await {
            Ok(prepared) => prepared,
            Err(cause) => return self.fail_job(job, cause).await,
        };

        let targets = self.publish_to_targets(article_id, &content, cancel).await;
        self.record_targets(&job, article_id, &targets).await;

        let job_id = job.id;
        self.queue
            .complete(job, article_id)
            .await
            .map_err(queue_error)?;
        counter!("pipeline_jobs_published_total").increment(1);
        info!(
            %article_id,
            succeeded = targets.iter().filter(|t| t.succeeded()).count(),
            attempted = targets.len(),
            "Pipeline job published"
        );

        Ok(ProcessOutcome::Published {
            job_id,
            article_id,
            targets,
        })
    }

    /// 步骤 1-4：生成、存草稿、优化、更新并标记发布
    ///
    /// 返回错误时的字符串即写入任务 `last_error` 的原因
    async fn prepare_article(
        &self,
        job: &PipelineJob,
        cancel: &CancellationToken,
    ) -> Result<(Uuid, PublishableArticle), String> {
        let keywords = &job.target_keywords;

        let generated = self
            .stage(
                "generation",
                cancel,
                self.adapters.generator.generate(&job.topic, keywords),
            )
            .await?;

        let article_id = self
            .stage(
                "draft creation",
                cancel,
                self.adapters.drafts.create_draft(&generated),
            )
            .await?;

        let optimized = self
            .stage(
                "optimization",
                cancel,
                self.adapters
                    .optimizer
                    .optimize(article_id, &generated, keywords),
            )
            .await?;

        let update = ArticleUpdate {
            id: article_id,
            title: Some(optimized.title.clone()),
            body: Some(optimized.body.clone()),
            seo_meta: Some(optimized.seo_meta.clone()),
            affiliate_placements: Some(optimized.suggested_placements.clone()),
            published: Some(true),
            ..Default::default()
        };
        self.stage(
            "article update",
            cancel,
            self.adapters.drafts.update_article(&update),
        )
        .await?;

        let article = self
            .articles
            .find_by_id(article_id)
            .await
            .map_err(|e| format!("article update failed: {}", e))?
            .ok_or_else(|| format!("article update failed: article {} vanished", article_id))?;

        let tags = if optimized.seo_meta.keywords.is_empty() {
            keywords.clone()
        } else {
            optimized.seo_meta.keywords.clone()
        };

        Ok((
            article_id,
            PublishableArticle {
                title: article.title,
                slug: article.slug,
                body: article.body,
                excerpt: article.excerpt,
                tags,
            },
        ))
    }

    /// 带超时和取消地运行一个阶段
    async fn stage<T, F>(
        &self,
        name: &'static str,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T, String>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        self.bounded(cancel, fut)
            .await
            .map_err(|e| format!("{} failed: {}", name, e))
    }

    async fn bounded<T, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T, AdapterError>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AdapterError::Cancelled),
            result = tokio::time::timeout(self.stage_timeout, fut) => {
                result.unwrap_or(Err(AdapterError::Timeout(self.stage_timeout)))
            }
        }
    }

    /// 步骤 5：逐个目标发布，不因单个目标失败而中断
    async fn publish_to_targets(
        &self,
        article_id: Uuid,
        content: &PublishableArticle,
        cancel: &CancellationToken,
    ) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(self.adapters.targets.len());

        for target in &self.adapters.targets {
            let result: Result<PostRef, AdapterError> = if cancel.is_cancelled() {
                Err(AdapterError::Cancelled)
            } else {
                self.bounded(cancel, target.publish(article_id, content))
                    .await
            };

            let outcome_label = if result.is_ok() { "success" } else { "failure" };
            counter!(
                "pipeline_publish_target_total",
                "target" => target.name().to_string(),
                "outcome" => outcome_label
            )
            .increment(1);

            match &result {
                Ok(post) => info!(target = target.name(), url = %post.url, "Published to target"),
                Err(e) => warn!(target = target.name(), "Publish to target failed: {}", e),
            }

            outcomes.push(TargetOutcome {
                target: target.name().to_string(),
                result: result.map_err(|e| e.to_string()),
            });
        }

        outcomes
    }

    /// 步骤 6：记录各目标结果并把外部帖子写回文章
    ///
    /// 文章已经在外部平台上线，这里的存储错误只记日志，不影响任务发布
    async fn record_targets(&self, job: &PipelineJob, article_id: Uuid, targets: &[TargetOutcome]) {
        let attempts: Vec<PublishAttempt> = targets
            .iter()
            .map(|t| PublishAttempt::from_outcome(job.id, article_id, t))
            .collect();
        if let Err(e) = self.articles.record_publish_attempts(&attempts).await {
            error!("Failed to record publish attempts: {}", e);
        }

        let posts: BTreeMap<String, PostRef> = targets
            .iter()
            .filter_map(|t| t.result.as_ref().ok().map(|p| (t.target.clone(), p.clone())))
            .collect();
        if posts.is_empty() {
            return;
        }
        let update = ArticleUpdate {
            id: article_id,
            external_posts: Some(posts),
            ..Default::default()
        };
        if let Err(e) = self.adapters.drafts.update_article(&update).await {
            error!("Failed to record external posts on article: {}", e);
        }
    }

    async fn fail_job(
        &self,
        job: PipelineJob,
        cause: String,
    ) -> Result<ProcessOutcome, WorkerError> {
        error!(job_id = %job.id, "Pipeline stage failed: {}", cause);
        let disposition = self
            .queue
            .fail(job, cause.clone())
            .await
            .map_err(queue_error)?;

        match disposition {
            FailureDisposition::Failed(job) => {
                counter!("pipeline_jobs_failed_total").increment(1);
                Ok(ProcessOutcome::Failed {
                    job_id: job.id,
                    error: cause,
                })
            }
            FailureDisposition::Requeued(job) => {
                counter!("pipeline_jobs_requeued_total").increment(1);
                Ok(ProcessOutcome::Requeued {
                    job_id: job.id,
                    error: cause,
                    retry_at: job.scheduled_at,
                })
            }
        }
    }
}

fn queue_error(err: crate::queue::job_queue::QueueError) -> WorkerError {
    use crate::queue::job_queue::QueueError;
    match err {
        QueueError::Repository(e) => WorkerError::Repository(e),
        QueueError::Domain(e) => WorkerError::Domain(e),
        QueueError::NotClaimed(id) => WorkerError::Repository(RepositoryError::Conflict(
            format!("job {} is not claimed", id),
        )),
    }
}
