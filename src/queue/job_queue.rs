// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, PipelineJob};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::utils::retry_policy::RetryStrategy;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 领域错误
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// 任务没有被当前调用方认领
    #[error("Job {0} is not claimed")]
    NotClaimed(Uuid),
}

/// 阶段失败后任务的去向
#[derive(Debug, Clone, PartialEq)]
pub enum FailureDisposition {
    /// 终止为 Failed
    Failed(PipelineJob),
    /// 重新排期
    Requeued(PipelineJob),
}

/// 流水线任务队列
///
/// 在任务表之上提供入队、认领和完成语义
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队任务，主题已存在时返回 `None`
    async fn enqueue(&self, job: PipelineJob) -> Result<Option<PipelineJob>, QueueError>;

    /// 认领下一个可处理任务
    async fn dequeue(&self, claim_token: Uuid) -> Result<Option<PipelineJob>, QueueError>;

    /// 标记已发布
    async fn complete(
        &self,
        job: PipelineJob,
        article_id: Uuid,
    ) -> Result<PipelineJob, QueueError>;

    /// 按重试策略处理阶段失败
    async fn fail(&self, job: PipelineJob, error: String)
        -> Result<FailureDisposition, QueueError>;

    /// 使认领租约已过期的任务失败
    async fn expire_leases(&self) -> Result<u64, QueueError>;
}

pub struct DatabaseJobQueue<R: JobRepository> {
    /// 任务仓库
    repository: Arc<R>,
    /// 认领租约时长
    lease: Duration,
    /// 重试策略
    retry: RetryStrategy,
}

impl<R: JobRepository> DatabaseJobQueue<R> {
    /// 创建新的任务队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 任务仓库
    /// * `lease` - 认领租约时长
    /// * `retry` - 阶段失败后的重试策略
    pub fn new(repository: Arc<R>, lease: Duration, retry: RetryStrategy) -> Self {
        Self {
            repository,
            lease,
            retry,
        }
    }
}

fn claim_token_of(job: &PipelineJob) -> Result<Uuid, QueueError> {
    job.claim_token.ok_or(QueueError::NotClaimed(job.id))
}

#[async_trait]
impl<R: JobRepository> JobQueue for DatabaseJobQueue<R> {
    async fn enqueue(&self, job: PipelineJob) -> Result<Option<PipelineJob>, QueueError> {
        Ok(self.repository.create_if_absent(&job).await?)
    }

    async fn dequeue(&self, claim_token: Uuid) -> Result<Option<PipelineJob>, QueueError> {
        let job = self
            .repository
            .claim_next(claim_token, Utc::now(), self.lease)
            .await?;
        Ok(job)
    }

    async fn complete(
        &self,
        job: PipelineJob,
        article_id: Uuid,
    ) -> Result<PipelineJob, QueueError> {
        let token = claim_token_of(&job)?;
        let published = job.publish(article_id, Utc::now())?;
        Ok(self.repository.save_claimed(&published, token).await?)
    }

    async fn fail(
        &self,
        job: PipelineJob,
        error: String,
    ) -> Result<FailureDisposition, QueueError> {
        let token = claim_token_of(&job)?;
        let now = Utc::now();
        let attempts = u32::try_from(job.attempts).unwrap_or(u32::MAX);

        match self.retry.next_retry_at(attempts, now) {
            Some(retry_at) => {
                info!(job_id = %job.id, attempts, %retry_at, "Requeueing job after stage failure");
                let requeued = job.requeue(error, retry_at, now)?;
                Ok(FailureDisposition::Requeued(
                    self.repository.save_claimed(&requeued, token).await?,
                ))
            }
            None => {
                let failed = job.fail(error, now)?;
                Ok(FailureDisposition::Failed(
                    self.repository.save_claimed(&failed, token).await?,
                ))
            }
        }
    }

    async fn expire_leases(&self) -> Result<u64, QueueError> {
        Ok(self.repository.fail_expired_leases(Utc::now()).await?)
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue(&self, job: PipelineJob) -> Result<Option<PipelineJob>, QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, claim_token: Uuid) -> Result<Option<PipelineJob>, QueueError> {
        (**self).dequeue(claim_token).await
    }

    async fn complete(
        &self,
        job: PipelineJob,
        article_id: Uuid,
    ) -> Result<PipelineJob, QueueError> {
        (**self).complete(job, article_id).await
    }

    async fn fail(
        &self,
        job: PipelineJob,
        error: String,
    ) -> Result<FailureDisposition, QueueError> {
        (**self).fail(job, error).await
    }

    async fn expire_leases(&self) -> Result<u64, QueueError> {
        (**self).expire_leases().await
    }
}
