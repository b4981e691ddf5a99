// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobStatus, PipelineJob};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::infrastructure::database::entities::pipeline_job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 认领时在竞争失败后重新选取的次数
const CLAIM_RACE_RETRIES: usize = 3;

/// 流水线任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for PipelineJob {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<JobStatus>()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        let target_keywords: Vec<String> = serde_json::from_value(model.target_keywords)
            .map_err(|e| RepositoryError::Corrupt(format!("target_keywords: {}", e)))?;

        Ok(Self {
            id: model.id,
            topic: model.topic,
            target_keywords,
            status,
            attempts: model.attempts,
            scheduled_at: model.scheduled_at,
            last_error: model.last_error,
            published_article_id: model.published_article_id,
            claim_token: model.claim_token,
            lease_expires_at: model.lease_expires_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<&PipelineJob> for job_entity::ActiveModel {
    fn from(job: &PipelineJob) -> Self {
        Self {
            id: Set(job.id),
            topic: Set(job.topic.clone()),
            target_keywords: Set(serde_json::json!(job.target_keywords)),
            status: Set(job.status.to_string()),
            attempts: Set(job.attempts),
            scheduled_at: Set(job.scheduled_at),
            last_error: Set(job.last_error.clone()),
            published_article_id: Set(job.published_article_id),
            claim_token: Set(job.claim_token),
            lease_expires_at: Set(job.lease_expires_at),
            started_at: Set(job.started_at),
            completed_at: Set(job.completed_at),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create_if_absent(
        &self,
        job: &PipelineJob,
    ) -> Result<Option<PipelineJob>, RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(Some(job.clone())),
            Err(err) if is_unique_violation(&err) => {
                debug!(topic = %job.topic, "Job for topic already exists");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineJob>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        model.map(PipelineJob::try_from).transpose()
    }

    async fn claim_next(
        &self,
        claim_token: Uuid,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Option<PipelineJob>, RepositoryError> {
        for _ in 0..CLAIM_RACE_RETRIES {
            let txn = self.db.begin().await?;

            let candidate = job_entity::Entity::find()
                .filter(job_entity::Column::Status.eq(JobStatus::Scheduled.to_string()))
                .filter(job_entity::Column::ScheduledAt.lte(now))
                .order_by_asc(job_entity::Column::ScheduledAt)
                .order_by_asc(job_entity::Column::CreatedAt)
                .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
                .one(&txn)
                .await?;

            let Some(candidate) = candidate else {
                txn.commit().await?;
                return Ok(None);
            };

            let claimed = PipelineJob::try_from(candidate)?
                .claim(claim_token, now, lease)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

            // Compare-and-set on status so two workers can never both win the same row
            let result = job_entity::Entity::update_many()
                .col_expr(
                    job_entity::Column::Status,
                    Expr::value(claimed.status.to_string()),
                )
                .col_expr(job_entity::Column::Attempts, Expr::value(claimed.attempts))
                .col_expr(job_entity::Column::ClaimToken, Expr::value(claimed.claim_token))
                .col_expr(
                    job_entity::Column::LeaseExpiresAt,
                    Expr::value(claimed.lease_expires_at),
                )
                .col_expr(job_entity::Column::StartedAt, Expr::value(claimed.started_at))
                .col_expr(job_entity::Column::UpdatedAt, Expr::value(claimed.updated_at))
                .filter(job_entity::Column::Id.eq(claimed.id))
                .filter(job_entity::Column::Status.eq(JobStatus::Scheduled.to_string()))
                .filter(job_entity::Column::Attempts.eq(claimed.attempts - 1))
                .exec(&txn)
                .await?;

            txn.commit().await?;

            if result.rows_affected == 1 {
                return Ok(Some(claimed));
            }
            debug!(job_id = %claimed.id, "Lost claim race, selecting another job");
        }

        Ok(None)
    }

    async fn save_claimed(
        &self,
        job: &PipelineJob,
        claim_token: Uuid,
    ) -> Result<PipelineJob, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(job.status.to_string()))
            .col_expr(job_entity::Column::ScheduledAt, Expr::value(job.scheduled_at))
            .col_expr(job_entity::Column::LastError, Expr::value(job.last_error.clone()))
            .col_expr(
                job_entity::Column::PublishedArticleId,
                Expr::value(job.published_article_id),
            )
            .col_expr(job_entity::Column::ClaimToken, Expr::value(job.claim_token))
            .col_expr(
                job_entity::Column::LeaseExpiresAt,
                Expr::value(job.lease_expires_at),
            )
            .col_expr(job_entity::Column::CompletedAt, Expr::value(job.completed_at))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(job.updated_at))
            .filter(job_entity::Column::Id.eq(job.id))
            .filter(job_entity::Column::Status.eq(JobStatus::Generating.to_string()))
            .filter(job_entity::Column::ClaimToken.eq(claim_token))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "job {} is no longer held by claim {}",
                job.id, claim_token
            )));
        }
        Ok(job.clone())
    }

    async fn fail_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Failed.to_string()),
            )
            .col_expr(
                job_entity::Column::LastError,
                Expr::value(Some("claim lease expired before the job finished".to_string())),
            )
            .col_expr(job_entity::Column::ClaimToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::LeaseExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(now)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(now))
            .filter(job_entity::Column::Status.eq(JobStatus::Generating.to_string()))
            .filter(job_entity::Column::LeaseExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn count_failed_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Failed.to_string()))
            .filter(job_entity::Column::CompletedAt.gte(since))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
#[path = "job_repo_impl_test.rs"]
mod tests;
