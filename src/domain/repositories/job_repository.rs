// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::PipelineJob;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 条件更新未命中（记录已被其他调用方修改）
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 持久化数据无法解析
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// 流水线任务仓库特质
///
/// 任务表是摄取方和工作器之间唯一的协调点
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 主题不存在时创建任务，已存在时返回 `None`
    async fn create_if_absent(
        &self,
        job: &PipelineJob,
    ) -> Result<Option<PipelineJob>, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PipelineJob>, RepositoryError>;
    /// 原子地认领最早的可处理任务（Scheduled → Generating）
    async fn claim_next(
        &self,
        claim_token: Uuid,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Option<PipelineJob>, RepositoryError>;
    /// 持久化由认领者发起的状态转换
    ///
    /// 仅当任务仍处于 Generating 且认领令牌匹配时才会写入
    async fn save_claimed(
        &self,
        job: &PipelineJob,
        claim_token: Uuid,
    ) -> Result<PipelineJob, RepositoryError>;
    /// 把认领租约已过期的任务标记为失败
    async fn fail_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 统计某时间点之后失败的任务数
    async fn count_failed_since(&self, since: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
