// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 流水线任务实体
///
/// 表示"把一个主题变成已发布文章"的一次完整请求。任务由摄取方创建，
/// 之后只由流水线工作器修改，且永不物理删除（作为审计记录保留）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 主题，同时作为摄取去重键
    pub topic: String,
    /// 目标关键词（有序）
    pub target_keywords: Vec<String>,
    /// 任务状态
    pub status: JobStatus,
    /// 已被认领的次数
    pub attempts: i32,
    /// 最早可处理时间
    pub scheduled_at: DateTime<Utc>,
    /// 最近一次失败的诊断信息
    pub last_error: Option<String>,
    /// 发布成功后的文章ID
    pub published_article_id: Option<Uuid>,
    /// 认领令牌，持有该令牌的工作器才能推进任务
    pub claim_token: Option<Uuid>,
    /// 认领租约过期时间
    pub lease_expires_at: Option<DateTime<Utc>>,
    /// 最近一次开始处理时间
    pub started_at: Option<DateTime<Utc>>,
    /// 进入终态的时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Scheduled → Generating → Published/Failed
///
/// 另外允许 Generating → Scheduled（仅在重试策略允许时由工作器重新排期）。
/// Published 和 Failed 都是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已排期，等待认领
    #[default]
    Scheduled,
    /// 生成中，已被某个工作器认领
    Generating,
    /// 已发布
    Published,
    /// 已失败
    Failed,
}

impl JobStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Published | JobStatus::Failed)
    }

    /// 校验状态转换
    ///
    /// # 返回值
    ///
    /// * `Ok(JobStatus)` - 目标状态
    /// * `Err(DomainError)` - 非法转换，例如 Published → Generating
    pub fn transition(self, to: JobStatus) -> Result<JobStatus, DomainError> {
        match (self, to) {
            (JobStatus::Scheduled, JobStatus::Generating)
            | (JobStatus::Generating, JobStatus::Published)
            | (JobStatus::Generating, JobStatus::Failed)
            | (JobStatus::Generating, JobStatus::Scheduled) => Ok(to),
            (from, to) => Err(DomainError::InvalidStateTransition { from, to }),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Scheduled => write!(f, "scheduled"),
            JobStatus::Generating => write!(f, "generating"),
            JobStatus::Published => write!(f, "published"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(JobStatus::Scheduled),
            "generating" => Ok(JobStatus::Generating),
            "published" => Ok(JobStatus::Published),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "unknown job status: {}",
                other
            ))),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 无效的任务状态转换
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: JobStatus, to: JobStatus },

    /// 链接已经处于停用状态
    #[error("Link is already inactive")]
    LinkAlreadyInactive,

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl PipelineJob {
    /// 创建一个新的已排期任务
    ///
    /// # 参数
    ///
    /// * `topic` - 主题
    /// * `target_keywords` - 目标关键词
    /// * `scheduled_at` - 最早可处理时间
    pub fn new(topic: String, target_keywords: Vec<String>, scheduled_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            topic,
            target_keywords,
            status: JobStatus::Scheduled,
            attempts: 0,
            scheduled_at,
            last_error: None,
            published_article_id: None,
            claim_token: None,
            lease_expires_at: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 认领任务
    ///
    /// Scheduled → Generating，并递增 attempts
    pub fn claim(
        mut self,
        claim_token: Uuid,
        now: DateTime<Utc>,
        lease: chrono::Duration,
    ) -> Result<Self, DomainError> {
        self.status = self.status.transition(JobStatus::Generating)?;
        self.attempts += 1;
        self.claim_token = Some(claim_token);
        self.lease_expires_at = Some(now + lease);
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(self)
    }

    /// 标记任务已发布
    pub fn publish(mut self, article_id: Uuid, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.status = self.status.transition(JobStatus::Published)?;
        self.published_article_id = Some(article_id);
        self.release(now);
        self.completed_at = Some(now);
        Ok(self)
    }

    /// 标记任务失败
    pub fn fail(mut self, error: String, now: DateTime<Utc>) -> Result<Self, DomainError> {
        self.status = self.status.transition(JobStatus::Failed)?;
        self.last_error = Some(error);
        self.release(now);
        self.completed_at = Some(now);
        Ok(self)
    }

    /// 重新排期（仅限 Generating 状态）
    pub fn requeue(
        mut self,
        error: String,
        retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        self.status = self.status.transition(JobStatus::Scheduled)?;
        self.last_error = Some(error);
        self.scheduled_at = retry_at;
        self.release(now);
        Ok(self)
    }

    fn release(&mut self, now: DateTime<Utc>) {
        self.claim_token = None;
        self.lease_expires_at = None;
        self.updated_at = now;
    }
}
