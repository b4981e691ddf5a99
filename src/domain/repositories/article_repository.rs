// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::article::{Article, PublishAttempt};
use async_trait::async_trait;
use uuid::Uuid;

/// 文章仓库特质
///
/// 草稿的写入通过 `DraftStore` 完成，这里只提供查询和发布记录
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 根据ID查找文章
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError>;
    /// 保存各目标的发布记录
    async fn record_publish_attempts(
        &self,
        attempts: &[PublishAttempt],
    ) -> Result<(), RepositoryError>;
    /// 查询某任务的发布记录
    async fn publish_attempts_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<PublishAttempt>, RepositoryError>;
}
