// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::article::{
    ArticleUpdate, GeneratedContent, OptimizedContent, PostRef, PublishableArticle,
};
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 外部协作方错误类型
#[derive(Error, Debug)]
pub enum AdapterError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// 响应无法解析
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// 缺少配置
    #[error("Not configured: {0}")]
    NotConfigured(String),
    /// 调用超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// 调用被取消
    #[error("Cancelled")]
    Cancelled,
    /// 草稿存储错误
    #[error("Draft store error: {0}")]
    Store(#[from] RepositoryError),
}

/// 内容生成服务
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// 根据主题和关键词生成初稿
    async fn generate(
        &self,
        topic: &str,
        keywords: &[String],
    ) -> Result<GeneratedContent, AdapterError>;
}

/// SEO 优化服务
#[async_trait]
pub trait ContentOptimizer: Send + Sync {
    /// 对已保存的草稿做 SEO 优化
    async fn optimize(
        &self,
        article_id: Uuid,
        draft: &GeneratedContent,
        keywords: &[String],
    ) -> Result<OptimizedContent, AdapterError>;
}

/// 草稿存储
///
/// 重复创建是安全的：失败任务留下的孤立草稿不会影响后续重建
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// 创建未发布的草稿，返回文章ID
    async fn create_draft(&self, content: &GeneratedContent) -> Result<Uuid, AdapterError>;
    /// 更新文章
    async fn update_article(&self, update: &ArticleUpdate) -> Result<(), AdapterError>;
}

/// 外部发布目标
#[async_trait]
pub trait PublishTarget: Send + Sync {
    /// 目标名称，用于发布记录
    fn name(&self) -> &str;

    /// 发布文章
    async fn publish(
        &self,
        article_id: Uuid,
        content: &PublishableArticle,
    ) -> Result<PostRef, AdapterError>;
}
