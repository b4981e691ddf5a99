// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::models::job::DomainError;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::adapters::AdapterError;
use crate::engines::traits::EngineError;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    #[error("外部服务错误: {0}")]
    Adapter(#[from] AdapterError),

    #[error("探测引擎错误: {0}")]
    Engine(#[from] EngineError),

    #[error("配置错误: {0}")]
    InvalidConfig(String),

    #[error("已取消")]
    Cancelled,
}
