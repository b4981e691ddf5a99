// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{Extension, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::repositories::job_repository::JobRepository;
use crate::presentation::errors::AppError;

/// 统计流水线失败的窗口
const FAILURE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 最近 7 天失败的流水线任务数
    pub failed_jobs_last_7_days: u64,
}

/// 健康检查端点
pub async fn health<R>(
    Extension(jobs): Extension<Arc<R>>,
) -> Result<Json<HealthResponse>, AppError>
where
    R: JobRepository + 'static,
{
    let since = Utc::now() - Duration::days(FAILURE_WINDOW_DAYS);
    let failed = jobs.count_failed_since(since).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        failed_jobs_last_7_days: failed,
    }))
}
