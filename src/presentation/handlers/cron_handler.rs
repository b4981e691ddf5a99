// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{Extension, Json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::models::link::ProbeSummary;
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::link_repository::LinkRepository;
use crate::presentation::errors::AppError;
use crate::queue::job_queue::JobQueue;
use crate::workers::link_prober::{HealthReport, LinkProber};
use crate::workers::link_rotator::{LinkRotator, RotationReport};
use crate::workers::pipeline_worker::{PipelineWorker, ProcessOutcome};

/// 处理下一个流水线任务
///
/// 每个请求使用服务关闭令牌的子令牌，服务关闭时进行中的阶段会被取消
pub async fn process_next<Q, A>(
    Extension(worker): Extension<Arc<PipelineWorker<Q, A>>>,
    Extension(shutdown): Extension<CancellationToken>,
) -> Result<Json<ProcessOutcome>, AppError>
where
    Q: JobQueue + 'static,
    A: ArticleRepository + 'static,
{
    let outcome = worker.process_next(&shutdown.child_token()).await?;
    info!(?outcome, "Cron process-next finished");
    Ok(Json(outcome))
}

/// 探测所有启用的联盟链接
pub async fn probe_links<R>(
    Extension(prober): Extension<Arc<LinkProber<R>>>,
    Extension(shutdown): Extension<CancellationToken>,
) -> Result<Json<ProbeSummary>, AppError>
where
    R: LinkRepository + 'static,
{
    let summary = prober.probe_all(&shutdown.child_token()).await?;
    Ok(Json(summary))
}

/// 轮换低点击率链接
pub async fn rotate_links<R>(
    Extension(rotator): Extension<Arc<LinkRotator<R>>>,
    Extension(shutdown): Extension<CancellationToken>,
) -> Result<Json<RotationReport>, AppError>
where
    R: LinkRepository + 'static,
{
    let report = rotator
        .rotate_underperforming(&shutdown.child_token())
        .await?;
    Ok(Json(report))
}

/// 链接健康报告
pub async fn health_report<R>(
    Extension(prober): Extension<Arc<LinkProber<R>>>,
) -> Result<Json<HealthReport>, AppError>
where
    R: LinkRepository + 'static,
{
    Ok(Json(prober.health_report().await?))
}
