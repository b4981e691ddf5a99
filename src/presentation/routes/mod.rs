// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use crate::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use crate::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use crate::presentation::handlers::{cron_handler, health_handler};
use crate::queue::job_queue::DatabaseJobQueue;
use axum::{
    routing::{get, post},
    Router,
};

/// 服务使用的任务队列
pub type AppJobQueue = DatabaseJobQueue<JobRepositoryImpl>;

/// 创建应用路由
///
/// 处理器依赖通过 `Extension` 注入：
/// `Arc<PipelineWorker<AppJobQueue, ArticleRepositoryImpl>>`、
/// `Arc<LinkProber<LinkRepositoryImpl>>`、`Arc<LinkRotator<LinkRepositoryImpl>>`、
/// `Arc<JobRepositoryImpl>` 以及服务关闭用的 `CancellationToken`
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_handler::health::<JobRepositoryImpl>))
        .route(
            "/links/health-report",
            get(cron_handler::health_report::<LinkRepositoryImpl>),
        );

    let cron_routes = Router::new()
        .route(
            "/cron/process-next",
            post(cron_handler::process_next::<AppJobQueue, ArticleRepositoryImpl>),
        )
        .route(
            "/cron/probe-links",
            post(cron_handler::probe_links::<LinkRepositoryImpl>),
        )
        .route(
            "/cron/rotate-links",
            post(cron_handler::rotate_links::<LinkRepositoryImpl>),
        );

    Router::new().merge(public_routes).merge(cron_routes)
}
