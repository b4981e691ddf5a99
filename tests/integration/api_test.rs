// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    create_link, create_product, setup_db, ScriptedChecker, StubGenerator, StubOptimizer,
    STAGE_TIMEOUT,
};
use axum::Extension;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use contentrs::domain::models::job::PipelineJob;
use contentrs::engines::circuit_breaker::LinkCircuitBreaker;
use contentrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use contentrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use contentrs::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use contentrs::presentation::routes;
use contentrs::queue::job_queue::{DatabaseJobQueue, JobQueue};
use contentrs::utils::retry_policy::RetryStrategy;
use contentrs::workers::link_prober::{LinkProber, ProbeConfig};
use contentrs::workers::link_rotator::LinkRotator;
use contentrs::workers::pipeline_worker::{PipelineAdapters, PipelineWorker};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct TestApp {
    server: TestServer,
    queue: Arc<DatabaseJobQueue<JobRepositoryImpl>>,
    links: Arc<LinkRepositoryImpl>,
    checker: Arc<ScriptedChecker>,
}

async fn create_test_app(generator: StubGenerator) -> TestApp {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
    let articles = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let links = Arc::new(LinkRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs.clone(),
        Duration::minutes(15),
        RetryStrategy::None,
    ));

    let pipeline = Arc::new(PipelineWorker::new(
        queue.clone(),
        articles.clone(),
        PipelineAdapters {
            generator: Arc::new(generator),
            optimizer: Arc::new(StubOptimizer),
            drafts: articles,
            targets: vec![],
        },
        STAGE_TIMEOUT,
    ));
    let checker = Arc::new(ScriptedChecker::default());
    let prober = Arc::new(LinkProber::new(
        links.clone(),
        checker.clone(),
        LinkCircuitBreaker::default(),
        ProbeConfig::default(),
    ));
    let rotator = Arc::new(LinkRotator::new(links.clone(), 10));

    let app = routes::routes()
        .layer(Extension(pipeline))
        .layer(Extension(prober))
        .layer(Extension(rotator))
        .layer(Extension(jobs))
        .layer(Extension(CancellationToken::new()));

    TestApp {
        server: TestServer::new(app).unwrap(),
        queue,
        links,
        checker,
    }
}

#[tokio::test]
async fn test_process_next_route_reports_idle_then_published() {
    let app = create_test_app(StubGenerator::succeeding()).await;

    let idle = app.server.post("/cron/process-next").await;
    idle.assert_status_ok();
    assert_eq!(idle.json::<Value>()["outcome"], "idle");

    app.queue
        .enqueue(PipelineJob::new(
            "sleep hygiene".to_string(),
            vec!["sleep".to_string()],
            Utc::now() - Duration::seconds(1),
        ))
        .await
        .unwrap();

    let published = app.server.post("/cron/process-next").await;
    published.assert_status_ok();
    let body = published.json::<Value>();
    assert_eq!(body["outcome"], "published");
    assert!(body["article_id"].is_string());
}

#[tokio::test]
async fn test_health_route_counts_recent_failures() {
    let app = create_test_app(StubGenerator::failing("boom")).await;
    app.queue
        .enqueue(PipelineJob::new(
            "doomed".to_string(),
            vec![],
            Utc::now() - Duration::seconds(1),
        ))
        .await
        .unwrap();

    let failed = app.server.post("/cron/process-next").await;
    assert_eq!(failed.json::<Value>()["outcome"], "failed");

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    let body = health.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["failed_jobs_last_7_days"], 1);
}

#[tokio::test]
async fn test_probe_and_report_routes() {
    let app = create_test_app(StubGenerator::succeeding()).await;
    let product = create_product(&app.links, "sleep").await;
    let link = create_link(&app.links, &product, "https://dead.example.com", 0.01).await;
    app.checker.push("https://dead.example.com", Ok(404));

    let probe = app.server.post("/cron/probe-links").await;
    probe.assert_status_ok();
    let summary = probe.json::<Value>();
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["broken"], 1);

    let report = app.server.get("/links/health-report").await;
    report.assert_status_ok();
    let body = report.json::<Value>();
    assert_eq!(body["summary"]["broken"], 1);
    assert_eq!(body["broken_links"][0]["link_id"], link.id.to_string());
    assert_eq!(body["broken_links"][0]["consecutive_failures"], 1);
}

#[tokio::test]
async fn test_rotate_route_returns_report() {
    let app = create_test_app(StubGenerator::succeeding()).await;
    let product = create_product(&app.links, "sleep").await;
    create_link(&app.links, &product, "https://a.example.com/1", 0.01).await;
    create_link(&app.links, &product, "https://a.example.com/2", 0.05).await;

    let response = app.server.post("/cron/rotate-links").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["examined"], 2);
    assert_eq!(body["rotations"].as_array().unwrap().len(), 1);
}
