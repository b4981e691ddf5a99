// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    pipeline_fixture, pipeline_fixture_with_optimizer, FailingOptimizer, StubGenerator,
    StubTarget, TargetBehavior,
};
use chrono::{Duration, Utc};
use contentrs::domain::models::job::{JobStatus, PipelineJob};
use contentrs::domain::repositories::article_repository::ArticleRepository;
use contentrs::domain::repositories::job_repository::JobRepository;
use contentrs::infrastructure::database::entities::article;
use contentrs::queue::job_queue::JobQueue;
use contentrs::utils::retry_policy::RetryStrategy;
use contentrs::workers::pipeline_worker::ProcessOutcome;
use sea_orm::EntityTrait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn job(topic: &str) -> PipelineJob {
    PipelineJob::new(
        topic.to_string(),
        vec!["sleep".to_string(), "rest".to_string()],
        Utc::now() - Duration::seconds(1),
    )
}

#[tokio::test]
async fn test_process_next_without_jobs_is_idle() {
    let fixture = pipeline_fixture(StubGenerator::succeeding(), vec![], RetryStrategy::None).await;

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Idle);
    assert_eq!(fixture.generator.call_count(), 0);
}

#[tokio::test]
async fn test_future_job_is_not_eligible() {
    let fixture = pipeline_fixture(StubGenerator::succeeding(), vec![], RetryStrategy::None).await;
    let future = PipelineJob::new(
        "tomorrow".to_string(),
        vec![],
        Utc::now() + Duration::hours(1),
    );
    fixture.queue.enqueue(future.clone()).await.unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, ProcessOutcome::Idle);
    let stored = fixture.jobs.find_by_id(future.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Scheduled);
    assert_eq!(stored.attempts, 0);
}

#[tokio::test]
async fn test_generation_failure_fails_job_and_stays_terminal() {
    let fixture = pipeline_fixture(
        StubGenerator::failing("model overloaded"),
        vec![StubTarget::new("wordpress", TargetBehavior::Succeed)],
        RetryStrategy::None,
    )
    .await;
    let queued = fixture.queue.enqueue(job("sleep hygiene")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ProcessOutcome::Failed { job_id, .. } if job_id == queued.id));

    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.attempts, 1);
    let last_error = stored.last_error.clone().unwrap();
    assert!(last_error.contains("generation failed"));
    assert!(last_error.contains("model overloaded"));
    assert!(stored.published_article_id.is_none());
    assert!(stored.claim_token.is_none());

    // A failed job is never picked up again
    let again = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(again, ProcessOutcome::Idle);
    assert_eq!(fixture.generator.call_count(), 1);
    let unchanged = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(unchanged, stored);
}

#[tokio::test]
async fn test_optimization_failure_fails_job_and_leaves_draft_unpublished() {
    let fixture = pipeline_fixture_with_optimizer(
        StubGenerator::succeeding(),
        Arc::new(FailingOptimizer("missing seo metadata")),
        vec![StubTarget::new("wordpress", TargetBehavior::Succeed)],
        RetryStrategy::None,
    )
    .await;
    let queued = fixture.queue.enqueue(job("sleep hygiene")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ProcessOutcome::Failed { job_id, .. } if job_id == queued.id));

    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.attempts, 1);
    assert!(stored.published_article_id.is_none());
    let last_error = stored.last_error.unwrap();
    assert!(last_error.starts_with("optimization failed"));
    assert!(last_error.contains("missing seo metadata"));

    // The draft stays behind, unpublished and never sent to a target
    let drafts = article::Entity::find()
        .all(fixture.db.as_ref())
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert!(!drafts[0].is_published);
    assert_eq!(drafts[0].title, "Draft: sleep hygiene");
    assert!(fixture
        .articles
        .publish_attempts_for_job(queued.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_timed_out_target_does_not_fail_the_job() {
    let fixture = pipeline_fixture(
        StubGenerator::succeeding(),
        vec![
            StubTarget::new("medium", TargetBehavior::Hang),
            StubTarget::new("wordpress", TargetBehavior::Succeed),
        ],
        RetryStrategy::None,
    )
    .await;
    let queued = fixture.queue.enqueue(job("sleep hygiene")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();

    let ProcessOutcome::Published {
        job_id,
        article_id,
        targets,
    } = outcome
    else {
        panic!("expected a published outcome, got {:?}", outcome);
    };
    assert_eq!(job_id, queued.id);
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].target, "medium");
    assert!(!targets[0].succeeded());
    assert!(targets[0].result.as_ref().unwrap_err().contains("Timed out"));
    assert_eq!(targets[1].target, "wordpress");
    assert!(targets[1].succeeded());

    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Published);
    assert_eq!(stored.published_article_id, Some(article_id));
    assert!(stored.last_error.is_none());

    let attempts = fixture
        .articles
        .publish_attempts_for_job(queued.id)
        .await
        .unwrap();
    assert_eq!(attempts.len(), 2);
    let medium = attempts.iter().find(|a| a.target == "medium").unwrap();
    let wordpress = attempts.iter().find(|a| a.target == "wordpress").unwrap();
    assert!(!medium.succeeded);
    assert!(medium.error.is_some());
    assert!(wordpress.succeeded);
    assert_eq!(wordpress.external_post_id.as_deref(), Some("wordpress-1"));

    let article = fixture.articles.find_by_id(article_id).await.unwrap().unwrap();
    assert!(article.is_published);
    assert_eq!(article.title, "sleep hygiene");
    assert_eq!(article.slug, "sleep-hygiene");
    assert_eq!(article.external_posts.len(), 1);
    assert_eq!(
        article.external_posts["wordpress"].url,
        "https://wordpress.example.com/sleep-hygiene"
    );
    assert_eq!(
        article.seo_meta.unwrap().keywords,
        vec!["sleep".to_string(), "rest".to_string()]
    );
}

#[tokio::test]
async fn test_failing_target_is_isolated() {
    let fixture = pipeline_fixture(
        StubGenerator::succeeding(),
        vec![
            StubTarget::new("wordpress", TargetBehavior::Fail),
            StubTarget::new("medium", TargetBehavior::Succeed),
        ],
        RetryStrategy::None,
    )
    .await;
    let queued = fixture.queue.enqueue(job("magnesium")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ProcessOutcome::Published { .. }));

    let attempts = fixture
        .articles
        .publish_attempts_for_job(queued.id)
        .await
        .unwrap();
    let failed: Vec<_> = attempts.iter().filter(|a| !a.succeeded).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, "wordpress");
}

#[tokio::test]
async fn test_zero_targets_still_publishes() {
    let fixture = pipeline_fixture(StubGenerator::succeeding(), vec![], RetryStrategy::None).await;
    let queued = fixture.queue.enqueue(job("stretching")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, ProcessOutcome::Published { ref targets, .. } if targets.is_empty()));
    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Published);
}

#[tokio::test]
async fn test_retry_strategy_requeues_until_attempts_run_out() {
    let fixture = pipeline_fixture(
        StubGenerator::failing("rate limited"),
        vec![],
        RetryStrategy::Fixed {
            max_attempts: 2,
            delay: std::time::Duration::from_secs(600),
        },
    )
    .await;
    let queued = fixture.queue.enqueue(job("breathing")).await.unwrap().unwrap();

    let outcome = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    let ProcessOutcome::Requeued { retry_at, .. } = outcome else {
        panic!("expected a requeue, got {:?}", outcome);
    };
    assert!(retry_at > Utc::now() + Duration::minutes(9));

    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Scheduled);
    assert_eq!(stored.attempts, 1);
    assert!(stored.last_error.is_some());

    // Not eligible until the retry time passes
    let idle = fixture
        .worker
        .process_next(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(idle, ProcessOutcome::Idle);
}

#[tokio::test]
async fn test_cancelled_run_fails_the_stage() {
    let fixture = pipeline_fixture(StubGenerator::succeeding(), vec![], RetryStrategy::None).await;
    let queued = fixture.queue.enqueue(job("cancelled topic")).await.unwrap().unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = fixture.worker.process_next(&cancel).await.unwrap();

    assert!(matches!(outcome, ProcessOutcome::Failed { ref error, .. } if error.contains("Cancelled")));
    let stored = fixture.jobs.find_by_id(queued.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_concurrent_process_next_claims_job_once() {
    let fixture = pipeline_fixture(StubGenerator::succeeding(), vec![], RetryStrategy::None).await;
    fixture.queue.enqueue(job("single job")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let worker = fixture.worker.clone();
        handles.push(tokio::spawn(async move {
            worker.process_next(&CancellationToken::new()).await.unwrap()
        }));
    }

    let mut published = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ProcessOutcome::Published { .. } => published += 1,
            ProcessOutcome::Idle => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(published, 1);
    assert_eq!(fixture.generator.call_count(), 1);
}
