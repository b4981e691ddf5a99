// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup_db;
use chrono::{Duration, Utc};
use contentrs::application::dto::ingest_request::{IngestItemDto, IngestRequestDto};
use contentrs::application::dto::link_request::{RegisterLinkDto, RegisterProductDto};
use contentrs::application::use_cases::ingest_jobs::{IngestError, IngestJobsUseCase};
use contentrs::application::use_cases::register_link::{RegisterLinkError, RegisterLinkUseCase};
use contentrs::domain::models::job::JobStatus;
use contentrs::domain::repositories::job_repository::JobRepository;
use contentrs::domain::repositories::link_repository::LinkRepository;
use contentrs::infrastructure::database::entities::pipeline_job;
use contentrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use contentrs::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use contentrs::queue::job_queue::DatabaseJobQueue;
use contentrs::utils::retry_policy::RetryStrategy;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use uuid::Uuid;

fn item(topic: &str, keywords: &[&str]) -> IngestItemDto {
    IngestItemDto {
        topic: topic.to_string(),
        target_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        scheduled_at: None,
    }
}

#[tokio::test]
async fn test_ingesting_same_topic_twice_creates_one_job() {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs.clone(),
        Duration::minutes(15),
        RetryStrategy::None,
    ));
    let use_case = IngestJobsUseCase::new(queue);

    let first = use_case
        .execute(IngestRequestDto {
            items: vec![item("sleep hygiene", &["sleep", "rest"])],
        })
        .await
        .unwrap();
    assert_eq!(first.created.len(), 1);

    let second = use_case
        .execute(IngestRequestDto {
            items: vec![item("  sleep hygiene ", &["sleep", "rest"])],
        })
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped, vec!["sleep hygiene".to_string()]);

    let rows = pipeline_job::Entity::find().count(db.as_ref()).await.unwrap();
    assert_eq!(rows, 1);

    let job = jobs.find_by_id(first.created[0]).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Scheduled);
    assert_eq!(job.target_keywords, vec!["sleep", "rest"]);
    assert!(job.scheduled_at <= Utc::now());
}

#[tokio::test]
async fn test_batch_duplicates_are_skipped_and_schedule_is_kept() {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs.clone(),
        Duration::minutes(15),
        RetryStrategy::None,
    ));
    let use_case = IngestJobsUseCase::new(queue);

    let later = Utc::now() + Duration::days(2);
    let mut scheduled = item("cold showers", &["recovery"]);
    scheduled.scheduled_at = Some(later);

    let report = use_case
        .execute(IngestRequestDto {
            items: vec![scheduled, item("cold showers", &[]), item("zinc", &[])],
        })
        .await
        .unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(report.skipped, vec!["cold showers".to_string()]);
    let job = jobs.find_by_id(report.created[0]).await.unwrap().unwrap();
    assert_eq!(job.scheduled_at.timestamp(), later.timestamp());
}

#[tokio::test]
async fn test_invalid_request_is_rejected() {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs,
        Duration::minutes(15),
        RetryStrategy::None,
    ));
    let use_case = IngestJobsUseCase::new(queue);

    let err = use_case
        .execute(IngestRequestDto { items: vec![] })
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));
}

#[tokio::test]
async fn test_blank_or_short_topics_create_no_jobs() {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs,
        Duration::minutes(15),
        RetryStrategy::None,
    ));
    let use_case = IngestJobsUseCase::new(queue);

    let err = use_case
        .execute(IngestRequestDto {
            items: vec![item("     ", &[]), item("  a  ", &[])],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));

    let rows = pipeline_job::Entity::find().count(db.as_ref()).await.unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_register_link_assigns_unique_short_code() {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db));
    let use_case = RegisterLinkUseCase::new(links.clone());

    let product = use_case
        .register_product(RegisterProductDto {
            name: "Weighted blanket".to_string(),
            category: " Sleep ".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(product.category, "sleep");

    let first = use_case
        .register_link(RegisterLinkDto {
            product_id: product.id,
            original_url: "https://shop.example.com/blanket".to_string(),
            ctr_14d: Some(0.04),
        })
        .await
        .unwrap();
    let second = use_case
        .register_link(RegisterLinkDto {
            product_id: product.id,
            original_url: "https://other.example.com/blanket".to_string(),
            ctr_14d: None,
        })
        .await
        .unwrap();

    assert_eq!(first.short_code.len(), 8);
    assert_ne!(first.short_code, second.short_code);
    assert!(first.is_active());
    assert!(links.exists_by_short_code(&first.short_code).await.unwrap());
    assert_eq!(first.ctr_14d, 0.04);
    assert_eq!(second.ctr_14d, 0.0);

    let missing = use_case
        .register_link(RegisterLinkDto {
            product_id: Uuid::new_v4(),
            original_url: "https://shop.example.com/x".to_string(),
            ctr_14d: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(missing, RegisterLinkError::ProductNotFound(_)));
}
