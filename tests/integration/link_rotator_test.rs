// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_link, create_product, setup_db};
use chrono::{Duration, Utc};
use contentrs::domain::repositories::link_repository::LinkRepository;
use contentrs::infrastructure::database::entities::link_rotation;
use contentrs::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use contentrs::workers::link_rotator::{LinkRotator, SkipReason};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_rotation_deactivates_candidate_with_better_alternative() {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db.clone()));
    let sleep = create_product(&links, "sleep").await;
    let fitness = create_product(&links, "fitness").await;

    let weak = create_link(&links, &sleep, "https://a.example.com/weak", 0.01).await;
    let strong = create_link(&links, &sleep, "https://a.example.com/strong", 0.08).await;
    let other_category = create_link(&links, &fitness, "https://b.example.com/top", 0.50).await;

    let rotator = LinkRotator::new(links.clone(), 10);
    let report = rotator
        .rotate_underperforming(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.examined, 3);
    assert_eq!(report.rotations.len(), 1);
    let rotation = &report.rotations[0];
    assert_eq!(rotation.old_link_id, weak.id);
    assert_eq!(rotation.suggested_link_id, strong.id);
    assert_eq!(rotation.category, "sleep");

    // The best link in each category has nothing better to move to
    let skipped: Vec<_> = report.skipped.iter().map(|s| s.link_id).collect();
    assert!(skipped.contains(&strong.id));
    assert!(skipped.contains(&other_category.id));
    assert!(report
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::NoBetterLink));

    assert!(!links.find_by_id(weak.id).await.unwrap().unwrap().is_active());
    assert!(links.find_by_id(strong.id).await.unwrap().unwrap().is_active());

    let audit = link_rotation::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].old_link_id, weak.id);
}

#[tokio::test]
async fn test_rotation_ignores_inactive_replacements() {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db));
    let sleep = create_product(&links, "sleep").await;

    let weak = create_link(&links, &sleep, "https://a.example.com/weak", 0.01).await;
    let retired = create_link(&links, &sleep, "https://a.example.com/retired", 0.30).await;
    links.deactivate(retired.id, chrono::Utc::now()).await.unwrap();

    let rotator = LinkRotator::new(links.clone(), 10);
    let report = rotator
        .rotate_underperforming(&CancellationToken::new())
        .await
        .unwrap();

    assert!(report.rotations.is_empty());
    assert_eq!(report.examined, 1);
    assert!(links.find_by_id(weak.id).await.unwrap().unwrap().is_active());
}

#[tokio::test]
async fn test_rotation_batch_takes_lowest_ctr_first() {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db));
    let sleep = create_product(&links, "sleep").await;

    let lowest = create_link(&links, &sleep, "https://a.example.com/1", 0.01).await;
    create_link(&links, &sleep, "https://a.example.com/2", 0.02).await;
    let best = create_link(&links, &sleep, "https://a.example.com/3", 0.09).await;

    let rotator = LinkRotator::new(links.clone(), 1);
    let report = rotator
        .rotate_underperforming(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.rotations[0].old_link_id, lowest.id);
    assert_eq!(report.rotations[0].suggested_link_id, best.id);
}

#[tokio::test]
async fn test_candidates_with_equal_ctr_are_ordered_by_staleness() {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db));
    let sleep = create_product(&links, "sleep").await;

    let recent = create_link(&links, &sleep, "https://a.example.com/recent", 0.02).await;
    let older = create_link(&links, &sleep, "https://a.example.com/older", 0.02).await;
    let never_checked = create_link(&links, &sleep, "https://a.example.com/never", 0.02).await;

    let now = Utc::now();
    links
        .touch_last_checked(recent.id, now - Duration::hours(1))
        .await
        .unwrap();
    links
        .touch_last_checked(older.id, now - Duration::days(3))
        .await
        .unwrap();

    let candidates = links.rotation_candidates(3).await.unwrap();
    let order: Vec<_> = candidates.iter().map(|l| l.id).collect();
    assert_eq!(order, vec![never_checked.id, older.id, recent.id]);
}
