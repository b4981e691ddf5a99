// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_link, create_product, link_fixture};
use contentrs::domain::models::link::ProbeSummary;
use contentrs::domain::repositories::link_repository::LinkRepository;
use tokio_util::sync::CancellationToken;

const URL: &str = "https://shop.example.com/p/1";

#[tokio::test]
async fn test_circuit_opens_on_third_consecutive_failure() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let link = create_link(&fixture.links, &product, URL, 0.02).await;

    fixture.checker.push(URL, Ok(404));
    fixture.checker.push(URL, Ok(500));
    fixture.checker.push(URL, Err("connection refused"));

    let cancel = CancellationToken::new();
    for _ in 0..2 {
        let summary = fixture.prober.probe_all(&cancel).await.unwrap();
        assert_eq!(summary.broken, 1);
        assert_eq!(summary.deactivated, 0);
    }
    let after_two = fixture.links.find_by_id(link.id).await.unwrap().unwrap();
    assert!(after_two.is_active());

    let summary = fixture.prober.probe_all(&cancel).await.unwrap();
    assert_eq!(summary.deactivated, 1);

    let after_three = fixture.links.find_by_id(link.id).await.unwrap().unwrap();
    assert!(!after_three.is_active());
    assert!(after_three.deactivated_at.is_some());

    let latest = fixture
        .links
        .latest_observation(link.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.consecutive_failures, 3);
    assert_eq!(latest.status_code, 0);
    assert!(latest
        .error_message
        .as_deref()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_success_resets_failures_and_counts_as_recently_fixed() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let link = create_link(&fixture.links, &product, URL, 0.02).await;

    fixture.checker.push(URL, Ok(503));
    fixture.checker.push(URL, Ok(503));
    fixture.checker.push(URL, Ok(200));

    let cancel = CancellationToken::new();
    fixture.prober.probe_all(&cancel).await.unwrap();
    fixture.prober.probe_all(&cancel).await.unwrap();
    let summary = fixture.prober.probe_all(&cancel).await.unwrap();

    assert_eq!(summary.working, 1);
    assert_eq!(summary.recently_fixed, 1);

    let latest = fixture
        .links
        .latest_observation(link.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.consecutive_failures, 0);
    assert!(latest.is_working);
    assert!(fixture
        .links
        .find_by_id(link.id)
        .await
        .unwrap()
        .unwrap()
        .is_active());
}

#[tokio::test]
async fn test_observations_are_ordered_and_consistent() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let link = create_link(&fixture.links, &product, URL, 0.02).await;

    fixture.checker.push(URL, Ok(500));
    fixture.checker.push(URL, Ok(500));
    fixture.checker.push(URL, Ok(204));
    fixture.checker.push(URL, Err("dns error"));

    let cancel = CancellationToken::new();
    for _ in 0..4 {
        fixture.prober.probe_all(&cancel).await.unwrap();
    }

    let observations = fixture.links.observations_for_link(link.id).await.unwrap();
    let failures: Vec<u32> = observations.iter().map(|o| o.consecutive_failures).collect();
    assert_eq!(failures, vec![1, 2, 0, 1]);
    assert!(observations
        .windows(2)
        .all(|pair| pair[0].checked_at < pair[1].checked_at));
}

#[tokio::test]
async fn test_deactivated_link_is_not_reactivated_by_success() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let link = create_link(&fixture.links, &product, URL, 0.02).await;

    for _ in 0..3 {
        fixture.checker.push(URL, Ok(500));
    }
    let cancel = CancellationToken::new();
    for _ in 0..3 {
        fixture.prober.probe_all(&cancel).await.unwrap();
    }
    assert!(!fixture
        .links
        .find_by_id(link.id)
        .await
        .unwrap()
        .unwrap()
        .is_active());

    // Inactive links are skipped by the regular run
    let summary = fixture.prober.probe_all(&cancel).await.unwrap();
    assert_eq!(summary.total, 0);

    fixture.checker.push(URL, Ok(200));
    let check = fixture.prober.probe_link(link.id, &cancel).await.unwrap();
    assert!(check.observation.is_working);
    assert_eq!(check.observation.consecutive_failures, 0);
    assert!(check.recovered);
    assert!(!check.deactivated);

    let stored = fixture.links.find_by_id(link.id).await.unwrap().unwrap();
    assert!(!stored.is_active());
}

#[tokio::test]
async fn test_probe_with_no_links_records_empty_run() {
    let fixture = link_fixture().await;

    let summary = fixture
        .prober
        .probe_all(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary, ProbeSummary::default());

    let run = fixture.links.latest_probe_run().await.unwrap().unwrap();
    assert_eq!(run.summary, ProbeSummary::default());
}

#[tokio::test]
async fn test_cancelled_probe_records_partial_run() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    create_link(&fixture.links, &product, URL, 0.02).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = fixture.prober.probe_all(&cancel).await.unwrap();

    assert_eq!(summary.total, 0);
    assert!(fixture.links.latest_probe_run().await.unwrap().is_some());
}

#[tokio::test]
async fn test_health_report_lists_broken_and_slow_links() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let flaky = create_link(&fixture.links, &product, "https://flaky.example.com", 0.01).await;
    let dead = create_link(&fixture.links, &product, "https://dead.example.com", 0.01).await;
    let slow = create_link(&fixture.links, &product, "https://slow.example.com", 0.01).await;

    fixture.checker.push("https://flaky.example.com", Ok(200));
    fixture.checker.push("https://flaky.example.com", Ok(500));
    fixture.checker.push("https://dead.example.com", Ok(410));
    fixture.checker.push("https://dead.example.com", Ok(410));
    fixture.checker.push_timed("https://slow.example.com", Ok(200), 4500);
    fixture.checker.push_timed("https://slow.example.com", Ok(200), 3900);

    let cancel = CancellationToken::new();
    fixture.prober.probe_all(&cancel).await.unwrap();
    fixture.prober.probe_all(&cancel).await.unwrap();

    let report = fixture.prober.health_report().await.unwrap();

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.working, 1);
    assert_eq!(report.summary.broken, 2);
    assert_eq!(report.summary.slow, 1);
    assert!(report.latest_run.is_some());

    let broken: Vec<_> = report.broken_links.iter().map(|b| b.link_id).collect();
    assert_eq!(broken, vec![dead.id, flaky.id]);
    assert_eq!(report.broken_links[0].consecutive_failures, 2);
    assert_eq!(report.broken_links[0].status_code, 410);

    assert_eq!(report.slow_links.len(), 1);
    assert_eq!(report.slow_links[0].link_id, slow.id);
    assert_eq!(report.slow_links[0].average_response_time_ms, 4200);
}

#[tokio::test]
async fn test_failing_check_on_inactive_link_keeps_original_deactivation() {
    let fixture = link_fixture().await;
    let product = create_product(&fixture.links, "sleep").await;
    let link = create_link(&fixture.links, &product, URL, 0.02).await;

    for _ in 0..3 {
        fixture.checker.push(URL, Ok(500));
    }
    let cancel = CancellationToken::new();
    for _ in 0..3 {
        fixture.prober.probe_all(&cancel).await.unwrap();
    }
    let opened = fixture.links.find_by_id(link.id).await.unwrap().unwrap();
    let opened_at = opened.deactivated_at.unwrap();

    fixture.checker.push(URL, Err("connection reset"));
    let check = fixture.prober.probe_link(link.id, &cancel).await.unwrap();

    assert_eq!(check.observation.consecutive_failures, 4);
    assert!(!check.deactivated);
    let stored = fixture.links.find_by_id(link.id).await.unwrap().unwrap();
    assert!(!stored.is_active());
    assert_eq!(stored.deactivated_at, Some(opened_at));
}
