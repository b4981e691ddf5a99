// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link::{
    AffiliateLink, LinkHealthObservation, ProbeOutcome, ProbeRun, ProbeSummary,
};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::link_repository::LinkRepository;
use crate::engines::circuit_breaker::LinkCircuitBreaker;
use crate::engines::traits::ReachabilityChecker;
use crate::utils::errors::WorkerError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 探测器配置
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// 单次请求超时
    pub request_timeout: Duration,
    /// 慢响应阈值（毫秒）
    pub slow_threshold_ms: u64,
    /// 同时探测的链接数
    pub concurrency: usize,
    /// 报告中慢链接的统计窗口
    pub report_window: ChronoDuration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            slow_threshold_ms: 3000,
            concurrency: 8,
            report_window: ChronoDuration::days(7),
        }
    }
}

/// 单个链接一次探测的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkCheck {
    /// 本次写入的观测
    pub observation: LinkHealthObservation,
    /// 响应时间超过慢阈值
    pub slow: bool,
    /// 上一次失败、本次恢复
    pub recovered: bool,
    /// 本次触发熔断并完成了停用
    pub deactivated: bool,
}

/// 报告中的故障链接
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLink {
    pub link_id: Uuid,
    pub short_code: String,
    pub original_url: String,
    pub is_active: bool,
    pub consecutive_failures: u32,
    pub status_code: u16,
    pub error_message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// 报告中的慢链接
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowLink {
    pub link_id: Uuid,
    pub short_code: String,
    pub original_url: String,
    /// 窗口内的平均响应时间（毫秒）
    pub average_response_time_ms: u64,
    /// 参与平均的观测数
    pub samples: usize,
}

/// 链接健康报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// 最近一次探测运行，从未探测过为 `None`
    pub latest_run: Option<ProbeRun>,
    /// 最近一次运行的汇总
    pub summary: ProbeSummary,
    /// 最近一次观测失败的链接，按连续失败次数降序
    pub broken_links: Vec<BrokenLink>,
    /// 窗口内平均响应时间超过慢阈值的链接
    pub slow_links: Vec<SlowLink>,
}

/// 联盟链接探测器
///
/// 对所有启用的链接做可达性检查，追加健康观测，
/// 连续失败达到阈值时停用链接。停用是单向的，之后成功的观测不会重新启用链接。
pub struct LinkProber<R: LinkRepository> {
    /// 链接仓库
    repository: Arc<R>,
    /// 可达性检查引擎
    checker: Arc<dyn ReachabilityChecker>,
    /// 熔断器
    breaker: LinkCircuitBreaker,
    /// 配置
    config: ProbeConfig,
}

impl<R: LinkRepository> LinkProber<R> {
    /// 创建新的探测器实例
    pub fn new(
        repository: Arc<R>,
        checker: Arc<dyn ReachabilityChecker>,
        breaker: LinkCircuitBreaker,
        config: ProbeConfig,
    ) -> Self {
        Self {
            repository,
            checker,
            breaker,
            config,
        }
    }

    /// 探测所有启用的链接并保存本次运行汇总
    ///
    /// 不同链接并发探测，单个链接的失败不会中断其他链接。
    /// 取消后不再发起新的探测，已完成的部分照常汇总。
    pub async fn probe_all(&self, cancel: &CancellationToken) -> Result<ProbeSummary, WorkerError> {
        let started_at = Utc::now();
        let links = self.repository.find_active().await?;
        info!(links = links.len(), checker = self.checker.name(), "Starting link probe run");

        let concurrency = self.config.concurrency.max(1);
        let results: Vec<Option<LinkCheck>> = stream::iter(links)
            .map(move |link| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                match self.probe_one(&link, cancel).await {
                    Ok(check) => check,
                    Err(e) => {
                        error!(link_id = %link.id, "Failed to record link probe: {}", e);
                        None
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = ProbeSummary::default();
        for check in results.into_iter().flatten() {
            summary.total += 1;
            if check.observation.is_working {
                summary.working += 1;
            } else {
                summary.broken += 1;
            }
            if check.slow {
                summary.slow += 1;
            }
            if check.recovered {
                summary.recently_fixed += 1;
            }
            if check.deactivated {
                summary.deactivated += 1;
            }
        }

        if cancel.is_cancelled() {
            warn!(probed = summary.total, "Link probe run cancelled, recording partial summary");
        }

        let run = ProbeRun {
            id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            summary: summary.clone(),
        };
        self.repository.record_probe_run(&run).await?;

        info!(
            total = summary.total,
            working = summary.working,
            broken = summary.broken,
            slow = summary.slow,
            recently_fixed = summary.recently_fixed,
            deactivated = summary.deactivated,
            "Link probe run finished"
        );
        Ok(summary)
    }

    /// 探测单个链接
    ///
    /// 已停用的链接也可以探测，结果只追加观测，不会重新启用
    pub async fn probe_link(
        &self,
        link_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<LinkCheck, WorkerError> {
        let link = self
            .repository
            .find_by_id(link_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        self.probe_one(&link, cancel)
            .await?
            .ok_or(WorkerError::Cancelled)
    }

    #[instrument(skip(self, link, cancel), fields(link_id = %link.id, short_code = %link.short_code))]
    async fn probe_one(
        &self,
        link: &AffiliateLink,
        cancel: &CancellationToken,
    ) -> Result<Option<LinkCheck>, RepositoryError> {
        let previous = self.repository.latest_observation(link.id).await?;

        let Some(outcome) = self.check(&link.original_url, cancel).await else {
            debug!("Probe cancelled before completion");
            return Ok(None);
        };

        let decision = self.breaker.evaluate(previous.as_ref(), &outcome);
        let is_working = outcome.is_working();
        let slow = outcome.status_code != 0 && outcome.response_time_ms > self.config.slow_threshold_ms;

        let checked_at = next_checked_at(previous.as_ref(), Utc::now());
        let observation = LinkHealthObservation {
            id: Uuid::new_v4(),
            link_id: link.id,
            checked_at,
            status_code: outcome.status_code,
            is_working,
            response_time_ms: outcome.response_time_ms,
            consecutive_failures: decision.consecutive_failures,
            error_message: outcome.error_message,
        };
        self.repository.append_observation(&observation).await?;
        self.repository.touch_last_checked(link.id, checked_at).await?;

        counter!(
            "link_probes_total",
            "outcome" => if is_working { "working" } else { "broken" }
        )
        .increment(1);

        let mut deactivated = false;
        if decision.should_deactivate() {
            let mut opened = link.clone();
            match opened.deactivate(checked_at) {
                Ok(()) => {
                    deactivated = self.repository.deactivate(link.id, checked_at).await?;
                }
                Err(e) => debug!(
                    consecutive_failures = decision.consecutive_failures,
                    "Circuit open, {}",
                    e
                ),
            }
            if deactivated {
                counter!("link_circuit_opened_total").increment(1);
                warn!(
                    consecutive_failures = decision.consecutive_failures,
                    threshold = self.breaker.failure_threshold(),
                    "Circuit opened, link deactivated"
                );
            }
        } else if !is_working {
            debug!(
                consecutive_failures = decision.consecutive_failures,
                status_code = observation.status_code,
                "Link probe failed"
            );
        }

        if decision.recovered {
            info!("Link recovered after failing probe");
        }

        Ok(Some(LinkCheck {
            observation,
            slow,
            recovered: decision.recovered,
            deactivated,
        }))
    }

    /// 执行一次可达性检查，网络错误和超时转为状态码 0 的失败结果
    ///
    /// 被取消时返回 `None`
    async fn check(&self, url: &str, cancel: &CancellationToken) -> Option<ProbeOutcome> {
        let timeout = self.config.request_timeout;
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = self.checker.check(url, timeout) => result,
        };
        histogram!("link_probe_duration_seconds").record(start.elapsed().as_secs_f64());

        Some(match result {
            Ok(response) => ProbeOutcome {
                status_code: response.status_code,
                response_time_ms: response.response_time_ms,
                error_message: None,
            },
            Err(e) => {
                if e.is_timeout() {
                    counter!("link_probe_timeouts_total").increment(1);
                }
                ProbeOutcome {
                    status_code: 0,
                    response_time_ms: u64::try_from(start.elapsed().as_millis())
                        .unwrap_or(u64::MAX),
                    error_message: Some(e.to_string()),
                }
            }
        })
    }

    /// 汇总最近一次探测运行、故障链接和慢链接
    pub async fn health_report(&self) -> Result<HealthReport, WorkerError> {
        let latest_run = self.repository.latest_probe_run().await?;
        let summary = latest_run
            .as_ref()
            .map(|run| run.summary.clone())
            .unwrap_or_default();

        let links = self.repository.find_all().await?;

        let mut broken_links = Vec::new();
        for link in &links {
            let Some(latest) = self.repository.latest_observation(link.id).await? else {
                continue;
            };
            if latest.is_working {
                continue;
            }
            broken_links.push(BrokenLink {
                link_id: link.id,
                short_code: link.short_code.clone(),
                original_url: link.original_url.clone(),
                is_active: link.is_active(),
                consecutive_failures: latest.consecutive_failures,
                status_code: latest.status_code,
                error_message: latest.error_message,
                checked_at: latest.checked_at,
            });
        }
        broken_links.sort_by(|a, b| b.consecutive_failures.cmp(&a.consecutive_failures));

        let since = Utc::now() - self.config.report_window;
        let observations = self.repository.observations_since(since).await?;
        let slow_links = slow_links(&links, &observations, self.config.slow_threshold_ms);

        Ok(HealthReport {
            latest_run,
            summary,
            broken_links,
            slow_links,
        })
    }
}

/// 同一链接的观测时间严格递增
fn next_checked_at(
    previous: Option<&LinkHealthObservation>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev.checked_at >= now => prev.checked_at + ChronoDuration::milliseconds(1),
        _ => now,
    }
}

/// 按链接计算窗口内平均响应时间，只统计收到了 HTTP 响应的观测
fn slow_links(
    links: &[AffiliateLink],
    observations: &[LinkHealthObservation],
    threshold_ms: u64,
) -> Vec<SlowLink> {
    let mut totals: HashMap<Uuid, (u128, usize)> = HashMap::new();
    for observation in observations.iter().filter(|o| o.status_code != 0) {
        let entry = totals.entry(observation.link_id).or_default();
        entry.0 += u128::from(observation.response_time_ms);
        entry.1 += 1;
    }

    let mut slow: Vec<SlowLink> = links
        .iter()
        .filter_map(|link| {
            let (sum, samples) = totals.get(&link.id).copied()?;
            let average = u64::try_from(sum / samples as u128).unwrap_or(u64::MAX);
            (average > threshold_ms).then(|| SlowLink {
                link_id: link.id,
                short_code: link.short_code.clone(),
                original_url: link.original_url.clone(),
                average_response_time_ms: average,
                samples,
            })
        })
        .collect();
    slow.sort_by(|a, b| b.average_response_time_ms.cmp(&a.average_response_time_ms));
    slow
}
