// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 启动 Prometheus 指标导出并登记指标说明
///
/// # 参数
///
/// * `host` - 监听地址
/// * `port` - 监听端口
pub fn init_metrics(host: &str, port: u16) {
    let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("Invalid metrics address {}:{}: {}", host, port, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(
        "pipeline_jobs_claimed_total",
        "Pipeline jobs claimed by a worker"
    );
    describe_counter!(
        "pipeline_jobs_published_total",
        "Pipeline jobs that reached the published state"
    );
    describe_counter!(
        "pipeline_jobs_failed_total",
        "Pipeline jobs that reached the failed state"
    );
    describe_counter!(
        "pipeline_jobs_requeued_total",
        "Pipeline jobs rescheduled by the retry strategy"
    );
    describe_counter!(
        "pipeline_publish_target_total",
        "Publish attempts per target and outcome"
    );
    describe_counter!("link_probes_total", "Affiliate link probes by outcome");
    describe_histogram!(
        "link_probe_duration_seconds",
        Unit::Seconds,
        "Affiliate link probe response time"
    );
    describe_counter!(
        "link_probe_timeouts_total",
        "Affiliate link probes that timed out"
    );
    describe_counter!(
        "link_circuit_opened_total",
        "Affiliate links deactivated by the circuit breaker"
    );
    describe_counter!(
        "link_rotations_total",
        "Underperforming links replaced by a better link"
    );
}
