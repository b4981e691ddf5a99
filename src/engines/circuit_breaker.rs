// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;

use crate::domain::models::link::{LinkHealthObservation, ProbeOutcome};

/// 默认熔断阈值
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Clone, Debug)]
pub struct CircuitConfig {
    /// 失败阈值（连续失败次数）
    pub failure_threshold: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// 熔断器状态
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    /// 关闭状态，链接正常参与投放
    Closed,
    /// 打开状态，链接应被停用
    Open,
}

/// 一次探测后的熔断判定
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitDecision {
    /// 本次观测的连续失败次数
    pub consecutive_failures: u32,
    /// 熔断器状态
    pub status: Status,
    /// 上一次观测失败、本次成功
    pub recovered: bool,
}

impl CircuitDecision {
    /// 是否应停用链接
    pub fn should_deactivate(&self) -> bool {
        self.status == Status::Open
    }
}

/// 联盟链接熔断器
///
/// 不保存内存状态，连续失败次数完全由链接的上一条健康观测推导，
/// 因此多个探测进程之间无需共享状态。
#[derive(Clone, Debug, Default)]
pub struct LinkCircuitBreaker {
    config: CircuitConfig,
}

impl LinkCircuitBreaker {
    /// 使用指定配置创建熔断器实例
    pub fn with_config(config: CircuitConfig) -> Self {
        Self { config }
    }

    /// 熔断阈值
    pub fn failure_threshold(&self) -> u32 {
        self.config.failure_threshold
    }

    /// 根据上一条观测和本次探测结果计算熔断判定
    ///
    /// # 参数
    ///
    /// * `previous` - 链接最近一次观测，没有则为 `None`
    /// * `outcome` - 本次探测结果
    pub fn evaluate(
        &self,
        previous: Option<&LinkHealthObservation>,
        outcome: &ProbeOutcome,
    ) -> CircuitDecision {
        let previous_failures = previous.map_or(0, |p| p.consecutive_failures);

        if outcome.is_working() {
            counter!("circuit_breaker_successes_total").increment(1);
            return CircuitDecision {
                consecutive_failures: 0,
                status: Status::Closed,
                recovered: previous.is_some_and(|p| !p.is_working),
            };
        }

        counter!("circuit_breaker_failures_total").increment(1);
        let consecutive_failures = previous_failures.saturating_add(1);
        let status = if consecutive_failures >= self.config.failure_threshold {
            Status::Open
        } else {
            Status::Closed
        };

        CircuitDecision {
            consecutive_failures,
            status,
            recovered: false,
        }
    }
}
