// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::settings::RetrySettings;
use crate::utils::errors::WorkerError;

/// 流水线任务的重试策略
///
/// 决定阶段失败后任务是终止为 Failed，还是回到 Scheduled 等待下一次认领。
/// 默认为 `None`，即一次失败就终止。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RetryStrategy {
    /// 不重试
    #[default]
    None,
    /// 固定间隔重试
    Fixed {
        /// 最大尝试次数（包含第一次）
        max_attempts: u32,
        /// 重试间隔
        delay: Duration,
    },
    /// 指数退避重试
    Exponential {
        /// 最大尝试次数（包含第一次）
        max_attempts: u32,
        /// 初始退避时间
        base_delay: Duration,
        /// 最大退避时间
        max_delay: Duration,
    },
}

impl RetryStrategy {
    /// 从配置构建
    pub fn from_settings(settings: &RetrySettings) -> Result<Self, WorkerError> {
        let delay = Duration::from_secs(settings.delay_secs);
        match settings.strategy.to_ascii_lowercase().as_str() {
            "none" => Ok(RetryStrategy::None),
            "fixed" => Ok(RetryStrategy::Fixed {
                max_attempts: settings.max_attempts,
                delay,
            }),
            "exponential" => Ok(RetryStrategy::Exponential {
                max_attempts: settings.max_attempts,
                base_delay: delay,
                max_delay: Duration::from_secs(settings.max_delay_secs),
            }),
            other => Err(WorkerError::InvalidConfig(format!(
                "unknown retry strategy: {}",
                other
            ))),
        }
    }

    /// 计算第 `attempt` 次尝试失败后的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::Fixed { max_attempts, delay } => {
                (attempt < *max_attempts).then_some(*delay)
            }
            RetryStrategy::Exponential {
                max_attempts,
                base_delay,
                max_delay,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                // 计算指数退避
                let exponent = attempt.saturating_sub(1).min(31);
                let backoff_secs = base_delay.as_secs_f64() * 2f64.powi(exponent as i32);
                // 限制最大退避时间
                Some(Duration::from_secs_f64(
                    backoff_secs.min(max_delay.as_secs_f64()),
                ))
            }
        }
    }

    /// 计算下次重试时间，不再重试时返回 `None`
    ///
    /// # 参数
    ///
    /// * `attempts` - 已经进行过的尝试次数
    /// * `now` - 当前时间
    pub fn next_retry_at(&self, attempts: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let backoff = self.calculate_backoff(attempts)?;
        let backoff = chrono::Duration::from_std(backoff).unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(backoff)
    }
}
