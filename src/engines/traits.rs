// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否由超时引起
    pub fn is_timeout(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => e.is_timeout(),
            EngineError::Timeout(_) => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 可达性检查响应
#[derive(Debug, Clone, PartialEq)]
pub struct ReachabilityResponse {
    /// 跟随重定向后的最终HTTP状态码
    pub status_code: u16,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 可达性检查引擎特质
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    /// 检查 URL 是否可达
    ///
    /// 任何 HTTP 响应都返回 `Ok`，由调用方按状态码判断成败；
    /// 网络错误和超时返回 `Err`
    async fn check(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ReachabilityResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
