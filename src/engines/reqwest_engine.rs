// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, ReachabilityChecker, ReachabilityResponse};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::{Duration, Instant};

/// 基于 reqwest 的可达性检查引擎
///
/// 先发 HEAD 请求，服务端不支持 HEAD 时回退为 GET。自动跟随重定向。
#[derive(Clone)]
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl ReqwestEngine {
    /// 创建引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 探测请求使用的 User-Agent
    pub fn new(user_agent: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

fn head_unsupported(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

#[async_trait]
impl ReachabilityChecker for ReqwestEngine {
    async fn check(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ReachabilityResponse, EngineError> {
        let start = Instant::now();
        let probe = async {
            let response = self.client.head(url).send().await?;
            if head_unsupported(response.status()) {
                return self.client.get(url).send().await;
            }
            Ok(response)
        };

        // One budget covers both the HEAD and the GET fallback
        let response = tokio::time::timeout(timeout, probe)
            .await
            .map_err(|_| EngineError::Timeout(timeout))??;

        Ok(ReachabilityResponse {
            status_code: response.status().as_u16(),
            response_time_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
