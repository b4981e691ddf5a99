// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::application::dto::ingest_request::IngestRequestDto;
use crate::queue::job_queue::{JobQueue, QueueError};
use crate::queue::scheduler::JobScheduler;

/// 摄取错误类型
#[derive(Error, Debug)]
pub enum IngestError {
    /// 请求校验失败
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
    /// 入队失败
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// 摄取结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// 新建任务的ID
    pub created: Vec<Uuid>,
    /// 因主题重复而跳过的主题
    pub skipped: Vec<String>,
}

/// 批量摄取主题为流水线任务
///
/// 主题去除首尾空白后作为去重键；同一批次内和任务表中已存在的主题都会被跳过
pub struct IngestJobsUseCase<Q: JobQueue + 'static> {
    scheduler: JobScheduler<Q>,
}

impl<Q: JobQueue + 'static> IngestJobsUseCase<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self {
            scheduler: JobScheduler::new(queue),
        }
    }

    pub async fn execute(&self, request: IngestRequestDto) -> Result<IngestReport, IngestError> {
        request.validate()?;

        let now = Utc::now();
        let mut seen = HashSet::new();
        let mut report = IngestReport::default();

        for item in request.items {
            let topic = item.topic.trim().to_string();
            if !seen.insert(topic.clone()) {
                report.skipped.push(topic);
                continue;
            }
            let keywords = item
                .target_keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .collect();

            match self
                .scheduler
                .schedule_at(topic.clone(), keywords, item.scheduled_at.unwrap_or(now))
                .await?
            {
                Some(job) => report.created.push(job.id),
                None => report.skipped.push(topic),
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Ingested pipeline jobs"
        );
        Ok(report)
    }
}
