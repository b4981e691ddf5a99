// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link::{AffiliateLink, LinkRotation};
use crate::domain::repositories::link_repository::LinkRepository;
use crate::utils::errors::WorkerError;
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 跳过某个候选链接的原因
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 同分类中没有点击率更高的启用链接
    NoBetterLink,
    /// 链接所属产品不存在
    ProductMissing,
    /// 处理前链接已被停用
    AlreadyInactive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLink {
    pub link_id: Uuid,
    pub reason: SkipReason,
}

/// 一次轮换的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotationReport {
    /// 检查的候选数
    pub examined: usize,
    /// 已停用并给出替换建议的链接
    pub rotations: Vec<LinkRotation>,
    /// 跳过的候选
    pub skipped: Vec<SkippedLink>,
}

/// 低点击率链接轮换器
///
/// 只停用候选链接并记录替换建议，引用旧链接的内容需要人工更新
pub struct LinkRotator<R: LinkRepository> {
    /// 链接仓库
    repository: Arc<R>,
    /// 每次处理的候选数
    batch_size: u64,
}

impl<R: LinkRepository> LinkRotator<R> {
    pub fn new(repository: Arc<R>, batch_size: u64) -> Self {
        Self {
            repository,
            batch_size,
        }
    }

    /// 轮换点击率最低的一批启用链接
    ///
    /// 取消后停止处理剩余候选，返回已完成的部分
    pub async fn rotate_underperforming(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RotationReport, WorkerError> {
        let candidates = self.repository.rotation_candidates(self.batch_size).await?;
        info!(candidates = candidates.len(), "Starting link rotation");

        let mut report = RotationReport::default();
        for link in candidates {
            if cancel.is_cancelled() {
                warn!(examined = report.examined, "Link rotation cancelled");
                break;
            }
            report.examined += 1;

            match self.rotate_one(&link).await? {
                Ok(rotation) => report.rotations.push(rotation),
                Err(reason) => {
                    debug!(link_id = %link.id, ?reason, "Skipping rotation candidate");
                    report.skipped.push(SkippedLink {
                        link_id: link.id,
                        reason,
                    });
                }
            }
        }

        info!(
            examined = report.examined,
            rotated = report.rotations.len(),
            skipped = report.skipped.len(),
            "Link rotation finished"
        );
        Ok(report)
    }

    async fn rotate_one(
        &self,
        link: &AffiliateLink,
    ) -> Result<Result<LinkRotation, SkipReason>, WorkerError> {
        let Some(product) = self.repository.find_product(link.product_id).await? else {
            return Ok(Err(SkipReason::ProductMissing));
        };

        let Some(replacement) = self
            .repository
            .find_replacement(link, &product.category)
            .await?
        else {
            return Ok(Err(SkipReason::NoBetterLink));
        };

        let now = Utc::now();
        let mut retired = link.clone();
        if retired.deactivate(now).is_err() || !self.repository.deactivate(link.id, now).await? {
            return Ok(Err(SkipReason::AlreadyInactive));
        }

        let rotation = LinkRotation {
            id: Uuid::new_v4(),
            old_link_id: link.id,
            suggested_link_id: replacement.id,
            old_ctr: link.ctr_14d,
            suggested_ctr: replacement.ctr_14d,
            category: product.category,
            rotated_at: now,
        };
        self.repository.record_rotation(&rotation).await?;
        counter!("link_rotations_total").increment(1);

        info!(
            old_link_id = %link.id,
            suggested_link_id = %replacement.id,
            old_ctr = link.ctr_14d,
            suggested_ctr = replacement.ctr_14d,
            category = %rotation.category,
            "Deactivated underperforming link, replacement suggested"
        );
        Ok(Ok(rotation))
    }
}
