// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::DomainError;

/// 联盟链接状态
///
/// 数据库中以 `is_active` 布尔列保存。状态只允许 Active → Inactive，
/// 重新启用属于人工操作，不在此处建模。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// 启用中，参与探测和投放
    Active,
    /// 已停用
    Inactive,
}

impl LinkStatus {
    /// 从 `is_active` 列构建
    pub fn from_active_flag(is_active: bool) -> Self {
        if is_active {
            LinkStatus::Active
        } else {
            LinkStatus::Inactive
        }
    }

    /// 是否启用
    pub fn is_active(self) -> bool {
        self == LinkStatus::Active
    }

    /// 停用链接
    pub fn deactivate(self) -> Result<LinkStatus, DomainError> {
        match self {
            LinkStatus::Active => Ok(LinkStatus::Inactive),
            LinkStatus::Inactive => Err(DomainError::LinkAlreadyInactive),
        }
    }
}

/// 联盟链接实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateLink {
    /// 链接ID
    pub id: Uuid,
    /// 所属产品ID
    pub product_id: Uuid,
    /// 原始跳转地址
    pub original_url: String,
    /// 短码，全局唯一
    pub short_code: String,
    /// 链接状态
    pub status: LinkStatus,
    /// 14天点击率（外部维护）
    pub ctr_14d: f64,
    /// 最近一次探测时间
    pub last_checked_at: Option<DateTime<Utc>>,
    /// 停用时间
    pub deactivated_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl AffiliateLink {
    /// 创建一个新的启用链接
    pub fn new(product_id: Uuid, original_url: String, short_code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product_id,
            original_url,
            short_code,
            status: LinkStatus::Active,
            ctr_14d: 0.0,
            last_checked_at: None,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否启用
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 停用链接
    ///
    /// 已停用的链接返回 `LinkAlreadyInactive`，不修改任何字段
    pub fn deactivate(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.status = self.status.deactivate()?;
        self.deactivated_at = Some(at);
        self.updated_at = at;
        Ok(())
    }
}

/// 链接健康观测记录
///
/// 只追加，不修改。每个链接每次探测产生一条。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkHealthObservation {
    /// 记录ID
    pub id: Uuid,
    /// 链接ID
    pub link_id: Uuid,
    /// 探测时间
    pub checked_at: DateTime<Utc>,
    /// HTTP状态码，网络错误或超时为0
    pub status_code: u16,
    /// 是否可用
    pub is_working: bool,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
    /// 连续失败次数
    pub consecutive_failures: u32,
    /// 错误信息
    pub error_message: Option<String>,
}

/// 单次探测的结果，在写入观测前使用
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// HTTP状态码，网络错误或超时为0
    pub status_code: u16,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
    /// 错误信息
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// 是否成功（2xx）
    pub fn is_working(&self) -> bool {
        self.error_message.is_none() && (200..300).contains(&self.status_code)
    }
}

/// 产品，提供链接轮换所需的分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 产品ID
    pub id: Uuid,
    /// 产品名称
    pub name: String,
    /// 产品分类
    pub category: String,
}

/// 探测运行汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    /// 探测的链接总数
    pub total: u32,
    /// 可用
    pub working: u32,
    /// 不可用
    pub broken: u32,
    /// 响应慢
    pub slow: u32,
    /// 之前失败、本次恢复
    pub recently_fixed: u32,
    /// 本次触发熔断而停用
    pub deactivated: u32,
}

/// 已持久化的一次探测运行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRun {
    /// 运行ID
    pub id: Uuid,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间
    pub finished_at: DateTime<Utc>,
    /// 汇总
    pub summary: ProbeSummary,
}

/// 轮换建议记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRotation {
    /// 记录ID
    pub id: Uuid,
    /// 被停用的链接
    pub old_link_id: Uuid,
    /// 建议替换的链接
    pub suggested_link_id: Uuid,
    /// 旧链接点击率
    pub old_ctr: f64,
    /// 建议链接点击率
    pub suggested_ctr: f64,
    /// 产品分类
    pub category: String,
    /// 轮换时间
    pub rotated_at: DateTime<Utc>,
}
