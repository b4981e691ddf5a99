// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::link::{
    AffiliateLink, LinkHealthObservation, LinkRotation, ProbeRun, Product,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 联盟链接仓库特质
///
/// 包括链接本身、健康观测时间序列、探测运行汇总和轮换记录
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// 创建产品
    async fn create_product(&self, product: &Product) -> Result<Product, RepositoryError>;
    /// 根据ID查找产品
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, RepositoryError>;
    /// 创建链接
    async fn create_link(&self, link: &AffiliateLink) -> Result<AffiliateLink, RepositoryError>;
    /// 检查短码是否已被占用
    async fn exists_by_short_code(&self, short_code: &str) -> Result<bool, RepositoryError>;
    /// 根据ID查找链接
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AffiliateLink>, RepositoryError>;
    /// 查找所有启用的链接
    async fn find_active(&self) -> Result<Vec<AffiliateLink>, RepositoryError>;
    /// 查找所有链接
    async fn find_all(&self) -> Result<Vec<AffiliateLink>, RepositoryError>;
    /// 停用链接，仅当链接仍处于启用状态时生效
    ///
    /// # 返回值
    ///
    /// 本次调用是否真正完成了停用
    async fn deactivate(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepositoryError>;
    /// 更新最近探测时间
    async fn touch_last_checked(&self, id: Uuid, at: DateTime<Utc>)
        -> Result<(), RepositoryError>;
    /// 获取链接最近一次观测
    async fn latest_observation(
        &self,
        link_id: Uuid,
    ) -> Result<Option<LinkHealthObservation>, RepositoryError>;
    /// 追加一条观测
    async fn append_observation(
        &self,
        observation: &LinkHealthObservation,
    ) -> Result<(), RepositoryError>;
    /// 按探测时间升序返回链接的全部观测
    async fn observations_for_link(
        &self,
        link_id: Uuid,
    ) -> Result<Vec<LinkHealthObservation>, RepositoryError>;
    /// 返回某时间点之后的所有观测
    async fn observations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<LinkHealthObservation>, RepositoryError>;
    /// 保存探测运行汇总
    async fn record_probe_run(&self, run: &ProbeRun) -> Result<(), RepositoryError>;
    /// 获取最近一次探测运行
    async fn latest_probe_run(&self) -> Result<Option<ProbeRun>, RepositoryError>;
    /// 按点击率升序、探测时间由旧到新选取轮换候选
    async fn rotation_candidates(&self, limit: u64)
        -> Result<Vec<AffiliateLink>, RepositoryError>;
    /// 在同一分类中查找点击率严格更高的启用链接
    async fn find_replacement(
        &self,
        link: &AffiliateLink,
        category: &str,
    ) -> Result<Option<AffiliateLink>, RepositoryError>;
    /// 保存轮换记录
    async fn record_rotation(&self, rotation: &LinkRotation) -> Result<(), RepositoryError>;
}
