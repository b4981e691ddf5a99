// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::link::{
    AffiliateLink, LinkHealthObservation, LinkRotation, LinkStatus, ProbeRun, ProbeSummary,
    Product,
};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::link_repository::LinkRepository;
use crate::infrastructure::database::entities::{
    affiliate_link, link_health_check, link_probe_run, link_rotation, product,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, NullOrdering}, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::JoinType;
use std::sync::Arc;
use uuid::Uuid;

/// 联盟链接仓库实现
///
/// 基于SeaORM实现链接、观测、探测运行和轮换记录的数据访问
#[derive(Clone)]
pub struct LinkRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl LinkRepositoryImpl {
    /// 创建新的链接仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<affiliate_link::Model> for AffiliateLink {
    fn from(model: affiliate_link::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            original_url: model.original_url,
            short_code: model.short_code,
            status: LinkStatus::from_active_flag(model.is_active),
            ctr_14d: model.ctr_14d,
            last_checked_at: model.last_checked_at,
            deactivated_at: model.deactivated_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl TryFrom<link_health_check::Model> for LinkHealthObservation {
    type Error = RepositoryError;

    fn try_from(model: link_health_check::Model) -> Result<Self, Self::Error> {
        let corrupt = |field: &str| RepositoryError::Corrupt(format!("link_health_checks.{}", field));
        Ok(Self {
            id: model.id,
            link_id: model.link_id,
            checked_at: model.checked_at,
            status_code: u16::try_from(model.status_code).map_err(|_| corrupt("status_code"))?,
            is_working: model.is_working,
            response_time_ms: u64::try_from(model.response_time_ms)
                .map_err(|_| corrupt("response_time_ms"))?,
            consecutive_failures: u32::try_from(model.consecutive_failures)
                .map_err(|_| corrupt("consecutive_failures"))?,
            error_message: model.error_message,
        })
    }
}

impl From<link_probe_run::Model> for ProbeRun {
    fn from(model: link_probe_run::Model) -> Self {
        let count = |value: i32| u32::try_from(value).unwrap_or_default();
        Self {
            id: model.id,
            started_at: model.started_at,
            finished_at: model.finished_at,
            summary: ProbeSummary {
                total: count(model.total),
                working: count(model.working),
                broken: count(model.broken),
                slow: count(model.slow),
                recently_fixed: count(model.recently_fixed),
                deactivated: count(model.deactivated),
            },
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl LinkRepository for LinkRepositoryImpl {
    async fn create_product(&self, item: &Product) -> Result<Product, RepositoryError> {
        let model = product::ActiveModel {
            id: Set(item.id),
            name: Set(item.name.clone()),
            category: Set(item.category.clone()),
            created_at: Set(Utc::now()),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(item.clone())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let model = product::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(|m| Product {
            id: m.id,
            name: m.name,
            category: m.category,
        }))
    }

    async fn create_link(&self, link: &AffiliateLink) -> Result<AffiliateLink, RepositoryError> {
        let model = affiliate_link::ActiveModel {
            id: Set(link.id),
            product_id: Set(link.product_id),
            original_url: Set(link.original_url.clone()),
            short_code: Set(link.short_code.clone()),
            is_active: Set(link.is_active()),
            ctr_14d: Set(link.ctr_14d),
            last_checked_at: Set(link.last_checked_at),
            deactivated_at: Set(link.deactivated_at),
            created_at: Set(link.created_at),
            updated_at: Set(link.updated_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(link.clone())
    }

    async fn exists_by_short_code(&self, short_code: &str) -> Result<bool, RepositoryError> {
        let count = affiliate_link::Entity::find()
            .filter(affiliate_link::Column::ShortCode.eq(short_code))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AffiliateLink>, RepositoryError> {
        let model = affiliate_link::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_active(&self) -> Result<Vec<AffiliateLink>, RepositoryError> {
        let models = affiliate_link::Entity::find()
            .filter(affiliate_link::Column::IsActive.eq(true))
            .order_by_asc(affiliate_link::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_all(&self) -> Result<Vec<AffiliateLink>, RepositoryError> {
        let models = affiliate_link::Entity::find()
            .order_by_asc(affiliate_link::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn deactivate(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = affiliate_link::Entity::update_many()
            .col_expr(affiliate_link::Column::IsActive, Expr::value(false))
            .col_expr(affiliate_link::Column::DeactivatedAt, Expr::value(Some(at)))
            .col_expr(affiliate_link::Column::UpdatedAt, Expr::value(at))
            .filter(affiliate_link::Column::Id.eq(id))
            .filter(affiliate_link::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn touch_last_checked(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        affiliate_link::Entity::update_many()
            .col_expr(affiliate_link::Column::LastCheckedAt, Expr::value(Some(at)))
            .filter(affiliate_link::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn latest_observation(
        &self,
        link_id: Uuid,
    ) -> Result<Option<LinkHealthObservation>, RepositoryError> {
        let model = link_health_check::Entity::find()
            .filter(link_health_check::Column::LinkId.eq(link_id))
            .order_by_desc(link_health_check::Column::CheckedAt)
            .one(self.db.as_ref())
            .await?;
        model.map(LinkHealthObservation::try_from).transpose()
    }

    async fn append_observation(
        &self,
        observation: &LinkHealthObservation,
    ) -> Result<(), RepositoryError> {
        let model = link_health_check::ActiveModel {
            id: Set(observation.id),
            link_id: Set(observation.link_id),
            checked_at: Set(observation.checked_at),
            status_code: Set(i32::from(observation.status_code)),
            is_working: Set(observation.is_working),
            response_time_ms: Set(i64::try_from(observation.response_time_ms).unwrap_or(i64::MAX)),
            consecutive_failures: Set(to_i32(observation.consecutive_failures)),
            error_message: Set(observation.error_message.clone()),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn observations_for_link(
        &self,
        link_id: Uuid,
    ) -> Result<Vec<LinkHealthObservation>, RepositoryError> {
        let models = link_health_check::Entity::find()
            .filter(link_health_check::Column::LinkId.eq(link_id))
            .order_by_asc(link_health_check::Column::CheckedAt)
            .all(self.db.as_ref())
            .await?;
        models
            .into_iter()
            .map(LinkHealthObservation::try_from)
            .collect()
    }

    async fn observations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<LinkHealthObservation>, RepositoryError> {
        let models = link_health_check::Entity::find()
            .filter(link_health_check::Column::CheckedAt.gte(since))
            .order_by_asc(link_health_check::Column::CheckedAt)
            .all(self.db.as_ref())
            .await?;
        models
            .into_iter()
            .map(LinkHealthObservation::try_from)
            .collect()
    }

    async fn record_probe_run(&self, run: &ProbeRun) -> Result<(), RepositoryError> {
        let model = link_probe_run::ActiveModel {
            id: Set(run.id),
            started_at: Set(run.started_at),
            finished_at: Set(run.finished_at),
            total: Set(to_i32(run.summary.total)),
            working: Set(to_i32(run.summary.working)),
            broken: Set(to_i32(run.summary.broken)),
            slow: Set(to_i32(run.summary.slow)),
            recently_fixed: Set(to_i32(run.summary.recently_fixed)),
            deactivated: Set(to_i32(run.summary.deactivated)),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn latest_probe_run(&self) -> Result<Option<ProbeRun>, RepositoryError> {
        let model = link_probe_run::Entity::find()
            .order_by_desc(link_probe_run::Column::FinishedAt)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn rotation_candidates(
        &self,
        limit: u64,
    ) -> Result<Vec<AffiliateLink>, RepositoryError> {
        let models = affiliate_link::Entity::find()
            .filter(affiliate_link::Column::IsActive.eq(true))
            .order_by_asc(affiliate_link::Column::Ctr14d)
            // never-checked links are the stalest on every backend
            .order_by_with_nulls(
                affiliate_link::Column::LastCheckedAt,
                Order::Asc,
                NullOrdering::First,
            )
            .order_by_asc(affiliate_link::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_replacement(
        &self,
        link: &AffiliateLink,
        category: &str,
    ) -> Result<Option<AffiliateLink>, RepositoryError> {
        let model = affiliate_link::Entity::find()
            .join(JoinType::InnerJoin, affiliate_link::Relation::Product.def())
            .filter(product::Column::Category.eq(category))
            .filter(affiliate_link::Column::IsActive.eq(true))
            .filter(affiliate_link::Column::Id.ne(link.id))
            .filter(affiliate_link::Column::Ctr14d.gt(link.ctr_14d))
            .order_by_desc(affiliate_link::Column::Ctr14d)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn record_rotation(&self, rotation: &LinkRotation) -> Result<(), RepositoryError> {
        let model = link_rotation::ActiveModel {
            id: Set(rotation.id),
            old_link_id: Set(rotation.old_link_id),
            suggested_link_id: Set(rotation.suggested_link_id),
            old_ctr: Set(rotation.old_ctr),
            suggested_ctr: Set(rotation.suggested_ctr),
            category: Set(rotation.category.clone()),
            rotated_at: Set(rotation.rotated_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }
}
