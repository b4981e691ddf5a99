// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::article::{
    AffiliatePlacement, Article, ArticleUpdate, GeneratedContent, PostRef, PublishAttempt, SeoMeta,
};
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::adapters::{AdapterError, DraftStore};
use crate::infrastructure::database::entities::{article, publish_attempt};
use crate::infrastructure::repositories::job_repo_impl::is_unique_violation;
use crate::utils::slug::slugify;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// 文章仓库实现
///
/// 同时作为流水线使用的草稿存储
#[derive(Clone)]
pub struct ArticleRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ArticleRepositoryImpl {
    /// 创建新的文章仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// 带文章ID后缀的备用 slug，标题 slug 已被占用时使用
fn suffixed_slug(slug: &str, id: Uuid) -> String {
    let suffix = id.simple().to_string();
    format!("{}-{}", slug, &suffix[..8])
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Corrupt(e.to_string()))
}

fn from_json<T: DeserializeOwned + Default>(
    value: Option<serde_json::Value>,
    field: &str,
) -> Result<T, RepositoryError> {
    match value {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| RepositoryError::Corrupt(format!("articles.{}: {}", field, e))),
        None => Ok(T::default()),
    }
}

impl TryFrom<article::Model> for Article {
    type Error = RepositoryError;

    fn try_from(model: article::Model) -> Result<Self, Self::Error> {
        let seo_meta: Option<SeoMeta> = from_json(model.seo_meta, "seo_meta")?;
        let affiliate_placements: Vec<AffiliatePlacement> =
            from_json(model.affiliate_placements, "affiliate_placements")?;
        let external_posts: BTreeMap<String, PostRef> =
            from_json(model.external_posts, "external_posts")?;

        Ok(Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            body: model.body,
            excerpt: model.excerpt,
            seo_meta,
            affiliate_placements,
            external_posts,
            is_published: model.is_published,
            published_at: model.published_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<publish_attempt::Model> for PublishAttempt {
    fn from(model: publish_attempt::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            article_id: model.article_id,
            target: model.target,
            succeeded: model.succeeded,
            external_post_id: model.external_post_id,
            url: model.url,
            error: model.error,
            attempted_at: model.attempted_at,
        }
    }
}

#[async_trait]
impl DraftStore for ArticleRepositoryImpl {
    async fn create_draft(&self, content: &GeneratedContent) -> Result<Uuid, AdapterError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let slug = slugify(&content.title);

        let mut model = article::ActiveModel {
            id: Set(id),
            title: Set(content.title.clone()),
            slug: Set(slug.clone()),
            body: Set(content.body.clone()),
            excerpt: Set(content.excerpt.clone()),
            seo_meta: Set(None),
            affiliate_placements: Set(None),
            external_posts: Set(None),
            is_published: Set(false),
            published_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // the unique index decides slug ownership; the loser takes a suffixed slug
        match model.clone().insert(self.db.as_ref()).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                model.slug = Set(suffixed_slug(&slug, id));
                model
                    .insert(self.db.as_ref())
                    .await
                    .map_err(RepositoryError::from)?;
            }
            Err(e) => return Err(RepositoryError::from(e).into()),
        }
        Ok(id)
    }

    async fn update_article(&self, update: &ArticleUpdate) -> Result<(), AdapterError> {
        let existing = article::Entity::find_by_id(update.id)
            .one(self.db.as_ref())
            .await
            .map_err(RepositoryError::from)?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        let mut model: article::ActiveModel = existing.into();

        if let Some(title) = &update.title {
            model.title = Set(title.clone());
        }
        // A new title re-derives the slug unless one is given explicitly
        let derived_slug = match (&update.slug, &update.title) {
            (Some(slug), _) => {
                model.slug = Set(slug.clone());
                None
            }
            (None, Some(title)) => {
                let slug = slugify(title);
                model.slug = Set(slug.clone());
                Some(slug)
            }
            (None, None) => None,
        };
        if let Some(body) = &update.body {
            model.body = Set(body.clone());
        }
        if let Some(seo_meta) = &update.seo_meta {
            model.seo_meta = Set(Some(to_json(seo_meta)?));
        }
        if let Some(placements) = &update.affiliate_placements {
            model.affiliate_placements = Set(Some(to_json(placements)?));
        }
        if let Some(posts) = &update.external_posts {
            model.external_posts = Set(Some(to_json(posts)?));
        }
        if let Some(published) = update.published {
            model.is_published = Set(published);
            model.published_at = Set(published.then_some(now));
        }
        model.updated_at = Set(now);

        match (model.clone().update(self.db.as_ref()).await, derived_slug) {
            (Ok(_), _) => {}
            (Err(e), Some(slug)) if is_unique_violation(&e) => {
                model.slug = Set(suffixed_slug(&slug, update.id));
                model
                    .update(self.db.as_ref())
                    .await
                    .map_err(RepositoryError::from)?;
            }
            (Err(e), _) => return Err(RepositoryError::from(e).into()),
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleRepository for ArticleRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError> {
        let model = article::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        model.map(Article::try_from).transpose()
    }

    async fn record_publish_attempts(
        &self,
        attempts: &[PublishAttempt],
    ) -> Result<(), RepositoryError> {
        if attempts.is_empty() {
            return Ok(());
        }
        let models = attempts.iter().map(|a| publish_attempt::ActiveModel {
            id: Set(a.id),
            job_id: Set(a.job_id),
            article_id: Set(a.article_id),
            target: Set(a.target.clone()),
            succeeded: Set(a.succeeded),
            external_post_id: Set(a.external_post_id.clone()),
            url: Set(a.url.clone()),
            error: Set(a.error.clone()),
            attempted_at: Set(a.attempted_at),
        });
        publish_attempt::Entity::insert_many(models)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn publish_attempts_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<PublishAttempt>, RepositoryError> {
        let models = publish_attempt::Entity::find()
            .filter(publish_attempt::Column::JobId.eq(job_id))
            .order_by_asc(publish_attempt::Column::Target)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
