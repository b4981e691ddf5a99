// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 生成服务返回的初稿内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
    pub excerpt: String,
}

/// SEO 元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoMeta {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// 建议的联盟链接投放位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliatePlacement {
    /// 锚文本或所在段落的描述
    pub anchor: String,
    /// 建议投放的产品或分类
    #[serde(default)]
    pub product_hint: Option<String>,
}

/// SEO 优化后的内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedContent {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub seo_meta: SeoMeta,
    #[serde(default)]
    pub suggested_placements: Vec<AffiliatePlacement>,
}

/// 对草稿的更新
///
/// 字段为 `None` 表示不修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleUpdate {
    pub id: Uuid,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub seo_meta: Option<SeoMeta>,
    pub affiliate_placements: Option<Vec<AffiliatePlacement>>,
    pub external_posts: Option<BTreeMap<String, PostRef>>,
    pub published: Option<bool>,
}

/// 草稿存储中的文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: String,
    pub seo_meta: Option<SeoMeta>,
    pub affiliate_placements: Vec<AffiliatePlacement>,
    /// 外部平台的帖子引用，按目标名称索引
    pub external_posts: BTreeMap<String, PostRef>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 发布到外部平台需要的内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishableArticle {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: String,
    pub tags: Vec<String>,
}

/// 外部平台返回的帖子引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub external_post_id: String,
    pub url: String,
}

/// 单个发布目标的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetOutcome {
    /// 目标名称
    pub target: String,
    /// 成功时的帖子引用，失败时的错误描述
    pub result: Result<PostRef, String>,
}

impl TargetOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// 发布记录（每个目标一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishAttempt {
    pub id: Uuid,
    pub job_id: Uuid,
    pub article_id: Uuid,
    pub target: String,
    pub succeeded: bool,
    pub external_post_id: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl PublishAttempt {
    /// 从目标结果构建发布记录
    pub fn from_outcome(job_id: Uuid, article_id: Uuid, outcome: &TargetOutcome) -> Self {
        let (external_post_id, url, error) = match &outcome.result {
            Ok(post) => (Some(post.external_post_id.clone()), Some(post.url.clone()), None),
            Err(e) => (None, None, Some(e.clone())),
        };
        Self {
            id: Uuid::new_v4(),
            job_id,
            article_id,
            target: outcome.target.clone(),
            succeeded: outcome.succeeded(),
            external_post_id,
            url,
            error,
            attempted_at: Utc::now(),
        }
    }
}
