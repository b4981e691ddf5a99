// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WordPressSettings;
use crate::domain::models::article::{PostRef, PublishableArticle};
use crate::domain::services::adapters::{AdapterError, PublishTarget};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// WordPress REST API 发布目标
pub struct WordPressPublisher {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 文章接口地址
    posts_endpoint: Url,
    /// 用户名
    username: String,
    /// 应用密码
    app_password: String,
    /// 发布状态
    status: String,
}

#[derive(Debug, Deserialize)]
struct WordPressPost {
    id: u64,
    link: String,
}

fn posts_endpoint(base_url: &str) -> Result<Url, AdapterError> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join("wp-json/wp/v2/posts"))
        .map_err(|e| AdapterError::NotConfigured(format!("wordpress.base_url: {}", e)))
}

fn required(value: &Option<String>, name: &str) -> Result<String, AdapterError> {
    value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AdapterError::NotConfigured(format!("wordpress.{}", name)))
}

impl WordPressPublisher {
    /// 创建新的 WordPress 发布目标
    pub fn new(settings: &WordPressSettings) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            posts_endpoint: posts_endpoint(&required(&settings.base_url, "base_url")?)?,
            username: required(&settings.username, "username")?,
            app_password: required(&settings.app_password, "app_password")?,
            status: settings.status.clone(),
        })
    }
}

#[async_trait]
impl PublishTarget for WordPressPublisher {
    fn name(&self) -> &str {
        "wordpress"
    }

    async fn publish(
        &self,
        article_id: Uuid,
        content: &PublishableArticle,
    ) -> Result<PostRef, AdapterError> {
        let response = self
            .client
            .post(self.posts_endpoint.clone())
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&json!({
                "title": content.title,
                "content": content.body,
                "excerpt": content.excerpt,
                "slug": content.slug,
                "status": self.status,
                "meta": { "contentrs_article_id": article_id.to_string() }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status { status, body });
        }

        let post: WordPressPost = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;
        Ok(PostRef {
            external_post_id: post.id.to_string(),
            url: post.link,
        })
    }
}
