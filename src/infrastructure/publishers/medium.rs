// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MediumSettings;
use crate::domain::models::article::{PostRef, PublishableArticle};
use crate::domain::services::adapters::{AdapterError, PublishTarget};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Medium 最多接受的标签数
const MAX_TAGS: usize = 5;

/// Medium API 发布目标
pub struct MediumPublisher {
    /// HTTP 客户端
    client: reqwest::Client,
    /// API 基础URL
    api_base_url: String,
    /// 集成令牌
    token: String,
    /// 作者ID
    author_id: String,
    /// 发布状态
    publish_status: String,
}

#[derive(Debug, Deserialize)]
struct MediumEnvelope {
    data: MediumPost,
}

#[derive(Debug, Deserialize)]
struct MediumPost {
    id: String,
    url: String,
}

impl MediumPublisher {
    /// 创建新的 Medium 发布目标
    pub fn new(settings: &MediumSettings) -> Result<Self, AdapterError> {
        let token = settings
            .token
            .clone()
            .ok_or_else(|| AdapterError::NotConfigured("medium.token".to_string()))?;
        let author_id = settings
            .author_id
            .clone()
            .ok_or_else(|| AdapterError::NotConfigured("medium.author_id".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            token,
            author_id,
            publish_status: settings.publish_status.clone(),
        })
    }
}

#[async_trait]
impl PublishTarget for MediumPublisher {
    fn name(&self) -> &str {
        "medium"
    }

    async fn publish(
        &self,
        _article_id: Uuid,
        content: &PublishableArticle,
    ) -> Result<PostRef, AdapterError> {
        let tags: Vec<&String> = content.tags.iter().take(MAX_TAGS).collect();
        let response = self
            .client
            .post(format!(
                "{}/users/{}/posts",
                self.api_base_url, self.author_id
            ))
            .bearer_auth(&self.token)
            .json(&json!({
                "title": content.title,
                "contentFormat": "markdown",
                "content": format!("# {}\n\n{}", content.title, content.body),
                "tags": tags,
                "publishStatus": self.publish_status
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status { status, body });
        }

        let envelope: MediumEnvelope = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;
        Ok(PostRef {
            external_post_id: envelope.data.id,
            url: envelope.data.url,
        })
    }
}
