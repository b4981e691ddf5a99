// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::settings::GenerationSettings;
use crate::domain::models::article::{GeneratedContent, OptimizedContent};
use crate::domain::services::adapters::{AdapterError, ContentGenerator, ContentOptimizer};

/// LLM内容服务 - 处理与LLM提供商的交互
///
/// # 功能
///
/// 通过 OpenAI 兼容的 chat completions 接口生成文章初稿并做 SEO 优化
///
/// # 配置
///
/// 通过 `generation` 配置段：
/// - `api_key` - LLM API密钥
/// - `model` - 使用的模型名称
/// - `api_base_url` - LLM API基础URL
pub struct LlmContentService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base_url: String,
}

/// 初稿的输入截断长度，避免超出上下文
const MAX_DRAFT_CHARS: usize = 24_000;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl LlmContentService {
    pub fn new(settings: &GenerationSettings) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 发送对话请求并把返回内容解析为 JSON
    async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: String,
    ) -> Result<T, AdapterError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AdapterError::NotConfigured("LLM API key".to_string()))?;

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status { status, body });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AdapterError::InvalidResponse("empty completion".to_string()))?;

        // Models sometimes wrap JSON in markdown fences
        let clean_content = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        debug!(chars = clean_content.len(), "LLM completion received");

        serde_json::from_str::<T>(clean_content)
            .map_err(|e| AdapterError::InvalidResponse(format!("completion is not valid JSON: {}", e)))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl ContentGenerator for LlmContentService {
    async fn generate(
        &self,
        topic: &str,
        keywords: &[String],
    ) -> Result<GeneratedContent, AdapterError> {
        let prompt = format!(
            "Write a well-researched wellness article about \"{}\". \
            Naturally cover these keywords: {}. \
            Return ONLY a JSON object with string fields \"title\", \"body\" (markdown) and \"excerpt\" (max 160 characters).",
            topic,
            keywords.join(", ")
        );

        let content: GeneratedContent = self
            .chat_json(
                "You are a careful health and wellness writer. You output only valid JSON.",
                prompt,
            )
            .await?;

        if content.title.trim().is_empty() || content.body.trim().is_empty() {
            return Err(AdapterError::InvalidResponse(
                "generated article is missing a title or body".to_string(),
            ));
        }
        Ok(content)
    }
}

#[async_trait]
impl ContentOptimizer for LlmContentService {
    async fn optimize(
        &self,
        article_id: Uuid,
        draft: &GeneratedContent,
        keywords: &[String],
    ) -> Result<OptimizedContent, AdapterError> {
        let schema: Value = json!({
            "title": "string",
            "body": "string (markdown)",
            "seo_meta": {
                "meta_title": "string",
                "meta_description": "string",
                "keywords": ["string"]
            },
            "suggested_placements": [{ "anchor": "string", "product_hint": "string" }]
        });
        let prompt = format!(
            "Optimize the following article (id {}) for search on the keywords: {}. \
            Keep the facts unchanged. Suggest where affiliate product links fit naturally. \
            Return ONLY a JSON object matching this shape: {}.\n\nTitle: {}\n\n{}",
            article_id,
            keywords.join(", "),
            schema,
            draft.title,
            truncate(&draft.body, MAX_DRAFT_CHARS)
        );

        let optimized: OptimizedContent = self
            .chat_json(
                "You are an SEO editor for a wellness publication. You output only valid JSON.",
                prompt,
            )
            .await?;

        if optimized.body.trim().is_empty() {
            return Err(AdapterError::InvalidResponse(
                "optimized article has an empty body".to_string(),
            ));
        }
        Ok(optimized)
    }
}
