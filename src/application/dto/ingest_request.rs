// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 单个待摄取的主题
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct IngestItemDto {
    /// 去除首尾空白后的长度须在 3..=200 字符之间
    #[validate(custom(function = "validate_topic"))]
    pub topic: String,
    #[serde(default, alias = "keywords")]
    #[validate(length(max = 20), custom(function = "validate_keywords"))]
    pub target_keywords: Vec<String>,
    /// 不填则立即可处理
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// 批量摄取请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct IngestRequestDto {
    #[validate(length(min = 1, max = 500))]
    #[validate(nested)]
    pub items: Vec<IngestItemDto>,
}

/// 主题长度上下限（按去除首尾空白后的字符数计）
const TOPIC_MIN_CHARS: usize = 3;
const TOPIC_MAX_CHARS: usize = 200;

fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    let chars = topic.trim().chars().count();
    if chars < TOPIC_MIN_CHARS {
        return Err(ValidationError::new("topic_too_short"));
    }
    if chars > TOPIC_MAX_CHARS {
        return Err(ValidationError::new("topic_too_long"));
    }
    Ok(())
}

fn validate_keywords(keywords: &[String]) -> Result<(), ValidationError> {
    if keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ValidationError::new("blank_keyword"));
    }
    Ok(())
}
