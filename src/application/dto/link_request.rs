// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 登记产品请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RegisterProductDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
}

/// 登记联盟链接请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RegisterLinkDto {
    pub product_id: Uuid,
    #[validate(url)]
    pub original_url: String,
    /// 点击率，通常由外部统计回填
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub ctr_14d: Option<f64>,
}
