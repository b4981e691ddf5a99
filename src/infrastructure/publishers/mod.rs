// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 发布目标模块
///
/// 每个外部平台一个 `PublishTarget` 实现
pub mod medium;
pub mod wordpress;

use crate::config::settings::Settings;
use crate::domain::services::adapters::{AdapterError, PublishTarget};
use std::sync::Arc;

/// 按配置构建启用的发布目标
pub fn configured_targets(settings: &Settings) -> Result<Vec<Arc<dyn PublishTarget>>, AdapterError> {
    let mut targets: Vec<Arc<dyn PublishTarget>> = Vec::new();
    if settings.wordpress.enabled {
        targets.push(Arc::new(wordpress::WordPressPublisher::new(&settings.wordpress)?));
    }
    if settings.medium.enabled {
        targets.push(Arc::new(medium::MediumPublisher::new(&settings.medium)?));
    }
    Ok(targets)
}
