// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 定义数据库表对应的实体结构
/// 使用SeaORM框架进行对象关系映射
pub mod affiliate_link;
pub mod article;
pub mod link_health_check;
pub mod link_probe_run;
pub mod link_rotation;
pub mod pipeline_job;
pub mod product;
pub mod publish_attempt;
