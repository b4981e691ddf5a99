// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务仓库（job_repository）：流水线任务的摄取、认领和终态记录
/// - 链接仓库（link_repository）：联盟链接、健康观测和轮换记录
/// - 文章仓库（article_repository）：文章查询和分目标发布记录
pub mod article_repository;
pub mod job_repository;
pub mod link_repository;
