// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 流水线任务（job）：把一个主题推进到已发布文章的工作单元
/// - 联盟链接（link）：被监控的变现链接及其健康观测
/// - 文章（article）：生成、优化和发布过程中流转的内容
pub mod article;
pub mod job;
pub mod link;
