// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库特质基于SeaORM的具体实现
pub mod article_repo_impl;
pub mod job_repo_impl;
pub mod link_repo_impl;
