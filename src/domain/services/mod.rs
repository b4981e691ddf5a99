// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 协作方契约（adapters）：生成、优化、草稿存储和发布目标
/// - LLM内容服务（llm_service）：生成和优化契约的 OpenAI 兼容实现
pub mod adapters;
pub mod llm_service;
