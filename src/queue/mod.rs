// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 在流水线任务表之上提供入队、认领、完成和租约维护
pub mod job_queue;
pub mod scheduler;
