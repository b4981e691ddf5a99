// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 探测引擎模块
///
/// 提供链接可达性检查引擎和基于连续失败次数的链接熔断器
pub mod circuit_breaker;
pub mod reqwest_engine;
pub mod traits;
