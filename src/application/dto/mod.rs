// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象模块
///
/// 定义摄取和链接登记的请求结构，使用 validator 校验
pub mod ingest_request;
pub mod link_request;
