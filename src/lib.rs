// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 摄取和登记用例及其请求DTO
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、仓库接口和外部协作方契约
pub mod domain;

/// 引擎模块
///
/// 链接可达性检查引擎和熔断判定
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、发布目标客户端和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 任务表之上的队列语义和租约清理
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 流水线、链接探测和链接轮换三个入口
pub mod workers;
