// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、服务器、内容流水线、链接健康和各发布目标的配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 内容流水线配置
    pub pipeline: PipelineSettings,
    /// 链接健康探测配置
    pub link_health: LinkHealthSettings,
    /// 链接轮换配置
    pub rotation: RotationSettings,
    /// 内容生成（LLM）配置
    pub generation: GenerationSettings,
    /// WordPress 发布配置
    pub wordpress: WordPressSettings,
    /// Medium 发布配置
    pub medium: MediumSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// Prometheus 指标导出端口，不配置则不导出
    pub metrics_port: Option<u16>,
}

/// 流水线配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 单个阶段的超时时间（秒）
    pub stage_timeout_secs: u64,
    /// 认领租约时长（秒）
    pub lease_secs: u64,
    /// 重试策略
    pub retry: RetrySettings,
}

/// 重试策略配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 策略名称：none、fixed、exponential
    pub strategy: String,
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 基础延迟（秒）
    pub delay_secs: u64,
    /// 最大延迟（秒）
    pub max_delay_secs: u64,
}

/// 链接健康配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LinkHealthSettings {
    /// 单次探测的超时时间（秒）
    pub request_timeout_secs: u64,
    /// 慢响应阈值（毫秒）
    pub slow_threshold_ms: u64,
    /// 熔断阈值（连续失败次数）
    pub failure_threshold: u32,
    /// 并发探测数
    pub concurrency: usize,
    /// 健康报告的统计窗口（天）
    pub report_window_days: i64,
    /// 探测使用的 User-Agent
    pub user_agent: String,
}

/// 链接轮换配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RotationSettings {
    /// 每次轮换处理的链接数
    pub batch_size: u64,
}

/// 内容生成配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// OpenAI 兼容接口的基础URL
    pub api_base_url: String,
    /// API密钥
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

/// WordPress 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WordPressSettings {
    /// 是否启用
    pub enabled: bool,
    /// 站点地址
    pub base_url: Option<String>,
    /// 用户名
    pub username: Option<String>,
    /// 应用密码
    pub app_password: Option<String>,
    /// 发布状态（publish、draft）
    pub status: String,
}

/// Medium 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MediumSettings {
    /// 是否启用
    pub enabled: bool,
    /// 集成令牌
    pub token: Option<String>,
    /// 作者ID
    pub author_id: Option<String>,
    /// 发布状态（public、draft、unlisted）
    pub publish_status: String,
    /// API 基础URL
    pub api_base_url: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次读取默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `CONTENTRS__` 前缀的环境变量，后者覆盖前者
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CONTENTRS").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.url", "sqlite://contentrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Pipeline
            .set_default("pipeline.stage_timeout_secs", 120)?
            .set_default("pipeline.lease_secs", 900)?
            .set_default("pipeline.retry.strategy", "none")?
            .set_default("pipeline.retry.max_attempts", 1)?
            .set_default("pipeline.retry.delay_secs", 300)?
            .set_default("pipeline.retry.max_delay_secs", 3600)?
            // Link health
            .set_default("link_health.request_timeout_secs", 10)?
            .set_default("link_health.slow_threshold_ms", 3000)?
            .set_default("link_health.failure_threshold", 3)?
            .set_default("link_health.concurrency", 8)?
            .set_default("link_health.report_window_days", 7)?
            .set_default("link_health.user_agent", "contentrs-link-checker/0.1")?
            .set_default("rotation.batch_size", 10)?
            // Generation
            .set_default("generation.api_base_url", "https://api.openai.com/v1")?
            .set_default("generation.model", "gpt-4o-mini")?
            .set_default("generation.timeout_secs", 90)?
            // Publish targets
            .set_default("wordpress.enabled", false)?
            .set_default("wordpress.status", "publish")?
            .set_default("medium.enabled", false)?
            .set_default("medium.publish_status", "public")?
            .set_default("medium.api_base_url", "https://api.medium.com/v1")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
