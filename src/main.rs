// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use axum::Extension;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use contentrs::application::dto::ingest_request::{IngestItemDto, IngestRequestDto};
use contentrs::application::dto::link_request::{RegisterLinkDto, RegisterProductDto};
use contentrs::application::use_cases::ingest_jobs::IngestJobsUseCase;
use contentrs::application::use_cases::register_link::RegisterLinkUseCase;
use contentrs::config::settings::Settings;
use contentrs::domain::services::llm_service::LlmContentService;
use contentrs::engines::circuit_breaker::{CircuitConfig, LinkCircuitBreaker};
use contentrs::engines::reqwest_engine::ReqwestEngine;
use contentrs::infrastructure::database::connection;
use contentrs::infrastructure::metrics;
use contentrs::infrastructure::publishers;
use contentrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use contentrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use contentrs::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use contentrs::presentation::routes::{self, AppJobQueue};
use contentrs::queue::job_queue::DatabaseJobQueue;
use contentrs::queue::scheduler::JobScheduler;
use contentrs::utils::retry_policy::RetryStrategy;
use contentrs::utils::{shutdown, telemetry};
use contentrs::workers::link_prober::{LinkProber, ProbeConfig};
use contentrs::workers::link_rotator::LinkRotator;
use contentrs::workers::pipeline_worker::{PipelineAdapters, PipelineWorker};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// 租约清理的周期
const LEASE_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// contentrs - 内容流水线与联盟链接健康监控
#[derive(Parser, Debug)]
#[command(name = "contentrs", version, about, long_about = None)]
struct Cli {
    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动 HTTP 服务，暴露 cron 入口和健康报告
    Serve,
    /// 处理下一个到期的流水线任务
    ProcessNext,
    /// 探测所有启用的联盟链接
    ProbeLinks,
    /// 探测单个链接（已停用的链接也可以）
    ProbeLink {
        #[arg(long)]
        id: Uuid,
    },
    /// 停用低点击率链接并给出替换建议
    RotateLinks,
    /// 输出链接健康报告
    HealthReport,
    /// 入队单个主题
    Enqueue {
        #[arg(long)]
        topic: String,
        /// 目标关键词，可重复
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// RFC 3339 时间，默认立即
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// 从 JSON 文件批量摄取主题
    IngestFile { path: PathBuf },
    /// 登记产品
    RegisterProduct {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
    },
    /// 登记联盟链接
    RegisterLink {
        #[arg(long)]
        product_id: Uuid,
        #[arg(long)]
        url: String,
        #[arg(long)]
        ctr: Option<f64>,
    },
}

/// 各入口共享的基础组件
struct Components {
    settings: Settings,
    db: Arc<DatabaseConnection>,
    jobs: Arc<JobRepositoryImpl>,
    links: Arc<LinkRepositoryImpl>,
    queue: Arc<AppJobQueue>,
}

impl Components {
    async fn init(settings: Settings) -> anyhow::Result<Self> {
        let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);

        let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
        let links = Arc::new(LinkRepositoryImpl::new(db.clone()));
        let retry = RetryStrategy::from_settings(&settings.pipeline.retry)?;
        let lease = chrono::Duration::seconds(i64::try_from(settings.pipeline.lease_secs)?);
        let queue = Arc::new(DatabaseJobQueue::new(jobs.clone(), lease, retry));

        Ok(Self {
            settings,
            db,
            jobs,
            links,
            queue,
        })
    }

    fn pipeline_worker(
        &self,
    ) -> anyhow::Result<PipelineWorker<AppJobQueue, ArticleRepositoryImpl>> {
        let articles = Arc::new(ArticleRepositoryImpl::new(self.db.clone()));
        let llm = Arc::new(LlmContentService::new(&self.settings.generation)?);
        let targets = publishers::configured_targets(&self.settings)?;
        info!(
            targets = ?targets.iter().map(|t| t.name().to_string()).collect::<Vec<_>>(),
            "Publish targets configured"
        );

        let adapters = PipelineAdapters {
            generator: llm.clone(),
            optimizer: llm,
            drafts: articles.clone(),
            targets,
        };
        Ok(PipelineWorker::new(
            self.queue.clone(),
            articles,
            adapters,
            Duration::from_secs(self.settings.pipeline.stage_timeout_secs),
        ))
    }

    fn link_prober(&self) -> anyhow::Result<LinkProber<LinkRepositoryImpl>> {
        let health = &self.settings.link_health;
        let checker = Arc::new(ReqwestEngine::new(&health.user_agent)?);
        let breaker = LinkCircuitBreaker::with_config(CircuitConfig {
            failure_threshold: health.failure_threshold,
        });
        let config = ProbeConfig {
            request_timeout: Duration::from_secs(health.request_timeout_secs),
            slow_threshold_ms: health.slow_threshold_ms,
            concurrency: health.concurrency,
            report_window: chrono::Duration::days(health.report_window_days),
        };
        Ok(LinkProber::new(self.links.clone(), checker, breaker, config))
    }

    fn link_rotator(&self) -> LinkRotator<LinkRepositoryImpl> {
        LinkRotator::new(self.links.clone(), self.settings.rotation.batch_size)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 批量文件可以是 `{"items": [...]}`，也可以直接是条目数组
fn read_ingest_file(path: &PathBuf) -> anyhow::Result<IngestRequestDto> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let request = if value.is_array() {
        IngestRequestDto {
            items: serde_json::from_value(value)?,
        }
    } else {
        serde_json::from_value(value)?
    };
    Ok(request)
}

/// 主函数
///
/// 应用程序入口点，负责初始化组件并分发子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.json_logs);
    let settings = Settings::new()?;
    info!("Configuration loaded");

    let components = Components::init(settings).await?;
    let cancel = shutdown::install_signal_handler();

    match cli.command {
        Commands::Serve => serve(components, cancel).await?,
        Commands::ProcessNext => {
            let worker = components.pipeline_worker()?;
            print_json(&worker.process_next(&cancel).await?)?;
        }
        Commands::ProbeLinks => {
            let prober = components.link_prober()?;
            print_json(&prober.probe_all(&cancel).await?)?;
        }
        Commands::ProbeLink { id } => {
            let prober = components.link_prober()?;
            print_json(&prober.probe_link(id, &cancel).await?)?;
        }
        Commands::RotateLinks => {
            let rotator = components.link_rotator();
            print_json(&rotator.rotate_underperforming(&cancel).await?)?;
        }
        Commands::HealthReport => {
            let prober = components.link_prober()?;
            print_json(&prober.health_report().await?)?;
        }
        Commands::Enqueue {
            topic,
            keywords,
            at,
        } => {
            let use_case = IngestJobsUseCase::new(components.queue.clone());
            let request = IngestRequestDto {
                items: vec![IngestItemDto {
                    topic,
                    target_keywords: keywords,
                    scheduled_at: at,
                }],
            };
            print_json(&use_case.execute(request).await?)?;
        }
        Commands::IngestFile { path } => {
            let use_case = IngestJobsUseCase::new(components.queue.clone());
            let request = read_ingest_file(&path)?;
            print_json(&use_case.execute(request).await?)?;
        }
        Commands::RegisterProduct { name, category } => {
            let use_case = RegisterLinkUseCase::new(components.links.clone());
            let product = use_case
                .register_product(RegisterProductDto { name, category })
                .await?;
            print_json(&product)?;
        }
        Commands::RegisterLink {
            product_id,
            url,
            ctr,
        } => {
            let use_case = RegisterLinkUseCase::new(components.links.clone());
            let link = use_case
                .register_link(RegisterLinkDto {
                    product_id,
                    original_url: url,
                    ctr_14d: ctr,
                })
                .await?;
            print_json(&link)?;
        }
    }

    Ok(())
}

/// 启动 HTTP 服务
///
/// 服务本身不调度流水线或探测，只有后台的租约清理循环
async fn serve(
    components: Components,
    cancel: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let server = &components.settings.server;
    if let Some(metrics_port) = server.metrics_port {
        metrics::init_metrics(&server.host, metrics_port);
    }

    let pipeline = Arc::new(components.pipeline_worker()?);
    let prober = Arc::new(components.link_prober()?);
    let rotator = Arc::new(components.link_rotator());

    let scheduler = JobScheduler::new(components.queue.clone());
    let sweeper = scheduler.start(LEASE_SWEEP_PERIOD, cancel.clone());

    let app = routes::routes().layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(Extension(pipeline))
            .layer(Extension(prober))
            .layer(Extension(rotator))
            .layer(Extension(components.jobs.clone()))
            .layer(Extension(cancel.clone())),
    );

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let shutdown_token = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;

    cancel.cancel();
    sweeper.await?;
    info!("contentrs serve shutdown complete");
    Ok(())
}
