// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use contentrs::config::settings::DatabaseSettings;
use contentrs::domain::models::article::{
    AffiliatePlacement, GeneratedContent, OptimizedContent, PostRef, PublishableArticle, SeoMeta,
};
use contentrs::domain::models::link::{AffiliateLink, Product};
use contentrs::domain::repositories::link_repository::LinkRepository;
use contentrs::domain::services::adapters::{
    AdapterError, ContentGenerator, ContentOptimizer, PublishTarget,
};
use contentrs::engines::circuit_breaker::LinkCircuitBreaker;
use contentrs::engines::traits::{EngineError, ReachabilityChecker, ReachabilityResponse};
use contentrs::infrastructure::database::connection;
use contentrs::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use contentrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use contentrs::infrastructure::repositories::link_repo_impl::LinkRepositoryImpl;
use contentrs::queue::job_queue::DatabaseJobQueue;
use contentrs::utils::retry_policy::RetryStrategy;
use contentrs::workers::link_prober::{LinkProber, ProbeConfig};
use contentrs::workers::pipeline_worker::{PipelineAdapters, PipelineWorker};
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub type TestQueue = DatabaseJobQueue<JobRepositoryImpl>;
pub type TestWorker = PipelineWorker<TestQueue, ArticleRepositoryImpl>;

/// 阶段超时，足够短以便超时用例快速结束
pub const STAGE_TIMEOUT: Duration = Duration::from_millis(300);

pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: None,
        idle_timeout: None,
    };
    Arc::new(connection::connect_and_migrate(&settings).await.unwrap())
}

/// 生成服务桩：按预设返回成功或失败，并记录调用次数
pub struct StubGenerator {
    failure: Option<String>,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(
        &self,
        topic: &str,
        _keywords: &[String],
    ) -> Result<GeneratedContent, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(AdapterError::Status {
                status: 500,
                body: message.clone(),
            });
        }
        Ok(GeneratedContent {
            title: format!("Draft: {}", topic),
            body: format!("A first draft about {}.", topic),
            excerpt: format!("About {}", topic),
        })
    }
}

/// 优化服务桩：把标题改写为最终标题并返回关键词
pub struct StubOptimizer;

#[async_trait]
impl ContentOptimizer for StubOptimizer {
    async fn optimize(
        &self,
        _article_id: Uuid,
        draft: &GeneratedContent,
        keywords: &[String],
    ) -> Result<OptimizedContent, AdapterError> {
        Ok(OptimizedContent {
            title: draft.title.trim_start_matches("Draft: ").to_string(),
            body: format!("{}\n\nOptimized.", draft.body),
            seo_meta: SeoMeta {
                meta_title: Some(draft.title.clone()),
                meta_description: Some(draft.excerpt.clone()),
                keywords: keywords.to_vec(),
            },
            suggested_placements: vec![AffiliatePlacement {
                anchor: "recommended gear".to_string(),
                product_hint: None,
            }],
        })
    }
}

/// 优化服务桩：总是返回预设错误
pub struct FailingOptimizer(pub &'static str);

#[async_trait]
impl ContentOptimizer for FailingOptimizer {
    async fn optimize(
        &self,
        _article_id: Uuid,
        _draft: &GeneratedContent,
        _keywords: &[String],
    ) -> Result<OptimizedContent, AdapterError> {
        Err(AdapterError::InvalidResponse(self.0.to_string()))
    }
}

/// 发布目标的行为
#[derive(Clone, Copy)]
pub enum TargetBehavior {
    Succeed,
    Fail,
    /// 挂起直到阶段超时
    Hang,
}

pub struct StubTarget {
    name: String,
    behavior: TargetBehavior,
}

impl StubTarget {
    pub fn new(name: &str, behavior: TargetBehavior) -> Arc<dyn PublishTarget> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
        })
    }
}

#[async_trait]
impl PublishTarget for StubTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        _article_id: Uuid,
        content: &PublishableArticle,
    ) -> Result<PostRef, AdapterError> {
        match self.behavior {
            TargetBehavior::Succeed => Ok(PostRef {
                external_post_id: format!("{}-1", self.name),
                url: format!("https://{}.example.com/{}", self.name, content.slug),
            }),
            TargetBehavior::Fail => Err(AdapterError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            TargetBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(AdapterError::InvalidResponse("unreachable".to_string()))
            }
        }
    }
}

#[allow(dead_code)]
pub struct PipelineFixture {
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<JobRepositoryImpl>,
    pub articles: Arc<ArticleRepositoryImpl>,
    pub queue: Arc<TestQueue>,
    pub generator: Arc<StubGenerator>,
    pub worker: Arc<TestWorker>,
}

pub async fn pipeline_fixture(
    generator: StubGenerator,
    targets: Vec<Arc<dyn PublishTarget>>,
    retry: RetryStrategy,
) -> PipelineFixture {
    pipeline_fixture_with_optimizer(generator, Arc::new(StubOptimizer), targets, retry).await
}

pub async fn pipeline_fixture_with_optimizer(
    generator: StubGenerator,
    optimizer: Arc<dyn ContentOptimizer>,
    targets: Vec<Arc<dyn PublishTarget>>,
    retry: RetryStrategy,
) -> PipelineFixture {
    let db = setup_db().await;
    let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
    let articles = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let queue = Arc::new(DatabaseJobQueue::new(
        jobs.clone(),
        chrono::Duration::minutes(15),
        retry,
    ));
    let generator = Arc::new(generator);

    let adapters = PipelineAdapters {
        generator: generator.clone(),
        optimizer,
        drafts: articles.clone(),
        targets,
    };
    let worker = Arc::new(PipelineWorker::new(
        queue.clone(),
        articles.clone(),
        adapters,
        STAGE_TIMEOUT,
    ));

    PipelineFixture {
        db,
        jobs,
        articles,
        queue,
        generator,
        worker,
    }
}

/// 可达性检查桩：按 URL 依次返回预设结果，用尽后返回 200
#[derive(Default)]
pub struct ScriptedChecker {
    scripts: Mutex<HashMap<String, VecDeque<Result<ReachabilityResponse, String>>>>,
}

impl ScriptedChecker {
    pub fn push(&self, url: &str, result: Result<u16, &str>) {
        self.push_timed(url, result, 50);
    }

    pub fn push_timed(&self, url: &str, result: Result<u16, &str>, response_time_ms: u64) {
        let entry = result
            .map(|status_code| ReachabilityResponse {
                status_code,
                response_time_ms,
            })
            .map_err(str::to_string);
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(entry);
    }
}

#[async_trait]
impl ReachabilityChecker for ScriptedChecker {
    async fn check(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<ReachabilityResponse, EngineError> {
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(EngineError::Other(message)),
            None => Ok(ReachabilityResponse {
                status_code: 200,
                response_time_ms: 50,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[allow(dead_code)]
pub struct LinkFixture {
    pub links: Arc<LinkRepositoryImpl>,
    pub checker: Arc<ScriptedChecker>,
    pub prober: Arc<LinkProber<LinkRepositoryImpl>>,
}

pub async fn link_fixture() -> LinkFixture {
    let db = setup_db().await;
    let links = Arc::new(LinkRepositoryImpl::new(db));
    let checker = Arc::new(ScriptedChecker::default());
    let prober = Arc::new(LinkProber::new(
        links.clone(),
        checker.clone(),
        LinkCircuitBreaker::default(),
        ProbeConfig::default(),
    ));
    LinkFixture {
        links,
        checker,
        prober,
    }
}

pub async fn create_product(links: &LinkRepositoryImpl, category: &str) -> Product {
    let product = Product {
        id: Uuid::new_v4(),
        name: format!("{} product", category),
        category: category.to_string(),
    };
    links.create_product(&product).await.unwrap()
}

pub async fn create_link(
    links: &LinkRepositoryImpl,
    product: &Product,
    url: &str,
    ctr_14d: f64,
) -> AffiliateLink {
    let mut link = AffiliateLink::new(
        product.id,
        url.to_string(),
        Uuid::new_v4().simple().to_string()[..8].to_string(),
    );
    link.ctr_14d = ctr_14d;
    link.created_at = Utc::now();
    links.create_link(&link).await.unwrap()
}
