// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::application::dto::link_request::{RegisterLinkDto, RegisterProductDto};
use crate::domain::models::link::{AffiliateLink, Product};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::link_repository::LinkRepository;
use crate::utils::short_code::generate_short_code;

/// 生成短码时的最大尝试次数
const MAX_SHORT_CODE_ATTEMPTS: usize = 10;

/// 链接登记错误类型
#[derive(Error, Debug)]
pub enum RegisterLinkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("Could not find a free short code after {0} attempts")]
    ShortCodeExhausted(usize),
}

/// 登记产品和联盟链接
pub struct RegisterLinkUseCase<R: LinkRepository> {
    repository: Arc<R>,
}

impl<R: LinkRepository> RegisterLinkUseCase<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// 登记产品
    pub async fn register_product(
        &self,
        request: RegisterProductDto,
    ) -> Result<Product, RegisterLinkError> {
        request.validate()?;
        let product = Product {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            category: request.category.trim().to_lowercase(),
        };
        Ok(self.repository.create_product(&product).await?)
    }

    /// 登记链接并分配唯一短码
    pub async fn register_link(
        &self,
        request: RegisterLinkDto,
    ) -> Result<AffiliateLink, RegisterLinkError> {
        request.validate()?;
        if self.repository.find_product(request.product_id).await?.is_none() {
            return Err(RegisterLinkError::ProductNotFound(request.product_id));
        }

        let short_code = self.free_short_code().await?;
        let mut link = AffiliateLink::new(request.product_id, request.original_url, short_code);
        if let Some(ctr) = request.ctr_14d {
            link.ctr_14d = ctr;
        }

        let link = self.repository.create_link(&link).await?;
        info!(link_id = %link.id, short_code = %link.short_code, "Registered affiliate link");
        Ok(link)
    }

    async fn free_short_code(&self) -> Result<String, RegisterLinkError> {
        for _ in 0..MAX_SHORT_CODE_ATTEMPTS {
            let candidate = generate_short_code();
            if !self.repository.exists_by_short_code(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(RegisterLinkError::ShortCodeExhausted(MAX_SHORT_CODE_ATTEMPTS))
    }
}
