// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_pipeline_jobs;
mod m20250301_000002_create_articles;
mod m20250301_000003_create_affiliate_links;
mod m20250301_000004_create_link_health;

/// 数据库迁移器
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    /// 获取所有迁移
    ///
    /// # 返回值
    ///
    /// 返回迁移列表
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_pipeline_jobs::Migration),
            Box::new(m20250301_000002_create_articles::Migration),
            Box::new(m20250301_000003_create_affiliate_links::Migration),
            Box::new(m20250301_000004_create_link_health::Migration),
        ]
    }
}
