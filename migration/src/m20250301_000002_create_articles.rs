// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Articles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Articles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Articles::Title).string().not_null())
                    .col(ColumnDef::new(Articles::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Articles::Body).text().not_null())
                    .col(ColumnDef::new(Articles::Excerpt).text().not_null())
                    .col(ColumnDef::new(Articles::SeoMeta).json().null())
                    .col(ColumnDef::new(Articles::AffiliatePlacements).json().null())
                    .col(ColumnDef::new(Articles::ExternalPosts).json().null())
                    .col(
                        ColumnDef::new(Articles::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Articles::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Articles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Articles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PublishAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublishAttempts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PublishAttempts::JobId).uuid().not_null())
                    .col(ColumnDef::new(PublishAttempts::ArticleId).uuid().not_null())
                    .col(ColumnDef::new(PublishAttempts::Target).string().not_null())
                    .col(ColumnDef::new(PublishAttempts::Succeeded).boolean().not_null())
                    .col(ColumnDef::new(PublishAttempts::ExternalPostId).string().null())
                    .col(ColumnDef::new(PublishAttempts::Url).string().null())
                    .col(ColumnDef::new(PublishAttempts::Error).text().null())
                    .col(
                        ColumnDef::new(PublishAttempts::AttemptedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publish_attempts_job_id")
                    .table(PublishAttempts::Table)
                    .col(PublishAttempts::JobId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PublishAttempts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Articles {
    Table,
    Id,
    Title,
    Slug,
    Body,
    Excerpt,
    SeoMeta,
    AffiliatePlacements,
    ExternalPosts,
    IsPublished,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PublishAttempts {
    Table,
    Id,
    JobId,
    ArticleId,
    Target,
    Succeeded,
    ExternalPostId,
    Url,
    Error,
    AttemptedAt,
}
