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
                    .table(PipelineJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PipelineJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PipelineJobs::Topic).string().not_null())
                    .col(ColumnDef::new(PipelineJobs::TargetKeywords).json().not_null())
                    .col(ColumnDef::new(PipelineJobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(PipelineJobs::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PipelineJobs::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PipelineJobs::LastError).text().null())
                    .col(ColumnDef::new(PipelineJobs::PublishedArticleId).uuid().null())
                    .col(ColumnDef::new(PipelineJobs::ClaimToken).uuid().null())
                    .col(
                        ColumnDef::new(PipelineJobs::LeaseExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PipelineJobs::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PipelineJobs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PipelineJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PipelineJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Ingestion dedup key
        manager
            .create_index(
                Index::create()
                    .name("idx_pipeline_jobs_topic")
                    .table(PipelineJobs::Table)
                    .col(PipelineJobs::Topic)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pipeline_jobs_status_scheduled_at")
                    .table(PipelineJobs::Table)
                    .col(PipelineJobs::Status)
                    .col(PipelineJobs::ScheduledAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PipelineJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PipelineJobs {
    Table,
    Id,
    Topic,
    TargetKeywords,
    Status,
    Attempts,
    ScheduledAt,
    LastError,
    PublishedArticleId,
    ClaimToken,
    LeaseExpiresAt,
    StartedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
