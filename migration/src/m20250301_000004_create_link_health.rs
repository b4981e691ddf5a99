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
                    .table(LinkHealthChecks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkHealthChecks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LinkHealthChecks::LinkId).uuid().not_null())
                    .col(
                        ColumnDef::new(LinkHealthChecks::CheckedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LinkHealthChecks::StatusCode).integer().not_null())
                    .col(ColumnDef::new(LinkHealthChecks::IsWorking).boolean().not_null())
                    .col(
                        ColumnDef::new(LinkHealthChecks::ResponseTimeMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkHealthChecks::ConsecutiveFailures)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LinkHealthChecks::ErrorMessage).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_link_health_checks_link_checked_at")
                    .table(LinkHealthChecks::Table)
                    .col(LinkHealthChecks::LinkId)
                    .col(LinkHealthChecks::CheckedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkProbeRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkProbeRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LinkProbeRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkProbeRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LinkProbeRuns::Total).integer().not_null())
                    .col(ColumnDef::new(LinkProbeRuns::Working).integer().not_null())
                    .col(ColumnDef::new(LinkProbeRuns::Broken).integer().not_null())
                    .col(ColumnDef::new(LinkProbeRuns::Slow).integer().not_null())
                    .col(ColumnDef::new(LinkProbeRuns::RecentlyFixed).integer().not_null())
                    .col(ColumnDef::new(LinkProbeRuns::Deactivated).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkRotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkRotations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LinkRotations::OldLinkId).uuid().not_null())
                    .col(ColumnDef::new(LinkRotations::SuggestedLinkId).uuid().not_null())
                    .col(ColumnDef::new(LinkRotations::OldCtr).double().not_null())
                    .col(ColumnDef::new(LinkRotations::SuggestedCtr).double().not_null())
                    .col(ColumnDef::new(LinkRotations::Category).string().not_null())
                    .col(
                        ColumnDef::new(LinkRotations::RotatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkRotations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LinkProbeRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LinkHealthChecks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LinkHealthChecks {
    Table,
    Id,
    LinkId,
    CheckedAt,
    StatusCode,
    IsWorking,
    ResponseTimeMs,
    ConsecutiveFailures,
    ErrorMessage,
}

#[derive(DeriveIden)]
enum LinkProbeRuns {
    Table,
    Id,
    StartedAt,
    FinishedAt,
    Total,
    Working,
    Broken,
    Slow,
    RecentlyFixed,
    Deactivated,
}

#[derive(DeriveIden)]
enum LinkRotations {
    Table,
    Id,
    OldLinkId,
    SuggestedLinkId,
    OldCtr,
    SuggestedCtr,
    Category,
    RotatedAt,
}
