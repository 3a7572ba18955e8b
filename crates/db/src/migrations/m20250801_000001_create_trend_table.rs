//! Create trend table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trend::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trend::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trend::Tag).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Trend::DisplayTag)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Trend::TweetCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::Count1h)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::Count6h)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::Count24h)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::Count7d)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::Score)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::PeakCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Trend::PeakAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Trend::Category)
                            .string_len(32)
                            .not_null()
                            .default("general"),
                    )
                    .col(ColumnDef::new(Trend::LocationCountry).string_len(128))
                    .col(ColumnDef::new(Trend::LocationRegion).string_len(128))
                    .col(ColumnDef::new(Trend::LocationCity).string_len(128))
                    .col(
                        ColumnDef::new(Trend::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Trend::History).json_binary().not_null())
                    .col(
                        ColumnDef::new(Trend::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Trend::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Trend::LastActivityAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: normalized tag is the record key
        manager
            .create_index(
                Index::create()
                    .name("idx_trend_tag")
                    .table(Trend::Table)
                    .col(Trend::Tag)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: score + active flag (top-K queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_trend_score_active")
                    .table(Trend::Table)
                    .col(Trend::Score)
                    .col(Trend::IsActive)
                    .to_owned(),
            )
            .await?;

        // Index: category + score (per-category rankings)
        manager
            .create_index(
                Index::create()
                    .name("idx_trend_category_score")
                    .table(Trend::Table)
                    .col(Trend::Category)
                    .col(Trend::Score)
                    .to_owned(),
            )
            .await?;

        // Index: last activity (staleness sweeps, recency tiebreaks)
        manager
            .create_index(
                Index::create()
                    .name("idx_trend_last_activity")
                    .table(Trend::Table)
                    .col(Trend::LastActivityAt)
                    .to_owned(),
            )
            .await?;

        // Index: country + score (local trends)
        manager
            .create_index(
                Index::create()
                    .name("idx_trend_country_score")
                    .table(Trend::Table)
                    .col(Trend::LocationCountry)
                    .col(Trend::Score)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trend::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Trend {
    Table,
    Id,
    Tag,
    DisplayTag,
    TweetCount,
    #[iden = "count_1h"]
    Count1h,
    #[iden = "count_6h"]
    Count6h,
    #[iden = "count_24h"]
    Count24h,
    #[iden = "count_7d"]
    Count7d,
    Score,
    PeakCount,
    PeakAt,
    Category,
    LocationCountry,
    LocationRegion,
    LocationCity,
    IsActive,
    History,
    Version,
    FirstSeenAt,
    LastActivityAt,
}
