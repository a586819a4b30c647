//! Marketplace schema: services, bookings and the social content around them.
//!
//! Foreign keys carry no `ON DELETE CASCADE`: account removal deletes children
//! explicitly, in dependency order.

use sea_orm_migration::prelude::*;

use crate::m20260110_000000_accounts::Profiles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Services {
    Table,
    Id,
    ProviderId,
    Title,
    Description,
    ServiceType,
    PriceMinor,
    Available,
    Images,
    DurationHours,
    MaxCapacity,
    LocationName,
    LocationAddress,
    CreatedAt,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    UserId,
    ServiceId,
    Status,
    TotalPriceMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Posts {
    Table,
    Id,
    UserId,
    VideoUrl,
    Description,
    LinkedServiceId,
    CreatedAt,
}

#[derive(Iden)]
enum PostComments {
    Table,
    Id,
    PostId,
    UserId,
    ParentCommentId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum PostLikes {
    Table,
    Id,
    UserId,
    PostId,
    CreatedAt,
}

#[derive(Iden)]
enum ServiceReviews {
    Table,
    Id,
    ServiceId,
    UserId,
    BookingId,
    Rating,
    Comment,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::ProviderId).string().not_null())
                    .col(ColumnDef::new(Services::Title).string().not_null())
                    .col(ColumnDef::new(Services::Description).string())
                    .col(
                        ColumnDef::new(Services::ServiceType)
                            .string()
                            .not_null()
                            .default("experience"),
                    )
                    .col(
                        ColumnDef::new(Services::PriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Services::Available)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Services::Images).string())
                    .col(ColumnDef::new(Services::DurationHours).integer())
                    .col(ColumnDef::new(Services::MaxCapacity).integer())
                    .col(ColumnDef::new(Services::LocationName).string())
                    .col(ColumnDef::new(Services::LocationAddress).string())
                    .col(ColumnDef::new(Services::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-services-provider_id")
                            .from(Services::Table, Services::ProviderId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::UserId).string())
                    .col(ColumnDef::new(Bookings::ServiceId).string())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Bookings::TotalPriceMinor).big_integer())
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-user_id")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-service_id")
                            .from(Bookings::Table, Bookings::ServiceId)
                            .to(Services::Table, Services::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-service_id-status")
                    .table(Bookings::Table)
                    .col(Bookings::ServiceId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Posts::UserId).string())
                    .col(ColumnDef::new(Posts::VideoUrl).string().not_null())
                    .col(ColumnDef::new(Posts::Description).string())
                    .col(ColumnDef::new(Posts::LinkedServiceId).string())
                    .col(ColumnDef::new(Posts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-posts-user_id")
                            .from(Posts::Table, Posts::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-posts-linked_service_id")
                            .from(Posts::Table, Posts::LinkedServiceId)
                            .to(Services::Table, Services::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostComments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostComments::PostId).string().not_null())
                    .col(ColumnDef::new(PostComments::UserId).string().not_null())
                    .col(ColumnDef::new(PostComments::ParentCommentId).string())
                    .col(ColumnDef::new(PostComments::Content).string().not_null())
                    .col(
                        ColumnDef::new(PostComments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_comments-post_id")
                            .from(PostComments::Table, PostComments::PostId)
                            .to(Posts::Table, Posts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_comments-user_id")
                            .from(PostComments::Table, PostComments::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostLikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostLikes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostLikes::UserId).string().not_null())
                    .col(ColumnDef::new(PostLikes::PostId).string().not_null())
                    .col(ColumnDef::new(PostLikes::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_likes-user_id")
                            .from(PostLikes::Table, PostLikes::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-post_likes-post_id")
                            .from(PostLikes::Table, PostLikes::PostId)
                            .to(Posts::Table, Posts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceReviews::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceReviews::ServiceId).string().not_null())
                    .col(ColumnDef::new(ServiceReviews::UserId).string().not_null())
                    .col(ColumnDef::new(ServiceReviews::BookingId).string())
                    .col(ColumnDef::new(ServiceReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(ServiceReviews::Comment).string())
                    .col(
                        ColumnDef::new(ServiceReviews::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-service_reviews-service_id")
                            .from(ServiceReviews::Table, ServiceReviews::ServiceId)
                            .to(Services::Table, Services::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-service_reviews-user_id")
                            .from(ServiceReviews::Table, ServiceReviews::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceReviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostLikes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await?;
        Ok(())
    }
}
