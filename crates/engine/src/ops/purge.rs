//! Account purge.
//!
//! The schema has no cascading deletes, so a user is removed by deleting
//! every dependent row first, in foreign key order, inside one database
//! transaction. Optional cleanups run in savepoints: a failure there is
//! rolled back on its own and logged.

use sea_orm::{
    Condition, ConnectionTrait, DatabaseTransaction, DbErr, PaginatorTrait, QueryFilter,
    QuerySelect, Statement, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BookingStatus, Currency, EngineError, Money, PurgeCmd, ResultEngine, Role, bookings,
    community::{ambassador_details, notifications, referrals},
    content::{post_comments, post_likes, posts, service_reviews},
    profiles, services, transactions, wallets,
};

use super::{Engine, moderation::delete_post_interactions, with_tx};

/// What deleting a user would remove.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionImpact {
    pub user_id: Uuid,
    pub username: String,
    /// Zero when the user has no wallet.
    pub wallet_balance: Money,
    pub currency: Currency,
    pub services: u64,
    /// Pending or confirmed bookings on services the user provides.
    pub active_bookings_as_provider: u64,
    /// Bookings the user made, any status.
    pub bookings_as_traveler: u64,
    pub posts: u64,
    pub can_delete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub impact: DeletionImpact,
    /// Rows removed across all tables, the profile included.
    pub rows_deleted: u64,
    /// Optional cleanups that failed and were skipped.
    pub skipped: Vec<String>,
}

/// Optional tables may be absent from a deployment.
fn is_missing_table(err: &DbErr) -> bool {
    err.to_string().contains("no such table")
}

/// Cleanups whose failure does not abort the purge.
enum Cleanup<'a> {
    UnlinkPosts { service_id: &'a str },
    NotificationPreferences,
    AmbassadorDetail,
    Notifications,
    Referrals,
}

impl Cleanup<'_> {
    fn label(&self) -> String {
        match self {
            Self::UnlinkPosts { service_id } => format!("unlink posts from service {service_id}"),
            Self::NotificationPreferences => "notification preferences".to_string(),
            Self::AmbassadorDetail => "ambassador detail".to_string(),
            Self::Notifications => "notifications".to_string(),
            Self::Referrals => "referrals".to_string(),
        }
    }

    async fn run(&self, db: &DatabaseTransaction, user_id: &str) -> Result<u64, DbErr> {
        let affected = match self {
            Self::UnlinkPosts { service_id } => {
                posts::Entity::update_many()
                    .col_expr(
                        posts::Column::LinkedServiceId,
                        Expr::value(Option::<String>::None),
                    )
                    .filter(posts::Column::LinkedServiceId.eq(*service_id))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            Self::NotificationPreferences => {
                db.execute(Statement::from_sql_and_values(
                    db.get_database_backend(),
                    "DELETE FROM notification_preferences WHERE user_id = ?",
                    vec![user_id.into()],
                ))
                .await?
                .rows_affected()
            }
            Self::AmbassadorDetail => {
                ambassador_details::Entity::delete_many()
                    .filter(ambassador_details::Column::UserId.eq(user_id))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            Self::Notifications => {
                notifications::Entity::delete_many()
                    .filter(notifications::Column::UserId.eq(user_id))
                    .exec(db)
                    .await?
                    .rows_affected
            }
            Self::Referrals => {
                referrals::Entity::delete_many()
                    .filter(
                        Condition::any()
                            .add(referrals::Column::AmbassadorId.eq(user_id))
                            .add(referrals::Column::ReferredUserId.eq(user_id)),
                    )
                    .exec(db)
                    .await?
                    .rows_affected
            }
        };
        Ok(affected)
    }

    /// Runs inside a savepoint. Returns the rows removed, or `None` when the
    /// cleanup failed and was rolled back. A missing table removes nothing.
    async fn run_isolated(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<u64>> {
        let savepoint = db_tx.begin().await?;
        match self.run(&savepoint, user_id).await {
            Ok(rows) => {
                savepoint.commit().await?;
                Ok(Some(rows))
            }
            Err(err) if is_missing_table(&err) => {
                savepoint.rollback().await?;
                tracing::debug!("purge of {user_id}: no table for {}", self.label());
                Ok(Some(0))
            }
            Err(err) => {
                savepoint.rollback().await?;
                tracing::warn!("purge of {user_id}: skipped {}: {err}", self.label());
                Ok(None)
            }
        }
    }
}

impl Engine {
    async fn compute_impact(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<DeletionImpact> {
        let profile = self.load_profile(db_tx, user_id).await?;
        let id = user_id.to_string();

        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(id.clone()))
            .one(db_tx)
            .await?;
        let (wallet_balance, currency) = match wallet {
            Some(model) => (
                Money::new(model.balance),
                Currency::try_from(model.currency_code.as_str())?,
            ),
            None => (Money::ZERO, Currency::default()),
        };

        let services = services::Entity::find()
            .filter(services::Column::ProviderId.eq(id.clone()))
            .count(db_tx)
            .await?;
        let active_bookings_as_provider = bookings::Entity::find()
            .inner_join(services::Entity)
            .filter(services::Column::ProviderId.eq(id.clone()))
            .filter(
                bookings::Column::Status.is_in(BookingStatus::ACTIVE.map(BookingStatus::as_str)),
            )
            .count(db_tx)
            .await?;
        let bookings_as_traveler = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(id.clone()))
            .count(db_tx)
            .await?;
        let posts = posts::Entity::find()
            .filter(posts::Column::UserId.eq(id))
            .count(db_tx)
            .await?;

        Ok(DeletionImpact {
            user_id,
            username: profile.username,
            wallet_balance,
            currency,
            services,
            active_bookings_as_provider,
            bookings_as_traveler,
            posts,
            can_delete: active_bookings_as_provider == 0,
        })
    }

    /// Reports what purging `user_id` would remove. Writes nothing.
    pub async fn deletion_impact(
        &self,
        caller: Option<Uuid>,
        user_id: Uuid,
    ) -> ResultEngine<DeletionImpact> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            self.compute_impact(&db_tx, user_id).await
        })
    }

    /// Deletes the user's rows in dependency order, then the auth identity.
    ///
    /// The impact is recomputed inside the deleting transaction, so a booking
    /// confirmed after the admin looked at the report still blocks the purge.
    /// The identity is deleted after commit; if that fails the result is
    /// [`EngineError::PurgeIncomplete`].
    pub async fn purge_user(&self, cmd: PurgeCmd) -> ResultEngine<PurgeReport> {
        let user_id = cmd.user_id;
        let report = with_tx!(self, |db_tx| {
            let admin = self.require_role(&db_tx, cmd.caller, Role::Admin).await?;
            if !cmd.confirmed {
                return Err(EngineError::ConfirmationRequired(
                    "account deletion must be confirmed".to_string(),
                ));
            }

            let impact = self.compute_impact(&db_tx, user_id).await?;
            if !impact.can_delete {
                tracing::warn!(
                    "{} tried to purge {}: {} active bookings as provider",
                    admin.username,
                    impact.username,
                    impact.active_bookings_as_provider
                );
                return Err(EngineError::HasActiveCommitments(format!(
                    "{} has {} pending or confirmed bookings on its services",
                    impact.username, impact.active_bookings_as_provider
                )));
            }

            let (rows_deleted, skipped) = self.delete_user_rows(&db_tx, user_id).await?;
            tracing::info!(
                "{} purged {} ({rows_deleted} rows)",
                admin.username,
                impact.username
            );
            Ok(PurgeReport {
                impact,
                rows_deleted,
                skipped,
            })
        })?;

        if let Err(err) = self.identities.delete_identity(user_id).await {
            tracing::error!("purge of {user_id}: identity not deleted: {err}");
            return Err(EngineError::PurgeIncomplete(format!(
                "data of {user_id} removed but its identity remains: {err}"
            )));
        }
        Ok(report)
    }

    async fn delete_user_rows(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<(u64, Vec<String>)> {
        let id = user_id.to_string();
        let mut rows = 0;
        let mut skipped = Vec::new();

        // Interactions authored by the user.
        rows += post_likes::Entity::delete_many()
            .filter(post_likes::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        rows += post_comments::Entity::delete_many()
            .filter(post_comments::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;
        rows += service_reviews::Entity::delete_many()
            .filter(service_reviews::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;

        // Interactions of others on the user's posts, then the posts.
        let post_ids: Vec<String> = posts::Entity::find()
            .select_only()
            .column(posts::Column::Id)
            .filter(posts::Column::UserId.eq(id.clone()))
            .into_tuple()
            .all(db_tx)
            .await?;
        rows += delete_post_interactions(db_tx, post_ids).await?;
        rows += posts::Entity::delete_many()
            .filter(posts::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;

        rows += bookings::Entity::delete_many()
            .filter(bookings::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;

        let service_ids: Vec<String> = services::Entity::find()
            .select_only()
            .column(services::Column::Id)
            .filter(services::Column::ProviderId.eq(id.clone()))
            .into_tuple()
            .all(db_tx)
            .await?;
        for service_id in &service_ids {
            rows += bookings::Entity::delete_many()
                .filter(bookings::Column::ServiceId.eq(service_id.as_str()))
                .exec(db_tx)
                .await?
                .rows_affected;
            rows += service_reviews::Entity::delete_many()
                .filter(service_reviews::Column::ServiceId.eq(service_id.as_str()))
                .exec(db_tx)
                .await?
                .rows_affected;
            let unlink = Cleanup::UnlinkPosts { service_id };
            if unlink.run_isolated(db_tx, &id).await?.is_none() {
                skipped.push(unlink.label());
            }
        }
        rows += services::Entity::delete_many()
            .filter(services::Column::ProviderId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;

        let wallet_ids: Vec<String> = wallets::Entity::find()
            .select_only()
            .column(wallets::Column::Id)
            .filter(wallets::Column::UserId.eq(id.clone()))
            .into_tuple()
            .all(db_tx)
            .await?;
        if !wallet_ids.is_empty() {
            rows += transactions::Entity::delete_many()
                .filter(transactions::Column::WalletId.is_in(wallet_ids))
                .exec(db_tx)
                .await?
                .rows_affected;
        }
        rows += wallets::Entity::delete_many()
            .filter(wallets::Column::UserId.eq(id.clone()))
            .exec(db_tx)
            .await?
            .rows_affected;

        for cleanup in [
            Cleanup::NotificationPreferences,
            Cleanup::AmbassadorDetail,
            Cleanup::Notifications,
            Cleanup::Referrals,
        ] {
            match cleanup.run_isolated(db_tx, &id).await? {
                Some(removed) => rows += removed,
                None => skipped.push(cleanup.label()),
            }
        }

        rows += profiles::Entity::delete_by_id(id)
            .exec(db_tx)
            .await?
            .rows_affected;
        Ok((rows, skipped))
    }
}
