use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CreateUserCmd, Currency, EngineError, Profile, ResultEngine, Role, Wallet, profiles, wallets,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    async fn store_profile(
        &self,
        identity_id: Uuid,
        username: &str,
        full_name: Option<String>,
        role: Role,
    ) -> ResultEngine<profiles::Model> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let model = profiles::ActiveModel {
                id: ActiveValue::Set(identity_id.to_string()),
                username: ActiveValue::Set(username.to_string()),
                full_name: ActiveValue::Set(full_name),
                role: ActiveValue::Set(role.as_str().to_string()),
                is_verified: ActiveValue::Set(false),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            let wallet = Wallet::new(identity_id, Currency::Axo);
            let wallet_model: wallets::ActiveModel = (&wallet).into();
            wallet_model.insert(&db_tx).await?;
            Ok(model)
        })
    }

    /// Registers a user: the auth identity first, then the profile and an
    /// empty AXO wallet in one transaction.
    ///
    /// If the profile cannot be stored the identity is deleted again.
    async fn register(&self, cmd: CreateUserCmd, actor: &str) -> ResultEngine<Profile> {
        let username = normalize_required_text(&cmd.username, "username")?;
        let full_name = normalize_optional_text(cmd.full_name.as_deref());

        let taken = profiles::Entity::find()
            .filter(profiles::Column::Username.eq(username.clone()))
            .one(&self.database)
            .await?
            .is_some();
        if taken {
            return Err(EngineError::ExistingKey(username));
        }

        let identity_id = self
            .identities
            .create_identity(&cmd.email, &cmd.password, cmd.role)
            .await?;

        let stored = self
            .store_profile(identity_id, &username, full_name, cmd.role)
            .await;
        let model = match stored {
            Ok(model) => model,
            Err(err) => {
                tracing::error!("profile for {username} not stored: {err}");
                if let Err(cleanup) = self.identities.delete_identity(identity_id).await {
                    tracing::error!("identity {identity_id} left without profile: {cleanup}");
                }
                return Err(err);
            }
        };

        tracing::info!("{actor} created {} user {}", cmd.role, model.username);
        Profile::try_from(model)
    }

    /// Admin-only user registration.
    pub async fn create_user(
        &self,
        caller: Option<Uuid>,
        cmd: CreateUserCmd,
    ) -> ResultEngine<Profile> {
        let admin = self
            .require_role(&self.database, caller, Role::Admin)
            .await?;
        self.register(cmd, &admin.username).await
    }

    /// Creates the first admin of an empty installation.
    ///
    /// Refused with `ExistingKey` once any admin profile exists.
    pub async fn bootstrap_admin(&self, cmd: CreateUserCmd) -> ResultEngine<Profile> {
        let admins = profiles::Entity::find()
            .filter(profiles::Column::Role.eq(Role::Admin.as_str()))
            .count(&self.database)
            .await?;
        if admins > 0 {
            return Err(EngineError::ExistingKey("admin account".to_string()));
        }
        self.register(cmd.role(Role::Admin), "bootstrap").await
    }

    /// Changes the role on the profile and mirrors it on the identity.
    ///
    /// The profile is authoritative: a failed mirror is only logged.
    pub async fn update_user_role(
        &self,
        caller: Option<Uuid>,
        user_id: Uuid,
        role: Role,
    ) -> ResultEngine<Profile> {
        let profile = with_tx!(self, |db_tx| {
            let admin = self.require_role(&db_tx, caller, Role::Admin).await?;
            let mut profile = self.load_profile(&db_tx, user_id).await?;
            profiles::Entity::update_many()
                .col_expr(profiles::Column::Role, Expr::value(role.as_str()))
                .col_expr(profiles::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(profiles::Column::Id.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            tracing::info!(
                "{} changed role of {} from {} to {role}",
                admin.username,
                profile.username,
                profile.role_name()
            );
            profile.role = Some(role);
            Ok(profile)
        })?;

        if let Err(err) = self.identities.update_role_metadata(user_id, role).await {
            tracing::warn!("role metadata of {} not synced: {err}", profile.username);
        }
        Ok(profile)
    }

    pub async fn set_verified(
        &self,
        caller: Option<Uuid>,
        user_id: Uuid,
        verified: bool,
    ) -> ResultEngine<Profile> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            let mut profile = self.load_profile(&db_tx, user_id).await?;
            profiles::Entity::update_many()
                .col_expr(profiles::Column::IsVerified, Expr::value(verified))
                .col_expr(profiles::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(profiles::Column::Id.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            profile.is_verified = verified;
            Ok(profile)
        })
    }

    /// Sets a new password on the user's identity.
    pub async fn reset_password(
        &self,
        caller: Option<Uuid>,
        user_id: Uuid,
        password: &str,
    ) -> ResultEngine<()> {
        let admin = self
            .require_role(&self.database, caller, Role::Admin)
            .await?;
        let profile = self.load_profile(&self.database, user_id).await?;
        self.identities.update_password(user_id, password).await?;
        tracing::info!("{} reset the password of {}", admin.username, profile.username);
        Ok(())
    }
}
