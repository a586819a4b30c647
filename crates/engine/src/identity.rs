//! Authentication identities.
//!
//! Credentials are owned by an identity provider, not by the engine. The
//! engine talks to it through [`IdentityProvider`]; [`StoredIdentities`] is
//! the provider backed by the `auth_identities` table of the same database.

use std::fmt::Debug;

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, QueryFilter, entity::prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Role, parse_id};

pub mod auth_identities {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "auth_identities")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub email: String,
        pub password_hash: String,
        /// Role copy kept for token claims; the profile is authoritative.
        pub role: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[async_trait]
pub trait IdentityProvider: Debug + Send + Sync {
    /// Registers a new identity and returns its id.
    async fn create_identity(&self, email: &str, password: &str, role: Role) -> ResultEngine<Uuid>;

    /// Returns the identity id when the credentials match.
    async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<Uuid>>;

    async fn update_role_metadata(&self, identity_id: Uuid, role: Role) -> ResultEngine<()>;

    async fn update_password(&self, identity_id: Uuid, password: &str) -> ResultEngine<()>;

    async fn delete_identity(&self, identity_id: Uuid) -> ResultEngine<()>;
}

#[derive(Clone, Debug)]
pub struct StoredIdentities {
    database: DatabaseConnection,
}

impl StoredIdentities {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Identity(format!("unable to hash password: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[async_trait]
impl IdentityProvider for StoredIdentities {
    async fn create_identity(&self, email: &str, password: &str, role: Role) -> ResultEngine<Uuid> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidInput(
                "email and password are required".to_string(),
            ));
        }

        let exists = auth_identities::Entity::find()
            .filter(auth_identities::Column::Email.eq(email.clone()))
            .one(&self.database)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(email));
        }

        let id = Uuid::new_v4();
        let model = auth_identities::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            email: ActiveValue::Set(email),
            password_hash: ActiveValue::Set(hash_password(password)?),
            role: ActiveValue::Set(Some(role.as_str().to_string())),
            created_at: ActiveValue::Set(Utc::now()),
        };
        model.insert(&self.database).await?;
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Option<Uuid>> {
        let Some(model) = auth_identities::Entity::find()
            .filter(auth_identities::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        if !verify_password(password, &model.password_hash) {
            tracing::warn!("invalid credentials for {}", model.email);
            return Ok(None);
        }
        parse_id(&model.id, "identity").map(Some)
    }

    async fn update_role_metadata(&self, identity_id: Uuid, role: Role) -> ResultEngine<()> {
        let result = auth_identities::Entity::update_many()
            .col_expr(
                auth_identities::Column::Role,
                Expr::value(Some(role.as_str().to_string())),
            )
            .filter(auth_identities::Column::Id.eq(identity_id.to_string()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Identity(format!(
                "identity {identity_id} not found"
            )));
        }
        Ok(())
    }

    async fn update_password(&self, identity_id: Uuid, password: &str) -> ResultEngine<()> {
        if password.is_empty() {
            return Err(EngineError::InvalidInput("password is required".to_string()));
        }
        let result = auth_identities::Entity::update_many()
            .col_expr(
                auth_identities::Column::PasswordHash,
                Expr::value(hash_password(password)?),
            )
            .filter(auth_identities::Column::Id.eq(identity_id.to_string()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Identity(format!(
                "identity {identity_id} not found"
            )));
        }
        Ok(())
    }

    async fn delete_identity(&self, identity_id: Uuid) -> ResultEngine<()> {
        let result = auth_identities::Entity::delete_by_id(identity_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Identity(format!(
                "identity {identity_id} not found"
            )));
        }
        Ok(())
    }
}
