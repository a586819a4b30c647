#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use uuid::Uuid;

use engine::{
    CreateUserCmd, Engine, EngineError, IdentityProvider, LedgerCmd, Money, Profile, Role, Wallet,
};
use migration::MigratorTrait;

/// Identity provider kept in memory, so tests skip password hashing.
#[derive(Debug, Default)]
pub struct MemoryIdentities {
    identities: Mutex<HashMap<Uuid, (String, String, Role)>>,
    fail_deletes: AtomicBool,
}

impl MemoryIdentities {
    pub fn contains(&self, id: Uuid) -> bool {
        self.identities.lock().unwrap().contains_key(&id)
    }

    pub fn role_of(&self, id: Uuid) -> Option<Role> {
        self.identities.lock().unwrap().get(&id).map(|(_, _, role)| *role)
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentities {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Uuid, EngineError> {
        let mut identities = self.identities.lock().unwrap();
        if identities.values().any(|(known, _, _)| known == email) {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        let id = Uuid::new_v4();
        identities.insert(id, (email.to_string(), password.to_string(), role));
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Uuid>, EngineError> {
        let identities = self.identities.lock().unwrap();
        Ok(identities
            .iter()
            .find(|(_, (known, secret, _))| known == email && secret == password)
            .map(|(id, _)| *id))
    }

    async fn update_role_metadata(&self, identity_id: Uuid, role: Role) -> Result<(), EngineError> {
        match self.identities.lock().unwrap().get_mut(&identity_id) {
            Some(entry) => {
                entry.2 = role;
                Ok(())
            }
            None => Err(EngineError::Identity("unknown identity".to_string())),
        }
    }

    async fn update_password(&self, identity_id: Uuid, password: &str) -> Result<(), EngineError> {
        match self.identities.lock().unwrap().get_mut(&identity_id) {
            Some(entry) => {
                entry.1 = password.to_string();
                Ok(())
            }
            None => Err(EngineError::Identity("unknown identity".to_string())),
        }
    }

    async fn delete_identity(&self, identity_id: Uuid) -> Result<(), EngineError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(EngineError::Identity("provider offline".to_string()));
        }
        self.identities.lock().unwrap().remove(&identity_id);
        Ok(())
    }
}

pub struct TestEnv {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub identities: Arc<MemoryIdentities>,
    pub admin: Profile,
}

pub async fn setup() -> TestEnv {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let identities = Arc::new(MemoryIdentities::default());
    let engine = Engine::builder()
        .database(db.clone())
        .identities(identities.clone())
        .build()
        .await
        .unwrap();
    let admin = engine
        .bootstrap_admin(CreateUserCmd::new("admin@ketzal.mx", "admin", "admin"))
        .await
        .unwrap();
    TestEnv {
        engine,
        db,
        identities,
        admin,
    }
}

impl TestEnv {
    pub fn admin_id(&self) -> Option<Uuid> {
        Some(self.admin.id)
    }

    pub async fn user(&self, username: &str, role: Role) -> Profile {
        let cmd = CreateUserCmd::new(format!("{username}@ketzal.mx"), "secret", username).role(role);
        self.engine.create_user(self.admin_id(), cmd).await.unwrap()
    }

    pub async fn wallet_of(&self, user_id: Uuid) -> Wallet {
        self.engine
            .wallet_for_user(self.admin_id(), user_id)
            .await
            .unwrap()
    }

    pub async fn deposit(&self, wallet_id: Uuid, minor: i64) {
        self.engine
            .apply_transaction(LedgerCmd::deposit(
                self.admin_id(),
                wallet_id,
                Money::new(minor),
            ))
            .await
            .unwrap();
    }

    pub async fn exec(&self, sql: &str, values: Vec<Value>) {
        self.db
            .execute(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                sql,
                values,
            ))
            .await
            .unwrap();
    }

    /// Runs a `SELECT COUNT(*) AS n ...` query.
    pub async fn count(&self, sql: &str, values: Vec<Value>) -> i64 {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                sql,
                values,
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get("", "n").unwrap()
    }

    pub async fn transaction_count(&self, wallet_id: Uuid) -> i64 {
        self.count(
            "SELECT COUNT(*) AS n FROM transactions WHERE wallet_id = ?",
            vec![wallet_id.to_string().into()],
        )
        .await
    }
}
