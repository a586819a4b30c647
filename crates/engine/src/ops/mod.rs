use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{EngineError, IdentityProvider, ResultEngine, StoredIdentities};

mod access;
mod catalog;
mod ledger;
mod moderation;
mod purge;
mod users;

pub use ledger::Reconciliation;
pub use purge::{DeletionImpact, PurgeReport};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every marketplace operation.
///
/// The identity provider is never called while a database transaction is
/// open: with a single-connection pool it would wait on itself.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    identities: Arc<dyn IdentityProvider>,
}

impl Engine {
    /// Starts an [`EngineBuilder`].
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn identities(&self) -> &Arc<dyn IdentityProvider> {
        &self.identities
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    identities: Option<Arc<dyn IdentityProvider>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Use another identity provider instead of the `auth_identities` table.
    pub fn identities(mut self, identities: Arc<dyn IdentityProvider>) -> EngineBuilder {
        self.identities = Some(identities);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let identities = match self.identities {
            Some(identities) => identities,
            None => Arc::new(StoredIdentities::new(self.database.clone())),
        };
        Ok(Engine {
            database: self.database,
            identities,
        })
    }
}
