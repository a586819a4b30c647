//! Wallet ledger: the only code path that changes a wallet balance.
//!
//! Every change inserts a [`Transaction`] first and then moves the balance
//! with a compare-and-swap on the value that was validated, both inside one
//! database transaction. The balance therefore always equals the signed sum
//! of the wallet's transactions.

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, LedgerCmd, Money, ResultEngine, Role, Transaction, TransactionKind, Wallet,
    transactions, wallets,
};

use super::{Engine, with_tx};

/// Stored balance compared with the ledger it should be derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub wallet_id: Uuid,
    pub balance: Money,
    pub ledger_sum: Money,
    pub entries: u64,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_sum
    }
}

/// Rolls back after a failed balance update.
async fn abandon(db_tx: DatabaseTransaction, wallet_id: Uuid, cause: EngineError) -> EngineError {
    rollback_outcome(db_tx.rollback().await, wallet_id, cause)
}

/// A rollback that fails too leaves the inserted transaction behind.
fn rollback_outcome(
    rollback: Result<(), DbErr>,
    wallet_id: Uuid,
    cause: EngineError,
) -> EngineError {
    match rollback {
        Ok(()) => cause,
        Err(err) => {
            tracing::error!("rollback failed for wallet {wallet_id}: {err}");
            EngineError::LedgerInconsistent(format!(
                "transaction recorded for wallet {wallet_id} without balance update ({cause})"
            ))
        }
    }
}

impl Engine {
    async fn find_wallet(&self, db_tx: &DatabaseTransaction, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::WalletNotFound(format!("wallet {wallet_id} not exists")))?;
        Wallet::try_from(model)
    }

    /// Deposits or withdraws on behalf of the wallet owner.
    ///
    /// Only admins may call this, and a withdrawal needs `confirmed`. Nothing
    /// is written unless every check passes.
    pub async fn apply_transaction(&self, cmd: LedgerCmd) -> ResultEngine<Transaction> {
        let db_tx = self.database.begin().await?;
        let admin = self.require_role(&db_tx, cmd.caller, Role::Admin).await?;

        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        if cmd.kind == TransactionKind::Withdrawal && !cmd.confirmed {
            return Err(EngineError::ConfirmationRequired(
                "withdrawals must be confirmed".to_string(),
            ));
        }

        let wallet = self.find_wallet(&db_tx, cmd.wallet_id).await?;
        let new_balance = wallet
            .balance
            .checked_add(cmd.kind.signed(cmd.amount))
            .ok_or_else(|| EngineError::InvalidAmount("amount out of range".to_string()))?;
        if new_balance.is_negative() {
            tracing::warn!(
                "withdrawal of {} refused on wallet {}: balance {}",
                cmd.amount,
                wallet.id,
                wallet.balance
            );
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} {} is lower than {}",
                wallet.balance, wallet.currency, cmd.amount
            )));
        }

        let tx = Transaction::new(
            wallet.id,
            cmd.kind,
            cmd.amount,
            wallet.currency,
            cmd.description.as_deref(),
            Some(admin.id),
        )?;
        let tx_model: transactions::ActiveModel = (&tx).into();
        tx_model.insert(&db_tx).await?;

        let update = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(new_balance.minor()))
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet.id.to_string()))
            .filter(wallets::Column::Balance.eq(wallet.balance.minor()))
            .exec(&db_tx)
            .await;
        match update {
            Ok(result) if result.rows_affected == 1 => {}
            Ok(_) => {
                let cause = EngineError::ConcurrentUpdate(format!(
                    "wallet {} changed while the transaction was applied",
                    wallet.id
                ));
                return Err(abandon(db_tx, wallet.id, cause).await);
            }
            Err(err) => {
                tracing::error!("balance update failed for wallet {}: {err}", wallet.id);
                return Err(abandon(db_tx, wallet.id, err.into()).await);
            }
        }

        db_tx.commit().await?;
        tracing::info!(
            "{} {} {} {} on wallet {} (balance {})",
            admin.username,
            tx.kind.as_str(),
            cmd.amount,
            wallet.currency,
            wallet.id,
            new_balance
        );
        Ok(tx)
    }

    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, caller: Option<Uuid>, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            self.find_wallet(&db_tx, wallet_id).await
        })
    }

    pub async fn wallet_for_user(&self, caller: Option<Uuid>, user_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            let model = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::WalletNotFound(format!("user {user_id} has no wallet"))
                })?;
            Wallet::try_from(model)
        })
    }

    /// Newest entries first.
    pub async fn list_wallet_transactions(
        &self,
        caller: Option<Uuid>,
        wallet_id: Uuid,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            self.find_wallet(&db_tx, wallet_id).await?;
            let models = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Compares the stored balance with the signed sum of the ledger.
    pub async fn reconcile_wallet(
        &self,
        caller: Option<Uuid>,
        wallet_id: Uuid,
    ) -> ResultEngine<Reconciliation> {
        with_tx!(self, |db_tx| {
            self.require_role(&db_tx, caller, Role::Admin).await?;
            let wallet = self.find_wallet(&db_tx, wallet_id).await?;
            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum, COUNT(*) AS entries \
                 FROM transactions WHERE wallet_id = ?",
                vec![wallet_id.to_string().into()],
            );
            let row = db_tx.query_one(stmt).await?;
            let (sum, entries): (i64, i64) = match row {
                Some(row) => (row.try_get("", "sum")?, row.try_get("", "entries")?),
                None => (0, 0),
            };
            let report = Reconciliation {
                wallet_id,
                balance: wallet.balance,
                ledger_sum: Money::new(sum),
                entries: u64::try_from(entries).unwrap_or_default(),
            };
            if !report.is_consistent() {
                tracing::warn!(
                    "wallet {wallet_id} balance {} differs from ledger sum {}",
                    report.balance,
                    report.ledger_sum
                );
            }
            Ok(report)
        })
    }
}
