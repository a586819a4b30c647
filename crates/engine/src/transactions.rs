//! Ledger entries.
//!
//! A `Transaction` records one signed change of a wallet balance. Rows are
//! only ever inserted; they disappear solely when the owning account is
//! purged.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, parse_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    /// Signed effect of an `amount` of this kind on the balance.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Self::Deposit => amount,
            Self::Withdrawal => -amount,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: TransactionKind,
    /// Signed: positive for deposits, negative for withdrawals.
    pub amount: Money,
    /// Profile that initiated the entry.
    pub reference_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a ledger entry for a positive `amount`.
    ///
    /// Without a description the entry reads `Admin <kind>: <amount> <currency>`.
    pub fn new(
        wallet_id: Uuid,
        kind: TransactionKind,
        amount: Money,
        currency: Currency,
        description: Option<&str>,
        reference_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }
        let description = description
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("Admin {}: {amount} {currency}", kind.as_str()));

        Ok(Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount: kind.signed(amount),
            reference_id,
            description,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub amount_minor: i64,
    pub kind: String,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallet,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            reference_id: ActiveValue::Set(tx.reference_id.map(|id| id.to_string())),
            description: ActiveValue::Set(Some(tx.description.clone())),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id, "transaction")?,
            wallet_id: parse_id(&model.wallet_id, "wallet")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            reference_id: model
                .reference_id
                .as_deref()
                .map(|id| parse_id(id, "profile"))
                .transpose()?,
            description: model.description.unwrap_or_default(),
            created_at: model.created_at,
        })
    }
}
