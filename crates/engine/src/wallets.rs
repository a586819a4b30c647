//! The module contains `Wallet` struct and its table.
//!
//! Every profile owns exactly one wallet. Its balance changes only through
//! the ledger operations, which append a transaction for every change.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Money,
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: Uuid, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Money::ZERO,
            currency,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub balance: i64,
    pub currency_code: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::UserId",
        to = "super::profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Profile,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            balance: ActiveValue::Set(value.balance.minor()),
            currency_code: ActiveValue::Set(value.currency.code().to_string()),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id, "wallet")?,
            user_id: parse_id(&model.user_id, "profile")?,
            balance: Money::new(model.balance),
            currency: Currency::try_from(model.currency_code.as_str())?,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wallet_is_empty() {
        let owner = Uuid::new_v4();
        let wallet = Wallet::new(owner, Currency::Axo);
        assert_eq!(wallet.user_id, owner);
        assert_eq!(wallet.balance, Money::ZERO);
        assert_eq!(wallet.currency, Currency::Axo);
    }

    #[test]
    fn model_round_trip_keeps_balance() {
        let wallet = Wallet::new(Uuid::new_v4(), Currency::Axo);
        let model = Model {
            id: wallet.id.to_string(),
            user_id: wallet.user_id.to_string(),
            balance: 10_000,
            currency_code: "AXO".to_string(),
            updated_at: wallet.updated_at,
        };
        let back = Wallet::try_from(model).unwrap();
        assert_eq!(back.balance, Money::new(10_000));
        assert_eq!(back.id, wallet.id);
    }

    #[test]
    fn model_with_unknown_currency_is_rejected() {
        let model = Model {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            balance: 0,
            currency_code: "EUR".to_string(),
            updated_at: Utc::now(),
        };
        assert!(Wallet::try_from(model).is_err());
    }
}
