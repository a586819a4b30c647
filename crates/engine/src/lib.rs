//! Marketplace core: wallet ledger, account purge and role policy.
//!
//! Every operation lives on [`Engine`], which owns the database connection
//! and the [`IdentityProvider`]. Authorization is checked by the engine
//! itself; the database is not trusted to enforce anything.

use uuid::Uuid;

pub use bookings::{Booking, BookingStatus};
pub use commands::{CreateUserCmd, LedgerCmd, PurgeCmd, ServiceNew};
pub use currency::Currency;
pub use error::EngineError;
pub use identity::{IdentityProvider, StoredIdentities};
pub use money::Money;
pub use ops::{DeletionImpact, Engine, EngineBuilder, PurgeReport, Reconciliation};
pub use profiles::Profile;
pub use roles::{Area, Locale, Role, is_authorized, landing_path};
pub use services::Service;
pub use transactions::{Transaction, TransactionKind};
pub use wallets::Wallet;

mod bookings;
mod commands;
mod community;
mod content;
mod currency;
mod error;
mod identity;
mod money;
mod ops;
mod profiles;
mod roles;
mod services;
mod transactions;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;

pub(crate) fn parse_id(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidInput(format!("invalid {label} id")))
}
