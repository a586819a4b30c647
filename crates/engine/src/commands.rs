//! Command structs for engine operations.
//!
//! Write operations take a command instead of a long argument list. The
//! caller is always an `Option<Uuid>`: `None` means the request carried no
//! authenticated identity.

use uuid::Uuid;

use crate::{Money, Role, TransactionKind};

/// Deposit into or withdraw from a wallet on behalf of its owner.
#[derive(Clone, Debug)]
pub struct LedgerCmd {
    pub caller: Option<Uuid>,
    pub wallet_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub description: Option<String>,
    /// Withdrawals are refused unless the operator confirmed them.
    pub confirmed: bool,
}

impl LedgerCmd {
    #[must_use]
    pub fn new(caller: Option<Uuid>, wallet_id: Uuid, kind: TransactionKind, amount: Money) -> Self {
        Self {
            caller,
            wallet_id,
            kind,
            amount,
            description: None,
            confirmed: false,
        }
    }

    #[must_use]
    pub fn deposit(caller: Option<Uuid>, wallet_id: Uuid, amount: Money) -> Self {
        Self::new(caller, wallet_id, TransactionKind::Deposit, amount)
    }

    #[must_use]
    pub fn withdrawal(caller: Option<Uuid>, wallet_id: Uuid, amount: Money) -> Self {
        Self::new(caller, wallet_id, TransactionKind::Withdrawal, amount)
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }
}

/// Remove a user and everything that references it.
#[derive(Clone, Debug)]
pub struct PurgeCmd {
    pub caller: Option<Uuid>,
    pub user_id: Uuid,
    pub confirmed: bool,
}

impl PurgeCmd {
    #[must_use]
    pub fn new(caller: Option<Uuid>, user_id: Uuid) -> Self {
        Self {
            caller,
            user_id,
            confirmed: false,
        }
    }

    #[must_use]
    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }
}

/// Register a user: auth identity, profile and an empty wallet.
#[derive(Clone, Debug)]
pub struct CreateUserCmd {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl CreateUserCmd {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            username: username.into(),
            full_name: None,
            role: Role::default(),
        }
    }

    #[must_use]
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// A service offering, as submitted by its provider.
#[derive(Clone, Debug)]
pub struct ServiceNew {
    pub title: String,
    pub description: Option<String>,
    pub service_type: String,
    pub price: Money,
    pub images: Vec<String>,
    pub duration_hours: Option<i32>,
    pub max_capacity: Option<i32>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
}

impl ServiceNew {
    #[must_use]
    pub fn new(title: impl Into<String>, price: Money) -> Self {
        Self {
            title: title.into(),
            description: None,
            service_type: "experience".to_string(),
            price,
            images: Vec::new(),
            duration_hours: None,
            max_capacity: None,
            location_name: None,
            location_address: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    #[must_use]
    pub fn location(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self.location_address = Some(address.into());
        self
    }
}
