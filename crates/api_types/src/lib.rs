use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod session {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LandingQuery {
        /// `es`, `en` or `zh`; anything else falls back to `es`.
        pub locale: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Landing {
        pub path: String,
        pub role: String,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub email: String,
        pub password: String,
        pub username: String,
        pub full_name: Option<String>,
        /// Defaults to `traveler`.
        pub role: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerificationUpdate {
        pub verified: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordReset {
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub full_name: Option<String>,
        pub role: String,
        pub is_verified: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeletionImpact {
        pub user_id: Uuid,
        pub username: String,
        pub wallet_balance_minor: i64,
        pub currency: String,
        pub services: u64,
        pub active_bookings_as_provider: u64,
        pub bookings_as_traveler: u64,
        pub posts: u64,
        pub can_delete: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PurgeQuery {
        /// Must be `true`, deletion cannot be undone.
        #[serde(default)]
        pub confirm: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurgeResult {
        pub user_id: Uuid,
        pub rows_deleted: u64,
        /// Optional cleanups that were skipped.
        pub skipped: Vec<String>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Deposit,
        Withdrawal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub balance_minor: i64,
        pub currency: String,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        /// Positive amount in minor units (cents).
        pub amount_minor: i64,
        pub description: Option<String>,
        /// Required for withdrawals.
        #[serde(default)]
        pub confirmed: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub wallet_id: Uuid,
        pub kind: TransactionKind,
        /// Signed: negative for withdrawals.
        pub amount_minor: i64,
        pub description: String,
        pub reference_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Reconciliation {
        pub wallet_id: Uuid,
        pub balance_minor: i64,
        pub ledger_sum_minor: i64,
        pub entries: u64,
        pub consistent: bool,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceNew {
        pub title: String,
        pub description: Option<String>,
        pub service_type: Option<String>,
        pub price_minor: i64,
        #[serde(default)]
        pub images: Vec<String>,
        pub duration_hours: Option<i32>,
        pub max_capacity: Option<i32>,
        pub location_name: Option<String>,
        pub location_address: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceView {
        pub id: Uuid,
        pub provider_id: Uuid,
        pub title: String,
        pub description: Option<String>,
        pub service_type: String,
        pub price_minor: i64,
        pub available: bool,
        pub images: Vec<String>,
        pub location_name: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub service_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingStatusUpdate {
        /// `pending`, `confirmed`, `cancelled` or `completed`.
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingView {
        pub id: Uuid,
        pub user_id: Option<Uuid>,
        pub service_id: Option<Uuid>,
        pub status: String,
        pub total_price_minor: Option<i64>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod content {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PostDeleted {
        pub post_id: Uuid,
        /// The post plus its comments and likes.
        pub rows_deleted: u64,
    }
}
