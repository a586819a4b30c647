//! Profiles: the marketplace identity of a person.
//!
//! The profile id is the id of the auth identity it belongs to.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Role, parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    /// `None` when the stored role is missing or not a known role.
    pub role: Option<Role>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn role_name(&self) -> &'static str {
        self.role.map_or("none", Role::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::wallets::Entity")]
    Wallet,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Profile {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id, "profile")?,
            role: Role::try_from(model.role.as_str()).ok(),
            username: model.username,
            full_name: model.full_name,
            is_verified: model.is_verified,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(role: &str) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4().to_string(),
            username: "lucia".to_string(),
            full_name: None,
            role: role.to_string(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn known_role_is_kept() {
        let profile = Profile::try_from(model("provider")).unwrap();
        assert!(profile.has_role(Role::Provider));
        assert_eq!(profile.role_name(), "provider");
    }

    #[test]
    fn unknown_role_still_loads() {
        let profile = Profile::try_from(model("superuser")).unwrap();
        assert_eq!(profile.role, None);
        assert!(!profile.has_role(Role::Admin));
        assert_eq!(profile.role_name(), "none");
    }
}
