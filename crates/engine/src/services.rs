//! Offerings published by providers.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, parse_id};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub service_type: String,
    pub price: Money,
    pub available: bool,
    pub images: Vec<String>,
    pub duration_hours: Option<i32>,
    pub max_capacity: Option<i32>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub provider_id: String,
    pub title: String,
    pub description: Option<String>,
    pub service_type: String,
    pub price_minor: i64,
    pub available: bool,
    /// JSON array of image URLs.
    pub images: Option<String>,
    pub duration_hours: Option<i32>,
    pub max_capacity: Option<i32>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Service {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let images = match model.images.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|err| EngineError::InvalidInput(format!("invalid images: {err}")))?,
            None => Vec::new(),
        };
        Ok(Self {
            id: parse_id(&model.id, "service")?,
            provider_id: parse_id(&model.provider_id, "profile")?,
            title: model.title,
            description: model.description,
            service_type: model.service_type,
            price: Money::new(model.price_minor),
            available: model.available,
            images,
            duration_hours: model.duration_hours,
            max_capacity: model.max_capacity,
            location_name: model.location_name,
            location_address: model.location_address,
            created_at: model.created_at,
        })
    }
}
