use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Booking, BookingStatus, EngineError, ResultEngine, Role, Service, ServiceNew, bookings,
    services,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Publishes a service owned by the calling provider.
    pub async fn create_service(
        &self,
        caller: Option<Uuid>,
        service: ServiceNew,
    ) -> ResultEngine<Service> {
        with_tx!(self, |db_tx| {
            let provider = self.require_role(&db_tx, caller, Role::Provider).await?;
            let title = normalize_required_text(&service.title, "title")?;
            let service_type = normalize_required_text(&service.service_type, "service type")?;
            if !service.price.is_positive() {
                return Err(EngineError::InvalidAmount(
                    "price must be positive".to_string(),
                ));
            }
            let images = serde_json::to_string(&service.images)
                .map_err(|err| EngineError::InvalidInput(format!("invalid images: {err}")))?;

            let model = services::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                provider_id: ActiveValue::Set(provider.id.to_string()),
                title: ActiveValue::Set(title),
                description: ActiveValue::Set(normalize_optional_text(
                    service.description.as_deref(),
                )),
                service_type: ActiveValue::Set(service_type),
                price_minor: ActiveValue::Set(service.price.minor()),
                available: ActiveValue::Set(true),
                images: ActiveValue::Set(Some(images)),
                duration_hours: ActiveValue::Set(service.duration_hours),
                max_capacity: ActiveValue::Set(service.max_capacity),
                location_name: ActiveValue::Set(normalize_optional_text(
                    service.location_name.as_deref(),
                )),
                location_address: ActiveValue::Set(normalize_optional_text(
                    service.location_address.as_deref(),
                )),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("{} published service {}", provider.username, model.title);
            Service::try_from(model)
        })
    }

    /// Books an available service for the calling traveler at its current
    /// price. The booking starts `pending`.
    pub async fn book_service(
        &self,
        caller: Option<Uuid>,
        service_id: Uuid,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            let traveler = self.require_role(&db_tx, caller, Role::Traveler).await?;
            let service = services::Entity::find_by_id(service_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;
            if !service.available {
                return Err(EngineError::InvalidInput(format!(
                    "service {} is not available",
                    service.title
                )));
            }

            let model = bookings::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(Some(traveler.id.to_string())),
                service_id: ActiveValue::Set(Some(service.id)),
                status: ActiveValue::Set(BookingStatus::Pending.as_str().to_string()),
                total_price_minor: ActiveValue::Set(Some(service.price_minor)),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("{} booked {}", traveler.username, service.title);
            Booking::try_from(model)
        })
    }

    /// Moves a booking on one of the caller's services to `status`.
    pub async fn update_booking_status(
        &self,
        caller: Option<Uuid>,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            let provider = self.require_role(&db_tx, caller, Role::Provider).await?;
            let (booking, service) = bookings::Entity::find_by_id(booking_id.to_string())
                .find_also_related(services::Entity)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
            let owns_service = service
                .as_ref()
                .is_some_and(|service| service.provider_id == provider.id.to_string());
            if !owns_service {
                return Err(EngineError::InsufficientPermissions(
                    "booking is not on one of your services".to_string(),
                ));
            }

            bookings::Entity::update_many()
                .col_expr(bookings::Column::Status, Expr::value(status.as_str()))
                .filter(bookings::Column::Id.eq(booking.id.clone()))
                .exec(&db_tx)
                .await?;
            tracing::info!(
                "{} moved booking {} from {} to {}",
                provider.username,
                booking.id,
                booking.status,
                status.as_str()
            );
            let mut booking = Booking::try_from(booking)?;
            booking.status = status;
            Ok(booking)
        })
    }
}
