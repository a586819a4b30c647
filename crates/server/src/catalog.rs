//! Provider services and traveler bookings.

use api_types::catalog::{BookingNew, BookingStatusUpdate, BookingView, ServiceNew, ServiceView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Booking, BookingStatus, Money, Profile, Service};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn service_view(service: Service) -> ServiceView {
    ServiceView {
        id: service.id,
        provider_id: service.provider_id,
        title: service.title,
        description: service.description,
        service_type: service.service_type,
        price_minor: service.price.minor(),
        available: service.available,
        images: service.images,
        location_name: service.location_name,
        created_at: service.created_at,
    }
}

fn booking_view(booking: Booking) -> BookingView {
    BookingView {
        id: booking.id,
        user_id: booking.user_id,
        service_id: booking.service_id,
        status: booking.status.as_str().to_string(),
        total_price_minor: booking.total_price.map(Money::minor),
        created_at: booking.created_at,
    }
}

pub async fn service_new(
    Extension(provider): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<ServiceNew>,
) -> Result<(StatusCode, Json<ServiceView>), ServerError> {
    let mut service = engine::ServiceNew::new(payload.title, Money::new(payload.price_minor));
    if let Some(description) = payload.description {
        service = service.description(description);
    }
    if let Some(service_type) = payload.service_type {
        service = service.service_type(service_type);
    }
    service.images = payload.images;
    service.duration_hours = payload.duration_hours;
    service.max_capacity = payload.max_capacity;
    service.location_name = payload.location_name;
    service.location_address = payload.location_address;

    let created = state
        .engine
        .create_service(Some(provider.id), service)
        .await?;
    Ok((StatusCode::CREATED, Json(service_view(created))))
}

pub async fn booking_new(
    Extension(traveler): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<BookingNew>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .book_service(Some(traveler.id), payload.service_id)
        .await?;
    Ok((StatusCode::CREATED, Json(booking_view(booking))))
}

pub async fn booking_update(
    Extension(provider): Extension<Profile>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<BookingStatusUpdate>,
) -> Result<Json<BookingView>, ServerError> {
    let status = BookingStatus::try_from(payload.status.as_str())?;
    let booking = state
        .engine
        .update_booking_status(Some(provider.id), booking_id, status)
        .await?;
    Ok(Json(booking_view(booking)))
}
