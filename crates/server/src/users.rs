//! Admin user management: registration, role and verification changes,
//! deletion impact and purge.

use api_types::user::{
    DeletionImpact, PasswordReset, PurgeQuery, PurgeResult, RoleUpdate, UserNew, UserView,
    VerificationUpdate,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateUserCmd, Profile, PurgeCmd, Role};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn user_view(profile: Profile) -> UserView {
    let role = profile.role_name().to_string();
    UserView {
        id: profile.id,
        username: profile.username,
        full_name: profile.full_name,
        role,
        is_verified: profile.is_verified,
        created_at: profile.created_at,
    }
}

pub async fn user_new(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let role = match payload.role.as_deref() {
        Some(raw) => Role::try_from(raw)?,
        None => Role::default(),
    };
    let mut cmd = CreateUserCmd::new(payload.email, payload.password, payload.username).role(role);
    if let Some(full_name) = payload.full_name {
        cmd = cmd.full_name(full_name);
    }

    let profile = state.engine.create_user(Some(admin.id), cmd).await?;
    Ok((StatusCode::CREATED, Json(user_view(profile))))
}

pub async fn role_update(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let role = Role::try_from(payload.role.as_str())?;
    let profile = state
        .engine
        .update_user_role(Some(admin.id), user_id, role)
        .await?;
    Ok(Json(user_view(profile)))
}

pub async fn verification_update(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<VerificationUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let profile = state
        .engine
        .set_verified(Some(admin.id), user_id, payload.verified)
        .await?;
    Ok(Json(user_view(profile)))
}

pub async fn password_reset(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PasswordReset>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .reset_password(Some(admin.id), user_id, &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deletion_impact(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DeletionImpact>, ServerError> {
    let impact = state
        .engine
        .deletion_impact(Some(admin.id), user_id)
        .await?;
    Ok(Json(DeletionImpact {
        user_id: impact.user_id,
        username: impact.username,
        wallet_balance_minor: impact.wallet_balance.minor(),
        currency: impact.currency.code().to_string(),
        services: impact.services,
        active_bookings_as_provider: impact.active_bookings_as_provider,
        bookings_as_traveler: impact.bookings_as_traveler,
        posts: impact.posts,
        can_delete: impact.can_delete,
    }))
}

/// `DELETE /admin/users/{id}?confirm=true`
pub async fn purge(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResult>, ServerError> {
    let report = state
        .engine
        .purge_user(PurgeCmd::new(Some(admin.id), user_id).confirmed(query.confirm))
        .await?;
    Ok(Json(PurgeResult {
        user_id: report.impact.user_id,
        rows_deleted: report.rows_deleted,
        skipped: report.skipped,
    }))
}
