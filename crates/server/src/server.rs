use axum::{
    Extension, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{ServerError, catalog, content, session, users, wallets};
use engine::{Area, Engine, EngineError, Profile};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves Basic credentials (email, password) to a profile through the
/// identity provider and stores it in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(EngineError::Unauthorized("missing credentials".to_string()).into());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(EngineError::Unauthorized("missing credentials".to_string()).into());
    }

    let profile = state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await?;

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

async fn gate(
    state: &ServerState,
    profile: &Profile,
    area: Area,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    state.engine.authorize_area(Some(profile.id), area).await?;
    Ok(next.run(request).await)
}

async fn admin_area(
    State(state): State<ServerState>,
    Extension(profile): Extension<Profile>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    gate(&state, &profile, Area::Admin, request, next).await
}

async fn provider_area(
    State(state): State<ServerState>,
    Extension(profile): Extension<Profile>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    gate(&state, &profile, Area::Provider, request, next).await
}

async fn traveler_area(
    State(state): State<ServerState>,
    Extension(profile): Extension<Profile>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    gate(&state, &profile, Area::Traveler, request, next).await
}

pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    let admin = Router::new()
        .route("/users", post(users::user_new))
        .route("/users/{id}", delete(users::purge))
        .route("/users/{id}/role", patch(users::role_update))
        .route("/users/{id}/verification", patch(users::verification_update))
        .route("/users/{id}/password", put(users::password_reset))
        .route("/users/{id}/deletion-impact", get(users::deletion_impact))
        .route("/users/{id}/wallet", get(wallets::wallet_for_user))
        .route(
            "/wallets/{id}/transactions",
            post(wallets::transaction_new).get(wallets::transaction_list),
        )
        .route("/wallets/{id}/reconciliation", get(wallets::reconciliation))
        .route("/posts/{id}", delete(content::post_delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_area));

    let provider = Router::new()
        .route("/services", post(catalog::service_new))
        .route("/bookings/{id}", patch(catalog::booking_update))
        .route_layer(middleware::from_fn_with_state(state.clone(), provider_area));

    let traveler = Router::new()
        .route("/bookings", post(catalog::booking_new))
        .route_layer(middleware::from_fn_with_state(state.clone(), traveler_area));

    Router::new()
        .route("/session/landing", get(session::landing))
        .nest("/admin", admin)
        .nest("/provider", provider)
        .nest("/traveler", traveler)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine)).await
}
