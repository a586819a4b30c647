//! Post-login redirect.

use api_types::session::{Landing, LandingQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{Locale, Profile};

use crate::{ServerError, server::ServerState};

/// Where the authenticated user should be sent, for the requested locale.
pub async fn landing(
    Extension(profile): Extension<Profile>,
    State(state): State<ServerState>,
    Query(query): Query<LandingQuery>,
) -> Result<Json<Landing>, ServerError> {
    let locale = Locale::parse_or_default(query.locale.as_deref());
    let path = state.engine.landing_for(Some(profile.id), locale).await?;
    Ok(Json(Landing {
        path,
        role: profile.role_name().to_string(),
    }))
}
