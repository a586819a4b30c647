//! Content moderation.

use api_types::content::PostDeleted;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::Profile;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn post_delete(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostDeleted>, ServerError> {
    let rows_deleted = state.engine.delete_post(Some(admin.id), post_id).await?;
    Ok(Json(PostDeleted {
        post_id,
        rows_deleted,
    }))
}
