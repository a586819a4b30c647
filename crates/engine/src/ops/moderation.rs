use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Role,
    content::{post_comments, post_likes, posts},
};

use super::{Engine, with_tx};

/// Deletes the comments and likes on `post_ids`. The posts themselves stay.
pub(super) async fn delete_post_interactions(
    db_tx: &DatabaseTransaction,
    post_ids: Vec<String>,
) -> ResultEngine<u64> {
    if post_ids.is_empty() {
        return Ok(0);
    }
    let comments = post_comments::Entity::delete_many()
        .filter(post_comments::Column::PostId.is_in(post_ids.clone()))
        .exec(db_tx)
        .await?
        .rows_affected;
    let likes = post_likes::Entity::delete_many()
        .filter(post_likes::Column::PostId.is_in(post_ids))
        .exec(db_tx)
        .await?
        .rows_affected;
    Ok(comments + likes)
}

impl Engine {
    /// Removes a post with its comments and likes. Returns the rows deleted.
    pub async fn delete_post(&self, caller: Option<Uuid>, post_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let admin = self.require_role(&db_tx, caller, Role::Admin).await?;
            let id = post_id.to_string();
            posts::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("post not exists".to_string()))?;

            let mut rows = delete_post_interactions(&db_tx, vec![id.clone()]).await?;
            rows += posts::Entity::delete_by_id(id)
                .exec(&db_tx)
                .await?
                .rows_affected;
            tracing::info!("{} deleted post {post_id} ({rows} rows)", admin.username);
            Ok(rows)
        })
    }
}
