use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run_with_listener};

mod catalog;
mod content;
mod server;
mod session;
mod users;
mod wallets;

pub struct ServerError(EngineError);

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        EngineError::ProfileNotFound(_)
        | EngineError::WalletNotFound(_)
        | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::HasActiveCommitments(_)
        | EngineError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
        EngineError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
        EngineError::InvalidAmount(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidStatus(_)
        | EngineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::LedgerInconsistent(_)
        | EngineError::PurgeIncomplete(_)
        | EngineError::Identity(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::StoreUnavailable(cause) => {
            tracing::error!("store unavailable: {cause}");
            "service unavailable".to_string()
        }
        EngineError::Identity(cause) => {
            tracing::error!("identity provider error: {cause}");
            "internal server error".to_string()
        }
        // Needs manual reconciliation.
        other @ (EngineError::LedgerInconsistent(_) | EngineError::PurgeIncomplete(_)) => {
            tracing::error!("{other}");
            other.to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        let error = message_for_engine_error(self.0);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn auth_errors_are_distinct() {
        assert_eq!(
            status_of(EngineError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(EngineError::InsufficientPermissions("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(EngineError::ProfileNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn refused_operations_map_to_4xx() {
        assert_eq!(
            status_of(EngineError::InsufficientFunds("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(EngineError::HasActiveCommitments("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::ConfirmationRequired("x".to_string())),
            StatusCode::PRECONDITION_REQUIRED
        );
    }

    #[test]
    fn partial_writes_map_to_500() {
        assert_eq!(
            status_of(EngineError::LedgerInconsistent("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(EngineError::PurgeIncomplete("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_outage_maps_to_503() {
        assert_eq!(
            status_of(EngineError::StoreUnavailable("pool timed out".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
