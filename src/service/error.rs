use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{
    model::session::{SessionKind, SessionState},
    store::StoreError,
};

/// Why a lifecycle operation did not happen. The session is left exactly as
/// it was in every case.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("admin only")]
    Forbidden,

    #[error("no {0} scheduled for today")]
    NoSessionToday(SessionKind),

    #[error("session not found")]
    SessionNotFound,

    #[error("cannot {action} a session that is {state}")]
    InvalidTransition { state: SessionState, action: &'static str },

    #[error("session can only start at or after {scheduled_at}")]
    NotYetStartable { scheduled_at: DateTime<Utc> },

    #[error("no employees to take attendance for")]
    NoEmployees,

    #[error("a {0} is already scheduled on {1}")]
    AlreadyScheduled(SessionKind, NaiveDate),

    #[error("employee {0} not found")]
    EmployeeNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::WriteConflict(_) => StatusCode::CONFLICT,
            StoreError::TransientIo(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // store internals stay in the logs
        let message = match self {
            StoreError::NotFound => "Not found",
            StoreError::WriteConflict(_) => "Conflicting record already exists",
            StoreError::TransientIo(_) => "Service temporarily unavailable",
            StoreError::DataCorruption(_) => "Internal Server Error",
        };
        error!(error = %self, "Store operation failed");

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

impl ResponseError for LifecycleError {
    fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::Forbidden => StatusCode::FORBIDDEN,
            LifecycleError::NoSessionToday(_) | LifecycleError::SessionNotFound | LifecycleError::EmployeeNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LifecycleError::InvalidTransition { .. } | LifecycleError::AlreadyScheduled(..) => StatusCode::CONFLICT,
            LifecycleError::NotYetStartable { .. } | LifecycleError::NoEmployees => StatusCode::BAD_REQUEST,
            LifecycleError::Store(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            LifecycleError::Store(e) => e.error_response(),
            other => HttpResponse::build(self.status_code()).json(json!({ "message": other.to_string() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(LifecycleError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            LifecycleError::NoSessionToday(SessionKind::Standup).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LifecycleError::InvalidTransition {
                state: SessionState::Completed,
                action: "toggle"
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LifecycleError::Store(StoreError::TransientIo("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn transition_message_names_state_and_action() {
        let err = LifecycleError::InvalidTransition {
            state: SessionState::Completed,
            action: "toggle",
        };
        assert_eq!(err.to_string(), "cannot toggle a session that is Completed");
    }
}
