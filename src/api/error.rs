use std::fmt::Display;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::engine::error::EngineError;

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InvalidRange { .. } | EngineError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            EngineError::LeaveCapExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::ConfirmationRequired { .. }
            | EngineError::AlreadyClockedIn { .. }
            | EngineError::NotClockedIn
            | EngineError::StaleState { .. } => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

/// Logs `e` and hides it behind a generic 500, the way every handler treats
/// database failures.
pub fn internal_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> actix_web::Error {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    }
}

pub fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": message }))
}
