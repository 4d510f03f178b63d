use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use rust_decimal::Decimal;

use crate::model::leave_request::LeaveStatus;

/// Every failure the accounting engine can report.
///
/// None of these are fatal: each one maps to a user-visible message at the
/// HTTP boundary (see `api::error`).
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EngineError {
    #[display(fmt = "start date {} is after end date {}", start, end)]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[display(
        fmt = "cannot request {} working days, only {} days remaining",
        requested,
        remaining
    )]
    LeaveCapExceeded { requested: Decimal, remaining: Decimal },

    #[display(
        fmt = "this will use {} working days of your {} remaining days, confirmation required",
        requested,
        remaining
    )]
    ConfirmationRequired { requested: Decimal, remaining: Decimal },

    #[display(fmt = "already clocked in since {}", since)]
    AlreadyClockedIn { since: NaiveDateTime },

    #[display(fmt = "not clocked in")]
    NotClockedIn,

    #[display(fmt = "leave request is already {}", current)]
    StaleState { current: LeaveStatus },

    #[display(fmt = "{}", reason)]
    InvalidRequest { reason: String },
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidRange { .. } => "invalid_range",
            EngineError::LeaveCapExceeded { .. } => "leave_cap_exceeded",
            EngineError::ConfirmationRequired { .. } => "confirmation_required",
            EngineError::AlreadyClockedIn { .. } => "already_clocked_in",
            EngineError::NotClockedIn => "not_clocked_in",
            EngineError::StaleState { .. } => "stale_state",
            EngineError::InvalidRequest { .. } => "invalid_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn messages_are_user_facing() {
        let err = EngineError::LeaveCapExceeded {
            requested: dec!(3),
            remaining: dec!(1.5),
        };
        assert_eq!(
            err.to_string(),
            "cannot request 3 working days, only 1.5 days remaining"
        );
        assert_eq!(err.code(), "leave_cap_exceeded");

        let err = EngineError::StaleState {
            current: LeaveStatus::Rejected,
        };
        assert_eq!(err.to_string(), "leave request is already rejected");
    }
}
