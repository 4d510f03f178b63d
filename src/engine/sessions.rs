use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::error::EngineError;
use crate::model::attendance::{AttendanceDay, ClockEvent, ClockKind, DataQualityWarning};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyTotal {
    #[schema(example = "7.00", value_type = String)]
    pub total_hours: Decimal,
    pub is_present: bool,
    pub open_session: bool,
    pub warnings: Vec<DataQualityWarning>,
}

/// Pairs in/out events chronologically and sums completed sessions.
///
/// A trailing `in` marks the day as having an open session but adds no hours.
/// An `out` without an open session, or a second `in` while one is already
/// open, is skipped and reported as a warning.
pub fn daily_total(events: &[ClockEvent]) -> DailyTotal {
    let mut ordered: Vec<&ClockEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.occurred_at);

    let mut seconds: i64 = 0;
    let mut open: Option<NaiveDateTime> = None;
    let mut warnings = Vec::new();

    for event in &ordered {
        match (event.kind, open) {
            (ClockKind::In, None) => open = Some(event.occurred_at),
            (ClockKind::In, Some(_)) => {
                warnings.push(DataQualityWarning::DuplicateClockIn {
                    at: event.occurred_at,
                });
            }
            (ClockKind::Out, Some(since)) => {
                seconds += (event.occurred_at - since).num_seconds();
                open = None;
            }
            (ClockKind::Out, None) => {
                warnings.push(DataQualityWarning::UnmatchedClockOut {
                    at: event.occurred_at,
                });
            }
        }
    }

    let total_hours =
        (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR)).round_dp(2);

    DailyTotal {
        total_hours,
        is_present: !ordered.is_empty(),
        open_session: open.is_some(),
        warnings,
    }
}

/// One [`AttendanceDay`] per calendar date that has at least one event.
pub fn attendance_days(employee_id: u64, events: &[ClockEvent]) -> Vec<AttendanceDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<ClockEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.employee_id == employee_id) {
        by_date.entry(event.date()).or_default().push(event.clone());
    }

    by_date
        .into_iter()
        .map(|(date, day_events)| {
            let total = daily_total(&day_events);
            AttendanceDay {
                employee_id,
                date,
                total_hours: total.total_hours,
                is_present: total.is_present,
                open_session: total.open_session,
                warnings: total.warnings,
            }
        })
        .collect()
}

/// Where one employee stands for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotClockedIn,
    ClockedIn {
        since: NaiveDateTime,
    },
    ClockedOut,
}

impl SessionState {
    /// Replays the day's events, skipping the same malformed entries
    /// [`daily_total`] skips.
    pub fn from_events(events: &[ClockEvent]) -> Self {
        let mut ordered: Vec<&ClockEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.occurred_at);

        ordered
            .into_iter()
            .fold(SessionState::NotClockedIn, |state, event| match event.kind {
                ClockKind::In => state.clock_in(event.occurred_at).unwrap_or(state),
                ClockKind::Out => state.clock_out(event.occurred_at).unwrap_or(state),
            })
    }

    pub fn clock_in(self, at: NaiveDateTime) -> Result<Self, EngineError> {
        match self {
            SessionState::NotClockedIn | SessionState::ClockedOut => {
                Ok(SessionState::ClockedIn { since: at })
            }
            SessionState::ClockedIn { since } => Err(EngineError::AlreadyClockedIn { since }),
        }
    }

    pub fn clock_out(self, at: NaiveDateTime) -> Result<Self, EngineError> {
        match self {
            SessionState::ClockedIn { since } if at >= since => Ok(SessionState::ClockedOut),
            SessionState::ClockedIn { .. } => Err(EngineError::invalid(
                "clock-out cannot be earlier than clock-in",
            )),
            _ => Err(EngineError::NotClockedIn),
        }
    }
}
