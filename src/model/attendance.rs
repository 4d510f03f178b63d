use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClockKind {
    In,
    Out,
}

/// One clock-in or clock-out. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub employee_id: u64,
    pub occurred_at: NaiveDateTime,
    pub kind: ClockKind,
}

impl ClockEvent {
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date()
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ClockEventRow {
    pub employee_id: u64,
    pub occurred_at: NaiveDateTime,
    pub kind: String,
}

impl ClockEventRow {
    /// `None` for rows whose kind is neither `in` nor `out`.
    pub fn into_event(self) -> Option<ClockEvent> {
        let kind = self.kind.parse().ok()?;
        Some(ClockEvent {
            employee_id: self.employee_id,
            occurred_at: self.occurred_at,
            kind,
        })
    }
}

/// Something odd in historical clock data that was skipped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    UnmatchedClockOut {
        #[schema(value_type = String, format = "date-time")]
        at: NaiveDateTime,
    },
    DuplicateClockIn {
        #[schema(value_type = String, format = "date-time")]
        at: NaiveDateTime,
    },
}

/// Derived view of one employee's day. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceDay {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "7.00", value_type = String)]
    pub total_hours: Decimal,
    pub is_present: bool,
    pub open_session: bool,
    pub warnings: Vec<DataQualityWarning>,
}
