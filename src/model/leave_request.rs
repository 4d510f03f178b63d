use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::engine::error::EngineError;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    FullDay,
    HalfDay,
    Sick,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Wire tag for the half-day period, as stored in `half_day_period`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HalfDaySlot {
    Morning,
    Afternoon,
    Custom,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HalfDayPeriod {
    Morning,
    Afternoon,
    Custom { start: NaiveTime, end: NaiveTime },
}

impl HalfDayPeriod {
    pub fn slot(&self) -> HalfDaySlot {
        match self {
            HalfDayPeriod::Morning => HalfDaySlot::Morning,
            HalfDayPeriod::Afternoon => HalfDaySlot::Afternoon,
            HalfDayPeriod::Custom { .. } => HalfDaySlot::Custom,
        }
    }

    pub fn custom_times(&self) -> (Option<NaiveTime>, Option<NaiveTime>) {
        match self {
            HalfDayPeriod::Custom { start, end } => (Some(*start), Some(*end)),
            _ => (None, None),
        }
    }
}

/// What is being asked for. Each variant carries only the fields that make
/// sense for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveKind {
    FullDay {
        date: NaiveDate,
    },
    /// `period` is `None` only for stored rows whose period was never
    /// recorded or is unreadable.
    HalfDay {
        date: NaiveDate,
        period: Option<HalfDayPeriod>,
    },
    Sick {
        start: NaiveDate,
        end: NaiveDate,
        certificate: Option<String>,
    },
}

/// Flat shape of a leave request as it travels over the wire or sits in a row.
pub struct LeaveParts<'a> {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day_period: Option<HalfDaySlot>,
    pub custom_start_time: Option<NaiveTime>,
    pub custom_end_time: Option<NaiveTime>,
    pub document: Option<&'a str>,
}

impl LeaveKind {
    /// Builds and validates the variant for `parts.leave_type`.
    pub fn from_parts(parts: LeaveParts<'_>) -> Result<Self, EngineError> {
        let LeaveParts {
            leave_type,
            start_date,
            end_date,
            half_day_period,
            custom_start_time,
            custom_end_time,
            document,
        } = parts;

        if start_date > end_date {
            return Err(EngineError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        match leave_type {
            LeaveType::FullDay => {
                if start_date != end_date {
                    return Err(EngineError::invalid(
                        "full_day leave must start and end on the same date",
                    ));
                }
                Ok(LeaveKind::FullDay { date: start_date })
            }
            LeaveType::HalfDay => {
                if start_date != end_date {
                    return Err(EngineError::invalid(
                        "half_day leave must start and end on the same date",
                    ));
                }
                let period = match half_day_period {
                    Some(HalfDaySlot::Morning) => HalfDayPeriod::Morning,
                    Some(HalfDaySlot::Afternoon) => HalfDayPeriod::Afternoon,
                    Some(HalfDaySlot::Custom) => match (custom_start_time, custom_end_time) {
                        (Some(start), Some(end)) if start < end => {
                            HalfDayPeriod::Custom { start, end }
                        }
                        (Some(_), Some(_)) => {
                            return Err(EngineError::invalid(
                                "custom_start_time must be before custom_end_time",
                            ));
                        }
                        _ => {
                            return Err(EngineError::invalid(
                                "custom half day needs custom_start_time and custom_end_time",
                            ));
                        }
                    },
                    None => {
                        return Err(EngineError::invalid(
                            "half_day leave needs a half_day_period",
                        ));
                    }
                };
                Ok(LeaveKind::HalfDay {
                    date: start_date,
                    period: Some(period),
                })
            }
            LeaveType::Sick => Ok(LeaveKind::Sick {
                start: start_date,
                end: end_date,
                certificate: document.filter(|d| !d.is_empty()).map(str::to_owned),
            }),
        }
    }

    /// Rebuilds the variant for a stored row. Submission rules are not
    /// re-applied: the row is history and its frozen cost stays as it is.
    pub fn from_stored(parts: LeaveParts<'_>) -> Self {
        let LeaveParts {
            leave_type,
            start_date,
            end_date,
            half_day_period,
            custom_start_time,
            custom_end_time,
            document,
        } = parts;

        match leave_type {
            LeaveType::FullDay => LeaveKind::FullDay { date: start_date },
            LeaveType::HalfDay => {
                let period = match half_day_period {
                    Some(HalfDaySlot::Morning) => Some(HalfDayPeriod::Morning),
                    Some(HalfDaySlot::Afternoon) => Some(HalfDayPeriod::Afternoon),
                    Some(HalfDaySlot::Custom) => custom_start_time
                        .zip(custom_end_time)
                        .map(|(start, end)| HalfDayPeriod::Custom { start, end }),
                    None => None,
                };
                LeaveKind::HalfDay {
                    date: start_date,
                    period,
                }
            }
            LeaveType::Sick => LeaveKind::Sick {
                start: start_date,
                end: end_date.max(start_date),
                certificate: document.filter(|d| !d.is_empty()).map(str::to_owned),
            },
        }
    }

    pub fn leave_type(&self) -> LeaveType {
        match self {
            LeaveKind::FullDay { .. } => LeaveType::FullDay,
            LeaveKind::HalfDay { .. } => LeaveType::HalfDay,
            LeaveKind::Sick { .. } => LeaveType::Sick,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        match self {
            LeaveKind::FullDay { date } | LeaveKind::HalfDay { date, .. } => *date,
            LeaveKind::Sick { start, .. } => *start,
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        match self {
            LeaveKind::FullDay { date } | LeaveKind::HalfDay { date, .. } => *date,
            LeaveKind::Sick { end, .. } => *end,
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }

    pub fn half_day_period(&self) -> Option<HalfDayPeriod> {
        match self {
            LeaveKind::HalfDay { period, .. } => *period,
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&str> {
        match self {
            LeaveKind::Sick { certificate, .. } => certificate.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub kind: LeaveKind,
    pub reason: String,
    pub status: LeaveStatus,
    /// Cost in days, fixed when the request was submitted.
    pub requested_days: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<u64>,
}

/// Row shape of `leave_requests`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day_period: Option<String>,
    pub custom_start_time: Option<NaiveTime>,
    pub custom_end_time: Option<NaiveTime>,
    pub reason: String,
    pub document: Option<String>,
    pub status: String,
    pub requested_days: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<u64>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = EngineError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type: LeaveType = row
            .leave_type
            .parse()
            .map_err(|_| EngineError::invalid(format!("unknown leave type {}", row.leave_type)))?;
        let status: LeaveStatus = row
            .status
            .parse()
            .map_err(|_| EngineError::invalid(format!("unknown leave status {}", row.status)))?;
        // An unreadable period only loses the label, not the request.
        let half_day_period = row
            .half_day_period
            .as_deref()
            .and_then(|p| p.parse::<HalfDaySlot>().ok());

        let kind = LeaveKind::from_stored(LeaveParts {
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            half_day_period,
            custom_start_time: row.custom_start_time,
            custom_end_time: row.custom_end_time,
            document: row.document.as_deref(),
        });

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            kind,
            reason: row.reason,
            status,
            requested_days: row.requested_days,
            created_at: row.created_at,
            reviewed_by: row.reviewed_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parts(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveParts<'static> {
        LeaveParts {
            leave_type,
            start_date: start,
            end_date: end,
            half_day_period: None,
            custom_start_time: None,
            custom_end_time: None,
            document: None,
        }
    }

    #[test]
    fn wire_names_round_trip_through_strum() {
        let wire: &str = LeaveType::HalfDay.as_ref();
        assert_eq!(wire, "half_day");
        assert_eq!("full_day".parse::<LeaveType>().unwrap(), LeaveType::FullDay);
        assert_eq!(LeaveStatus::Approved.to_string(), "approved");
        assert!("cancelled".parse::<LeaveStatus>().is_err());
    }

    #[test]
    fn backwards_range_is_invalid() {
        let err = LeaveKind::from_parts(parts(LeaveType::Sick, date(2025, 3, 5), date(2025, 3, 3)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRange { .. }));
    }

    #[test]
    fn full_day_spans_exactly_one_date() {
        let day = date(2025, 3, 3);
        assert_eq!(
            LeaveKind::from_parts(parts(LeaveType::FullDay, day, day)).unwrap(),
            LeaveKind::FullDay { date: day }
        );
        let err = LeaveKind::from_parts(parts(LeaveType::FullDay, day, date(2025, 3, 4)))
            .unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn half_day_requires_a_period() {
        let day = date(2025, 3, 3);
        assert!(LeaveKind::from_parts(parts(LeaveType::HalfDay, day, day)).is_err());

        let mut custom = parts(LeaveType::HalfDay, day, day);
        custom.half_day_period = Some(HalfDaySlot::Custom);
        custom.custom_start_time = NaiveTime::from_hms_opt(14, 0, 0);
        custom.custom_end_time = NaiveTime::from_hms_opt(10, 0, 0);
        assert!(LeaveKind::from_parts(custom).is_err());

        let mut morning = parts(LeaveType::HalfDay, day, day);
        morning.half_day_period = Some(HalfDaySlot::Morning);
        let kind = LeaveKind::from_parts(morning).unwrap();
        assert_eq!(kind.half_day_period(), Some(HalfDayPeriod::Morning));
    }

    #[test]
    fn sick_keeps_its_certificate() {
        let mut sick = parts(LeaveType::Sick, date(2025, 3, 3), date(2025, 3, 7));
        sick.document = Some("uploads/cert.pdf");
        let kind = LeaveKind::from_parts(sick).unwrap();
        assert_eq!(kind.document(), Some("uploads/cert.pdf"));
        assert!(kind.covers(date(2025, 3, 5)));
        assert!(!kind.covers(date(2025, 3, 8)));
    }

    fn row(leave_type: &str, start: NaiveDate, end: NaiveDate) -> LeaveRow {
        LeaveRow {
            id: 1,
            employee_id: 7,
            leave_type: leave_type.into(),
            start_date: start,
            end_date: end,
            half_day_period: None,
            custom_start_time: None,
            custom_end_time: None,
            reason: "flu".into(),
            document: None,
            status: "approved".into(),
            requested_days: Decimal::ONE,
            created_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let mut stored = row("sick", date(2025, 3, 3), date(2025, 3, 3));
        stored.status = "archived".into();
        assert!(LeaveRequest::try_from(stored).is_err());
    }

    #[test]
    fn stored_rows_skip_submission_rules() {
        let mut full_day = row("full_day", date(2025, 3, 4), date(2025, 3, 5));
        full_day.requested_days = Decimal::new(2, 0);
        let request = LeaveRequest::try_from(full_day).unwrap();
        assert_eq!(request.kind, LeaveKind::FullDay { date: date(2025, 3, 4) });
        assert_eq!(request.requested_days, Decimal::new(2, 0));

        let mut custom = row("half_day", date(2025, 3, 6), date(2025, 3, 6));
        custom.half_day_period = Some("custom".into());
        custom.custom_start_time = NaiveTime::from_hms_opt(13, 0, 0);
        let request = LeaveRequest::try_from(custom).unwrap();
        assert_eq!(request.kind.leave_type(), LeaveType::HalfDay);
        assert_eq!(request.kind.half_day_period(), None);

        let mut odd_label = row("half_day", date(2025, 3, 6), date(2025, 3, 6));
        odd_label.half_day_period = Some("evening".into());
        assert!(LeaveRequest::try_from(odd_label).is_ok());
    }
}
