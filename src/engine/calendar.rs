use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::error::EngineError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

/// Saturday and Sunday. There is no holiday calendar.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts non-weekend dates in `[start, end]`, both ends included.
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> Result<u32, EngineError> {
    if start > end {
        return Err(EngineError::InvalidRange { start, end });
    }

    Ok(start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !is_weekend(*d))
        .count() as u32)
}

/// Label to render for `date`: the leave type of the first approved request
/// (by ascending id) whose range covers it.
pub fn leave_type_for_date(date: NaiveDate, requests: &[LeaveRequest]) -> Option<LeaveType> {
    requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved && r.kind.covers(date))
        .min_by_key(|r| r.id)
        .map(|r| r.kind.leave_type())
}

/// A calendar month, the unit leave allowances are granted in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct LeavePeriod {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

impl LeavePeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::invalid(format!(
                "{year}-{month} is not a valid month"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Working days of the month, in order.
    pub fn working_days(&self) -> Vec<NaiveDate> {
        let last = self.last_day();
        self.first_day()
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| !is_weekend(*d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveKind;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn approved(id: u64, kind: LeaveKind) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 1,
            kind,
            reason: String::new(),
            status: LeaveStatus::Approved,
            requested_days: Decimal::ONE,
            created_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn weekends_are_saturday_and_sunday() {
        // 2025-01-06 is a Monday
        assert!(!is_weekend(date(2025, 1, 6)));
        assert!(!is_weekend(date(2025, 1, 10)));
        assert!(is_weekend(date(2025, 1, 11)));
        assert!(is_weekend(date(2025, 1, 12)));
    }

    #[test]
    fn single_day_counts_zero_or_one() {
        assert_eq!(working_days_between(date(2025, 1, 8), date(2025, 1, 8)), Ok(1));
        assert_eq!(working_days_between(date(2025, 1, 11), date(2025, 1, 11)), Ok(0));
    }

    #[test]
    fn full_week_has_five_working_days() {
        assert_eq!(working_days_between(date(2025, 1, 6), date(2025, 1, 12)), Ok(5));
        // Friday through Monday
        assert_eq!(working_days_between(date(2025, 1, 10), date(2025, 1, 13)), Ok(2));
        assert_eq!(working_days_between(date(2025, 1, 11), date(2025, 1, 12)), Ok(0));
    }

    #[test]
    fn backwards_range_is_a_caller_error() {
        assert_eq!(
            working_days_between(date(2025, 1, 10), date(2025, 1, 9)),
            Err(EngineError::InvalidRange {
                start: date(2025, 1, 10),
                end: date(2025, 1, 9),
            })
        );
    }

    #[test]
    fn working_days_never_exceed_span_and_match_weekday_count() {
        let start = date(2024, 12, 20);
        for len in 0..60i64 {
            let end = start + chrono::Duration::days(len);
            let span = (len + 1) as u32;
            let weekend = start
                .iter_days()
                .take(span as usize)
                .filter(|d| is_weekend(*d))
                .count() as u32;
            let working = working_days_between(start, end).unwrap();
            assert!(working <= span);
            assert_eq!(working, span - weekend);
        }
    }

    #[test]
    fn leave_label_uses_first_approved_request_by_id() {
        let sick = approved(
            9,
            LeaveKind::Sick {
                start: date(2025, 2, 3),
                end: date(2025, 2, 7),
                certificate: None,
            },
        );
        let full = approved(4, LeaveKind::FullDay { date: date(2025, 2, 5) });
        let mut pending = approved(1, LeaveKind::FullDay { date: date(2025, 2, 4) });
        pending.status = LeaveStatus::Pending;

        let requests = vec![sick, full, pending];
        assert_eq!(leave_type_for_date(date(2025, 2, 5), &requests), Some(LeaveType::FullDay));
        assert_eq!(leave_type_for_date(date(2025, 2, 4), &requests), Some(LeaveType::Sick));
        assert_eq!(leave_type_for_date(date(2025, 2, 10), &requests), None);
    }

    #[test]
    fn period_bounds() {
        let feb = LeavePeriod::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        let dec = LeavePeriod::new(2025, 12).unwrap();
        assert_eq!(dec.last_day(), date(2025, 12, 31));
        assert!(dec.contains(date(2025, 12, 1)));
        assert!(!dec.contains(date(2026, 1, 1)));
        assert!(LeavePeriod::new(2025, 13).is_err());
        // March 2025 has 21 working days
        assert_eq!(LeavePeriod::new(2025, 3).unwrap().working_days().len(), 21);
    }
}
