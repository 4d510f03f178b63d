use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::calendar::{LeavePeriod, working_days_between};
use crate::engine::error::EngineError;
use crate::model::leave_request::{LeaveKind, LeaveRequest, LeaveStatus};

/// Allowance granted per month when an employee has none of their own.
pub const DEFAULT_MONTHLY_ALLOWANCE: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// Remaining balance at or below which a submission must be confirmed.
pub const DEFAULT_LOW_BALANCE_THRESHOLD: Decimal = Decimal::ONE;

const HALF_DAY: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Cost of a request in days. Half days are a flat 0.5 whatever the period
/// or custom times; sick leave skips weekends.
pub fn price_request(kind: &LeaveKind) -> Result<Decimal, EngineError> {
    match kind {
        LeaveKind::FullDay { .. } => Ok(Decimal::ONE),
        LeaveKind::HalfDay { .. } => Ok(HALF_DAY),
        LeaveKind::Sick { start, end, .. } => {
            working_days_between(*start, *end).map(Decimal::from)
        }
    }
}

/// Computed balance for one employee over one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub period: LeavePeriod,
    #[schema(example = "4", value_type = String)]
    pub total_allowed: Decimal,
    #[schema(example = "1.5", value_type = String)]
    pub used_leaves: Decimal,
    #[schema(example = "2.5", value_type = String)]
    pub remaining_leaves: Decimal,
}

impl LeaveBalance {
    fn new(employee_id: u64, period: LeavePeriod, total_allowed: Decimal, used: Decimal) -> Self {
        Self {
            employee_id,
            period,
            total_allowed,
            used_leaves: used,
            remaining_leaves: total_allowed - used,
        }
    }
}

/// Sums the frozen cost of every pending or approved request the employee
/// started in `period`. Pending requests count against the balance as soon
/// as they are submitted.
pub fn recompute_balance(
    employee_id: u64,
    period: LeavePeriod,
    total_allowed: Decimal,
    requests: &[LeaveRequest],
) -> LeaveBalance {
    let used = requests
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .filter(|r| matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved))
        .filter(|r| period.contains(r.kind.start_date()))
        .map(|r| r.requested_days)
        .sum::<Decimal>()
        .max(Decimal::ZERO);

    LeaveBalance::new(employee_id, period, total_allowed, used)
}

/// Outcome of the first submission step. Holding one does not submit
/// anything; call [`SubmissionCheck::authorize`] with the user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmissionCheck {
    #[schema(example = "1", value_type = String)]
    pub requested_days: Decimal,
    #[schema(example = "2", value_type = String)]
    pub remaining_leaves: Decimal,
    #[schema(example = "1", value_type = String)]
    pub remaining_after: Decimal,
    pub needs_confirmation: bool,
}

impl SubmissionCheck {
    pub fn authorize(&self, confirmed: bool) -> Result<(), EngineError> {
        if self.needs_confirmation && !confirmed {
            return Err(EngineError::ConfirmationRequired {
                requested: self.requested_days,
                remaining: self.remaining_leaves,
            });
        }
        Ok(())
    }
}

/// Checks `requested_days` against the balance. An exhausted balance rejects
/// every request, including zero-cost ones.
pub fn can_submit(
    balance: &LeaveBalance,
    requested_days: Decimal,
    low_balance_threshold: Decimal,
) -> Result<SubmissionCheck, EngineError> {
    if balance.remaining_leaves <= Decimal::ZERO
        || balance.used_leaves + requested_days > balance.total_allowed
    {
        return Err(EngineError::LeaveCapExceeded {
            requested: requested_days,
            remaining: balance.remaining_leaves,
        });
    }

    let remaining_after = balance.remaining_leaves - requested_days;
    Ok(SubmissionCheck {
        requested_days,
        remaining_leaves: balance.remaining_leaves,
        remaining_after,
        needs_confirmation: remaining_after <= low_balance_threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::HalfDayPeriod;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn march() -> LeavePeriod {
        LeavePeriod::new(2025, 3).unwrap()
    }

    fn request(id: u64, status: LeaveStatus, start: NaiveDate, days: Decimal) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 7,
            kind: LeaveKind::Sick {
                start,
                end: start,
                certificate: None,
            },
            reason: "unwell".into(),
            status,
            requested_days: days,
            created_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn constants_have_expected_values() {
        assert_eq!(DEFAULT_MONTHLY_ALLOWANCE, dec!(4));
        assert_eq!(HALF_DAY, dec!(0.5));
    }

    #[test]
    fn half_day_costs_half_regardless_of_times() {
        let day = date(2025, 3, 4);
        for period in [
            HalfDayPeriod::Morning,
            HalfDayPeriod::Afternoon,
            HalfDayPeriod::Custom {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            },
        ] {
            let kind = LeaveKind::HalfDay {
                date: day,
                period: Some(period),
            };
            assert_eq!(price_request(&kind), Ok(dec!(0.5)));
        }
    }

    #[test]
    fn full_day_costs_one() {
        let kind = LeaveKind::FullDay { date: date(2025, 3, 8) };
        assert_eq!(price_request(&kind), Ok(dec!(1)));
    }

    #[test]
    fn sick_leave_skips_weekends() {
        let weekend = LeaveKind::Sick {
            start: date(2025, 3, 8),
            end: date(2025, 3, 9),
            certificate: None,
        };
        assert_eq!(price_request(&weekend), Ok(dec!(0)));

        let thu_to_tue = LeaveKind::Sick {
            start: date(2025, 3, 6),
            end: date(2025, 3, 11),
            certificate: Some("cert.pdf".into()),
        };
        assert_eq!(price_request(&thu_to_tue), Ok(dec!(4)));
    }

    #[test]
    fn balance_counts_pending_and_approved_only() {
        let requests = vec![
            request(1, LeaveStatus::Approved, date(2025, 3, 3), dec!(1)),
            request(2, LeaveStatus::Pending, date(2025, 3, 4), dec!(0.5)),
            request(3, LeaveStatus::Rejected, date(2025, 3, 5), dec!(2)),
            // different month
            request(4, LeaveStatus::Approved, date(2025, 4, 1), dec!(1)),
        ];
        let balance = recompute_balance(7, march(), dec!(4), &requests);
        assert_eq!(balance.used_leaves, dec!(1.5));
        assert_eq!(balance.remaining_leaves, dec!(2.5));
    }

    #[test]
    fn balance_ignores_other_employees() {
        let mut other = request(1, LeaveStatus::Approved, date(2025, 3, 3), dec!(3));
        other.employee_id = 8;
        let balance = recompute_balance(7, march(), dec!(4), &[other]);
        assert_eq!(balance.used_leaves, dec!(0));
        assert_eq!(balance.remaining_leaves, dec!(4));
    }

    #[test]
    fn frozen_cost_is_used_not_repriced() {
        // Priced at 3 when submitted even though the range now prices at 1.
        let frozen = request(1, LeaveStatus::Approved, date(2025, 3, 3), dec!(3));
        let balance = recompute_balance(7, march(), dec!(4), &[frozen]);
        assert_eq!(balance.used_leaves, dec!(3));
    }

    #[test]
    fn over_cap_request_is_rejected() {
        let balance = LeaveBalance::new(7, march(), dec!(4), dec!(3));
        let err = can_submit(&balance, dec!(2), DEFAULT_LOW_BALANCE_THRESHOLD).unwrap_err();
        assert_eq!(
            err,
            EngineError::LeaveCapExceeded {
                requested: dec!(2),
                remaining: dec!(1),
            }
        );
    }

    #[test]
    fn exhausted_balance_rejects_even_free_requests() {
        let balance = LeaveBalance::new(7, march(), dec!(4), dec!(4));
        for requested in [dec!(0), dec!(0.5), dec!(1)] {
            assert!(matches!(
                can_submit(&balance, requested, DEFAULT_LOW_BALANCE_THRESHOLD),
                Err(EngineError::LeaveCapExceeded { .. })
            ));
        }
    }

    #[test]
    fn near_limit_requires_confirmation() {
        let balance = LeaveBalance::new(7, march(), dec!(4), dec!(1));
        let check = can_submit(&balance, dec!(2), DEFAULT_LOW_BALANCE_THRESHOLD).unwrap();
        assert!(check.needs_confirmation);
        assert_eq!(check.remaining_after, dec!(1));
        assert_eq!(
            check.authorize(false),
            Err(EngineError::ConfirmationRequired {
                requested: dec!(2),
                remaining: dec!(3),
            })
        );
        assert_eq!(check.authorize(true), Ok(()));
    }

    #[test]
    fn comfortable_balance_needs_no_confirmation() {
        let balance = LeaveBalance::new(7, march(), dec!(4), dec!(0));
        let check = can_submit(&balance, dec!(1), DEFAULT_LOW_BALANCE_THRESHOLD).unwrap();
        assert!(!check.needs_confirmation);
        assert_eq!(check.authorize(false), Ok(()));
    }

    #[test]
    fn using_the_exact_remainder_is_allowed_with_confirmation() {
        let balance = LeaveBalance::new(7, march(), dec!(4), dec!(3.5));
        let check = can_submit(&balance, dec!(0.5), DEFAULT_LOW_BALANCE_THRESHOLD).unwrap();
        assert_eq!(check.remaining_after, dec!(0));
        assert!(check.needs_confirmation);
    }
}
