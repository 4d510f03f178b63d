use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::calendar::LeavePeriod;
use crate::model::attendance::AttendanceDay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 40)]
    pub total_records: usize,
    #[schema(example = 38)]
    pub present_records: usize,
    #[schema(example = 2)]
    pub absent_records: usize,
    #[schema(example = "266.50", value_type = String)]
    pub total_hours: Decimal,
    #[schema(example = "6.66", value_type = String)]
    pub average_hours: Decimal,
}

pub fn summarize(days: &[AttendanceDay]) -> AttendanceSummary {
    let total_records = days.len();
    let present_records = days.iter().filter(|d| d.is_present).count();
    let total_hours: Decimal = days.iter().map(|d| d.total_hours).sum();
    let average_hours = if total_records == 0 {
        Decimal::ZERO
    } else {
        (total_hours / Decimal::from(total_records)).round_dp(2)
    };

    AttendanceSummary {
        total_records,
        present_records,
        absent_records: total_records - present_records,
        total_hours,
        average_hours,
    }
}

/// Adds an absent row for every working day in `period`, up to and including
/// `through`, on which an employee has no recorded day. Result is sorted by
/// date then employee.
pub fn expand_month(
    period: LeavePeriod,
    through: NaiveDate,
    employee_ids: &[u64],
    mut days: Vec<AttendanceDay>,
) -> Vec<AttendanceDay> {
    let seen: HashSet<(u64, NaiveDate)> =
        days.iter().map(|d| (d.employee_id, d.date)).collect();

    for date in period.working_days().into_iter().filter(|d| *d <= through) {
        for &employee_id in employee_ids {
            if !seen.contains(&(employee_id, date)) {
                days.push(AttendanceDay {
                    employee_id,
                    date,
                    total_hours: Decimal::ZERO,
                    is_present: false,
                    open_session: false,
                    warnings: Vec::new(),
                });
            }
        }
    }

    days.sort_by_key(|d| (d.date, d.employee_id));
    days
}
