use crate::api::attendance::{AttendanceReport, ClockResponse, ReportQuery};
use crate::api::leave_request::{
    CalendarDay, CreateLeave, CreatedLeave, EmployeeLeaveOverview, LeaveFilter, LeaveListResponse,
    LeaveResponse, PeriodQuery,
};
use crate::engine::calendar::LeavePeriod;
use crate::engine::ledger::{LeaveBalance, SubmissionCheck};
use crate::engine::report::AttendanceSummary;
use crate::engine::sessions::DailyTotal;
use crate::model::attendance::{AttendanceDay, DataQualityWarning};
use crate::model::employee::Employee;
use crate::model::leave_request::{HalfDaySlot, LeaveStatus, LeaveType};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Accounting

Tracks employee clock-in/clock-out sessions and a monthly leave allowance.

### Key Features
- **Attendance**
  - Clock in and out, any number of sessions per day
  - Daily totals, 30-day history and a monthly report with absences filled in
- **Leave**
  - Full-day, half-day and sick leave priced in working days
  - Monthly balance, with a confirmation step when a request would leave one day or less
  - Approve/reject workflow for HR and Admin

### Security
Every endpoint expects a **JWT Bearer** access token. Tokens are issued by the identity service.

### Errors
Domain errors come back as `{"error": "<code>", "message": "<text>"}`.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::report,

        crate::api::leave_request::quote_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::leave_overview,
        crate::api::leave_request::leave_calendar
    ),
    components(
        schemas(
            ClockResponse,
            DailyTotal,
            AttendanceDay,
            DataQualityWarning,
            AttendanceReport,
            AttendanceSummary,
            ReportQuery,
            LeavePeriod,
            LeaveType,
            LeaveStatus,
            HalfDaySlot,
            CreateLeave,
            CreatedLeave,
            SubmissionCheck,
            LeaveBalance,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            PeriodQuery,
            EmployeeLeaveOverview,
            CalendarDay,
            Employee
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock events and attendance reporting"),
        (name = "Leave", description = "Leave requests, balances and approvals"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_leave_and_attendance_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/attendance"));
        assert!(paths.contains_key("/api/leave/quote"));
        assert!(paths.contains_key("/api/leave/{leave_id}/approve"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
