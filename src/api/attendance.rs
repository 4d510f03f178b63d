use crate::api::error::internal_error;
use crate::auth::auth::AuthUser;
use crate::engine::calendar::LeavePeriod;
use crate::engine::report::{self, AttendanceSummary};
use crate::engine::sessions::{self, DailyTotal, SessionState};
use crate::model::attendance::{AttendanceDay, ClockEvent, ClockKind};
use crate::utils::db_utils;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

/// Days of history returned by the history endpoint.
const HISTORY_DAYS: i64 = 30;

#[derive(Serialize, ToSchema)]
pub struct ClockResponse {
    #[schema(example = "Clocked in successfully")]
    pub message: String,
    #[schema(example = "2026-01-05T09:00:00", value_type = String, format = "date-time")]
    pub time: NaiveDateTime,
    pub today: DailyTotal,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    #[schema(example = 2026)]
    /// Report year, defaults to the current year
    pub year: Option<i32>,
    #[schema(example = 1)]
    /// Report month (1-12), defaults to the current month
    pub month: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceReport {
    pub period: LeavePeriod,
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceDay>,
}

fn log_warnings(employee_id: u64, days: &[AttendanceDay]) {
    for day in days.iter().filter(|d| !d.warnings.is_empty()) {
        warn!(
            employee_id,
            date = %day.date,
            warnings = ?day.warnings,
            "Skipped malformed clock events"
        );
    }
}

fn employee_not_found() -> actix_web::Error {
    actix_web::error::ErrorNotFound(json!({ "message": "Employee not found" }))
}

/// Validates `kind` against the day's replayed state and appends it.
/// The employee row lock keeps a second device from racing past the check.
async fn record_clock_event(
    pool: &MySqlPool,
    employee_id: u64,
    kind: ClockKind,
) -> actix_web::Result<(NaiveDateTime, DailyTotal)> {
    let now = Local::now().naive_local();
    let today = now.date();

    let mut tx = pool
        .begin()
        .await
        .map_err(internal_error("Failed to open transaction"))?;

    if db_utils::lock_employee(&mut *tx, employee_id)
        .await
        .map_err(internal_error("Failed to lock employee"))?
        .is_none()
    {
        return Err(employee_not_found());
    }

    let mut events = db_utils::clock_events_between(&mut *tx, Some(employee_id), today, today)
        .await
        .map_err(internal_error("Failed to load clock events"))?;

    let state = SessionState::from_events(&events);
    match kind {
        ClockKind::In => state.clock_in(now)?,
        ClockKind::Out => state.clock_out(now)?,
    };

    let event = ClockEvent {
        employee_id,
        occurred_at: now,
        kind,
    };
    db_utils::insert_clock_event(&mut *tx, &event)
        .await
        .map_err(internal_error("Failed to record clock event"))?;

    tx.commit()
        .await
        .map_err(internal_error("Failed to commit clock event"))?;

    events.push(event);
    Ok((now, sessions::daily_total(&events)))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Clocked in successfully", body = ClockResponse),
        (status = 409, description = "Already clocked in", body = Object, example = json!({
            "error": "already_clocked_in",
            "message": "already clocked in since 2026-01-05 09:00:00"
        })),
        (status = 404, description = "No employee record for the caller"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let (time, today) = record_clock_event(pool.get_ref(), employee_id, ClockKind::In).await?;
    info!(employee_id, %time, "Clocked in");

    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Clocked in successfully".into(),
        time,
        today,
    }))
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Clocked out successfully", body = ClockResponse),
        (status = 409, description = "No open session to close", body = Object, example = json!({
            "error": "not_clocked_in",
            "message": "not clocked in"
        })),
        (status = 404, description = "No employee record for the caller"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let (time, today) = record_clock_event(pool.get_ref(), employee_id, ClockKind::Out).await?;
    info!(employee_id, %time, total_hours = %today.total_hours, "Clocked out");

    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Clocked out successfully".into(),
        time,
        today,
    }))
}

/// Today's totals for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance", body = AttendanceDay),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let date = Local::now().date_naive();

    let events = db_utils::clock_events_between(pool.get_ref(), Some(employee_id), date, date)
        .await
        .map_err(internal_error("Failed to load clock events"))?;

    let total = sessions::daily_total(&events);
    let day = AttendanceDay {
        employee_id,
        date,
        total_hours: total.total_hours,
        is_present: total.is_present,
        open_session: total.open_session,
        warnings: total.warnings,
    };
    log_warnings(employee_id, std::slice::from_ref(&day));

    Ok(HttpResponse::Ok().json(day))
}

/// Daily totals for the caller's last 30 days, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    responses(
        (status = 200, description = "Attendance history", body = [AttendanceDay]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let last = Local::now().date_naive();
    let first = last - Duration::days(HISTORY_DAYS - 1);

    let events = db_utils::clock_events_between(pool.get_ref(), Some(employee_id), first, last)
        .await
        .map_err(internal_error("Failed to load attendance history"))?;

    let mut days = sessions::attendance_days(employee_id, &events);
    log_warnings(employee_id, &days);
    days.reverse();

    Ok(HttpResponse::Ok().json(days))
}

/// Monthly attendance report across active employees (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Monthly attendance report", body = AttendanceReport),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let today = Local::now().date_naive();
    let period = resolve_period(today, query.year, query.month)?;
    let through = period.last_day().min(today);

    let employees = db_utils::active_employees(pool.get_ref())
        .await
        .map_err(internal_error("Failed to load employees"))?;
    let events =
        db_utils::clock_events_between(pool.get_ref(), None, period.first_day(), period.last_day())
            .await
            .map_err(internal_error("Failed to load clock events"))?;

    let ids: Vec<u64> = employees.iter().map(|e| e.id).collect();
    let mut days = Vec::new();
    for &employee_id in &ids {
        let employee_days = sessions::attendance_days(employee_id, &events);
        log_warnings(employee_id, &employee_days);
        days.extend(employee_days);
    }

    let records = report::expand_month(period, through, &ids, days);
    let summary = report::summarize(&records);

    Ok(HttpResponse::Ok().json(AttendanceReport {
        period,
        summary,
        records,
    }))
}

/// Year/month from the query, falling back to the month containing `today`.
pub fn resolve_period(
    today: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<LeavePeriod, crate::engine::error::EngineError> {
    let current = LeavePeriod::containing(today);
    LeavePeriod::new(year.unwrap_or(current.year), month.unwrap_or(current.month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    #[test]
    fn period_defaults_to_current_month() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            resolve_period(today, None, None).unwrap(),
            LeavePeriod::new(2026, 10).unwrap()
        );
        assert_eq!(
            resolve_period(today, Some(2025), Some(2)).unwrap(),
            LeavePeriod::new(2025, 2).unwrap()
        );
        assert!(resolve_period(today, None, Some(0)).is_err());
    }

    #[actix_web::test]
    async fn unknown_employee_surfaces_as_404() {
        let resp = employee_not_found().error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Employee not found");
    }
}
