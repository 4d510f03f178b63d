use crate::api::attendance::resolve_period;
use crate::api::error::{internal_error, not_found};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::calendar::{self, LeavePeriod};
use crate::engine::error::EngineError;
use crate::engine::ledger::{self, LeaveBalance, SubmissionCheck};
use crate::engine::workflow::Decision;
use crate::model::employee::Employee;
use crate::model::leave_request::{
    HalfDaySlot, LeaveKind, LeaveParts, LeaveRequest, LeaveRow, LeaveStatus, LeaveType,
};
use crate::utils::db_utils::{self, LEAVE_COLUMNS, into_requests};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

/// Recent requests shown per employee on the admin overview.
const OVERVIEW_RECENT: u32 = 5;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "half_day")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "custom", nullable = true)]
    pub half_day_period: Option<HalfDaySlot>,
    #[schema(example = "13:00:00", value_type = Option<String>, format = "time", nullable = true)]
    pub custom_start_time: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = Option<String>, format = "time", nullable = true)]
    pub custom_end_time: Option<NaiveTime>,
    #[schema(example = "Doctor appointment")]
    pub reason: String,
    /// Reference to an uploaded supporting document (sick leave only)
    #[schema(example = "uploads/medical-note.pdf", nullable = true)]
    pub document: Option<String>,
    /// Set once the user has accepted the low-balance warning
    #[serde(default)]
    #[schema(example = false)]
    pub confirmed: bool,
}

impl CreateLeave {
    fn kind(&self) -> Result<LeaveKind, EngineError> {
        LeaveKind::from_parts(LeaveParts {
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            half_day_period: self.half_day_period,
            custom_start_time: self.custom_start_time,
            custom_end_time: self.custom_end_time,
            document: self.document.as_deref(),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedLeave {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    #[schema(example = 1)]
    pub id: u64,
    pub status: LeaveStatus,
    #[schema(example = "0.5", value_type = String)]
    pub requested_days: Decimal,
    #[schema(example = "2.5", value_type = String)]
    pub remaining_leaves: Decimal,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    /// employee id for whom the leave is applied
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    /// leave start date
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(nullable = true)]
    pub half_day_period: Option<HalfDaySlot>,
    #[schema(value_type = Option<String>, format = "time", nullable = true)]
    pub custom_start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, format = "time", nullable = true)]
    pub custom_end_time: Option<NaiveTime>,
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(nullable = true)]
    pub document: Option<String>,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    #[schema(example = "2", value_type = String)]
    pub requested_days: Decimal,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
    /// user id of the HR/Admin who decided the request
    #[schema(nullable = true)]
    pub reviewed_by: Option<u64>,
}

impl From<&LeaveRequest> for LeaveResponse {
    fn from(request: &LeaveRequest) -> Self {
        let period = request.kind.half_day_period();
        let (custom_start_time, custom_end_time) =
            period.map(|p| p.custom_times()).unwrap_or((None, None));
        Self {
            id: request.id,
            employee_id: request.employee_id,
            leave_type: request.kind.leave_type(),
            start_date: request.kind.start_date(),
            end_date: request.kind.end_date(),
            half_day_period: period.map(|p| p.slot()),
            custom_start_time,
            custom_end_time,
            reason: request.reason.clone(),
            document: request.kind.document().map(str::to_owned),
            status: request.status,
            requested_days: request.requested_days,
            created_at: request.created_at,
            reviewed_by: request.reviewed_by,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = "sick")]
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 3)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = 2026)]
    /// Year, defaults to the current year
    pub year: Option<i32>,
    #[schema(example = 1)]
    /// Month (1-12), defaults to the current month
    pub month: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeLeaveOverview {
    pub employee: Employee,
    pub leave_balance: LeaveBalance,
    pub recent_leave_requests: Vec<LeaveResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarDay {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_weekend: bool,
    #[schema(nullable = true)]
    pub leave_type: Option<LeaveType>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

fn period_from(query: &PeriodQuery) -> Result<LeavePeriod, EngineError> {
    resolve_period(Local::now().date_naive(), query.year, query.month)
}

fn allowance(employee: &Employee, config: &Config) -> Decimal {
    employee.allowance_or(config.default_leave_allowance)
}

/// Prices the request and checks it against the employee's current balance.
async fn check_submission<'e, E>(
    executor: E,
    employee: &Employee,
    kind: &LeaveKind,
    config: &Config,
) -> actix_web::Result<SubmissionCheck>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    let requested_days = ledger::price_request(kind)?;
    let period = LeavePeriod::containing(kind.start_date());

    let rows = db_utils::leave_in_period(executor, Some(employee.id), period)
        .await
        .map_err(internal_error("Failed to load leave requests"))?;
    let requests = into_requests(rows);

    let balance = ledger::recompute_balance(employee.id, period, allowance(employee, config), &requests);
    Ok(ledger::can_submit(&balance, requested_days, config.low_balance_threshold)?)
}

/* =========================
Quote a leave request
========================= */
/// Price a leave request without submitting it
#[utoipa::path(
    post,
    path = "/api/leave/quote",
    request_body(
        content = CreateLeave,
        description = "Leave request payload (confirmed is ignored)",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Price and whether submission must be confirmed", body = SubmissionCheck),
        (status = 400, description = "Malformed request"),
        (status = 422, description = "Not enough leave remaining"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn quote_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let kind = payload.kind()?;

    let employee = match db_utils::fetch_employee(pool.get_ref(), employee_id)
        .await
        .map_err(internal_error("Failed to load employee"))?
    {
        Some(e) => e,
        None => return Ok(not_found("Employee not found")),
    };

    let check = check_submission(pool.get_ref(), &employee, &kind, &config).await?;
    Ok(HttpResponse::Ok().json(check))
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully", body = CreatedLeave),
        (status = 400, description = "Malformed request"),
        (status = 409, description = "Low balance, resubmit with confirmed = true", body = Object, example = json!({
            "error": "confirmation_required",
            "message": "this will use 1 working days of your 2 remaining days, confirmation required"
        })),
        (status = 422, description = "Not enough leave remaining"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.reason.trim().is_empty() {
        return Err(EngineError::invalid("reason must not be empty").into());
    }
    let kind = payload.kind()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(internal_error("Failed to open transaction"))?;

    // Serializes submissions per employee so two requests cannot both pass the cap check.
    let employee = match db_utils::lock_employee(&mut *tx, employee_id)
        .await
        .map_err(internal_error("Failed to lock employee"))?
    {
        Some(e) => e,
        None => return Ok(not_found("Employee not found")),
    };

    let check = check_submission(&mut *tx, &employee, &kind, &config).await?;
    check.authorize(payload.confirmed)?;

    let id = db_utils::insert_leave(
        &mut *tx,
        employee_id,
        &kind,
        payload.reason.trim(),
        check.requested_days,
    )
    .await
    .map_err(internal_error("Failed to create leave request"))?;

    tx.commit()
        .await
        .map_err(internal_error("Failed to commit leave request"))?;

    info!(
        employee_id,
        leave_id = id,
        leave_type = %kind.leave_type(),
        requested_days = %check.requested_days,
        "Leave request submitted"
    );

    Ok(HttpResponse::Created().json(CreatedLeave {
        message: "Leave request submitted".into(),
        id,
        status: LeaveStatus::Pending,
        requested_days: check.requested_days,
        remaining_leaves: check.remaining_after,
    }))
}

/// Error for a decision whose guarded update matched no row. Only a stored
/// final status is reported back as the one that won.
fn lost_decision(leave_id: u64, decision: Decision, stored: Option<&str>) -> actix_web::Error {
    let current = stored
        .and_then(|raw| raw.parse::<LeaveStatus>().ok())
        .filter(|status| status.is_final());
    match current {
        Some(current) => {
            warn!(leave_id, %current, %decision, "Concurrent leave decision lost");
            EngineError::StaleState { current }.into()
        }
        None => {
            warn!(leave_id, stored = ?stored, %decision, "Leave decision lost to an unknown status");
            actix_web::error::ErrorConflict("Leave request changed, reload and retry")
        }
    }
}

/// Loads the request, applies the decision, and writes it back guarded on
/// the status still being pending.
async fn decide(
    auth: &AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    decision: Decision,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let row = match db_utils::fetch_leave(pool, leave_id)
        .await
        .map_err(internal_error("Failed to fetch leave request"))?
    {
        Some(row) => row,
        None => return Ok(not_found("Leave request not found")),
    };

    let mut request =
        LeaveRequest::try_from(row).map_err(internal_error("Unreadable leave request"))?;
    let next = request.decide(decision, auth.user_id)?;

    let applied = db_utils::set_leave_status(pool, leave_id, next, auth.user_id)
        .await
        .map_err(internal_error("Failed to update leave request"))?;

    if !applied {
        // Someone else decided it between our read and our write.
        let stored = db_utils::fetch_leave(pool, leave_id)
            .await
            .map_err(internal_error("Failed to fetch leave request"))?
            .map(|row| row.status);
        return Err(lost_decision(leave_id, decision, stored.as_deref()));
    }

    info!(leave_id, reviewer = auth.user_id, status = %next, "Leave request decided");

    let message = match next {
        LeaveStatus::Approved => "Leave approved",
        _ => "Leave rejected",
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "status": next,
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved",
            "status": "approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "error": "stale_state",
            "message": "leave request is already rejected"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "approve_leave", skip(auth, pool), fields(reviewer = auth.user_id))]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, pool.get_ref(), path.into_inner(), Decision::Approve).await
}

/* =========================
Reject leave (HR/Admin)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected",
            "status": "rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "error": "stale_state",
            "message": "leave request is already approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "reject_leave", skip(auth, pool), fields(reviewer = auth.user_id))]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, pool.get_ref(), path.into_inner(), Decision::Reject).await
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let row = db_utils::fetch_leave(pool.get_ref(), leave_id)
        .await
        .map_err(internal_error("Failed to fetch leave request"))?;

    match row {
        Some(row) => {
            let request =
                LeaveRequest::try_from(row).map_err(internal_error("Unreadable leave request"))?;
            Ok(HttpResponse::Ok().json(LeaveResponse::from(&request)))
        }
        None => Ok(not_found("Leave request not found")),
    }
}

/// for getting leave applications endpoint. Employees get their own
/// requests whatever `employee_id` they pass.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_filter = auth.leave_scope(query.employee_id)?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(leave_type) = query.leave_type {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type.to_string()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(internal_error("Failed to count leave requests"))?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {LEAVE_COLUMNS}
        FROM leave_requests
        {}
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(internal_error("Failed to fetch leave list"))?;

    let requests = into_requests(rows);

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: requests.iter().map(LeaveResponse::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Caller's leave balance for a month
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let period = period_from(&query)?;

    let employee = match db_utils::fetch_employee(pool.get_ref(), employee_id)
        .await
        .map_err(internal_error("Failed to load employee"))?
    {
        Some(e) => e,
        None => return Ok(not_found("Employee not found")),
    };

    let rows = db_utils::leave_in_period(pool.get_ref(), Some(employee_id), period)
        .await
        .map_err(internal_error("Failed to load leave requests"))?;
    let requests = into_requests(rows);

    let balance =
        ledger::recompute_balance(employee_id, period, allowance(&employee, &config), &requests);
    Ok(HttpResponse::Ok().json(balance))
}

/// Balance and recent requests for every active employee (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/leave/overview",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Leave overview per employee", body = [EmployeeLeaveOverview]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let period = period_from(&query)?;

    let employees = db_utils::active_employees(pool.get_ref())
        .await
        .map_err(internal_error("Failed to load employees"))?;
    let in_period = into_requests(
        db_utils::leave_in_period(pool.get_ref(), None, period)
            .await
            .map_err(internal_error("Failed to load leave requests"))?,
    );
    let recent = into_requests(
        db_utils::recent_leave(pool.get_ref(), OVERVIEW_RECENT)
            .await
            .map_err(internal_error("Failed to load recent leave requests"))?,
    );

    let overview: Vec<EmployeeLeaveOverview> = employees
        .into_iter()
        .map(|employee| {
            let leave_balance = ledger::recompute_balance(
                employee.id,
                period,
                allowance(&employee, &config),
                &in_period,
            );
            let recent_leave_requests = recent
                .iter()
                .filter(|r| r.employee_id == employee.id)
                .map(LeaveResponse::from)
                .collect();
            EmployeeLeaveOverview {
                employee,
                leave_balance,
                recent_leave_requests,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(overview))
}

/// Day-by-day approved leave labels for the caller's calendar
#[utoipa::path(
    get,
    path = "/api/leave/calendar",
    params(PeriodQuery),
    responses(
        (status = 200, description = "One entry per day of the month", body = [CalendarDay]),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_calendar(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let period = period_from(&query)?;

    let approved = into_requests(
        db_utils::approved_overlapping(pool.get_ref(), employee_id, period)
            .await
            .map_err(internal_error("Failed to load approved leave"))?,
    );

    Ok(HttpResponse::Ok().json(month_calendar(period, &approved)))
}

fn month_calendar(period: LeavePeriod, approved: &[LeaveRequest]) -> Vec<CalendarDay> {
    let last = period.last_day();
    period
        .first_day()
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| CalendarDay {
            date,
            is_weekend: calendar::is_weekend(date),
            leave_type: calendar::leave_type_for_date(date, approved),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::HalfDayPeriod;
    use actix_web::http::StatusCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn payload_deserializes_wire_shape() {
        let payload: CreateLeave = serde_json::from_value(serde_json::json!({
            "leave_type": "half_day",
            "start_date": "2026-01-05",
            "end_date": "2026-01-05",
            "half_day_period": "custom",
            "custom_start_time": "13:00:00",
            "custom_end_time": "17:00:00",
            "reason": "Dentist"
        }))
        .unwrap();
        assert!(!payload.confirmed);

        let kind = payload.kind().unwrap();
        assert_eq!(ledger::price_request(&kind).unwrap(), Decimal::new(5, 1));
        assert!(matches!(
            kind.half_day_period(),
            Some(HalfDayPeriod::Custom { .. })
        ));
    }

    #[test]
    fn response_flattens_the_variant() {
        let request = LeaveRequest {
            id: 3,
            employee_id: 9,
            kind: LeaveKind::Sick {
                start: date(2026, 1, 5),
                end: date(2026, 1, 7),
                certificate: Some("note.pdf".into()),
            },
            reason: "Flu".into(),
            status: LeaveStatus::Approved,
            requested_days: Decimal::from(3),
            created_at: None,
            reviewed_by: Some(2),
        };
        let value = serde_json::to_value(LeaveResponse::from(&request)).unwrap();
        assert_eq!(value["leave_type"], "sick");
        assert_eq!(value["status"], "approved");
        assert_eq!(value["document"], "note.pdf");
        assert_eq!(value["end_date"], "2026-01-07");
        assert!(value["half_day_period"].is_null());
    }

    #[test]
    fn lost_decision_reports_only_a_stored_final_status() {
        let err = lost_decision(4, Decision::Reject, Some("approved"));
        assert_eq!(
            err.as_error::<EngineError>(),
            Some(&EngineError::StaleState {
                current: LeaveStatus::Approved
            })
        );

        for stored in [None, Some("pending"), Some("archived")] {
            let err = lost_decision(4, Decision::Approve, stored);
            assert!(err.as_error::<EngineError>().is_none());
            assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn calendar_covers_every_day_of_the_month() {
        let period = LeavePeriod::new(2026, 2).unwrap();
        let approved = vec![LeaveRequest {
            id: 1,
            employee_id: 9,
            kind: LeaveKind::FullDay { date: date(2026, 2, 10) },
            reason: "Move".into(),
            status: LeaveStatus::Approved,
            requested_days: Decimal::ONE,
            created_at: None,
            reviewed_by: Some(2),
        }];
        let days = month_calendar(period, &approved);
        assert_eq!(days.len(), 28);
        assert_eq!(days[9].leave_type, Some(LeaveType::FullDay));
        assert!(days[0].is_weekend); // 2026-02-01 is a Sunday
        assert_eq!(days.iter().filter(|d| d.leave_type.is_some()).count(), 1);
    }
}
