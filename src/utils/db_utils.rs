use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Executor, MySql};

use crate::engine::calendar::LeavePeriod;
use crate::model::attendance::{ClockEvent, ClockEventRow};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveKind, LeaveRequest, LeaveRow, LeaveStatus};

/// Column list matching [`LeaveRow`]. Enum-typed columns are cast so they
/// decode as plain strings.
pub const LEAVE_COLUMNS: &str = r#"
    id,
    employee_id,
    CAST(leave_type AS CHAR) AS leave_type,
    start_date,
    end_date,
    CAST(half_day_period AS CHAR) AS half_day_period,
    custom_start_time,
    custom_end_time,
    reason,
    document,
    CAST(status AS CHAR) AS status,
    requested_days,
    created_at,
    reviewed_by
"#;

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, first_name, last_name, hire_date, status, monthly_leave_allowance
"#;

/// Converts rows, skipping any whose leave type or status text is unknown.
pub fn into_requests(rows: Vec<LeaveRow>) -> Vec<LeaveRequest> {
    rows.into_iter()
        .filter_map(|row| {
            let leave_id = row.id;
            LeaveRequest::try_from(row)
                .map_err(|e| tracing::warn!(leave_id, error = %e, "Skipped unreadable leave request"))
                .ok()
        })
        .collect()
}

pub async fn fetch_employee<'e, E>(executor: E, employee_id: u64) -> Result<Option<Employee>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(executor)
        .await
}

/// Same as [`fetch_employee`] but takes a row lock, serializing clock and
/// leave writes for one employee until the transaction ends.
pub async fn lock_employee<'e, E>(executor: E, employee_id: u64) -> Result<Option<Employee>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(executor)
        .await
}

pub async fn active_employees<'e, E>(executor: E) -> Result<Vec<Employee>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE status = 'active' ORDER BY id");
    sqlx::query_as::<_, Employee>(&sql).fetch_all(executor).await
}

pub async fn fetch_leave<'e, E>(executor: E, leave_id: u64) -> Result<Option<LeaveRow>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
    sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(leave_id)
        .fetch_optional(executor)
        .await
}

/// Requests starting inside `period`, optionally for one employee only.
pub async fn leave_in_period<'e, E>(
    executor: E,
    employee_id: Option<u64>,
    period: LeavePeriod,
) -> Result<Vec<LeaveRow>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let mut sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE start_date BETWEEN ? AND ?"
    );
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY id");

    let mut query = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(period.first_day())
        .bind(period.last_day());
    if let Some(id) = employee_id {
        query = query.bind(id);
    }
    query.fetch_all(executor).await
}

/// Approved requests of one employee that overlap `period`, in id order.
pub async fn approved_overlapping<'e, E>(
    executor: E,
    employee_id: u64,
    period: LeavePeriod,
) -> Result<Vec<LeaveRow>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        r#"
        SELECT {LEAVE_COLUMNS}
        FROM leave_requests
        WHERE employee_id = ?
        AND status = 'approved'
        AND start_date <= ?
        AND end_date >= ?
        ORDER BY id
        "#
    );
    sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(employee_id)
        .bind(period.last_day())
        .bind(period.first_day())
        .fetch_all(executor)
        .await
}

/// The `per_employee` most recent requests of every employee.
pub async fn recent_leave<'e, E>(executor: E, per_employee: u32) -> Result<Vec<LeaveRow>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!(
        r#"
        SELECT {LEAVE_COLUMNS}
        FROM (
            SELECT lr.*,
                ROW_NUMBER() OVER (PARTITION BY employee_id ORDER BY created_at DESC, id DESC) AS rn
            FROM leave_requests lr
        ) ranked
        WHERE rn <= ?
        ORDER BY employee_id, created_at DESC, id DESC
        "#
    );
    sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(per_employee)
        .fetch_all(executor)
        .await
}

pub async fn insert_leave<'e, E>(
    executor: E,
    employee_id: u64,
    kind: &LeaveKind,
    reason: &str,
    requested_days: rust_decimal::Decimal,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let period = kind.half_day_period();
    let (custom_start, custom_end) = period.map(|p| p.custom_times()).unwrap_or((None, None));

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, half_day_period,
             custom_start_time, custom_end_time, reason, document, status, requested_days)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(kind.leave_type().to_string())
    .bind(kind.start_date())
    .bind(kind.end_date())
    .bind(period.map(|p| p.slot().to_string()))
    .bind(custom_start)
    .bind(custom_end)
    .bind(reason)
    .bind(kind.document())
    .bind(LeaveStatus::Pending.to_string())
    .bind(requested_days)
    .execute(executor)
    .await?;

    Ok(result.last_insert_id())
}

/// Check-then-set on the status column. Returns false when the request was
/// no longer pending by the time the update ran.
pub async fn set_leave_status<'e, E>(
    executor: E,
    leave_id: u64,
    status: LeaveStatus,
    reviewer: u64,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewed_by = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(status.to_string())
    .bind(reviewer)
    .bind(leave_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Clock events with `from <= occurred_at < until`, oldest first. Rows with
/// an unknown kind are dropped.
pub async fn clock_events<'e, E>(
    executor: E,
    employee_id: Option<u64>,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<Vec<ClockEvent>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let mut sql = String::from(
        r#"
        SELECT employee_id, occurred_at, CAST(kind AS CHAR) AS kind
        FROM clock_events
        WHERE occurred_at >= ? AND occurred_at < ?
        "#,
    );
    if employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    sql.push_str(" ORDER BY occurred_at, id");

    let mut query = sqlx::query_as::<_, ClockEventRow>(&sql).bind(from).bind(until);
    if let Some(id) = employee_id {
        query = query.bind(id);
    }

    let rows = query.fetch_all(executor).await?;
    let total = rows.len();
    let events: Vec<ClockEvent> = rows.into_iter().filter_map(ClockEventRow::into_event).collect();
    if events.len() != total {
        tracing::warn!(dropped = total - events.len(), "Skipped clock events with unknown kind");
    }
    Ok(events)
}

/// Events for the calendar dates `[first, last]`.
pub async fn clock_events_between<'e, E>(
    executor: E,
    employee_id: Option<u64>,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<Vec<ClockEvent>, sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    let from = first.and_time(chrono::NaiveTime::MIN);
    let until = last
        .succ_opt()
        .unwrap_or(NaiveDate::MAX)
        .and_time(chrono::NaiveTime::MIN);
    clock_events(executor, employee_id, from, until).await
}

pub async fn insert_clock_event<'e, E>(executor: E, event: &ClockEvent) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query("INSERT INTO clock_events (employee_id, occurred_at, kind) VALUES (?, ?, ?)")
        .bind(event.employee_id)
        .bind(event.occurred_at)
        .bind(event.kind.to_string())
        .execute(executor)
        .await?;
    Ok(())
}
