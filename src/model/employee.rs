use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "hire_date": "2024-01-01",
        "status": "active",
        "monthly_leave_allowance": "4"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,

    /// Leave days per month; the configured default applies when unset.
    #[schema(example = "4", value_type = Option<String>, nullable = true)]
    pub monthly_leave_allowance: Option<Decimal>,
}

impl Employee {
    pub fn allowance_or(&self, default: Decimal) -> Decimal {
        self.monthly_leave_allowance.unwrap_or(default)
    }
}
