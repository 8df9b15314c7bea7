use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave_request::LeaveType;

/// Largest value a `DECIMAL(5,1)` day column can hold.
pub fn max_days() -> Decimal {
    Decimal::new(9999, 1)
}

/// Checks that `value` is stored exactly by a `DECIMAL(5,1)` column: at most
/// one fractional digit and no more than [`max_days`]. Sign is left to the
/// caller.
pub fn check_day_amount(field: &str, value: Decimal) -> Result<(), AppError> {
    if value.round_dp(1) != value {
        return Err(AppError::Validation(format!(
            "{field} must have at most one decimal place"
        )));
    }
    if value > max_days() {
        return Err(AppError::Validation(format!(
            "{field} must not exceed {}",
            max_days()
        )));
    }
    Ok(())
}

/// Balance years outside this range are rejected before touching storage.
pub fn check_year(year: i32) -> Result<i32, AppError> {
    if (1970..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::Validation("year is out of range".into()))
    }
}

/// The three limited leave pools stored per (user, year).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BalanceColumn {
    Annual,
    Sick,
    Personal,
}

impl BalanceColumn {
    /// Column name in `leave_balances`. Only these literals are ever
    /// interpolated into SQL.
    pub fn as_sql(self) -> &'static str {
        match self {
            BalanceColumn::Annual => "annual_leave",
            BalanceColumn::Sick => "sick_leave",
            BalanceColumn::Personal => "personal_leave",
        }
    }
}

/// Days granted when a balance row is first created for a user and year.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Allotment {
    pub annual_leave: Decimal,
    pub sick_leave: Decimal,
    pub personal_leave: Decimal,
}

impl Default for Allotment {
    fn default() -> Self {
        Self {
            annual_leave: Decimal::from(10),
            sick_leave: Decimal::from(10),
            personal_leave: Decimal::from(5),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 2,
    "year": 2026,
    "annual_leave": 10.0,
    "sick_leave": 10.0,
    "personal_leave": 5.0,
    "created_at": "2026-01-01T00:00:00",
    "updated_at": "2026-01-01T00:00:00"
}))]
pub struct LeaveBalance {
    pub id: u64,
    pub user_id: u64,
    pub year: i32,
    #[schema(value_type = f64)]
    pub annual_leave: Decimal,
    #[schema(value_type = f64)]
    pub sick_leave: Decimal,
    #[schema(value_type = f64)]
    pub personal_leave: Decimal,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: NaiveDateTime,
}

impl LeaveBalance {
    pub fn remaining(&self, column: BalanceColumn) -> Decimal {
        match column {
            BalanceColumn::Annual => self.annual_leave,
            BalanceColumn::Sick => self.sick_leave,
            BalanceColumn::Personal => self.personal_leave,
        }
    }

    fn remaining_mut(&mut self, column: BalanceColumn) -> &mut Decimal {
        match column {
            BalanceColumn::Annual => &mut self.annual_leave,
            BalanceColumn::Sick => &mut self.sick_leave,
            BalanceColumn::Personal => &mut self.personal_leave,
        }
    }

    /// Fails with `InsufficientBalance` when the pool for `leave_type` holds
    /// fewer than `days`. Unlimited types always pass.
    pub fn ensure_covers(&self, leave_type: LeaveType, days: Decimal) -> Result<(), AppError> {
        match leave_type.balance_column() {
            Some(column) if self.remaining(column) < days => {
                Err(AppError::InsufficientBalance(leave_type))
            }
            _ => Ok(()),
        }
    }

    /// Checks and draws `days` from the pool for `leave_type`.
    pub fn deduct(&mut self, leave_type: LeaveType, days: Decimal) -> Result<(), AppError> {
        self.ensure_covers(leave_type, days)?;
        if let Some(column) = leave_type.balance_column() {
            *self.remaining_mut(column) -= days;
        }
        Ok(())
    }
}

/// Org-wide listing row.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LeaveBalanceWithUser {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub balance: LeaveBalance,
    pub user_name: String,
    pub user_department: Option<String>,
    pub user_position: Option<String>,
}

/// Admin request to overwrite (or create) one user's balance for a year.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetLeaveBalance {
    #[schema(example = 2)]
    pub user_id: u64,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12.0, value_type = f64)]
    pub annual_leave: Decimal,
    #[schema(example = 10.0, value_type = f64)]
    pub sick_leave: Decimal,
    #[schema(example = 5.0, value_type = f64)]
    pub personal_leave: Decimal,
}

impl SetLeaveBalance {
    pub fn validate(&self) -> Result<(), AppError> {
        let values = [
            ("annual_leave", self.annual_leave),
            ("sick_leave", self.sick_leave),
            ("personal_leave", self.personal_leave),
        ];

        if let Some((field, _)) = values.iter().find(|(_, value)| *value < Decimal::ZERO) {
            return Err(AppError::Validation(format!("{field} must not be negative")));
        }
        for (field, value) in values {
            check_day_amount(field, value)?;
        }
        check_year(self.year)?;
        Ok(())
    }

    pub fn allotment(&self) -> Allotment {
        Allotment {
            annual_leave: self.annual_leave,
            sick_leave: self.sick_leave,
            personal_leave: self.personal_leave,
        }
    }
}

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Upsert {
    Created,
    Updated,
}
