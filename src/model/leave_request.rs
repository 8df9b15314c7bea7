use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave_balance::{BalanceColumn, check_day_amount};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Other,
}

impl LeaveType {
    /// Balance column drawn down by this leave type. `Other` has none and is
    /// never limited.
    pub fn balance_column(self) -> Option<BalanceColumn> {
        match self {
            LeaveType::Annual => Some(BalanceColumn::Annual),
            LeaveType::Sick => Some(BalanceColumn::Sick),
            LeaveType::Personal => Some(BalanceColumn::Personal),
            LeaveType::Other => None,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Outcome an approver can record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// The only transitions are `pending -> approved` and `pending -> rejected`.
    pub fn decide(self, decision: Decision) -> Result<LeaveStatus, AppError> {
        match self {
            LeaveStatus::Pending => Ok(match decision {
                Decision::Approved => LeaveStatus::Approved,
                Decision::Rejected => LeaveStatus::Rejected,
            }),
            LeaveStatus::Approved | LeaveStatus::Rejected => Err(AppError::AlreadyDecided),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 2,
    "leave_type": "annual",
    "start_date": "2026-02-02",
    "end_date": "2026-02-06",
    "days": 5.0,
    "reason": "Family trip",
    "status": "pending",
    "approver_id": null,
    "remark": null,
    "decided_at": null,
    "created_at": "2026-01-20T10:00:00",
    "updated_at": "2026-01-20T10:00:00"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: LeaveType,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(value_type = f64)]
    pub days: Decimal,
    pub reason: String,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub remark: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub decided_at: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: NaiveDateTime,
}

#[derive(FromRow)]
pub struct LeaveRequestRow {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Decimal,
    pub reason: String,
    pub status: String,
    pub approver_id: Option<u64>,
    pub remark: Option<String>,
    pub decided_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = String;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let leave_type = LeaveType::from_str(&row.leave_type)
            .map_err(|_| format!("leave request {} has unknown type '{}'", row.id, row.leave_type))?;
        let status = LeaveStatus::from_str(&row.status)
            .map_err(|_| format!("leave request {} has unknown status '{}'", row.id, row.status))?;

        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            status,
            approver_id: row.approver_id,
            remark: row.remark,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Org-wide listing row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveRequestWithUser {
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub user_name: String,
    pub user_department: Option<String>,
}

#[derive(FromRow)]
pub struct LeaveRequestWithUserRow {
    #[sqlx(flatten)]
    pub request: LeaveRequestRow,
    pub user_name: String,
    pub user_department: Option<String>,
}

impl TryFrom<LeaveRequestWithUserRow> for LeaveRequestWithUser {
    type Error = String;

    fn try_from(row: LeaveRequestWithUserRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequestWithUser {
            request: row.request.try_into()?,
            user_name: row.user_name,
            user_department: row.user_department,
        })
    }
}

/// Request body for a new leave application.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLeaveRequest {
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 5.0, value_type = f64)]
    pub days: Decimal,
    #[schema(example = "Family trip")]
    pub reason: String,
}

impl NewLeaveRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_date < self.start_date {
            return Err(AppError::Validation(
                "end_date cannot be before start_date".into(),
            ));
        }
        if self.days <= Decimal::ZERO {
            return Err(AppError::Validation("days must be greater than 0".into()));
        }
        check_day_amount("days", self.days)?;
        if self.reason.trim().is_empty() {
            return Err(AppError::Validation("reason is required".into()));
        }
        Ok(())
    }
}
