use chrono::{Datelike, Local};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::model::leave_balance::{
    Allotment, LeaveBalance, LeaveBalanceWithUser, SetLeaveBalance, Upsert, check_year,
};
use crate::model::leave_request::{
    Decision, LeaveRequest, LeaveRequestWithUser, LeaveStatus, NewLeaveRequest,
};
use crate::repository::{DecisionRecord, LeaveRepository, UserRepository};

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Parses an optional `status` query value.
pub fn parse_status(raw: Option<&str>) -> AppResult<Option<LeaveStatus>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<LeaveStatus>()
                .map_err(|_| AppError::Validation(format!("Unknown leave status '{s}'")))
        })
        .transpose()
}

/// Returns the (user, year) balance, creating it with the default allotment
/// on first use.
pub async fn ensure_balance(
    leave: &dyn LeaveRepository,
    user_id: u64,
    year: i32,
) -> AppResult<LeaveBalance> {
    leave
        .ensure_balance(user_id, year, &Allotment::default())
        .await
}

pub async fn get_balance(
    leave: &dyn LeaveRepository,
    user_id: u64,
    year: Option<i32>,
) -> AppResult<LeaveBalance> {
    let year = check_year(year.unwrap_or_else(current_year))?;
    ensure_balance(leave, user_id, year).await
}

pub async fn create_request(
    leave: &dyn LeaveRepository,
    user_id: u64,
    request: NewLeaveRequest,
) -> AppResult<LeaveRequest> {
    request.validate()?;

    let created = leave
        .create_request(
            user_id,
            &request,
            current_year(),
            &Allotment::default(),
            Local::now().naive_local(),
        )
        .await?;

    info!(
        request_id = created.id,
        user_id,
        leave_type = %created.leave_type,
        days = %created.days,
        "Leave request submitted"
    );
    Ok(created)
}

/// Records an admin's decision. Approval draws the days from the requester's
/// current-year balance in the same transaction.
pub async fn decide_request(
    leave: &dyn LeaveRepository,
    request_id: u64,
    decision: Decision,
    approver_id: u64,
    remark: Option<String>,
) -> AppResult<LeaveRequest> {
    let record = DecisionRecord {
        decision,
        approver_id,
        remark: remark
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        at: Local::now().naive_local(),
    };

    let decided = leave
        .decide_request(request_id, &record, current_year(), &Allotment::default())
        .await?;

    info!(
        request_id,
        approver_id,
        status = %decided.status,
        "Leave request decided"
    );
    Ok(decided)
}

pub async fn list_my_requests(
    leave: &dyn LeaveRepository,
    user_id: u64,
    status: Option<LeaveStatus>,
) -> AppResult<Vec<LeaveRequest>> {
    leave.list_for_user(user_id, status).await
}

pub async fn list_requests(
    leave: &dyn LeaveRepository,
    status: Option<LeaveStatus>,
) -> AppResult<Vec<LeaveRequestWithUser>> {
    leave.list_all(status).await
}

pub async fn list_balances(
    leave: &dyn LeaveRepository,
    year: Option<i32>,
) -> AppResult<Vec<LeaveBalanceWithUser>> {
    let year = check_year(year.unwrap_or_else(current_year))?;
    debug!(year, "Listing leave balances");
    leave.list_balances(year).await
}

pub async fn set_balance(
    users: &dyn UserRepository,
    leave: &dyn LeaveRepository,
    payload: &SetLeaveBalance,
) -> AppResult<Upsert> {
    payload.validate()?;

    if users.find_by_id(payload.user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    let outcome = leave
        .set_balance(payload.user_id, payload.year, &payload.allotment())
        .await?;

    info!(
        user_id = payload.user_id,
        year = payload.year,
        ?outcome,
        "Leave balance set"
    );
    Ok(outcome)
}
