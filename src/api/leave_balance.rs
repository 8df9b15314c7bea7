use crate::{
    auth::{auth::AuthUser, policy::Capability},
    error::AppError,
    model::leave_balance::{SetLeaveBalance, Upsert},
    service::leave as leave_service,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct YearQuery {
    /// Calendar year, defaults to the current one
    #[param(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetBalanceResponse {
    #[schema(example = "Leave balance created")]
    pub message: String,
    pub user_id: u64,
    pub year: i32,
}

#[utoipa::path(
    get,
    path = "/api/leave-balances/my",
    params(YearQuery),
    responses(
        (status = 200, description = "Own balance, created with the default allotment if missing", body = crate::model::leave_balance::LeaveBalance),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn my_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, AppError> {
    let balance = leave_service::get_balance(state.leave.as_ref(), auth.user_id, query.year).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    get,
    path = "/api/leave-balances",
    params(YearQuery),
    responses(
        (status = 200, description = "Balances ordered by department then name", body = [crate::model::leave_balance::LeaveBalanceWithUser]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn list_balances(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ManageLeaveBalances)?;

    let balances = leave_service::list_balances(state.leave.as_ref(), query.year).await?;
    Ok(HttpResponse::Ok().json(balances))
}

#[utoipa::path(
    put,
    path = "/api/leave-balances",
    request_body = SetLeaveBalance,
    responses(
        (status = 201, description = "Balance created", body = SetBalanceResponse),
        (status = 200, description = "Balance updated", body = SetBalanceResponse),
        (status = 400, description = "Negative value or bad year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn set_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<SetLeaveBalance>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ManageLeaveBalances)?;

    let outcome =
        leave_service::set_balance(state.users.as_ref(), state.leave.as_ref(), &payload).await?;

    let (mut response, message) = match outcome {
        Upsert::Created => (HttpResponse::Created(), "Leave balance created"),
        Upsert::Updated => (HttpResponse::Ok(), "Leave balance updated"),
    };

    Ok(response.json(SetBalanceResponse {
        message: message.into(),
        user_id: payload.user_id,
        year: payload.year,
    }))
}
