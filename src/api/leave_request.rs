use crate::{
    auth::{auth::AuthUser, policy::Capability},
    error::AppError,
    model::leave_request::{Decision, LeaveRequest, NewLeaveRequest},
    service::leave as leave_service,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by status: pending, approved or rejected
    #[param(example = "pending")]
    pub status: Option<String>,
}

/// Admin decision on a pending request. The approver is the caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideLeave {
    #[schema(example = "approved")]
    pub status: Decision,
    #[schema(example = "Enjoy the trip")]
    pub remark: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    pub request: LeaveRequest,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = NewLeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Invalid dates, days or reason"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Insufficient balance", body = Object, example = json!({
            "error": "Insufficient annual leave balance",
            "code": "INSUFFICIENT_BALANCE"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewLeaveRequest>,
) -> Result<HttpResponse, AppError> {
    let request =
        leave_service::create_request(state.leave.as_ref(), auth.user_id, payload.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(LeaveResponse {
        message: "Leave request submitted".into(),
        request,
    }))
}

/* =========================
Own requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests/my",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Own requests, newest first", body = [LeaveRequest]),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    let status = leave_service::parse_status(query.status.as_deref())?;
    let requests =
        leave_service::list_my_requests(state.leave.as_ref(), auth.user_id, status).await?;

    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
All requests (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveFilter),
    responses(
        (status = 200, description = "All requests with requester details", body = [crate::model::leave_request::LeaveRequestWithUser]),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ViewAllLeaveRequests)?;

    let status = leave_service::parse_status(query.status.as_deref())?;
    let requests = leave_service::list_requests(state.leave.as_ref(), status).await?;

    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
Decide leave (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Decision recorded", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided, or balance no longer covers the request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::DecideLeave)?;

    let leave_id = path.into_inner();
    let DecideLeave { status, remark } = payload.into_inner();

    let decided =
        leave_service::decide_request(state.leave.as_ref(), leave_id, status, auth.user_id, remark)
            .await?;

    Ok(HttpResponse::Ok().json(decided))
}
