use crate::{
    api::DateRangeQuery,
    auth::{auth::AuthUser, policy::Capability},
    error::AppError,
    model::attendance::AttendanceRecord,
    service::attendance as attendance_service,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Optional body for check-in and check-out.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LocationPayload {
    #[schema(example = "HQ, floor 3")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub record: AttendanceRecord,
}

fn location(body: Option<web::Json<LocationPayload>>) -> Option<String> {
    body.and_then(|b| b.into_inner().location)
}

/* =========================
Check in
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = LocationPayload, description = "Optional location", content_type = "application/json"),
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "Already checked in today",
            "code": "ALREADY_CHECKED_IN"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: Option<web::Json<LocationPayload>>,
) -> Result<HttpResponse, AppError> {
    let record =
        attendance_service::check_in(state.attendance.as_ref(), auth.user_id, location(body))
            .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse {
        message: "Checked in successfully".into(),
        record,
    }))
}

/* =========================
Check out
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body(content = LocationPayload, description = "Optional location", content_type = "application/json"),
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Not checked in, or already checked out today")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: Option<web::Json<LocationPayload>>,
) -> Result<HttpResponse, AppError> {
    let record =
        attendance_service::check_out(state.attendance.as_ref(), auth.user_id, location(body))
            .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse {
        message: "Checked out successfully".into(),
        record,
    }))
}

/* =========================
Own records
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance/my",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Own attendance, newest first", body = [AttendanceRecord]),
        (status = 400, description = "end_date before start_date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let records = attendance_service::my_records(
        state.attendance.as_ref(),
        auth.user_id,
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's check-in state", body = crate::model::attendance::TodayStatus),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let status = attendance_service::today_status(state.attendance.as_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

/* =========================
Org-wide records (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "All attendance in range, newest first", body = [crate::model::attendance::AttendanceWithUser]),
        (status = 400, description = "end_date before start_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn all_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ViewAllAttendance)?;

    let records =
        attendance_service::all_records(state.attendance.as_ref(), query.start_date, query.end_date)
            .await?;

    Ok(HttpResponse::Ok().json(records))
}
