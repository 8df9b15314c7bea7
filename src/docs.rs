use crate::api::attendance::{AttendanceResponse, LocationPayload};
use crate::api::leave_balance::SetBalanceResponse;
use crate::api::leave_request::{DecideLeave, LeaveResponse};
use crate::api::MessageResponse;
use crate::model::attendance::{AttendanceRecord, AttendanceWithUser, TodayStatus};
use crate::model::leave_balance::{LeaveBalance, LeaveBalanceWithUser, SetLeaveBalance};
use crate::model::leave_request::{
    Decision, LeaveRequest, LeaveRequestWithUser, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::model::role::Role;
use crate::model::user::{ProfileUpdate, User};
use crate::models::{ChangePasswordReq, LoginReqDto, LoginResponse, LoginUser};
use crate::service::directory::CreateUser;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave Management

REST API for a single organization's attendance and leave bookkeeping.

### 🔹 Key Features
- **Users**
  - Admins manage the directory; everyone can read and edit their own profile
- **Attendance**
  - One check-in and one check-out per day, with optional location
- **Leave**
  - Apply for leave, admins approve or reject, balances drawn on approval
- **Leave Balances**
  - Per-year annual/sick/personal allotments, created on first use

### 🔐 Security
Everything except login is protected with **JWT Bearer authentication**.
Org-wide views and decisions require the **admin** role.

### 📦 Errors
Every failure is `{"error": "...", "code": "..."}`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::change_password,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::today,
        crate::api::attendance::all_attendance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::approve_leave,

        crate::api::leave_balance::my_balance,
        crate::api::leave_balance::list_balances,
        crate::api::leave_balance::set_balance
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            LoginUser,
            ChangePasswordReq,
            Role,
            User,
            CreateUser,
            ProfileUpdate,
            MessageResponse,
            AttendanceRecord,
            AttendanceWithUser,
            AttendanceResponse,
            LocationPayload,
            TodayStatus,
            LeaveType,
            LeaveStatus,
            Decision,
            LeaveRequest,
            LeaveRequestWithUser,
            NewLeaveRequest,
            DecideLeave,
            LeaveResponse,
            LeaveBalance,
            LeaveBalanceWithUser,
            SetLeaveBalance,
            SetBalanceResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and password management"),
        (name = "Users", description = "User directory APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Leave Balance", description = "Leave balance APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/login",
            "/api/users/{user_id}",
            "/api/attendance/check-in",
            "/api/leave-requests/{leave_id}/approve",
            "/api/leave-balances",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
