//! Persistence ports. Services only see these traits; `db::MySqlStore`
//! implements them against MySQL.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppResult;
use crate::model::attendance::{AttendanceRecord, AttendanceWithUser};
use crate::model::leave_balance::{Allotment, LeaveBalance, LeaveBalanceWithUser, Upsert};
use crate::model::leave_request::{
    Decision, LeaveRequest, LeaveRequestWithUser, LeaveStatus, NewLeaveRequest,
};
use crate::model::user::{NewUser, ProfileUpdate, User, UserCredentials};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>>;

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;

    async fn password_hash(&self, id: u64) -> AppResult<Option<String>>;

    async fn username_exists(&self, username: &str) -> AppResult<bool>;

    /// Usernames for warming the availability index. `active_within_days`
    /// limits the result to users who logged in recently.
    async fn usernames(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    async fn create(&self, user: &NewUser) -> AppResult<User>;

    async fn update_profile(&self, id: u64, update: &ProfileUpdate) -> AppResult<Option<User>>;

    async fn update_password(&self, id: u64, password_hash: &str) -> AppResult<()>;

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()>;

    /// Removes the user together with its attendance, leave and balance rows.
    async fn delete(&self, id: u64) -> AppResult<bool>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn find_for_day(&self, user_id: u64, day: NaiveDate)
    -> AppResult<Option<AttendanceRecord>>;

    async fn insert_check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord>;

    async fn set_check_out(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord>;

    /// Records whose check-in date falls in `[from, to]`, newest first.
    async fn list_for_user(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>>;

    async fn list_all(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<AttendanceWithUser>>;
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    /// Returns the (user, year) balance, inserting `allotment` first when no
    /// row exists. Idempotent.
    async fn ensure_balance(
        &self,
        user_id: u64,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveBalance>;

    /// In one transaction: ensure and lock the balance for `year`, check that
    /// it covers the request, insert the request as pending.
    async fn create_request(
        &self,
        user_id: u64,
        request: &NewLeaveRequest,
        year: i32,
        allotment: &Allotment,
        now: NaiveDateTime,
    ) -> AppResult<LeaveRequest>;

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>>;

    /// In one transaction: lock the request, apply the status transition and,
    /// for an approval, draw the days from the live `year` balance. Nothing is
    /// written if any step fails.
    async fn decide_request(
        &self,
        id: u64,
        decision: &DecisionRecord,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveRequest>;

    async fn list_for_user(
        &self,
        user_id: u64,
        status: Option<LeaveStatus>,
    ) -> AppResult<Vec<LeaveRequest>>;

    async fn list_all(&self, status: Option<LeaveStatus>) -> AppResult<Vec<LeaveRequestWithUser>>;

    async fn list_balances(&self, year: i32) -> AppResult<Vec<LeaveBalanceWithUser>>;

    async fn set_balance(&self, user_id: u64, year: i32, values: &Allotment) -> AppResult<Upsert>;
}

/// Who decided a request, how, and when.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub approver_id: u64,
    pub remark: Option<String>,
    pub at: NaiveDateTime,
}
