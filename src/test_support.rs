//! In-memory repositories and fixtures for unit and handler tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceWithUser};
use crate::model::leave_balance::{Allotment, LeaveBalance, LeaveBalanceWithUser, Upsert};
use crate::model::leave_request::{
    LeaveRequest, LeaveRequestWithUser, LeaveStatus, NewLeaveRequest,
};
use crate::model::role::Role;
use crate::model::user::{NewUser, ProfileUpdate, User, UserCredentials};
use crate::repository::{AttendanceRepository, DecisionRecord, LeaveRepository, UserRepository};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
    last_login_at: Option<NaiveDateTime>,
}

#[derive(Clone, Default)]
struct Tables {
    next_id: u64,
    users: Vec<StoredUser>,
    attendance: Vec<AttendanceRecord>,
    requests: Vec<LeaveRequest>,
    balances: Vec<LeaveBalance>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.user.id == id)
    }

    fn ensure_balance(&mut self, user_id: u64, year: i32, allotment: &Allotment) -> usize {
        if let Some(pos) = self
            .balances
            .iter()
            .position(|b| b.user_id == user_id && b.year == year)
        {
            return pos;
        }

        let id = self.next_id();
        let at = now();
        self.balances.push(LeaveBalance {
            id,
            user_id,
            year,
            annual_leave: allotment.annual_leave,
            sick_leave: allotment.sick_leave,
            personal_leave: allotment.personal_leave,
            created_at: at,
            updated_at: at,
        });
        self.balances.len() - 1
    }
}

/// Implements every repository port over plain vectors. Multi-step writes
/// work on a copy of the tables that is only committed on success.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// While set, every repository call fails like an unreachable database.
    pub fn fail_next_queries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Inserts a user whose password never verifies.
    pub fn seed_user(&self, username: &str, role: Role) -> User {
        self.insert_user(username, "!", role)
    }

    pub fn seed_user_with_password(&self, username: &str, password: &str, role: Role) -> User {
        let hash = hash_password(password).unwrap();
        self.insert_user(username, &hash, role)
    }

    fn insert_user(&self, username: &str, password_hash: &str, role: Role) -> User {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let at = now();
        let user = User {
            id,
            username: username.to_string(),
            name: format!("{username} name"),
            email: None,
            phone: None,
            role,
            department: Some("Engineering".into()),
            position: None,
            created_at: at,
            updated_at: at,
        };
        tables.users.push(StoredUser {
            user: user.clone(),
            password_hash: password_hash.to_string(),
            last_login_at: None,
        });
        user
    }

    /// Stores an attendance row as-is, for back-dated fixtures.
    pub fn seed_attendance(&self, user_id: u64, check_in: NaiveDateTime) -> AttendanceRecord {
        let mut tables = self.tables.lock().unwrap();
        let record = AttendanceRecord {
            id: tables.next_id(),
            user_id,
            check_in_time: check_in,
            check_out_time: None,
            check_in_location: None,
            check_out_location: None,
            created_at: check_in,
        };
        tables.attendance.push(record.clone());
        record
    }

    pub fn balance(&self, user_id: u64, year: i32) -> Option<LeaveBalance> {
        let tables = self.tables.lock().unwrap();
        tables
            .balances
            .iter()
            .find(|b| b.user_id == user_id && b.year == year)
            .cloned()
    }

    pub fn request_count(&self) -> usize {
        self.tables.lock().unwrap().requests.len()
    }

    pub fn last_login(&self, user_id: u64) -> Option<NaiveDateTime> {
        let tables = self.tables.lock().unwrap();
        tables.user(user_id).and_then(|u| u.last_login_at)
    }
}

pub fn test_state() -> (AppState, Arc<InMemoryStore>) {
    let store = InMemoryStore::shared();
    (AppState::new(store.clone()), store)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.lock()?.user(id).map(|u| u.user.clone()))
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.username.eq_ignore_ascii_case(username))
            .map(|u| UserCredentials {
                id: u.user.id,
                username: u.user.username.clone(),
                password_hash: u.password_hash.clone(),
                name: u.user.name.clone(),
                role: u.user.role,
            }))
    }

    async fn password_hash(&self, id: u64) -> AppResult<Option<String>> {
        Ok(self.lock()?.user(id).map(|u| u.password_hash.clone()))
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .lock()?
            .users
            .iter()
            .any(|u| u.user.username.eq_ignore_ascii_case(username)))
    }

    async fn usernames(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>> {
        let tables = self.lock()?;
        let since = active_within_days.map(|days| now() - Duration::days(days.into()));

        Ok(tables
            .users
            .iter()
            .filter(|u| match since {
                Some(since) => u.last_login_at.is_some_and(|at| at >= since),
                None => true,
            })
            .map(|u| u.user.username.clone())
            .collect())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let tables = self.lock()?;
        let mut users: Vec<User> = tables.users.iter().map(|u| u.user.clone()).collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;
        if tables
            .users
            .iter()
            .any(|u| u.user.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(AppError::Conflict("Username already exists".into()));
        }

        let id = tables.next_id();
        let at = now();
        let created = User {
            id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            department: user.department.clone(),
            position: user.position.clone(),
            created_at: at,
            updated_at: at,
        };
        tables.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
            last_login_at: None,
        });
        Ok(created)
    }

    async fn update_profile(&self, id: u64, update: &ProfileUpdate) -> AppResult<Option<User>> {
        let mut tables = self.lock()?;
        let Some(stored) = tables.users.iter_mut().find(|u| u.user.id == id) else {
            return Ok(None);
        };
        update.apply_to(&mut stored.user);
        stored.user.updated_at = now();
        Ok(Some(stored.user.clone()))
    }

    async fn update_password(&self, id: u64, password_hash: &str) -> AppResult<()> {
        let mut tables = self.lock()?;
        if let Some(stored) = tables.users.iter_mut().find(|u| u.user.id == id) {
            stored.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()> {
        let mut tables = self.lock()?;
        if let Some(stored) = tables.users.iter_mut().find(|u| u.user.id == id) {
            stored.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> AppResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.user.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        tables.attendance.retain(|a| a.user_id != id);
        tables.requests.retain(|r| r.user_id != id);
        tables.balances.retain(|b| b.user_id != id);
        for request in tables.requests.iter_mut() {
            if request.approver_id == Some(id) {
                request.approver_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryStore {
    async fn find_for_day(
        &self,
        user_id: u64,
        day: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id && a.check_in_time.date() == day)
            .min_by_key(|a| a.check_in_time)
            .cloned())
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord> {
        let mut tables = self.lock()?;
        let record = AttendanceRecord {
            id: tables.next_id(),
            user_id,
            check_in_time: at,
            check_out_time: None,
            check_in_location: location.map(str::to_string),
            check_out_location: None,
            created_at: at,
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn set_check_out(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord> {
        let mut tables = self.lock()?;
        let record = tables
            .attendance
            .iter_mut()
            .find(|a| a.id == record_id)
            .ok_or(AppError::NotFound("Attendance record"))?;
        record.check_out_time = Some(at);
        record.check_out_location = location.map(str::to_string);
        Ok(record.clone())
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| (from..=to).contains(&a.check_in_time.date()))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        Ok(records)
    }

    async fn list_all(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<AttendanceWithUser>> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables
            .attendance
            .iter()
            .filter(|a| (from..=to).contains(&a.check_in_time.date()))
            .filter_map(|a| {
                tables.user(a.user_id).map(|u| AttendanceWithUser {
                    record: a.clone(),
                    user_name: u.user.name.clone(),
                    user_department: u.user.department.clone(),
                })
            })
            .collect();
        records.sort_by(|a, b| b.record.check_in_time.cmp(&a.record.check_in_time));
        Ok(records)
    }
}

#[async_trait]
impl LeaveRepository for InMemoryStore {
    async fn ensure_balance(
        &self,
        user_id: u64,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveBalance> {
        let mut tables = self.lock()?;
        let pos = tables.ensure_balance(user_id, year, allotment);
        Ok(tables.balances[pos].clone())
    }

    async fn create_request(
        &self,
        user_id: u64,
        request: &NewLeaveRequest,
        year: i32,
        allotment: &Allotment,
        now: NaiveDateTime,
    ) -> AppResult<LeaveRequest> {
        let mut tables = self.lock()?;
        let mut tx = tables.clone();

        let pos = tx.ensure_balance(user_id, year, allotment);
        tx.balances[pos].ensure_covers(request.leave_type, request.days)?;

        let created = LeaveRequest {
            id: tx.next_id(),
            user_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            days: request.days,
            reason: request.reason.trim().to_string(),
            status: LeaveStatus::Pending,
            approver_id: None,
            remark: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        };
        tx.requests.push(created.clone());

        *tables = tx;
        Ok(created)
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let tables = self.lock()?;
        Ok(tables.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn decide_request(
        &self,
        id: u64,
        decision: &DecisionRecord,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveRequest> {
        let mut tables = self.lock()?;
        let mut tx = tables.clone();

        let request = tx
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound("Leave request"))?;
        request.status = request.status.decide(decision.decision)?;
        request.approver_id = Some(decision.approver_id);
        request.remark = decision.remark.clone();
        request.decided_at = Some(decision.at);
        request.updated_at = decision.at;
        let decided = request.clone();

        if decided.status == LeaveStatus::Approved && decided.leave_type.balance_column().is_some()
        {
            let pos = tx.ensure_balance(decided.user_id, year, allotment);
            let balance = &mut tx.balances[pos];
            balance.deduct(decided.leave_type, decided.days)?;
            balance.updated_at = decision.at;
        }

        *tables = tx;
        Ok(decided)
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        status: Option<LeaveStatus>,
    ) -> AppResult<Vec<LeaveRequest>> {
        let tables = self.lock()?;
        let mut requests: Vec<_> = tables
            .requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(requests)
    }

    async fn list_all(&self, status: Option<LeaveStatus>) -> AppResult<Vec<LeaveRequestWithUser>> {
        let tables = self.lock()?;
        let mut requests: Vec<_> = tables
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .filter_map(|r| {
                tables.user(r.user_id).map(|u| LeaveRequestWithUser {
                    request: r.clone(),
                    user_name: u.user.name.clone(),
                    user_department: u.user.department.clone(),
                })
            })
            .collect();
        requests.sort_by(|a, b| {
            (b.request.created_at, b.request.id).cmp(&(a.request.created_at, a.request.id))
        });
        Ok(requests)
    }

    async fn list_balances(&self, year: i32) -> AppResult<Vec<LeaveBalanceWithUser>> {
        let tables = self.lock()?;
        let mut balances: Vec<_> = tables
            .balances
            .iter()
            .filter(|b| b.year == year)
            .filter_map(|b| {
                tables.user(b.user_id).map(|u| LeaveBalanceWithUser {
                    balance: b.clone(),
                    user_name: u.user.name.clone(),
                    user_department: u.user.department.clone(),
                    user_position: u.user.position.clone(),
                })
            })
            .collect();
        balances.sort_by(|a, b| {
            (&a.user_department, &a.user_name).cmp(&(&b.user_department, &b.user_name))
        });
        Ok(balances)
    }

    async fn set_balance(&self, user_id: u64, year: i32, values: &Allotment) -> AppResult<Upsert> {
        let mut tables = self.lock()?;
        let at = now();

        if let Some(balance) = tables
            .balances
            .iter_mut()
            .find(|b| b.user_id == user_id && b.year == year)
        {
            balance.annual_leave = values.annual_leave;
            balance.sick_leave = values.sick_leave;
            balance.personal_leave = values.personal_leave;
            balance.updated_at = at;
            return Ok(Upsert::Updated);
        }

        tables.ensure_balance(user_id, year, values);
        Ok(Upsert::Created)
    }
}
