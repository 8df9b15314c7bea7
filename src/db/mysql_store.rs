use std::fmt::Display;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;
use futures_util::StreamExt;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceWithUser};
use crate::model::leave_balance::{Allotment, LeaveBalance, LeaveBalanceWithUser, Upsert};
use crate::model::leave_request::{
    LeaveRequest, LeaveRequestRow, LeaveRequestWithUser, LeaveRequestWithUserRow, LeaveStatus,
    NewLeaveRequest,
};
use crate::model::role::Role;
use crate::model::user::{NewUser, ProfileUpdate, User, UserCredentials, UserRow};
use crate::repository::{AttendanceRepository, DecisionRecord, LeaveRepository, UserRepository};

const USER_COLUMNS: &str =
    "id, username, name, email, phone, role, department, position, created_at, updated_at";

const ATTENDANCE_COLUMNS: &str = "id, user_id, check_in_time, check_out_time, \
     check_in_location, check_out_location, created_at";

const LEAVE_COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, days, reason, \
     status, approver_id, remark, decided_at, created_at, updated_at";

const BALANCE_COLUMNS: &str =
    "id, user_id, year, annual_leave, sick_leave, personal_leave, created_at, updated_at";

/// MySQL-backed implementation of every repository port.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Drains a row stream, skipping rows that fail to decode or convert instead
/// of failing the whole listing. Query-level errors still abort.
async fn collect_rows<R, T>(
    mut rows: BoxStream<'_, Result<R, sqlx::Error>>,
    what: &'static str,
) -> AppResult<Vec<T>>
where
    R: TryInto<T>,
    <R as TryInto<T>>::Error: Display,
{
    let mut out = Vec::new();

    while let Some(row) = rows.next().await {
        match row {
            Ok(row) => match row.try_into() {
                Ok(item) => out.push(item),
                Err(e) => warn!(error = %e, what, "Skipping unreadable row"),
            },
            Err(e @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_))) => {
                warn!(error = %e, what, "Skipping undecodable row");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(out)
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

async fn fetch_user(conn: &mut MySqlConnection, id: u64) -> AppResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(User::try_from)
        .transpose()
        .map_err(AppError::Internal)
}

async fn fetch_attendance(
    conn: &mut MySqlConnection,
    id: u64,
) -> AppResult<Option<AttendanceRecord>> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

async fn fetch_request(
    conn: &mut MySqlConnection,
    id: u64,
    for_update: bool,
) -> AppResult<Option<LeaveRequest>> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let row = sqlx::query_as::<_, LeaveRequestRow>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?{lock}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(LeaveRequest::try_from)
        .transpose()
        .map_err(AppError::Internal)
}

/// Inserts the default row for (user, year) unless one already exists.
/// Returns whether a row was inserted.
async fn ensure_balance_row(
    conn: &mut MySqlConnection,
    user_id: u64,
    year: i32,
    allotment: &Allotment,
) -> AppResult<bool> {
    if balance_exists(conn, user_id, year).await? {
        return Ok(false);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO leave_balances (user_id, year, annual_leave, sick_leave, personal_leave)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(year)
    .bind(allotment.annual_leave)
    .bind(allotment.sick_leave)
    .bind(allotment.personal_leave)
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(_) => {
            info!(user_id, year, "Initialized leave balance");
            Ok(true)
        }
        // A concurrent request created it first.
        Err(e) if is_duplicate_key(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn balance_exists(conn: &mut MySqlConnection, user_id: u64, year: i32) -> AppResult<bool> {
    let found: Option<u64> =
        sqlx::query_scalar("SELECT id FROM leave_balances WHERE user_id = ? AND year = ?")
            .bind(user_id)
            .bind(year)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

async fn fetch_balance(
    conn: &mut MySqlConnection,
    user_id: u64,
    year: i32,
    for_update: bool,
) -> AppResult<LeaveBalance> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE user_id = ? AND year = ?{lock}"
    ))
    .bind(user_id)
    .bind(year)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::Internal(format!("balance row missing for user {user_id}/{year}")))
}

#[async_trait]
impl UserRepository for MySqlStore {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, (u64, String, String, String, String)>(
            "SELECT id, username, password, name, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, username, password_hash, name, role)) = row else {
            return Ok(None);
        };
        let role = role
            .parse::<Role>()
            .map_err(|_| AppError::Internal(format!("user {id} has unknown role '{role}'")))?;

        Ok(Some(UserCredentials {
            id,
            username,
            password_hash,
            name,
            role,
        }))
    }

    async fn password_hash(&self, id: u64) -> AppResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hash)
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn usernames(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>> {
        let rows = match active_within_days {
            Some(days) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT username
                FROM users
                WHERE last_login_at >= NOW() - INTERVAL ? DAY
                ORDER BY last_login_at DESC
                "#,
            )
            .bind(days)
            .fetch(&self.pool),
            None => sqlx::query_scalar::<_, String>("SELECT username FROM users").fetch(&self.pool),
        };

        collect_rows::<String, String>(rows, "usernames").await
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch(&self.pool);
        collect_rows::<_, User>(rows, "users").await
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (username, password, name, email, phone, role, department, position)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_ref())
        .bind(&user.department)
        .bind(&user.position)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("Username already exists".into())
            } else {
                e.into()
            }
        })?;

        let id = result.last_insert_id();
        debug!(user_id = id, "User row inserted");

        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {id} vanished after insert")))
    }

    async fn update_profile(&self, id: u64, update: &ProfileUpdate) -> AppResult<Option<User>> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                department = COALESCE(?, department),
                position = COALESCE(?, position),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.department)
        .bind(&update.position)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // The row count cannot tell a missing user from an unchanged one, so re-read.
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    async fn update_password(&self, id: u64, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> AppResult<bool> {
        // Dependent rows go through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttendanceRepository for MySqlStore {
    async fn find_for_day(
        &self,
        user_id: u64,
        day: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance_records
            WHERE user_id = ? AND DATE(check_in_time) = ?
            ORDER BY check_in_time
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (user_id, check_in_time, check_in_location, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(at)
        .bind(location)
        .bind(at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        let mut conn = self.pool.acquire().await?;
        fetch_attendance(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("attendance {id} vanished after insert")))
    }

    async fn set_check_out(
        &self,
        record_id: u64,
        at: NaiveDateTime,
        location: Option<&str>,
    ) -> AppResult<AttendanceRecord> {
        sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_out_time = ?, check_out_location = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(location)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        fetch_attendance(&mut conn, record_id)
            .await?
            .ok_or(AppError::NotFound("Attendance record"))
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance_records
            WHERE user_id = ? AND DATE(check_in_time) BETWEEN ? AND ?
            ORDER BY check_in_time DESC
            "#
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch(&self.pool);

        collect_rows::<_, AttendanceRecord>(rows, "attendance_records").await
    }

    async fn list_all(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<AttendanceWithUser>> {
        let rows = sqlx::query_as::<_, AttendanceWithUser>(
            r#"
            SELECT a.id, a.user_id, a.check_in_time, a.check_out_time,
                   a.check_in_location, a.check_out_location, a.created_at,
                   u.name AS user_name, u.department AS user_department
            FROM attendance_records a
            JOIN users u ON a.user_id = u.id
            WHERE DATE(a.check_in_time) BETWEEN ? AND ?
            ORDER BY a.check_in_time DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch(&self.pool);

        collect_rows::<_, AttendanceWithUser>(rows, "attendance_records").await
    }
}

#[async_trait]
impl LeaveRepository for MySqlStore {
    async fn ensure_balance(
        &self,
        user_id: u64,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveBalance> {
        let mut conn = self.pool.acquire().await?;
        ensure_balance_row(&mut conn, user_id, year, allotment).await?;
        fetch_balance(&mut conn, user_id, year, false).await
    }

    async fn create_request(
        &self,
        user_id: u64,
        request: &NewLeaveRequest,
        year: i32,
        allotment: &Allotment,
        now: NaiveDateTime,
    ) -> AppResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        ensure_balance_row(&mut tx, user_id, year, allotment).await?;
        let balance = fetch_balance(&mut tx, user_id, year, true).await?;
        // Dropping `tx` on the error path rolls back the balance initialization too.
        balance.ensure_covers(request.leave_type, request.days)?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, leave_type, start_date, end_date, days, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(request.reason.trim())
        .bind(LeaveStatus::Pending.as_ref())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id();
        let created = fetch_request(&mut tx, id, false)
            .await?
            .ok_or_else(|| AppError::Internal(format!("leave request {id} vanished after insert")))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let mut conn = self.pool.acquire().await?;
        fetch_request(&mut conn, id, false).await
    }

    async fn decide_request(
        &self,
        id: u64,
        decision: &DecisionRecord,
        year: i32,
        allotment: &Allotment,
    ) -> AppResult<LeaveRequest> {
        let mut tx = self.pool.begin().await?;

        let request = fetch_request(&mut tx, id, true)
            .await?
            .ok_or(AppError::NotFound("Leave request"))?;
        let status = request.status.decide(decision.decision)?;

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?, remark = ?, decided_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_ref())
        .bind(decision.approver_id)
        .bind(&decision.remark)
        .bind(decision.at)
        .bind(decision.at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if status == LeaveStatus::Approved {
            if let Some(column) = request.leave_type.balance_column() {
                ensure_balance_row(&mut tx, request.user_id, year, allotment).await?;
                let balance = fetch_balance(&mut tx, request.user_id, year, true).await?;
                balance.ensure_covers(request.leave_type, request.days)?;

                let column = column.as_sql();
                sqlx::query(&format!(
                    "UPDATE leave_balances SET {column} = {column} - ?, updated_at = ? \
                     WHERE user_id = ? AND year = ?"
                ))
                .bind(request.days)
                .bind(decision.at)
                .bind(request.user_id)
                .bind(year)
                .execute(&mut *tx)
                .await?;
            }
        }

        let decided = fetch_request(&mut tx, id, false)
            .await?
            .ok_or(AppError::NotFound("Leave request"))?;

        tx.commit().await?;
        Ok(decided)
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        status: Option<LeaveStatus>,
    ) -> AppResult<Vec<LeaveRequest>> {
        let mut sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE user_id = ?");
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query_as::<_, LeaveRequestRow>(&sql).bind(user_id);
        if let Some(status) = &status {
            query = query.bind(status.as_ref());
        }

        collect_rows::<_, LeaveRequest>(query.fetch(&self.pool), "leave_requests").await
    }

    async fn list_all(&self, status: Option<LeaveStatus>) -> AppResult<Vec<LeaveRequestWithUser>> {
        let mut sql = String::from(
            r#"
            SELECT l.id, l.user_id, l.leave_type, l.start_date, l.end_date, l.days,
                   l.reason, l.status, l.approver_id, l.remark, l.decided_at,
                   l.created_at, l.updated_at,
                   u.name AS user_name, u.department AS user_department
            FROM leave_requests l
            JOIN users u ON l.user_id = u.id
            "#,
        );
        if status.is_some() {
            sql.push_str(" WHERE l.status = ?");
        }
        sql.push_str(" ORDER BY l.created_at DESC, l.id DESC");

        let mut query = sqlx::query_as::<_, LeaveRequestWithUserRow>(&sql);
        if let Some(status) = &status {
            query = query.bind(status.as_ref());
        }

        collect_rows::<_, LeaveRequestWithUser>(query.fetch(&self.pool), "leave_requests").await
    }

    async fn list_balances(&self, year: i32) -> AppResult<Vec<LeaveBalanceWithUser>> {
        let rows = sqlx::query_as::<_, LeaveBalanceWithUser>(
            r#"
            SELECT lb.id, lb.user_id, lb.year, lb.annual_leave, lb.sick_leave,
                   lb.personal_leave, lb.created_at, lb.updated_at,
                   u.name AS user_name, u.department AS user_department,
                   u.position AS user_position
            FROM leave_balances lb
            JOIN users u ON lb.user_id = u.id
            WHERE lb.year = ?
            ORDER BY u.department, u.name
            "#,
        )
        .bind(year)
        .fetch(&self.pool);

        collect_rows::<_, LeaveBalanceWithUser>(rows, "leave_balances").await
    }

    async fn set_balance(&self, user_id: u64, year: i32, values: &Allotment) -> AppResult<Upsert> {
        let mut tx = self.pool.begin().await?;

        // Inserts the requested values directly when no row exists yet.
        let upsert = if ensure_balance_row(&mut tx, user_id, year, values).await? {
            Upsert::Created
        } else {
            fetch_balance(&mut tx, user_id, year, true).await?;
            sqlx::query(
                r#"
                UPDATE leave_balances
                SET annual_leave = ?, sick_leave = ?, personal_leave = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE user_id = ? AND year = ?
                "#,
            )
            .bind(values.annual_leave)
            .bind(values.sick_leave)
            .bind(values.personal_leave)
            .bind(user_id)
            .bind(year)
            .execute(&mut *tx)
            .await?;
            Upsert::Updated
        };

        tx.commit().await?;
        Ok(upsert)
    }
}
