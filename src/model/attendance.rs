use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 2,
    "check_in_time": "2026-01-05T09:01:12",
    "check_out_time": "2026-01-05T18:03:40",
    "check_in_location": "HQ",
    "check_out_location": null,
    "created_at": "2026-01-05T09:01:12"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(format = "date-time", value_type = String)]
    pub check_in_time: NaiveDateTime,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_out_time: Option<NaiveDateTime>,
    pub check_in_location: Option<String>,
    pub check_out_location: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// Org-wide listing row: the record plus who it belongs to.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AttendanceWithUser {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: AttendanceRecord,
    pub user_name: String,
    pub user_department: Option<String>,
}

/// Today's state for the calling user.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodayStatus {
    pub checked_in: bool,
    pub checked_out: bool,
    pub record: Option<AttendanceRecord>,
}

impl From<Option<AttendanceRecord>> for TodayStatus {
    fn from(record: Option<AttendanceRecord>) -> Self {
        Self {
            checked_in: record.is_some(),
            checked_out: record.as_ref().is_some_and(AttendanceRecord::is_checked_out),
            record,
        }
    }
}
