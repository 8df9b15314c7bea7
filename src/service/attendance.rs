use chrono::{Local, Months, NaiveDate};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, AttendanceWithUser, TodayStatus};
use crate::repository::AttendanceRepository;

/// Inclusive date window for attendance listings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Missing bounds default to one month back and to `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| {
            end.checked_sub_months(Months::new(1))
                .unwrap_or(NaiveDate::MIN)
        });

        if end < start {
            return Err(AppError::Validation(
                "end_date cannot be before start_date".into(),
            ));
        }
        Ok(Self { start, end })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn clean(location: Option<String>) -> Option<String> {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

pub async fn check_in(
    attendance: &dyn AttendanceRepository,
    user_id: u64,
    location: Option<String>,
) -> AppResult<AttendanceRecord> {
    let now = Local::now().naive_local();

    if attendance.find_for_day(user_id, now.date()).await?.is_some() {
        return Err(AppError::AlreadyCheckedIn);
    }

    let location = clean(location);
    let record = attendance
        .insert_check_in(user_id, now, location.as_deref())
        .await?;

    info!(user_id, record_id = record.id, "Checked in");
    Ok(record)
}

pub async fn check_out(
    attendance: &dyn AttendanceRepository,
    user_id: u64,
    location: Option<String>,
) -> AppResult<AttendanceRecord> {
    let now = Local::now().naive_local();

    let record = attendance
        .find_for_day(user_id, now.date())
        .await?
        .ok_or(AppError::NotCheckedIn)?;
    if record.is_checked_out() {
        return Err(AppError::AlreadyCheckedOut);
    }

    let location = clean(location);
    let record = attendance
        .set_check_out(record.id, now, location.as_deref())
        .await?;

    info!(user_id, record_id = record.id, "Checked out");
    Ok(record)
}

pub async fn my_records(
    attendance: &dyn AttendanceRepository,
    user_id: u64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> AppResult<Vec<AttendanceRecord>> {
    let range = DateRange::resolve(start, end, today())?;
    attendance
        .list_for_user(user_id, range.start, range.end)
        .await
}

pub async fn today_status(
    attendance: &dyn AttendanceRepository,
    user_id: u64,
) -> AppResult<TodayStatus> {
    let record = attendance.find_for_day(user_id, today()).await?;
    Ok(TodayStatus::from(record))
}

pub async fn all_records(
    attendance: &dyn AttendanceRepository,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> AppResult<Vec<AttendanceWithUser>> {
    let range = DateRange::resolve(start, end, today())?;
    attendance.list_all(range.start, range.end).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::test_support::InMemoryStore;
    use chrono::Duration;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[rstest]
    #[case(None, None, "2026-02-15", "2026-03-15")]
    #[case(Some("2026-03-01"), None, "2026-03-01", "2026-03-15")]
    #[case(None, Some("2026-03-31"), "2026-02-28", "2026-03-31")]
    fn range_defaults_to_last_month(
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] expected_start: &str,
        #[case] expected_end: &str,
    ) {
        let range = DateRange::resolve(start.map(date), end.map(date), date("2026-03-15")).unwrap();
        assert_eq!(range.start, date(expected_start));
        assert_eq!(range.end, date(expected_end));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::resolve(
            Some(date("2026-03-10")),
            Some(date("2026-03-09")),
            date("2026-03-15"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[actix_web::test]
    async fn full_day_cycle() {
        let store = InMemoryStore::default();
        let user = store.seed_user("jdoe", Role::Employee).id;

        let status = today_status(&store, user).await.unwrap();
        assert!(!status.checked_in);

        let err = check_out(&store, user, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotCheckedIn));

        let record = check_in(&store, user, Some(" HQ ".into())).await.unwrap();
        assert_eq!(record.check_in_location.as_deref(), Some("HQ"));

        let err = check_in(&store, user, None).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedIn));

        let record = check_out(&store, user, Some("Home".into())).await.unwrap();
        assert!(record.check_out_time.is_some());
        assert_eq!(record.check_out_location.as_deref(), Some("Home"));

        let err = check_out(&store, user, None).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedOut));

        let status = today_status(&store, user).await.unwrap();
        assert!(status.checked_in && status.checked_out);

        let mine = my_records(&store, user, None, None).await.unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[actix_web::test]
    async fn yesterdays_record_does_not_block_todays_check_in() {
        let store = InMemoryStore::default();
        let user = store.seed_user("jdoe", Role::Employee).id;
        store.seed_attendance(user, Local::now().naive_local() - Duration::days(1));

        check_in(&store, user, None).await.unwrap();

        let mine = my_records(&store, user, None, None).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].check_in_time > mine[1].check_in_time);
    }

    #[actix_web::test]
    async fn org_wide_listing_respects_the_range() {
        let store = InMemoryStore::default();
        let a = store.seed_user("alice", Role::Employee).id;
        let b = store.seed_user("bob", Role::Employee).id;
        store.seed_attendance(a, Local::now().naive_local() - Duration::days(40));
        check_in(&store, a, None).await.unwrap();
        check_in(&store, b, None).await.unwrap();

        let all = all_records(&store, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.user_department.as_deref() == Some("Engineering")));

        let everything = all_records(&store, Some(today() - Duration::days(60)), None)
            .await
            .unwrap();
        assert_eq!(everything.len(), 3);
    }
}
