pub mod attendance;
pub mod leave_balance;
pub mod leave_request;
pub mod users;


use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::service::directory::Directory;
use crate::state::AppState;

/// Optional inclusive date window; missing bounds default to the last month.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    /// First day (YYYY-MM-DD)
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD), defaults to today
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Done")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub(crate) fn directory(state: &AppState) -> Directory<'_> {
    Directory {
        users: state.users.as_ref(),
        leave: state.leave.as_ref(),
        usernames: state.usernames.as_ref(),
    }
}
