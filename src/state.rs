use std::sync::Arc;

use crate::db::MySqlStore;
use crate::repository::{AttendanceRepository, LeaveRepository, UserRepository};
use crate::utils::username_index::UsernameIndex;

/// Shared handles every handler receives through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub leave: Arc<dyn LeaveRepository>,
    pub usernames: Arc<UsernameIndex>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + AttendanceRepository + LeaveRepository + 'static,
    {
        Self {
            users: store.clone(),
            attendance: store.clone(),
            leave: store,
            usernames: Arc::new(UsernameIndex::default()),
        }
    }

    pub fn mysql(store: MySqlStore) -> Self {
        Self::new(Arc::new(store))
    }
}
