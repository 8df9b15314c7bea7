use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::password::{hash_password, validate_new_password};
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::{NewUser, ProfileUpdate, User};
use crate::repository::{LeaveRepository, UserRepository};
use crate::service::leave::{current_year, ensure_balance};
use crate::utils::username_index::UsernameIndex;

/// Admin request to create a directory entry.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "changeme", min_length = 6)]
    pub password: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Defaults to `employee`.
    pub role: Option<Role>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Developer")]
    pub position: Option<String>,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Borrowed handles the directory operations work against.
pub struct Directory<'a> {
    pub users: &'a dyn UserRepository,
    pub leave: &'a dyn LeaveRepository,
    pub usernames: &'a UsernameIndex,
}

impl Directory<'_> {
    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    pub async fn get(&self, id: u64) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn create(&self, payload: CreateUser) -> AppResult<User> {
        let username = payload.username.trim().to_string();
        let name = payload.name.trim().to_string();

        if username.is_empty() {
            return Err(AppError::Validation("username is required".into()));
        }
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        validate_new_password(&payload.password)?;

        if self.usernames.is_taken(self.users, &username).await? {
            return Err(AppError::Conflict("Username already exists".into()));
        }

        let new_user = NewUser {
            username,
            password_hash: hash_password(&payload.password)?,
            name,
            email: optional(payload.email),
            phone: optional(payload.phone),
            role: payload.role.unwrap_or(Role::Employee),
            department: optional(payload.department),
            position: optional(payload.position),
        };

        let user = self.users.create(&new_user).await?;
        self.usernames.mark_taken(&user.username).await;

        if let Err(e) = ensure_balance(self.leave, user.id, current_year()).await {
            warn!(user_id = user.id, error = %e, "Failed to provision leave balance");
        }

        info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: u64, update: ProfileUpdate) -> AppResult<User> {
        let update = update.normalized();
        let user = self
            .users
            .update_profile(id, &update)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        info!(user_id = id, "Profile updated");
        Ok(user)
    }

    pub async fn delete(&self, id: u64) -> AppResult<()> {
        let user = self.get(id).await?;

        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User"));
        }
        self.usernames.forget(&user.username).await;

        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Creates the configured admin account unless a user of that name
    /// already exists. Returns whether one was created.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        if self.users.username_exists(username).await? {
            return Ok(false);
        }

        self.create(CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            name: "Administrator".into(),
            email: None,
            phone: None,
            role: Some(Role::Admin),
            department: None,
            position: None,
        })
        .await?;

        info!(username, "Bootstrap admin created");
        Ok(true)
    }
}
