use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Directory entry as returned by the API. The credential hash never leaves
/// the persistence layer through this type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 2,
    "username": "jdoe",
    "name": "John Doe",
    "email": "john.doe@company.com",
    "phone": "+8801712345678",
    "role": "employee",
    "department": "Engineering",
    "position": "Developer",
    "created_at": "2026-01-01T09:00:00",
    "updated_at": "2026-01-01T09:00:00"
}))]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub position: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: NaiveDateTime,
}

#[derive(FromRow)]
pub struct UserRow {
    pub id: u64, // BIGINT UNSIGNED
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| format!("user {} has unknown role '{}'", row.id, row.role))?;

        Ok(User {
            id: row.id,
            username: row.username,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            department: row.department,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// What login and password rotation need to see.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

/// A validated user ready to be persisted; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Profile fields a user may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

impl ProfileUpdate {
    /// Empty strings mean "leave unchanged", same as an absent field.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: keep(self.name),
            email: keep(self.email),
            phone: keep(self.phone),
            department: keep(self.department),
            position: keep(self.position),
        }
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(department) = &self.department {
            user.department = Some(department.clone());
        }
        if let Some(position) = &self.position {
            user.position = Some(position.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_profile_fields_are_dropped() {
        let update = ProfileUpdate {
            name: Some("  ".into()),
            email: Some(" new@company.com ".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(update.name, None);
        assert_eq!(update.email.as_deref(), Some("new@company.com"));
    }

    #[test]
    fn row_with_unknown_role_is_rejected() {
        let now = chrono::Local::now().naive_local();
        let row = UserRow {
            id: 7,
            username: "x".into(),
            name: "X".into(),
            email: None,
            phone: None,
            role: "superuser".into(),
            department: None,
            position: None,
            created_at: now,
            updated_at: now,
        };
        assert!(User::try_from(row).is_err());
    }
}
