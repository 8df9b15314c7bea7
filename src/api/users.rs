use crate::{
    api::{MessageResponse, directory},
    auth::{auth::AuthUser, policy::Capability},
    error::AppError,
    model::user::ProfileUpdate,
    service::directory::CreateUser,
    state::AppState,
};
use actix_web::{HttpResponse, web};

/// Swagger doc for list_users endpoint
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, newest first", body = [crate::model::user::User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ManageUsers)?;

    let users = directory(&state).list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Swagger doc for create_user endpoint
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = crate::model::user::User),
        (status = 400, description = "Missing field or password too short"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already exists", body = Object, example = json!({
            "error": "Username already exists",
            "code": "CONFLICT"
        }))
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ManageUsers)?;

    let user = directory(&state).create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Swagger doc for get_user endpoint
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = crate::model::user::User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Neither the owner nor an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.authorize(Capability::ReadProfile, Some(user_id))?;

    let user = directory(&state).get(user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Swagger doc for update_user endpoint
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = crate::model::user::User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Neither the owner nor an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    auth.authorize(Capability::UpdateProfile, Some(user_id))?;

    let user = directory(&state)
        .update(user_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Swagger doc for delete_user endpoint
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted with all their records", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require(Capability::ManageUsers)?;

    directory(&state).delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted")))
}
