use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_token,
        password::{burn_verification, hash_password, validate_new_password, verify_password},
    },
    config::Config,
    error::AppError,
    models::{ChangePasswordReq, LoginReqDto, LoginResponse, LoginUser},
    state::AppState,
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Exchanges credentials for a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::Validation("Username or password required".into()));
    }

    // 2️⃣ Fetch user
    debug!("Fetching user");
    let Some(db_user) = state.users.find_credentials(user.username.trim()).await? else {
        burn_verification(&user.password);
        info!("Invalid credentials: user not found");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    // 3️⃣ Verify password
    if !verify_password(&user.password, &db_user.password_hash) {
        info!(user_id = db_user.id, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    // 4️⃣ Issue token
    let token = generate_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role,
        &config.jwt_secret,
        config.token_ttl_hours,
    )?;

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = state
        .users
        .record_login(db_user.id, Local::now().naive_local())
        .await
    {
        warn!(error = %e, "Failed to update last_login_at");
    }
    state.usernames.mark_taken(&db_user.username).await;

    info!(user_id = db_user.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: LoginUser {
            id: db_user.id,
            username: db_user.username,
            name: db_user.name,
            role: db_user.role,
        },
    }))
}

/// Rotates the caller's own password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordReq,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Password changed"
        })),
        (status = 400, description = "Old password incorrect or new password too short"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn change_password(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ChangePasswordReq>,
) -> Result<HttpResponse, AppError> {
    validate_new_password(&payload.new_password)?;

    let current = state
        .users
        .password_hash(auth.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !verify_password(&payload.old_password, &current) {
        return Err(AppError::Validation("Old password is incorrect".into()));
    }

    let hashed = hash_password(&payload.new_password)?;
    state.users.update_password(auth.user_id, &hashed).await?;

    info!(user_id = auth.user_id, "Password changed");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password changed"
    })))
}
