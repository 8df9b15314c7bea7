use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod repository;
mod routes;
mod service;
mod state;
#[cfg(test)]
mod test_support;
mod utils;

use config::Config;
use db::{MySqlStore, init_db, init_schema};
use routes::RateLimiters;
use state::AppState;

use crate::docs::ApiDoc;
use serde_json::json;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("failed to connect to database")?;
    init_schema(&pool)
        .await
        .context("failed to initialize schema")?;

    let state = AppState::mysql(MySqlStore::new(pool));

    api::directory(&state)
        .ensure_bootstrap_admin(&config.admin_username, &config.admin_password)
        .await
        .context("failed to create bootstrap admin")?;

    let filter_state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = filter_state
            .usernames
            .warmup_filter(filter_state.users.as_ref(), 100)
            .await
        {
            error!(error = %e, "Failed to warmup username filter");
        }
    });

    let cache_state = state.clone();
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = cache_state
            .usernames
            .warmup_cache(cache_state.users.as_ref(), 30, 250)
            .await
        {
            error!(error = %e, "Failed to warmup username cache");
        }
    });

    let limiters = RateLimiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let state = Data::new(state);
    let config_data = Data::new(config);

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config_data.clone())
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config_data, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
