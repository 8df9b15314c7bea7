use crate::{
    api::{attendance, leave_balance, leave_request, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Malformed bodies, queries and paths answer in the common error format.
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            // Public
            .service(
                web::resource("/auth/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            // Protected
            .service(
                web::scope("")
                    .wrap(from_fn(auth_middleware)) // authentication
                    .wrap(limiters.protected.clone()) // rate limiting
                    .service(
                        web::resource("/auth/change-password")
                            .route(web::post().to(handlers::change_password)),
                    )
                    .service(
                        web::scope("/users")
                            // /users
                            .service(
                                web::resource("")
                                    .route(web::get().to(users::list_users))
                                    .route(web::post().to(users::create_user)),
                            )
                            // /users/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(users::get_user))
                                    .route(web::put().to(users::update_user))
                                    .route(web::delete().to(users::delete_user)),
                            ),
                    )
                    .service(
                        web::scope("/attendance")
                            .service(
                                web::resource("").route(web::get().to(attendance::all_attendance)),
                            )
                            .service(
                                web::resource("/check-in")
                                    .route(web::post().to(attendance::check_in)),
                            )
                            .service(
                                web::resource("/check-out")
                                    .route(web::post().to(attendance::check_out)),
                            )
                            .service(
                                web::resource("/my").route(web::get().to(attendance::my_attendance)),
                            )
                            .service(web::resource("/today").route(web::get().to(attendance::today))),
                    )
                    .service(
                        web::scope("/leave-requests")
                            // /leave-requests
                            .service(
                                web::resource("")
                                    .route(web::get().to(leave_request::leave_list))
                                    .route(web::post().to(leave_request::create_leave)),
                            )
                            .service(
                                web::resource("/my").route(web::get().to(leave_request::my_leaves)),
                            )
                            // /leave-requests/{id}/approve
                            .service(
                                web::resource("/{id}/approve")
                                    .route(web::put().to(leave_request::approve_leave)),
                            ),
                    )
                    .service(
                        web::scope("/leave-balances")
                            .service(
                                web::resource("")
                                    .route(web::get().to(leave_balance::list_balances))
                                    .route(web::put().to(leave_balance::set_balance)),
                            )
                            .service(
                                web::resource("/my").route(web::get().to(leave_balance::my_balance)),
                            ),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn limiters_build_for_any_positive_rate() {
        for rate in [1, 60, 1000, 120_000] {
            assert!(build_limiter(rate).is_ok(), "rate {rate}");
        }
        assert!(RateLimiters::from_config(&test_config()).is_ok());
    }
}
