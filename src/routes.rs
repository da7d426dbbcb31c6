use crate::{
    api::{attendance, employee, feedback, session},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> anyhow::Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

/// Limiters are built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
    protected: Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            // only admins create logins
            .service(
                web::resource("/register")
                    .wrap(from_fn(auth_middleware))
                    .wrap(limiters.protected.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    // /employee/{id}/attendance
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::get().to(attendance::employee_history)),
                    ),
            )
            .service(
                web::scope("/sessions/{kind}")
                    // /sessions/{kind}
                    .service(
                        web::resource("")
                            .route(web::get().to(session::list_sessions))
                            .route(web::post().to(session::schedule_session)),
                    )
                    // /sessions/{kind}/today
                    .service(web::resource("/today").route(web::get().to(session::today)))
                    .service(web::resource("/today/start").route(web::post().to(session::start_session)))
                    .service(web::resource("/today/stop").route(web::post().to(session::stop_session)))
                    // /sessions/{kind}/today/attendance/{employee_id}
                    .service(
                        web::resource("/today/attendance/{employee_id}")
                            .route(web::put().to(session::toggle_attendance)),
                    )
                    // /sessions/{kind}/{session_id}/attendance
                    .service(
                        web::resource("/{session_id}/attendance")
                            .route(web::put().to(session::edit_attendance)),
                    ),
            )
            .service(web::resource("/streak").route(web::get().to(attendance::my_streak)))
            .service(web::resource("/feedback/metrics").route(web::post().to(feedback::feedback_metrics))),
    );
}
