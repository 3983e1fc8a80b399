use crate::{
    api::{attendance, dashboard, grades, leave_request, timetable},
    auth::handlers,
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let kiosk_limiter = Arc::new(build_limiter(config.rate_kiosk_per_min));
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));

    // malformed bodies, queries and paths answer with the usual {"message"} shape
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::bad_request(err.to_string()).into()),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            // kiosk + login
            .service(
                web::resource("/mark-attendance")
                    .wrap(kiosk_limiter)
                    .route(web::post().to(attendance::mark_attendance)),
            )
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::scope("/student")
                    .service(
                        web::resource("/dashboard-summary/{student_id}")
                            .route(web::get().to(dashboard::dashboard_summary)),
                    )
                    .service(
                        web::resource("/attendance/{student_id}")
                            .route(web::get().to(attendance::student_attendance)),
                    )
                    .service(
                        web::resource("/marks/{student_id}")
                            .route(web::get().to(grades::student_marks)),
                    )
                    .service(
                        web::resource("/leaves/{student_id}")
                            .route(web::get().to(leave_request::student_leaves)),
                    )
                    .service(
                        web::resource("/apply-leave")
                            .route(web::post().to(leave_request::apply_leave)),
                    )
                    .service(web::resource("/timetable").route(web::get().to(timetable::timetable))),
            )
            .service(
                web::scope("/teacher")
                    // /teacher/attendance?date=
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(attendance::daily_roster)),
                    )
                    .service(
                        web::resource("/mark-attendance")
                            .route(web::post().to(attendance::set_attendance)),
                    )
                    // older dashboards still post here
                    .service(
                        web::resource("/manual-attendance")
                            .route(web::post().to(attendance::set_attendance)),
                    )
                    .service(
                        web::resource("/leaves").route(web::get().to(leave_request::pending_leaves)),
                    )
                    .service(
                        web::resource("/handle-leave")
                            .route(web::post().to(leave_request::handle_leave)),
                    )
                    .service(
                        web::resource("/grades")
                            .route(web::get().to(grades::list_grades))
                            .route(web::post().to(grades::create_grade)),
                    ),
            ),
    );
}
