use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

use crate::api::{attendance, employee, leave, organization, payroll, regularize};
use crate::auth::handlers;
use crate::config::Config;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(build_limiter(config.rate_onboarding_per_min))
                    .route(web::post().to(organization::create_organization)),
            ),
    );

    // Token-protected routes; every handler extracts the Actor itself.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(build_limiter(config.rate_protected_per_min))
            .service(
                web::scope("/organization")
                    .service(
                        web::resource("").route(web::get().to(organization::get_organization)),
                    )
                    .service(
                        web::resource("/holiday").route(web::post().to(organization::add_holiday)),
                    )
                    .service(
                        web::resource("/deactivate")
                            .route(web::put().to(organization::deactivate_organization)),
                    ),
            )
            .service(
                web::scope("/employee")
                    .service(web::resource("").route(web::post().to(employee::create_employee)))
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/monthly").route(web::get().to(attendance::monthly))),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list))
                            .route(web::post().to(leave::apply)),
                    )
                    .service(web::resource("/action").route(web::post().to(leave::action))),
            )
            .service(
                web::scope("/regularization")
                    .service(web::resource("").route(web::post().to(regularize::apply)))
                    .service(web::resource("/action").route(web::post().to(regularize::action)))
                    .service(web::resource("/pending").route(web::get().to(regularize::pending))),
            )
            .service(
                web::scope("/payroll").service(
                    web::resource("/salary").route(web::post().to(payroll::calculate_salary)),
                ),
            ),
    );
}
