use actix_web::web;
use actix_governor::{Governor, GovernorConfigBuilder};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::config::Config;
use crate::docs::ApiDoc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let requests_per_min = config.rate_actions_per_min;
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let limiter_conf = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .finish()
        .unwrap();

    cfg.service(
        web::scope(&format!("{}/v1", config.api_prefix)).service(
            web::resource("/actions")
                .wrap(Governor::new(&limiter_conf))
                .route(web::post().to(api::actions)),
        ),
    );

    cfg.service(
        SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
