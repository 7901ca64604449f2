use http::{header, HeaderValue};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::routes::{health, news};
use crate::state::AppState;

pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::<AppState>::new()
        .merge(health::router())
        .merge(news::router());

    Router::<AppState>::new()
        .nest("/api", api)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser access from the configured front-end origins, with credentials.
///
/// Credentialed CORS cannot use `*`, so methods and headers mirror the
/// preflight request instead.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers(ExposeHeaders::list([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::DATE,
        ]))
        .max_age(Duration::from_secs(config.cors_max_age_secs))
}
