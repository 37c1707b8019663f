//! # Fxfeed API Server
//!
//! REST surface over the same store the mobile app uses: the news feed,
//! trader profiles, KYC review and notification settings.

use actix_web::{App, HttpServer};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    middleware::error::set_development_mode(config.is_development());

    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = %config.environment,
        "Starting Fxfeed API Server"
    );

    let state = AppState::new(&config);

    HttpServer::new(move || {
        let app = App::new();
        #[cfg(feature = "rate-limit")]
        let app = app.wrap(middleware::rate_limit::RateLimitMiddleware::new(
            state.rate_limiter.clone(),
        ));

        app.wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure_app(state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
