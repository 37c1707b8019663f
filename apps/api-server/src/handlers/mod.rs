//! HTTP handlers and route configuration.

mod health;
mod kyc;
mod news;
mod notifications;
mod users;

use actix_web::{HttpRequest, error, web};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Register the state, extractor settings and routes. Used by the server
/// and by handler tests.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state.tokens.clone()))
            .app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .configure(configure_routes);
    }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Payload(format!("Invalid JSON body: {err}")).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Payload(format!("Invalid query string: {err}")).into()
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/news")
                    .route("", web::get().to(news::list_news))
                    .route("", web::post().to(news::create_news))
                    .route("/{id}", web::get().to(news::get_news))
                    .route("/{id}", web::put().to(news::update_news))
                    .route("/{id}", web::delete().to(news::delete_news))
                    .route("/{id}/like", web::post().to(news::toggle_like))
                    .route("/{id}/comments", web::post().to(news::add_comment)),
            )
            .service(
                web::scope("/kyc")
                    .route("/{user_id}", web::get().to(kyc::get_kyc))
                    .route("/{user_id}", web::post().to(kyc::submit_kyc))
                    .route("/{user_id}/status", web::put().to(kyc::set_status)),
            )
            .service(
                web::scope("/notifications")
                    // Registered before `/{user_id}` so it is not taken for a uid.
                    .route("/upload", web::post().to(notifications::upload))
                    .route("/{user_id}", web::get().to(notifications::get_preferences))
                    .route("/{user_id}", web::put().to(notifications::update_preferences))
                    .route("/{user_id}/items", web::get().to(notifications::list))
                    .route("/{user_id}/items/read-all", web::post().to(notifications::mark_all_read))
                    .route("/{user_id}/items/{id}/read", web::post().to(notifications::mark_read)),
            )
            .service(
                web::scope("/users/{user_id}")
                    .route("/profile", web::get().to(users::get_profile))
                    .route("/profile", web::put().to(users::update_profile))
                    .route("/stats", web::get().to(users::get_stats))
                    .route("/stats", web::put().to(users::update_stats))
                    .route("/trades", web::get().to(users::get_trades))
                    .route("/trades", web::post().to(users::record_trade))
                    .route("/settings", web::get().to(users::get_settings))
                    .route("/settings/currency", web::put().to(users::set_currency))
                    .route("/settings/{key}/toggle", web::post().to(users::toggle_setting))
                    .route("/audit-log", web::get().to(users::audit_log)),
            ),
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use actix_web::http::header;
    use fxfeed_core::ports::ADMIN_ROLE;
    use fxfeed_infra::{InMemoryStore, JwtConfig, JwtTokenService};

    use crate::state::AppState;

    pub fn state() -> AppState {
        AppState::with_store(
            Arc::new(InMemoryStore::new()),
            Arc::new(JwtTokenService::new(JwtConfig::default())),
        )
    }

    /// `Authorization` header for a regular user.
    pub fn bearer(state: &AppState, uid: &str) -> (header::HeaderName, String) {
        token(state, uid, vec!["user".to_string()])
    }

    pub fn admin_bearer(state: &AppState, uid: &str) -> (header::HeaderName, String) {
        token(state, uid, vec!["user".to_string(), ADMIN_ROLE.to_string()])
    }

    fn token(state: &AppState, uid: &str, roles: Vec<String>) -> (header::HeaderName, String) {
        let token = state
            .tokens
            .generate_token(uid, &format!("{uid}@example.com"), roles)
            .unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }
}
